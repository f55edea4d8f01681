//! Best-effort figure discovery for papers.
//!
//! This crate provides:
//! - [`PageFetcher`]: HTTP collaborator (GET pages, HEAD probes)
//! - [`ImageMatcher`]: ordered image-tag patterns
//! - [`FigureExtractor`]: rendered-page scan with abstract-page fallback,
//!   caption heuristic, and conventional-filename probes
//!
//! Extraction never fails; each step that could not complete is reported in
//! [`FigureScan::degraded`] and contributes no figures.

mod fetch;
mod matcher;
mod scan;

use paperscout_shared::{Figure, FiguresConfig, MAX_FIGURES, Paper};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use fetch::{FetchedPage, HttpFetcher, PageFetcher};
pub use matcher::ImageMatcher;
pub use scan::{find_caption, resolve_image_url, scan_page};

/// Conventional figure filenames probed under each base path.
pub const CATALOGUE_NAMES: [&str; 12] = [
    "figure1.png",
    "figure2.png",
    "figure3.png",
    "fig1.png",
    "fig2.png",
    "fig3.png",
    "image1.png",
    "image2.png",
    "image3.png",
    "plot1.png",
    "plot2.png",
    "plot3.png",
];

// ---------------------------------------------------------------------------
// FigureScan
// ---------------------------------------------------------------------------

/// Extraction steps that can degrade independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureStep {
    RenderedPage,
    AbstractPage,
    Scan,
    Catalogue,
}

impl std::fmt::Display for FigureStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::RenderedPage => "rendered page",
            Self::AbstractPage => "abstract page",
            Self::Scan => "html scan",
            Self::Catalogue => "catalogue probe",
        })
    }
}

/// Figures found for one paper, with the steps that failed along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FigureScan {
    /// At most [`MAX_FIGURES`], HTML matches before catalogue hits.
    pub figures: Vec<Figure>,
    pub degraded: Vec<(FigureStep, String)>,
}

impl FigureScan {
    fn degrade(&mut self, step: FigureStep, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(%step, %reason, "figure step degraded");
        self.degraded.push((step, reason));
    }
}

// ---------------------------------------------------------------------------
// FigureExtractor
// ---------------------------------------------------------------------------

/// Locates figure images for a paper's detail URL.
#[derive(Debug, Clone)]
pub struct FigureExtractor<F> {
    fetcher: F,
    config: FiguresConfig,
}

impl<F: PageFetcher> FigureExtractor<F> {
    pub fn new(fetcher: F, config: FiguresConfig) -> Self {
        Self { fetcher, config }
    }

    /// Find up to [`MAX_FIGURES`] figures for the paper at `detail_url`.
    #[instrument(skip_all, fields(url = %detail_url))]
    pub async fn extract(&self, detail_url: &str) -> FigureScan {
        let mut scan = FigureScan::default();

        let id = Paper::identifier_from_url(detail_url);
        if id.is_empty() {
            scan.degrade(FigureStep::RenderedPage, "no identifier in URL");
            return scan;
        }

        let Some((page_url, body)) = self.retrieve_page(&id, &mut scan).await else {
            return scan;
        };

        match Url::parse(&page_url) {
            Ok(base) => scan.figures = scan_page(&body, &base),
            Err(e) => scan.degrade(FigureStep::Scan, format!("{page_url}: {e}")),
        }

        if self.config.probe_catalogue {
            self.probe_catalogue(&id, &mut scan).await;
        }

        scan.figures.truncate(MAX_FIGURES);
        info!(
            figures = scan.figures.len(),
            degraded = scan.degraded.len(),
            "figure extraction complete"
        );
        scan
    }

    /// Fetch the rendered page, falling back to the abstract page on 404.
    /// Returns the URL actually retrieved and its body.
    async fn retrieve_page(&self, id: &str, scan: &mut FigureScan) -> Option<(String, String)> {
        let html_url = format!("{}{id}", self.config.html_base);
        match self.fetcher.fetch(&html_url).await {
            Ok(page) if page.is_not_found() => {
                debug!(%html_url, "no rendered page, trying abstract page");
            }
            Ok(FetchedPage {
                body: Some(body), ..
            }) => return Some((html_url, body)),
            Ok(page) => {
                scan.degrade(FigureStep::RenderedPage, format!("HTTP {}", page.status));
                return None;
            }
            Err(e) => {
                warn!(error = %e, "rendered page fetch failed");
                scan.degrade(FigureStep::RenderedPage, e.to_string());
                return None;
            }
        }

        let abs_url = format!("{}{id}", self.config.abs_base);
        match self.fetcher.fetch(&abs_url).await {
            Ok(FetchedPage {
                body: Some(body), ..
            }) => Some((abs_url, body)),
            Ok(page) => {
                scan.degrade(FigureStep::AbstractPage, format!("HTTP {}", page.status));
                None
            }
            Err(e) => {
                warn!(error = %e, "abstract page fetch failed");
                scan.degrade(FigureStep::AbstractPage, e.to_string());
                None
            }
        }
    }

    /// HEAD conventional filenames under the rendered and source bases until
    /// the figure list is full.
    async fn probe_catalogue(&self, id: &str, scan: &mut FigureScan) {
        let bases = [&self.config.html_base, &self.config.src_base];
        let mut failures = 0usize;

        for base in bases {
            for name in CATALOGUE_NAMES {
                if scan.figures.len() >= MAX_FIGURES {
                    return;
                }
                let url = format!("{base}{id}/{name}");
                if scan.figures.iter().any(|f| f.url == url) {
                    continue;
                }
                match self.fetcher.head(&url).await {
                    Ok(200) => {
                        debug!(%url, "catalogue hit");
                        scan.figures.push(Figure {
                            url,
                            alt: Some(format!("Figure from {id}")),
                            caption: format!("Image: {name}"),
                        });
                    }
                    Ok(_) => {}
                    Err(e) => {
                        failures += 1;
                        debug!(%url, error = %e, "probe failed");
                    }
                }
            }
        }

        if failures > 0 {
            scan.degrade(
                FigureStep::Catalogue,
                format!("{failures} probe request(s) failed"),
            );
        }
    }
}
