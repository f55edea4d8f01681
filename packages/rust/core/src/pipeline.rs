//! Run orchestration: query → search → filter → translate → notify → persist.
//!
//! One [`Pipeline`] owns every collaborator and the run state (the set of
//! known identity URLs and the daily counter). Steps run strictly in order;
//! the pacing delays are courtesy throttling towards the external services.

use std::collections::HashSet;
use std::time::Duration;

use paperscout_discovery::PaperSearch;
use paperscout_figures::{FigureExtractor, PageFetcher};
use paperscout_notify::{
    Messenger, render_basic_info, render_header, render_no_relevant, render_no_results,
    render_summary,
};
use paperscout_shared::{AppConfig, PacingConfig, Paper};
use paperscout_storage::PaperStore;
use paperscout_translate::{
    QuotaTracker, TranslateOptions, Translator, remaining_quota, translate_abstract,
};
use tracing::{debug, info, instrument, warn};

use crate::filter::filter_candidates;

// ---------------------------------------------------------------------------
// Settings, state, and results
// ---------------------------------------------------------------------------

/// Tunables for one run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Papers handed off per query.
    pub papers_per_query: usize,
    /// Daily cap on processed papers.
    pub max_new_papers: usize,
    /// Candidates requested per wanted paper.
    pub candidate_multiplier: usize,
    pub pacing: PacingConfig,
    pub translate: TranslateOptions,
    /// Quota assumed when the translation usage endpoint fails.
    pub fallback_limit: u64,
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            papers_per_query: config.search.papers_per_query,
            max_new_papers: config.search.max_new_papers_per_day,
            candidate_multiplier: config.search.candidate_multiplier,
            pacing: config.pacing.clone(),
            translate: TranslateOptions::from(&config.translation),
            fallback_limit: config.translation.fallback_limit,
        }
    }
}

/// State carried across queries within a run.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    /// Identity URLs archived before or during this run.
    pub existing_urls: HashSet<String>,
    /// Papers processed so far today.
    pub processed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QueriesExhausted,
    DailyCapReached,
}

/// Per-paper hand-off steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffStep {
    BasicInfo,
    Summary,
    Persist,
}

impl std::fmt::Display for HandoffStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::BasicInfo => "basic info message",
            Self::Summary => "summary message",
            Self::Persist => "persist",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffFailure {
    pub arxiv_id: String,
    pub step: HandoffStep,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Queries for which a search was issued.
    pub queries_run: usize,
    /// Papers counted towards the daily cap during this run.
    pub papers_processed: usize,
    pub stop: StopReason,
    pub handoff_failures: Vec<HandoffFailure>,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress reporting trait for CLI/UI feedback.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each query's search.
    fn query_started(&self, query: &str, current: usize, total: usize);
    /// Called before each paper's hand-off.
    fn paper_started(&self, title: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn query_started(&self, _query: &str, _current: usize, _total: usize) {}
    fn paper_started(&self, _title: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Orchestrates one run over a list of queries.
pub struct Pipeline<S, F, T, M, P> {
    search: S,
    figures: FigureExtractor<F>,
    translator: T,
    messenger: M,
    store: P,
    settings: PipelineSettings,
    state: RunState,
    quota: QuotaTracker,
}

impl<S, F, T, M, P> Pipeline<S, F, T, M, P>
where
    S: PaperSearch,
    F: PageFetcher,
    T: Translator,
    M: Messenger,
    P: PaperStore,
{
    pub fn new(
        search: S,
        figures: FigureExtractor<F>,
        translator: T,
        messenger: M,
        store: P,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            search,
            figures,
            translator,
            messenger,
            store,
            settings,
            state: RunState::default(),
            quota: QuotaTracker::new(0),
        }
    }

    /// Start from a pre-populated state (e.g. papers already processed today).
    pub fn with_state(mut self, state: RunState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Translation budget as of the last processed paper.
    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    /// Process `queries` in order until they run out or the daily cap is hit.
    #[instrument(skip_all, fields(queries = queries.len()))]
    pub async fn run(&mut self, queries: &[String], progress: &dyn ProgressReporter) -> RunSummary {
        progress.phase("Loading archived papers");
        self.load_existing_urls().await;

        let mut summary = RunSummary {
            queries_run: 0,
            papers_processed: 0,
            stop: StopReason::QueriesExhausted,
            handoff_failures: Vec::new(),
        };
        let start_count = self.state.processed;

        for (i, query) in queries.iter().enumerate() {
            if self.cap_reached() {
                info!(
                    processed = self.state.processed,
                    cap = self.settings.max_new_papers,
                    "daily limit reached"
                );
                summary.stop = StopReason::DailyCapReached;
                break;
            }

            progress.query_started(query, i + 1, queries.len());
            info!(
                %query,
                processed = self.state.processed,
                cap = self.settings.max_new_papers,
                "processing query"
            );
            summary.queries_run += 1;
            self.run_query(query, progress, &mut summary.handoff_failures)
                .await;

            if self.cap_reached() {
                info!(processed = self.state.processed, "daily limit reached");
                summary.stop = StopReason::DailyCapReached;
                break;
            }
            if i + 1 < queries.len() {
                pause(self.settings.pacing.query_interval_ms).await;
            }
        }

        summary.papers_processed = self.state.processed - start_count;
        info!(
            queries_run = summary.queries_run,
            papers_processed = summary.papers_processed,
            failures = summary.handoff_failures.len(),
            stop = ?summary.stop,
            "run complete"
        );
        progress.done(&summary);
        summary
    }

    fn cap_reached(&self) -> bool {
        self.state.processed >= self.settings.max_new_papers
    }

    async fn load_existing_urls(&mut self) {
        if !self.store.is_enabled() {
            debug!("persistence disabled, starting with in-run dedup only");
            return;
        }
        match self.store.list_existing_urls().await {
            Ok(urls) => {
                info!(count = urls.len(), "loaded archived URLs");
                self.state.existing_urls.extend(urls);
            }
            Err(e) => warn!(error = %e, "could not load archived URLs, continuing without history"),
        }
    }

    /// Search, then extract figures for each candidate with pacing in between.
    /// A failed search counts as "no papers".
    async fn discover(&self, query: &str, max_results: usize) -> Vec<Paper> {
        let mut papers = match self.search.search(query, max_results).await {
            Ok(papers) => papers,
            Err(e) => {
                warn!(%query, error = %e, "search failed");
                return Vec::new();
            }
        };

        for (i, paper) in papers.iter_mut().enumerate() {
            if i > 0 {
                pause(self.settings.pacing.request_interval_ms).await;
            }
            let scan = self.figures.extract(&paper.url).await;
            for (step, reason) in &scan.degraded {
                debug!(id = %paper.arxiv_id, %step, %reason, "figure step skipped");
            }
            paper.attach_figures(scan.figures);
        }
        papers
    }

    async fn run_query(
        &mut self,
        query: &str,
        progress: &dyn ProgressReporter,
        failures: &mut Vec<HandoffFailure>,
    ) {
        let wanted = self.settings.papers_per_query;
        let candidates = self
            .discover(query, wanted * self.settings.candidate_multiplier)
            .await;

        if candidates.is_empty() {
            info!(%query, "no papers found");
            self.notify(&render_no_results(query)).await;
            return;
        }
        info!(%query, found = candidates.len(), "candidates found");

        let outcome = filter_candidates(candidates, query, &self.state.existing_urls);
        info!(
            kept = outcome.kept.len(),
            irrelevant = outcome.irrelevant.len(),
            duplicates = outcome.duplicates.len(),
            "candidates filtered"
        );

        let mut papers = outcome.kept;
        if papers.is_empty() {
            info!(%query, "no relevant papers after filtering");
            self.notify(&render_no_relevant(query)).await;
            return;
        }
        papers.truncate(wanted);

        self.notify(&render_header(papers.len())).await;
        pause(self.settings.pacing.message_interval_ms).await;

        let total = papers.len();
        for (i, mut paper) in papers.into_iter().enumerate() {
            progress.paper_started(&paper.title, i + 1, total);
            self.process_paper(&mut paper, query, i + 1, total, failures)
                .await;
        }
    }

    /// Translate, send both messages, persist, and update the run state.
    #[instrument(skip_all, fields(id = %paper.arxiv_id, n = n, total = total))]
    pub async fn process_paper(
        &mut self,
        paper: &mut Paper,
        keyword: &str,
        n: usize,
        total: usize,
        failures: &mut Vec<HandoffFailure>,
    ) {
        info!(title = %paper.short_title(50), "processing paper");

        let remaining = remaining_quota(&self.translator, self.settings.fallback_limit).await;
        self.quota.refresh(remaining);
        translate_abstract(
            &self.translator,
            &paper.abstract_text,
            &mut self.quota,
            &self.settings.translate,
        )
        .await
        .apply_to(paper);

        let messages = [
            (HandoffStep::BasicInfo, render_basic_info(paper, n, total)),
            (HandoffStep::Summary, render_summary(paper)),
        ];
        for (step, message) in messages {
            if let Err(e) = self.messenger.send(&message).await {
                warn!(%step, error = %e, "message not delivered");
                failures.push(HandoffFailure {
                    arxiv_id: paper.arxiv_id.clone(),
                    step,
                    reason: e.to_string(),
                });
            }
            pause(self.settings.pacing.message_interval_ms).await;
        }

        if self.store.is_enabled() {
            match self.store.save(paper, keyword).await {
                Ok(record_id) => {
                    info!(%record_id, "paper persisted");
                    self.mark_processed(paper);
                }
                Err(e) => {
                    warn!(error = %e, "paper not persisted");
                    failures.push(HandoffFailure {
                        arxiv_id: paper.arxiv_id.clone(),
                        step: HandoffStep::Persist,
                        reason: e.to_string(),
                    });
                }
            }
        } else {
            self.mark_processed(paper);
        }
    }

    fn mark_processed(&mut self, paper: &Paper) {
        if let Some(url) = paper.identity_url() {
            self.state.existing_urls.insert(url.to_string());
        }
        self.state.processed += 1;
    }

    /// Send an informational message; delivery failures are only logged.
    async fn notify(&self, message: &str) {
        if let Err(e) = self.messenger.send(message).await {
            warn!(error = %e, "notice not delivered");
        }
    }
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use paperscout_figures::FetchedPage;
    use paperscout_shared::{FiguresConfig, PaperScoutError, Result, TranslationStatus};
    use paperscout_translate::Usage;

    use super::*;

    // -- fakes ---------------------------------------------------------------

    #[derive(Default)]
    struct FakeSearch {
        results: HashMap<String, Vec<Paper>>,
        failing: HashSet<String>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl FakeSearch {
        fn with(mut self, query: &str, papers: Vec<Paper>) -> Self {
            self.results.insert(query.to_string(), papers);
            self
        }

        fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PaperSearch for FakeSearch {
        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), max_results));
            if self.failing.contains(query) {
                return Err(PaperScoutError::Network("connection reset".into()));
            }
            Ok(self.results.get(query).cloned().unwrap_or_default())
        }
    }

    /// Every page is missing, so no figures are found.
    struct NoPages;

    impl PageFetcher for NoPages {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                status: 404,
                body: None,
            })
        }

        async fn head(&self, _url: &str) -> Result<u16> {
            Ok(404)
        }
    }

    struct EchoTranslator;

    impl Translator for EchoTranslator {
        async fn usage(&self) -> Result<Usage> {
            Ok(Usage {
                used: 0,
                limit: 500_000,
            })
        }

        async fn translate(&self, text: &str, _target_lang: &str) -> Result<String> {
            Ok(format!("訳: {text}"))
        }
    }

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingMessenger {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Messenger for RecordingMessenger {
        async fn send(&self, message: &str) -> Result<()> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeStore {
        disabled: bool,
        fail_saves: bool,
        existing: HashSet<String>,
        saved: Mutex<Vec<(String, String)>>,
    }

    impl FakeStore {
        fn saved(&self) -> Vec<(String, String)> {
            self.saved.lock().unwrap().clone()
        }
    }

    impl PaperStore for FakeStore {
        fn is_enabled(&self) -> bool {
            !self.disabled
        }

        async fn list_existing_urls(&self) -> Result<HashSet<String>> {
            Ok(self.existing.clone())
        }

        async fn save(&self, paper: &Paper, keyword: &str) -> Result<String> {
            if self.fail_saves {
                return Err(PaperScoutError::Storage("database unavailable".into()));
            }
            self.saved
                .lock()
                .unwrap()
                .push((paper.arxiv_id.clone(), keyword.to_string()));
            Ok(format!("page-{}", paper.arxiv_id))
        }
    }

    // -- helpers -------------------------------------------------------------

    fn paper(id: &str, title: &str, abstract_text: &str) -> Paper {
        Paper {
            arxiv_id: id.into(),
            url: format!("http://arxiv.org/abs/{id}"),
            title: title.into(),
            authors: vec!["A. Author".into()],
            abstract_text: abstract_text.into(),
            published: "2024-01-15".into(),
            categories: vec!["physics.ao-ph".into()],
            pdf_url: Some(format!("http://arxiv.org/pdf/{id}")),
            ..Default::default()
        }
    }

    fn typhoon(id: &str) -> Paper {
        paper(
            id,
            &format!("Typhoon eye structure {id}"),
            "We analyse the eye of a typhoon using satellite imagery.",
        )
    }

    fn settings(papers_per_query: usize, max_new_papers: usize) -> PipelineSettings {
        PipelineSettings {
            papers_per_query,
            max_new_papers,
            candidate_multiplier: 3,
            pacing: PacingConfig::none(),
            translate: TranslateOptions::default(),
            fallback_limit: 500_000,
        }
    }

    fn figures() -> FigureExtractor<NoPages> {
        FigureExtractor::new(
            NoPages,
            FiguresConfig {
                probe_catalogue: false,
                ..Default::default()
            },
        )
    }

    type TestPipeline =
        Pipeline<FakeSearch, NoPages, EchoTranslator, RecordingMessenger, FakeStore>;

    fn pipeline(search: FakeSearch, store: FakeStore, settings: PipelineSettings) -> TestPipeline {
        Pipeline::new(
            search,
            figures(),
            EchoTranslator,
            RecordingMessenger::default(),
            store,
            settings,
        )
    }

    fn queries(qs: &[&str]) -> Vec<String> {
        qs.iter().map(|q| q.to_string()).collect()
    }

    // -- tests ---------------------------------------------------------------

    #[tokio::test]
    async fn filters_duplicates_and_irrelevant_then_caps_per_query() {
        let candidates = vec![
            typhoon("2401.00001v1"),
            typhoon("2401.00002v1"),
            paper(
                "2401.00003v1",
                "Sparse attention for protein folding",
                "We fold proteins with sparse transformers.",
            ),
            typhoon("2401.00004v1"),
            typhoon("2401.00005v1"),
            typhoon("2401.00006v1"),
        ];
        let search = FakeSearch::default().with("typhoon eye", candidates);
        let store = FakeStore {
            existing: HashSet::from([
                "http://arxiv.org/pdf/2401.00001v1".to_string(),
                "http://arxiv.org/pdf/2401.00002v1".to_string(),
            ]),
            ..Default::default()
        };
        let mut pipeline = pipeline(search, store, settings(1, 5));

        let summary = pipeline
            .run(&queries(&["typhoon eye"]), &SilentProgress)
            .await;

        assert_eq!(summary.queries_run, 1);
        assert_eq!(summary.papers_processed, 1);
        assert_eq!(summary.stop, StopReason::QueriesExhausted);
        assert!(summary.handoff_failures.is_empty());
        assert_eq!(pipeline.search.calls(), vec![("typhoon eye".to_string(), 3)]);
        assert_eq!(
            pipeline.store().saved(),
            vec![("2401.00004v1".to_string(), "typhoon eye".to_string())]
        );
        assert!(
            pipeline
                .state()
                .existing_urls
                .contains("http://arxiv.org/pdf/2401.00004v1")
        );
    }

    #[tokio::test]
    async fn messages_go_out_header_first_then_info_and_summary_per_paper() {
        let search =
            FakeSearch::default().with("typhoon", vec![typhoon("2401.00001v1"), typhoon("2401.00002v1")]);
        let mut pipeline = pipeline(search, FakeStore::default(), settings(2, 10));

        pipeline.run(&queries(&["typhoon"]), &SilentProgress).await;

        let sent = pipeline.messenger.sent();
        assert_eq!(sent.len(), 5);
        assert!(sent[0].starts_with("🔬 本日の論文情報 (2件)"));
        assert!(sent[1].starts_with("[1/2]"));
        assert!(sent[2].starts_with("📝 要約（日本語翻訳）"));
        assert!(sent[2].contains("訳: We analyse"));
        assert!(sent[3].starts_with("[2/2]"));
        assert!(sent[4].starts_with("📝 要約（日本語翻訳）"));
    }

    #[tokio::test]
    async fn cap_already_reached_issues_no_searches() {
        let search = FakeSearch::default().with("typhoon", vec![typhoon("2401.00001v1")]);
        let mut pipeline = pipeline(search, FakeStore::default(), settings(1, 2)).with_state(
            RunState {
                processed: 2,
                ..Default::default()
            },
        );

        let summary = pipeline
            .run(&queries(&["typhoon", "hurricane"]), &SilentProgress)
            .await;

        assert_eq!(summary.stop, StopReason::DailyCapReached);
        assert_eq!(summary.queries_run, 0);
        assert_eq!(summary.papers_processed, 0);
        assert!(pipeline.search.calls().is_empty());
        assert!(pipeline.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn stops_between_queries_once_cap_is_reached() {
        let search = FakeSearch::default()
            .with("typhoon", vec![typhoon("2401.00001v1"), typhoon("2401.00002v1")])
            .with("hurricane", vec![typhoon("2401.00003v1")]);
        let mut pipeline = pipeline(search, FakeStore::default(), settings(2, 2));

        let summary = pipeline
            .run(&queries(&["typhoon", "hurricane"]), &SilentProgress)
            .await;

        assert_eq!(summary.stop, StopReason::DailyCapReached);
        assert_eq!(summary.papers_processed, 2);
        assert_eq!(pipeline.search.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_save_is_not_counted_and_not_remembered() {
        let search = FakeSearch::default().with("typhoon", vec![typhoon("2401.00001v1")]);
        let store = FakeStore {
            fail_saves: true,
            ..Default::default()
        };
        let mut pipeline = pipeline(search, store, settings(1, 5));

        let summary = pipeline.run(&queries(&["typhoon"]), &SilentProgress).await;

        assert_eq!(summary.papers_processed, 0);
        assert_eq!(summary.handoff_failures.len(), 1);
        assert_eq!(summary.handoff_failures[0].step, HandoffStep::Persist);
        assert_eq!(summary.handoff_failures[0].arxiv_id, "2401.00001v1");
        assert!(pipeline.state().existing_urls.is_empty());
        // Both messages were still delivered.
        assert_eq!(pipeline.messenger.sent().len(), 3);
    }

    #[tokio::test]
    async fn disabled_store_still_dedups_within_the_run() {
        let search = FakeSearch::default()
            .with("typhoon", vec![typhoon("2401.00001v1")])
            .with("typhoon eye", vec![typhoon("2401.00001v1")]);
        let store = FakeStore {
            disabled: true,
            ..Default::default()
        };
        let mut pipeline = pipeline(search, store, settings(1, 5));

        let summary = pipeline
            .run(&queries(&["typhoon", "typhoon eye"]), &SilentProgress)
            .await;

        assert_eq!(summary.papers_processed, 1);
        assert!(pipeline.store().saved().is_empty());
        let sent = pipeline.messenger.sent();
        assert_eq!(
            sent.last().map(String::as_str),
            Some("「typhoon eye」に関連する論文が見つかりませんでした。")
        );
    }

    #[tokio::test]
    async fn empty_or_failed_search_sends_no_results_notice() {
        let search = FakeSearch {
            failing: HashSet::from(["cyclone".to_string()]),
            ..Default::default()
        };
        let mut pipeline = pipeline(search, FakeStore::default(), settings(1, 5));

        let summary = pipeline
            .run(&queries(&["typhoon", "cyclone"]), &SilentProgress)
            .await;

        assert_eq!(summary.queries_run, 2);
        assert_eq!(summary.papers_processed, 0);
        assert_eq!(
            pipeline.messenger.sent(),
            vec![
                "「typhoon」に関する論文が見つかりませんでした。".to_string(),
                "「cyclone」に関する論文が見つかりませんでした。".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn short_abstract_is_skipped_not_failed() {
        let search = FakeSearch::default().with(
            "typhoon",
            vec![paper("2401.00009v1", "Typhoon note", "Short.")],
        );
        let mut pipeline = pipeline(search, FakeStore::default(), settings(1, 5));

        pipeline.run(&queries(&["typhoon"]), &SilentProgress).await;

        let sent = pipeline.messenger.sent();
        assert!(sent[2].contains("翻訳をスキップしたため"));
        assert!(sent[2].ends_with("Short."));
    }

    #[tokio::test]
    async fn process_paper_records_translation_on_the_paper() {
        let mut pipeline = pipeline(FakeSearch::default(), FakeStore::default(), settings(1, 5));
        let mut p = typhoon("2401.00001v1");
        let mut failures = Vec::new();

        pipeline
            .process_paper(&mut p, "typhoon", 1, 1, &mut failures)
            .await;

        assert_eq!(p.translation, TranslationStatus::Translated);
        assert_eq!(
            p.translated_abstract.as_deref(),
            Some("訳: We analyse the eye of a typhoon using satellite imagery.")
        );
        assert_eq!(pipeline.state().processed, 1);
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn quota_is_refetched_before_each_paper() {
        let mut pipeline = pipeline(FakeSearch::default(), FakeStore::default(), settings(1, 5));
        let mut failures = Vec::new();
        let abstract_chars = typhoon("x").abstract_text.chars().count() as u64;

        let mut first = typhoon("2401.00001v1");
        pipeline
            .process_paper(&mut first, "typhoon", 1, 2, &mut failures)
            .await;
        assert_eq!(pipeline.quota().remaining(), 500_000 - abstract_chars);

        // The service still reports the full budget, so the second paper
        // starts from it rather than from the locally decremented value.
        let mut second = typhoon("2401.00002v1");
        pipeline
            .process_paper(&mut second, "typhoon", 2, 2, &mut failures)
            .await;
        assert_eq!(pipeline.quota().remaining(), 500_000 - abstract_chars);
        assert_eq!(second.translation, TranslationStatus::Translated);
    }
}
