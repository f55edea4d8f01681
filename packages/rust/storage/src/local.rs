//! Local libSQL archive of processed papers.

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use paperscout_shared::{Figure, Paper, PaperScoutError, Result};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::migrations;

fn storage_err(e: impl std::fmt::Display) -> PaperScoutError {
    PaperScoutError::Storage(e.to_string())
}

/// A paper row read back from the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedPaper {
    pub id: String,
    pub identity_url: String,
    pub arxiv_id: String,
    pub title: String,
    pub keyword: String,
    pub read_status: String,
    pub translated_abstract: Option<String>,
    pub figures: Vec<Figure>,
}

/// Paper archive stored in a local libSQL database file.
pub struct LocalArchive {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl LocalArchive {
    /// Open or create the archive at `path`, applying pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PaperScoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let archive = Self { db, conn };
        archive.run_migrations().await?;
        info!(path = %path.display(), "local archive opened");
        Ok(archive)
    }

    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        PaperScoutError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 before the first migration.
    async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0,
        }
    }

    /// Every archived identity URL.
    pub async fn identity_urls(&self) -> Result<HashSet<String>> {
        let mut rows = self
            .conn
            .query("SELECT identity_url FROM papers", params![])
            .await
            .map_err(storage_err)?;

        let mut urls = HashSet::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            urls.insert(row.get::<String>(0).map_err(storage_err)?);
        }
        debug!(count = urls.len(), "loaded archived URLs");
        Ok(urls)
    }

    /// Insert or refresh a paper and replace its figures. Returns the row id,
    /// which is stable across re-saves of the same identity URL.
    #[instrument(skip_all, fields(id = %paper.arxiv_id))]
    pub async fn insert_paper(&self, paper: &Paper, keyword: &str) -> Result<String> {
        let identity = paper.identity_url().ok_or_else(|| {
            PaperScoutError::validation(format!("{} has no URL to archive under", paper.arxiv_id))
        })?;

        let categories = serde_json::to_string(&paper.categories).map_err(storage_err)?;
        let translation = serde_json::to_string(&paper.translation).map_err(storage_err)?;
        let now = Utc::now().to_rfc3339();

        // Paper row and figure list change together or not at all.
        let tx = self.conn.transaction().await.map_err(storage_err)?;

        tx.execute(
            "INSERT INTO papers (identity_url, id, arxiv_id, title, authors, abstract,
                                 translated_abstract, translation_json, published, updated,
                                 categories_json, pdf_url, doi, journal_ref, comment,
                                 keyword, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT(identity_url) DO UPDATE SET
               title = excluded.title,
               authors = excluded.authors,
               abstract = excluded.abstract,
               translated_abstract = excluded.translated_abstract,
               translation_json = excluded.translation_json,
               updated = excluded.updated,
               categories_json = excluded.categories_json,
               keyword = excluded.keyword",
            params![
                identity,
                Uuid::now_v7().to_string(),
                paper.arxiv_id.as_str(),
                paper.title.as_str(),
                paper.authors_str(),
                paper.abstract_text.as_str(),
                paper.translated_abstract.as_deref(),
                translation,
                paper.published.as_str(),
                paper.updated.as_str(),
                categories,
                paper.pdf_url.as_deref(),
                paper.doi.as_deref(),
                paper.journal_ref.as_deref(),
                paper.comment.as_deref(),
                keyword,
                now,
            ],
        )
        .await
        .map_err(storage_err)?;

        tx.execute("DELETE FROM figures WHERE paper_url = ?1", params![identity])
            .await
            .map_err(storage_err)?;

        for (position, figure) in paper.figures.iter().enumerate() {
            tx.execute(
                "INSERT INTO figures (paper_url, position, url, alt, caption)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    identity,
                    position as i64,
                    figure.url.as_str(),
                    figure.alt.as_deref(),
                    figure.caption.as_str(),
                ],
            )
            .await
            .map_err(storage_err)?;
        }

        let mut rows = tx
            .query("SELECT id FROM papers WHERE identity_url = ?1", params![identity])
            .await
            .map_err(storage_err)?;
        let id = match rows.next().await.map_err(storage_err)? {
            Some(row) => row.get::<String>(0).map_err(storage_err)?,
            None => return Err(PaperScoutError::Storage(format!("{identity}: row vanished"))),
        };
        drop(rows);
        tx.commit().await.map_err(storage_err)?;

        info!(%id, figures = paper.figures.len(), "paper archived");
        Ok(id)
    }

    /// Look up an archived paper by identity URL.
    pub async fn get_paper(&self, identity_url: &str) -> Result<Option<ArchivedPaper>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, identity_url, arxiv_id, title, keyword, read_status, translated_abstract
                 FROM papers WHERE identity_url = ?1",
                params![identity_url],
            )
            .await
            .map_err(storage_err)?;

        let Some(row) = rows.next().await.map_err(storage_err)? else {
            return Ok(None);
        };

        let mut paper = ArchivedPaper {
            id: row.get::<String>(0).map_err(storage_err)?,
            identity_url: row.get::<String>(1).map_err(storage_err)?,
            arxiv_id: row.get::<String>(2).map_err(storage_err)?,
            title: row.get::<String>(3).map_err(storage_err)?,
            keyword: row.get::<String>(4).map_err(storage_err)?,
            read_status: row.get::<String>(5).map_err(storage_err)?,
            translated_abstract: row.get::<Option<String>>(6).map_err(storage_err)?,
            figures: Vec::new(),
        };
        paper.figures = self.figures_for(identity_url).await?;
        Ok(Some(paper))
    }

    async fn figures_for(&self, identity_url: &str) -> Result<Vec<Figure>> {
        let mut rows = self
            .conn
            .query(
                "SELECT url, alt, caption FROM figures WHERE paper_url = ?1 ORDER BY position",
                params![identity_url],
            )
            .await
            .map_err(storage_err)?;

        let mut figures = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            figures.push(Figure {
                url: row.get::<String>(0).map_err(storage_err)?,
                alt: row.get::<Option<String>>(1).map_err(storage_err)?,
                caption: row.get::<String>(2).map_err(storage_err)?,
            });
        }
        Ok(figures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperscout_shared::TranslationStatus;

    async fn test_archive() -> LocalArchive {
        let tmp = std::env::temp_dir().join(format!("ps_test_{}.db", Uuid::now_v7()));
        LocalArchive::open(&tmp).await.expect("open test db")
    }

    fn paper() -> Paper {
        Paper {
            arxiv_id: "2401.01234v2".into(),
            url: "http://arxiv.org/abs/2401.01234v2".into(),
            title: "Deep Learning Estimation of Typhoon Eye Size".into(),
            authors: vec!["Hanako Sato".into()],
            abstract_text: "We estimate the eye size.".into(),
            pdf_url: Some("http://arxiv.org/pdf/2401.01234v2".into()),
            categories: vec!["physics.ao-ph".into()],
            translated_abstract: Some("目の大きさを推定する。".into()),
            translation: TranslationStatus::Translated,
            figures: vec![
                Figure {
                    url: "https://arxiv.org/html/2401.01234v2/x1.png".into(),
                    alt: Some("Refer to caption".into()),
                    caption: "Figure 1: Brightness temperature.".into(),
                },
                Figure {
                    url: "https://arxiv.org/html/2401.01234v2/x2.png".into(),
                    alt: None,
                    caption: String::new(),
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let archive = test_archive().await;
        assert_eq!(
            archive.schema_version().await,
            migrations::all_migrations().last().unwrap().version
        );
        assert!(archive.identity_urls().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reopen_does_not_rerun_migrations() {
        let tmp = std::env::temp_dir().join(format!("ps_test_{}.db", Uuid::now_v7()));
        let first = LocalArchive::open(&tmp).await.unwrap();
        first.insert_paper(&paper(), "typhoon eye").await.unwrap();
        drop(first);

        let second = LocalArchive::open(&tmp).await.expect("reopen");
        assert_eq!(second.identity_urls().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let archive = test_archive().await;
        let id = archive.insert_paper(&paper(), "typhoon eye").await.unwrap();

        let urls = archive.identity_urls().await.unwrap();
        assert!(urls.contains("http://arxiv.org/pdf/2401.01234v2"));

        let stored = archive
            .get_paper("http://arxiv.org/pdf/2401.01234v2")
            .await
            .unwrap()
            .expect("archived paper");
        assert_eq!(stored.id, id);
        assert_eq!(stored.keyword, "typhoon eye");
        assert_eq!(stored.read_status, "UNREAD");
        assert_eq!(stored.translated_abstract.as_deref(), Some("目の大きさを推定する。"));
        assert_eq!(stored.figures, paper().figures);
    }

    #[tokio::test]
    async fn resave_keeps_id_and_replaces_figures() {
        let archive = test_archive().await;
        let first = archive.insert_paper(&paper(), "typhoon eye").await.unwrap();

        let mut updated = paper();
        updated.figures.truncate(1);
        let second = archive.insert_paper(&updated, "eyewall").await.unwrap();
        assert_eq!(first, second);

        let stored = archive
            .get_paper("http://arxiv.org/pdf/2401.01234v2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.figures.len(), 1);
        assert_eq!(stored.keyword, "eyewall");
    }

    /// Make figure inserts with this URL fail inside the database.
    async fn reject_figure_url(archive: &LocalArchive, url: &str) {
        archive
            .conn
            .execute_batch(&format!(
                "CREATE TRIGGER reject_figure BEFORE INSERT ON figures
                 WHEN NEW.url = '{url}'
                 BEGIN SELECT RAISE(ABORT, 'figure rejected'); END;"
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_figure_insert_leaves_no_paper_row() {
        let archive = test_archive().await;
        reject_figure_url(&archive, "https://arxiv.org/html/2401.01234v2/x2.png").await;

        let err = archive.insert_paper(&paper(), "typhoon eye").await.unwrap_err();
        assert!(matches!(err, PaperScoutError::Storage(_)));
        assert!(archive.identity_urls().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_resave_keeps_previous_figures() {
        let archive = test_archive().await;
        archive.insert_paper(&paper(), "typhoon eye").await.unwrap();
        reject_figure_url(&archive, "https://arxiv.org/html/2401.01234v2/x3.png").await;

        let mut updated = paper();
        updated.figures.push(Figure {
            url: "https://arxiv.org/html/2401.01234v2/x3.png".into(),
            alt: None,
            caption: String::new(),
        });
        assert!(archive.insert_paper(&updated, "eyewall").await.is_err());

        let stored = archive
            .get_paper("http://arxiv.org/pdf/2401.01234v2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.figures, paper().figures);
        assert_eq!(stored.keyword, "typhoon eye");
    }

    #[tokio::test]
    async fn falls_back_to_detail_url() {
        let archive = test_archive().await;
        let mut p = paper();
        p.pdf_url = None;
        archive.insert_paper(&p, "q").await.unwrap();
        assert!(
            archive
                .identity_urls()
                .await
                .unwrap()
                .contains("http://arxiv.org/abs/2401.01234v2")
        );
    }

    #[tokio::test]
    async fn paper_without_urls_is_rejected() {
        let archive = test_archive().await;
        let err = archive.insert_paper(&Paper::default(), "q").await.unwrap_err();
        assert!(matches!(err, PaperScoutError::Validation { .. }));
    }
}
