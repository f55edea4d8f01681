//! SQL migration definitions for the local paper archive.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: papers, figures",
            sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per archived paper, keyed by its identity URL
CREATE TABLE IF NOT EXISTS papers (
    identity_url       TEXT PRIMARY KEY,
    id                 TEXT NOT NULL UNIQUE,
    arxiv_id           TEXT NOT NULL,
    title              TEXT NOT NULL,
    authors            TEXT NOT NULL,
    abstract           TEXT NOT NULL,
    translated_abstract TEXT,
    translation_json   TEXT NOT NULL,
    published          TEXT,
    categories_json    TEXT NOT NULL,
    pdf_url            TEXT,
    doi                TEXT,
    keyword            TEXT NOT NULL,
    read_status        TEXT NOT NULL DEFAULT 'UNREAD',
    added_at           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_papers_arxiv_id ON papers(arxiv_id);

CREATE TABLE IF NOT EXISTS figures (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    paper_url TEXT NOT NULL REFERENCES papers(identity_url) ON DELETE CASCADE,
    position  INTEGER NOT NULL,
    url       TEXT NOT NULL,
    alt       TEXT,
    caption   TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_figures_paper ON figures(paper_url);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Bibliographic extras: updated date, journal reference, comment",
            sql: r#"
ALTER TABLE papers ADD COLUMN updated TEXT;
ALTER TABLE papers ADD COLUMN journal_ref TEXT;
ALTER TABLE papers ADD COLUMN comment TEXT;

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
