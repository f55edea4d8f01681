//! Atom feed parser for arXiv search results.
//!
//! Each `<entry>` becomes one [`Paper`]. Elements are matched by namespace
//! URI (resolved through [`FeedNamespaces`]) and local name, so prefixes in
//! the document do not matter. Missing elements map to empty strings or
//! `None`; a single entry never fails on its own.

use paperscout_shared::{Paper, PaperScoutError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::warn;

// ---------------------------------------------------------------------------
// Namespace map
// ---------------------------------------------------------------------------

/// Namespace URIs the parser resolves element names against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedNamespaces {
    /// Atom syndication namespace (entry, title, author, link, ...).
    pub atom: String,
    /// arXiv extension namespace (doi, journal_ref, comment).
    pub arxiv: String,
}

impl Default for FeedNamespaces {
    fn default() -> Self {
        Self {
            atom: "http://www.w3.org/2005/Atom".into(),
            arxiv: "http://arxiv.org/schemas/atom".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    Atom,
    Arxiv,
    Other,
}

impl FeedNamespaces {
    fn classify(&self, resolved: &ResolveResult<'_>) -> Ns {
        match resolved {
            ResolveResult::Bound(Namespace(uri)) if *uri == self.atom.as_bytes() => Ns::Atom,
            ResolveResult::Bound(Namespace(uri)) if *uri == self.arxiv.as_bytes() => Ns::Arxiv,
            _ => Ns::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry accumulation
// ---------------------------------------------------------------------------

/// Elements whose text content we keep.
#[derive(Debug, Clone, Copy)]
enum TextField {
    Title,
    Summary,
    Published,
    Updated,
    Id,
    AuthorName,
    Doi,
    JournalRef,
    Comment,
}

fn text_field(ns: Ns, local: &[u8], in_author: bool) -> Option<TextField> {
    match (ns, local) {
        (Ns::Atom, b"name") if in_author => Some(TextField::AuthorName),
        (Ns::Atom, b"title") if !in_author => Some(TextField::Title),
        (Ns::Atom, b"summary") => Some(TextField::Summary),
        (Ns::Atom, b"published") => Some(TextField::Published),
        (Ns::Atom, b"updated") => Some(TextField::Updated),
        (Ns::Atom, b"id") => Some(TextField::Id),
        (Ns::Arxiv, b"doi") => Some(TextField::Doi),
        (Ns::Arxiv, b"journal_ref") => Some(TextField::JournalRef),
        (Ns::Arxiv, b"comment") => Some(TextField::Comment),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct EntryBuilder {
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    id: Option<String>,
    authors: Vec<String>,
    pdf_url: Option<String>,
    categories: Vec<String>,
    doi: Option<String>,
    journal_ref: Option<String>,
    comment: Option<String>,
}

impl EntryBuilder {
    fn set(&mut self, field: TextField, value: String) {
        match field {
            TextField::Title => self.title = Some(value),
            TextField::Summary => self.summary = Some(value),
            TextField::Published => self.published = Some(value),
            TextField::Updated => self.updated = Some(value),
            TextField::Id => self.id = Some(value),
            TextField::AuthorName => self.authors.push(value),
            TextField::Doi => self.doi = Some(value),
            TextField::JournalRef => self.journal_ref = Some(value),
            TextField::Comment => self.comment = Some(value),
        }
    }

    /// First `<link type="application/pdf">` wins.
    fn link(&mut self, el: &BytesStart<'_>) {
        if self.pdf_url.is_some() {
            return;
        }
        if attr_value(el, b"type").as_deref() == Some("application/pdf") {
            self.pdf_url = attr_value(el, b"href");
        }
    }

    fn category(&mut self, el: &BytesStart<'_>) {
        if let Some(term) = attr_value(el, b"term").filter(|t| !t.is_empty()) {
            self.categories.push(term);
        }
    }

    fn build(self) -> Paper {
        let url = self.id.map(|s| s.trim().to_string()).unwrap_or_default();
        Paper {
            arxiv_id: if url.is_empty() {
                String::new()
            } else {
                Paper::identifier_from_url(&url)
            },
            title: self.title.map(|s| s.trim().to_string()).unwrap_or_default(),
            authors: self.authors,
            abstract_text: self.summary.map(|s| s.trim().to_string()).unwrap_or_default(),
            published: date_part(self.published),
            updated: date_part(self.updated),
            url,
            categories: self.categories,
            pdf_url: self.pdf_url,
            doi: non_empty(self.doi),
            journal_ref: non_empty(self.journal_ref),
            comment: non_empty(self.comment),
            ..Default::default()
        }
    }
}

/// The date portion (first 10 characters) of an ISO-8601 timestamp.
fn date_part(value: Option<String>) -> String {
    value
        .map(|v| v.trim().chars().take(10).collect())
        .unwrap_or_default()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn attr_value(el: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    el.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse an Atom feed document into papers, one per `<entry>`, in feed order.
///
/// A syntax error after at least one complete entry keeps the entries parsed
/// so far; a syntax error before any entry is a parse error.
pub fn parse_feed(xml: &str, namespaces: &FeedNamespaces) -> Result<Vec<Paper>> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut papers = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut in_author = false;
    let mut field: Option<TextField> = None;
    let mut text = String::new();

    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok((resolved, event)) => (namespaces.classify(&resolved), event),
            Err(e) if papers.is_empty() => {
                return Err(PaperScoutError::parse(format!("invalid feed XML: {e}")));
            }
            Err(e) => {
                warn!(error = %e, parsed = papers.len(), "feed truncated by XML error");
                break;
            }
        };

        match event {
            Event::Start(el) => {
                let local = el.local_name();
                match (ns, local.as_ref()) {
                    (Ns::Atom, b"entry") => {
                        entry = Some(EntryBuilder::default());
                        in_author = false;
                    }
                    _ => {
                        let Some(builder) = entry.as_mut() else {
                            continue;
                        };
                        match (ns, local.as_ref()) {
                            (Ns::Atom, b"author") => in_author = true,
                            (Ns::Atom, b"link") => builder.link(&el),
                            (Ns::Atom, b"category") => builder.category(&el),
                            (ns, name) => {
                                field = text_field(ns, name, in_author);
                                text.clear();
                            }
                        }
                    }
                }
            }
            Event::Empty(el) => {
                let Some(builder) = entry.as_mut() else {
                    continue;
                };
                let local = el.local_name();
                match (ns, local.as_ref()) {
                    (Ns::Atom, b"link") => builder.link(&el),
                    (Ns::Atom, b"category") => builder.category(&el),
                    (ns, name) => {
                        if let Some(f) = text_field(ns, name, in_author) {
                            builder.set(f, String::new());
                        }
                    }
                }
            }
            Event::Text(t) if field.is_some() => match t.unescape() {
                Ok(s) => text.push_str(&s),
                Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
            },
            Event::CData(c) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Event::End(el) => {
                let local = el.local_name();
                match (ns, local.as_ref()) {
                    (Ns::Atom, b"entry") => {
                        if let Some(builder) = entry.take() {
                            papers.push(builder.build());
                        }
                        field = None;
                    }
                    (Ns::Atom, b"author") => in_author = false,
                    _ => {
                        if let (Some(f), Some(builder)) = (field.take(), entry.as_mut()) {
                            builder.set(f, std::mem::take(&mut text));
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(papers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        let path = format!("../../../fixtures/atom/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    #[test]
    fn parse_full_entry() {
        let papers = parse_feed(&fixture("search-results.xml"), &FeedNamespaces::default())
            .expect("parse feed");
        assert_eq!(papers.len(), 3);

        let first = &papers[0];
        assert_eq!(first.arxiv_id, "2401.01234v2");
        assert_eq!(first.url, "http://arxiv.org/abs/2401.01234v2");
        assert!(first.title.starts_with("Deep Learning Estimation of Typhoon Eye"));
        assert!(first.title.ends_with("Geostationary Satellite Imagery"));
        assert_eq!(first.authors, vec!["Hanako Sato", "John Smith"]);
        assert_eq!(first.authors_str(), "Hanako Sato, John Smith");
        assert!(first.abstract_text.starts_with("We estimate the eye size"));
        assert!(first.abstract_text.contains("& Dvorak-based"));
        assert!(!first.abstract_text.ends_with('\n'));
        assert_eq!(first.published, "2024-01-03");
        assert_eq!(first.updated, "2024-02-10");
        assert_eq!(first.pdf_url.as_deref(), Some("http://arxiv.org/pdf/2401.01234v2"));
        assert_eq!(first.categories, vec!["physics.ao-ph", "cs.CV"]);
        assert_eq!(first.primary_category(), "physics.ao-ph");
        assert_eq!(first.doi.as_deref(), Some("10.1029/2024GL000001"));
        assert_eq!(first.journal_ref.as_deref(), Some("Geophys. Res. Lett. 51 (2024)"));
        assert_eq!(first.comment.as_deref(), Some("12 pages, 5 figures"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let papers = parse_feed(&fixture("search-results.xml"), &FeedNamespaces::default())
            .expect("parse feed");

        let second = &papers[1];
        assert_eq!(second.authors, vec!["Maria Garcia"]);
        assert!(second.doi.is_none());
        assert!(second.journal_ref.is_none());
        assert!(second.comment.is_none());

        let bare = &papers[2];
        assert_eq!(bare.arxiv_id, "2311.00042v3");
        assert!(bare.authors.is_empty());
        assert_eq!(bare.abstract_text, "");
        assert_eq!(bare.published, "");
        assert_eq!(bare.updated, "");
        assert!(bare.pdf_url.is_none());
        assert!(bare.categories.is_empty());
        assert_eq!(bare.primary_category(), "");
    }

    #[test]
    fn feed_level_elements_are_ignored() {
        let papers = parse_feed(&fixture("empty.xml"), &FeedNamespaces::default())
            .expect("parse feed");
        assert!(papers.is_empty());
    }

    #[test]
    fn prefixed_namespaces_resolve() {
        let xml = r#"<a:feed xmlns:a="http://www.w3.org/2005/Atom" xmlns:x="http://arxiv.org/schemas/atom">
            <a:entry>
              <a:id>http://arxiv.org/abs/2402.00001v1</a:id>
              <a:title>Prefixed</a:title>
              <x:doi>10.1/abc</x:doi>
            </a:entry>
        </a:feed>"#;
        let papers = parse_feed(xml, &FeedNamespaces::default()).expect("parse");
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "Prefixed");
        assert_eq!(papers[0].doi.as_deref(), Some("10.1/abc"));
    }

    #[test]
    fn unknown_namespace_is_not_matched() {
        let xml = r#"<feed xmlns="urn:not-atom"><entry><id>http://x/abs/1</id></entry></feed>"#;
        let papers = parse_feed(xml, &FeedNamespaces::default()).expect("parse");
        assert!(papers.is_empty());
    }

    #[test]
    fn first_pdf_link_wins() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
            <id>http://arxiv.org/abs/1</id>
            <link href="http://a/html" type="text/html"/>
            <link href="http://a/first.pdf" type="application/pdf"/>
            <link href="http://a/second.pdf" type="application/pdf"/>
        </entry></feed>"#;
        let papers = parse_feed(xml, &FeedNamespaces::default()).expect("parse");
        assert_eq!(papers[0].pdf_url.as_deref(), Some("http://a/first.pdf"));
    }

    #[test]
    fn truncated_feed_keeps_complete_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><id>http://arxiv.org/abs/1</id><title>One</title></entry>
            <entry><id>http://arxiv.org/abs/2</id><title>Two</wrong></entry>
        </feed>"#;
        let papers = parse_feed(xml, &FeedNamespaces::default()).expect("partial parse");
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "One");
    }

    #[test]
    fn garbage_is_parse_error() {
        let result = parse_feed("<feed><entry></feed>", &FeedNamespaces::default());
        assert!(result.is_err());
    }
}
