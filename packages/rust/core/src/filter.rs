//! Relevance and duplicate filtering of search candidates.
//!
//! Relevance is a permissive OR of two weak signals: any query token, or any
//! domain keyword, appearing in the lowercased title + abstract. Recall is
//! preferred over precision.

use std::collections::HashSet;

use paperscout_shared::Paper;
use tracing::debug;

/// Storm, cyclone, and meteorology terms in English and Japanese.
pub const DOMAIN_KEYWORDS: &[&str] = &[
    "typhoon",
    "tropical cyclone",
    "hurricane",
    "cyclone",
    "storm",
    "weather forecasting",
    "meteorology",
    "atmospheric",
    "precipitation",
    "wind",
    "satellite",
    "climate",
    "prediction",
    "台風",
    "熱帯低気圧",
    "気象",
    "予報",
    "予測",
];

/// Why a candidate was kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Irrelevant,
    Duplicate,
}

/// Candidates split by verdict, each list in input order.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub kept: Vec<Paper>,
    pub irrelevant: Vec<Paper>,
    pub duplicates: Vec<Paper>,
}

/// Whether the paper matches any query token or domain keyword.
pub fn is_relevant(paper: &Paper, query: &str) -> bool {
    let text = format!("{} {}", paper.title, paper.abstract_text).to_lowercase();
    let query = query.to_lowercase();

    query.split_whitespace().any(|token| text.contains(token))
        || DOMAIN_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// Whether the paper's identity URL is already known. Papers without any
/// URL are never duplicates.
pub fn is_duplicate(paper: &Paper, existing: &HashSet<String>) -> bool {
    paper
        .identity_url()
        .is_some_and(|url| existing.contains(url))
}

/// Relevance is checked before duplication.
pub fn classify(paper: &Paper, query: &str, existing: &HashSet<String>) -> Verdict {
    if !is_relevant(paper, query) {
        Verdict::Irrelevant
    } else if is_duplicate(paper, existing) {
        Verdict::Duplicate
    } else {
        Verdict::Keep
    }
}

/// Partition candidates by [`classify`], preserving order.
pub fn filter_candidates(
    papers: Vec<Paper>,
    query: &str,
    existing: &HashSet<String>,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for paper in papers {
        match classify(&paper, query, existing) {
            Verdict::Keep => {
                debug!(title = %paper.short_title(60), "new relevant paper");
                outcome.kept.push(paper);
            }
            Verdict::Irrelevant => {
                debug!(
                    title = %paper.short_title(60),
                    categories = ?paper.categories,
                    "not relevant"
                );
                outcome.irrelevant.push(paper);
            }
            Verdict::Duplicate => {
                debug!(
                    title = %paper.short_title(60),
                    url = paper.identity_url().unwrap_or_default(),
                    "duplicate"
                );
                outcome.duplicates.push(paper);
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(title: &str, abstract_text: &str, pdf: &str) -> Paper {
        Paper {
            title: title.into(),
            abstract_text: abstract_text.into(),
            pdf_url: (!pdf.is_empty()).then(|| pdf.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn domain_keyword_is_enough() {
        let p = paper("Typhoon genesis statistics", "", "");
        assert!(is_relevant(&p, "graph neural networks"));
    }

    #[test]
    fn query_token_is_enough() {
        let p = paper("Sparse attention for graphs", "", "");
        assert!(is_relevant(&p, "Graphs Transformers"));
    }

    #[test]
    fn japanese_keyword_matches() {
        let p = paper("台風の進路予測", "", "");
        assert!(is_relevant(&p, "unrelated"));
    }

    #[test]
    fn neither_signal_is_irrelevant() {
        let p = paper("Quantum error correction", "Surface codes on lattices.", "");
        assert!(!is_relevant(&p, "protein folding"));
    }

    #[test]
    fn tokens_match_as_substrings() {
        // "eye" inside "eyewall" counts.
        let p = paper("Eyewall dynamics", "", "");
        assert!(is_relevant(&p, "eye"));
    }

    #[test]
    fn duplicate_by_pdf_url() {
        let existing: HashSet<String> = ["http://arxiv.org/pdf/1".to_string()].into();
        let p = paper("x", "", "http://arxiv.org/pdf/1");
        assert!(is_duplicate(&p, &existing));
    }

    #[test]
    fn duplicate_falls_back_to_detail_url() {
        let existing: HashSet<String> = ["http://arxiv.org/abs/1".to_string()].into();
        let mut p = paper("x", "", "");
        p.url = "http://arxiv.org/abs/1".into();
        assert!(is_duplicate(&p, &existing));
    }

    #[test]
    fn paper_without_urls_is_never_duplicate() {
        let existing: HashSet<String> = [String::new()].into();
        assert!(!is_duplicate(&paper("x", "", ""), &existing));
    }

    #[test]
    fn irrelevance_is_reported_before_duplication() {
        let existing: HashSet<String> = ["http://arxiv.org/pdf/1".to_string()].into();
        let p = paper("Quantum codes", "", "http://arxiv.org/pdf/1");
        assert_eq!(classify(&p, "protein", &existing), Verdict::Irrelevant);

        let p = paper("Typhoon codes", "", "http://arxiv.org/pdf/1");
        assert_eq!(classify(&p, "protein", &existing), Verdict::Duplicate);
    }

    #[test]
    fn filter_preserves_order_and_reasons() {
        let existing: HashSet<String> = ["http://arxiv.org/pdf/2".to_string()].into();
        let papers = vec![
            paper("Typhoon eye A", "", "http://arxiv.org/pdf/1"),
            paper("Typhoon eye B", "", "http://arxiv.org/pdf/2"),
            paper("Lattice QCD", "", "http://arxiv.org/pdf/3"),
            paper("Hurricane eye C", "", "http://arxiv.org/pdf/4"),
        ];

        let outcome = filter_candidates(papers, "typhoon eye", &existing);
        let kept: Vec<&str> = outcome.kept.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(kept, vec!["Typhoon eye A", "Hurricane eye C"]);
        assert_eq!(outcome.duplicates.len(), 1);
        assert_eq!(outcome.irrelevant[0].title, "Lattice QCD");
    }
}
