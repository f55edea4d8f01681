//! Search query construction for the arXiv export API.
//!
//! The query grammar is quoted phrases combined with `AND`/`OR`, scoped by
//! field prefixes (`ti:`, `abs:`, `cat:`, `all:`).

/// Category codes searched in addition to exact title/abstract matches.
pub const DOMAIN_CATEGORIES: [&str; 2] = ["physics.ao-ph", "physics.geo-ph"];

/// Build the disjunctive search expression for a free-text query.
///
/// Matches the exact phrase in the title, the exact phrase in the abstract,
/// or the same text anywhere in papers filed under [`DOMAIN_CATEGORIES`].
pub fn build_search_query(query: &str) -> String {
    let [atmos, geo] = DOMAIN_CATEGORIES;
    format!(r#"ti:"{query}" OR abs:"{query}" OR (cat:{atmos} OR cat:{geo}) AND all:{query}"#)
}

/// Parameters of one search request, sorted by relevance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub search_query: String,
    pub start: usize,
    pub max_results: usize,
}

impl SearchRequest {
    /// Request the top `max_results` entries for a free-text query.
    pub fn new(query: &str, max_results: usize) -> Self {
        Self {
            search_query: build_search_query(query),
            start: 0,
            max_results,
        }
    }

    /// Query-string pairs in the order the API documents them.
    pub fn query_pairs(&self) -> [(&'static str, String); 5] {
        [
            ("search_query", self.search_query.clone()),
            ("start", self.start.to_string()),
            ("max_results", self.max_results.to_string()),
            ("sortBy", "relevance".to_string()),
            ("sortOrder", "descending".to_string()),
        ]
    }
}
