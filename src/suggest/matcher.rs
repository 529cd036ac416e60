//! Ranked prefix matching over the candidate corpus

/// Upper bound on suggestions returned for a single query
pub const MAX_SUGGESTIONS: usize = 5;

/// Return up to [`MAX_SUGGESTIONS`] phrases that start with `query`, ignoring case
///
/// Shorter phrases (counted in characters) rank first; phrases of equal length
/// keep their corpus order.
/// An empty query matches nothing.
pub fn suggest<'a>(query: &str, corpus: &'a [String]) -> Vec<&'a str> {
    if query.is_empty() {
        return Vec::new();
    }

    let needle = query.to_lowercase();
    let mut matches: Vec<&str> = corpus
        .iter()
        .filter(|candidate| candidate.to_lowercase().starts_with(&needle))
        .map(String::as_str)
        .collect();

    // stable: equal lengths stay in corpus order
    matches.sort_by_key(|candidate| candidate.chars().count());
    matches.truncate(MAX_SUGGESTIONS);
    matches
}
