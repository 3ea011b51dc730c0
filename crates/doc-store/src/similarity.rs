//! Keyword-overlap similarity used by the in-memory backend.

use std::collections::BTreeSet;

const STOP_TOKENS: &[&str] = &[
    "http", "https", "www", "com", "org", "net", "io", "the", "an", "and", "of", "to", "for",
    "in", "on", "at", "with", "by",
];

/// Lowercased alphanumeric tokens of `text`, minus stop tokens and single characters.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1)
        .map(str::to_lowercase)
        .filter(|token| !STOP_TOKENS.contains(&token.as_str()))
        .collect()
}

/// Fraction of query tokens present in the candidate tokens, in `[0, 1]`.
pub fn overlap_score(query: &BTreeSet<String>, candidate: &BTreeSet<String>) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let matched = query.intersection(candidate).count();
    matched as f64 / query.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_noise_is_ignored() {
        let tokens = tokenize("https://www.OpenTable.com/r/bistro");
        assert_eq!(
            tokens.into_iter().collect::<Vec<_>>(),
            vec!["bistro".to_string(), "opentable".to_string()]
        );
    }

    #[test]
    fn score_is_fraction_of_query_tokens() {
        let query = tokenize("search flights cheap");
        let candidate = tokenize("Search available flights");
        let score = overlap_score(&query, &candidate);
        assert!((score - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_query_scores_zero() {
        assert_eq!(overlap_score(&tokenize("https://"), &tokenize("anything")), 0.0);
    }
}
