// "Did you mean" candidates for typo'd tags, yields and recipe ids
use strsim::normalized_levenshtein;

/// Minimum similarity for two strings to count as a likely misspelling
pub const SIMILARITY_CUTOFF: f64 = 0.8;

/// Maximum number of suggestions returned
pub const MAX_CANDIDATES: usize = 3;

/// Return up to [`MAX_CANDIDATES`] candidates at least [`SIMILARITY_CUTOFF`]
/// similar to `word`, best first. Exact matches are included.
pub fn close_matches<'a>(word: &str, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|candidate| (normalized_levenshtein(word, candidate), candidate))
        .filter(|(score, _)| *score >= SIMILARITY_CUTOFF)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}
