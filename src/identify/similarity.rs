//! Title-similarity heuristic used by `identify` to rank provider search
//! results. No fuzzy-matching crate is in the dependency set, so this is a
//! small hand-rolled normalized-Levenshtein measure, grounded in the shape of
//! the teacher's `rapidfuzz`-backed torrent-title matching (same
//! normalize-then-compare idiom, without the crate).

/// Minimum similarity (0.0-1.0) for a candidate to be accepted by `identify`.
pub const MATCH_FLOOR: f64 = 0.6;

pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let distance = levenshtein(&a, &b) as f64;
    let max_len = a.chars().count().max(b.chars().count()) as f64;
    if max_len == 0.0 {
        1.0
    } else {
        1.0 - (distance / max_len)
    }
}

fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let temp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = temp;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_titles_score_one() {
        assert_eq!(title_similarity("Inception", "Inception"), 1.0);
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        assert_eq!(title_similarity("Inception", "INCEPTION!"), 1.0);
    }

    #[test]
    fn dissimilar_titles_score_low() {
        assert!(title_similarity("Inception", "The Matrix") < 0.5);
    }
}
