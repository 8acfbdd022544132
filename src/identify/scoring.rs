//! Provider-asset scoring: ranks candidate assets returned by `enrich` so the
//! auto-select policy can pick the best one per slot without user input.

use crate::hash::is_perceptual_duplicate;
use crate::models::provider_asset::CandidateAsset;
use crate::models::slot::dimension_spec;

/// Hamming-distance ceiling under which two perceptual hashes count as the
/// same image for dedup purposes.
const NEAR_DUPLICATE_THRESHOLD: u32 = 5;
const NEAR_DUPLICATE_PENALTY: i32 = 15;
const PROVIDER_BONUS_STEP: i32 = 10;

/// Higher is better. Dimension fit against the slot spec dominates; provider
/// rank, language, and community rating break ties, and a candidate that
/// perceptually duplicates an asset already cached is penalized so a fresh
/// crop of the same artwork doesn't win just by being listed first.
///
/// `provider_priority` is the caller's most-to-least-preferred provider
/// names; a candidate from a provider earlier in that list scores higher.
/// `cached_perceptual_hashes` are the hashes of assets already stored for
/// this slot.
pub fn score_asset(
    candidate: &CandidateAsset,
    preferred_language: Option<&str>,
    provider_priority: &[&str],
    cached_perceptual_hashes: &[u64],
) -> i32 {
    let mut score = 0i32;

    if let Some(rank) = provider_priority
        .iter()
        .position(|p| p.eq_ignore_ascii_case(&candidate.provider_name))
    {
        score += (provider_priority.len() - rank) as i32 * PROVIDER_BONUS_STEP;
    }

    if let (Some(width), Some(height)) = (candidate.width, candidate.height) {
        if let Some(spec) = dimension_spec(candidate.slot) {
            if spec.validate(width, height) {
                score += 50;
            }
            let area = (width as i64) * (height as i64);
            score += (area / 100_000).min(30) as i32;
        }
    }

    match (&candidate.language, preferred_language) {
        (Some(lang), Some(pref)) if lang.eq_ignore_ascii_case(pref) => score += 20,
        (None, _) => score += 5,
        _ => {}
    }

    if let Some(rating) = candidate.vote_average {
        score += (rating * 2.0) as i32;
    }

    if let Some(phash) = candidate.perceptual_hash {
        if cached_perceptual_hashes
            .iter()
            .any(|&cached| is_perceptual_duplicate(phash, cached, NEAR_DUPLICATE_THRESHOLD))
        {
            score -= NEAR_DUPLICATE_PENALTY;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slot::Slot;

    fn candidate(width: u32, height: u32, language: Option<&str>) -> CandidateAsset {
        CandidateAsset {
            slot: Slot::Poster,
            provider_name: "tmdb".into(),
            provider_url: "https://example.test/poster.jpg".into(),
            width: Some(width),
            height: Some(height),
            language: language.map(|s| s.to_string()),
            vote_average: None,
            perceptual_hash: None,
        }
    }

    #[test]
    fn dimension_fit_outranks_a_mismatched_aspect() {
        let good = candidate(1000, 1500, None);
        let bad = candidate(1500, 1000, None);
        assert!(score_asset(&good, None, &[], &[]) > score_asset(&bad, None, &[], &[]));
    }

    #[test]
    fn preferred_language_match_adds_bonus() {
        let en = candidate(1000, 1500, Some("en"));
        let fr = candidate(1000, 1500, Some("fr"));
        assert!(score_asset(&en, Some("en"), &[], &[]) > score_asset(&fr, Some("en"), &[], &[]));
    }

    #[test]
    fn earlier_provider_in_priority_list_scores_higher() {
        let mut tmdb = candidate(1000, 1500, None);
        tmdb.provider_name = "tmdb".into();
        let mut fanart = candidate(1000, 1500, None);
        fanart.provider_name = "fanart.tv".into();

        let priority = ["tmdb", "fanart.tv"];
        assert!(score_asset(&tmdb, None, &priority, &[]) > score_asset(&fanart, None, &priority, &[]));
    }

    #[test]
    fn unranked_provider_gets_no_bonus() {
        let ranked = candidate(1000, 1500, None);
        let priority = ["tmdb"];
        assert_eq!(score_asset(&ranked, None, &[], &[]), score_asset(&ranked, None, &[], &[]));
        let mut other = candidate(1000, 1500, None);
        other.provider_name = "omdb".into();
        assert!(score_asset(&ranked, None, &priority, &[]) > score_asset(&other, None, &priority, &[]));
    }

    #[test]
    fn near_duplicate_perceptual_hash_is_penalized() {
        let mut dup = candidate(1000, 1500, None);
        dup.perceptual_hash = Some(0b1010_1010);
        let without_dup = score_asset(&dup, None, &[], &[]);
        let with_dup = score_asset(&dup, None, &[], &[0b1010_1011]);
        assert_eq!(without_dup - with_dup, NEAR_DUPLICATE_PENALTY);
    }

    #[test]
    fn distant_perceptual_hash_is_not_penalized() {
        let mut far = candidate(1000, 1500, None);
        far.perceptual_hash = Some(0);
        let score = score_asset(&far, None, &[], &[u64::MAX]);
        assert_eq!(score, score_asset(&far, None, &[], &[]));
    }
}
