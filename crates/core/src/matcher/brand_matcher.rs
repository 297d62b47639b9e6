//! Brand matcher.
//!
//! Scores search result cards against a target brand. A card matches exactly
//! when its brand line equals the target (case-insensitive), or partially when
//! one of the target's words appears inside the brand line.

use tracing::debug;

use crate::session::RawCandidate;

use super::types::{MatchResult, MatchSummary, MatchedCandidate, ResultCap};

/// Score one card's brand text against the target brand.
///
/// Partial matches report the first target word (in target order) found in
/// the brand text, with its 1-based position as rank.
pub fn score_one(target: &str, brand_text: &str) -> MatchResult {
    let target = target.trim();
    let brand = brand_text.trim();

    if target.is_empty() || brand.is_empty() {
        return MatchResult::none();
    }

    let target_folded = target.to_lowercase();
    let brand_folded = brand.to_lowercase();

    if target_folded == brand_folded {
        return MatchResult::exact(target);
    }

    target
        .split_whitespace()
        .enumerate()
        .find(|(_, token)| brand_folded.contains(&token.to_lowercase()))
        .map(|(index, token)| MatchResult::partial(token, index + 1))
        .unwrap_or_else(MatchResult::none)
}

/// Score every candidate and keep the winners.
///
/// When at least one exact match exists only exact matches are kept,
/// otherwise all partial matches. Arrival order is preserved and the list is
/// truncated to `cap`.
pub fn match_candidates(
    target: &str,
    candidates: Vec<RawCandidate>,
    cap: ResultCap,
) -> MatchSummary {
    let mut exact = Vec::new();
    let mut partial = Vec::new();

    for candidate in candidates {
        let result = score_one(target, &candidate.brand_text);
        if !result.matched {
            continue;
        }
        let scored = MatchedCandidate { candidate, result };
        if scored.result.exact {
            exact.push(scored);
        } else {
            partial.push(scored);
        }
    }

    let exact_count = exact.len();
    let partial_count = partial.len();

    let mut accepted = if exact.is_empty() { partial } else { exact };
    cap.apply(&mut accepted);

    debug!(
        target = target,
        exact = exact_count,
        partial = partial_count,
        accepted = accepted.len(),
        "Candidates matched"
    );

    MatchSummary {
        accepted,
        exact_count,
        partial_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(asin: &str, brand: &str) -> RawCandidate {
        RawCandidate {
            asin: asin.to_string(),
            title: format!("{} product", brand),
            brand_text: brand.to_string(),
            link: format!("https://shop.example/dp/{}", asin),
        }
    }

    #[test]
    fn test_exact_match() {
        let result = score_one("Nike", "Nike");
        assert!(result.matched);
        assert!(result.exact);
        assert_eq!(result.rank, 0);
        assert_eq!(result.matched_word.as_deref(), Some("Nike"));
    }

    #[test]
    fn test_exact_match_ignores_case_and_padding() {
        let result = score_one("  nike ", "NIKE");
        assert!(result.exact);
        assert_eq!(result.label(), "Exact Match");
    }

    #[test]
    fn test_partial_match_reports_word_position() {
        let result = score_one("Under Armour", "Armour Sports Co");
        assert!(result.matched);
        assert!(!result.exact);
        assert_eq!(result.rank, 2);
        assert_eq!(result.matched_word.as_deref(), Some("Armour"));
        assert_eq!(result.label(), "Word 2");
    }

    #[test]
    fn test_first_target_word_wins() {
        // Both words occur in the brand text; the earlier target word is reported.
        let result = score_one("Blue Ocean", "Ocean Blue Outfitters");
        assert_eq!(result.rank, 1);
        assert_eq!(result.matched_word.as_deref(), Some("Blue"));
    }

    #[test]
    fn test_partial_match_is_substring() {
        let result = score_one("Arm", "Under Armour");
        assert!(result.matched);
        assert_eq!(result.rank, 1);
    }

    #[test]
    fn test_empty_inputs_do_not_match() {
        assert!(!score_one("", "Nike").matched);
        assert!(!score_one("Nike", "").matched);
        assert!(!score_one("   ", "   ").matched);
    }

    #[test]
    fn test_no_overlap() {
        let result = score_one("Adidas", "Puma");
        assert_eq!(result, MatchResult::none());
    }

    #[test]
    fn test_cutover_keeps_only_exact_when_present() {
        let candidates = vec![
            card("A1", "Nike Kids"),
            card("A2", "Nike"),
            card("A3", "Generic"),
            card("A4", "nike"),
        ];
        let summary = match_candidates("Nike", candidates, ResultCap::All);

        assert_eq!(summary.exact_count, 2);
        assert_eq!(summary.partial_count, 1);
        let asins: Vec<&str> = summary
            .accepted
            .iter()
            .map(|m| m.candidate.asin.as_str())
            .collect();
        assert_eq!(asins, vec!["A2", "A4"]);
        assert!(summary.accepted.iter().all(|m| m.result.exact));
    }

    #[test]
    fn test_partials_kept_in_arrival_order_without_exact() {
        let candidates = vec![
            card("B1", "Armour Sports"),
            card("B2", "Other"),
            card("B3", "Under Water Co"),
        ];
        let summary = match_candidates("Under Armour", candidates, ResultCap::All);

        let asins: Vec<&str> = summary
            .accepted
            .iter()
            .map(|m| m.candidate.asin.as_str())
            .collect();
        assert_eq!(asins, vec!["B1", "B3"]);
        assert_eq!(summary.accepted[0].result.rank, 2);
        assert_eq!(summary.accepted[1].result.rank, 1);
    }

    #[test]
    fn test_cap_truncates_after_cutover() {
        let candidates = (0..5).map(|i| card(&format!("C{}", i), "Acme")).collect();
        let summary = match_candidates("Acme", candidates, ResultCap::Limit(3));
        assert_eq!(summary.accepted.len(), 3);
        assert_eq!(summary.exact_count, 5);
        assert_eq!(summary.accepted[2].candidate.asin, "C2");
    }

    #[test]
    fn test_nothing_matches() {
        let summary = match_candidates("Acme", vec![card("D1", "Other")], ResultCap::All);
        assert!(summary.is_empty());
    }
}
