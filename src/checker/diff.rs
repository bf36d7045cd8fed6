// src/checker/diff.rs
// =============================================================================
// Decides whether the outcomes of one check differ in a way worth reporting,
// and encodes outcomes into patterns so two runs can be compared.
//
// Significance (has_difference):
// - every outcome is compared against a reference outcome
// - errors, status codes and titles must match exactly
// - content lengths may drift by up to CONTENT_LENGTH_THRESHOLD percent
//
// Patterns (patterns_match):
// - used by the verification pass to check that a second run reproduced
//   the first one
// - content lengths are compared exactly here, no threshold
// =============================================================================

use std::collections::BTreeMap;

use super::outcome::CountryOutcome;

/// Percent change in body size above which two lengths count as different.
pub const CONTENT_LENGTH_THRESHOLD: usize = 20;

const PATTERN_DELIMITER: &str = ":";

/// Returns true when any outcome differs significantly from the reference.
///
/// Fewer than two outcomes can never differ.
pub fn has_difference(outcomes: &[CountryOutcome]) -> bool {
    if outcomes.len() <= 1 {
        return false;
    }

    let reference_index = reference_index(outcomes);
    let reference = &outcomes[reference_index];

    outcomes
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != reference_index)
        .any(|(_, candidate)| differs(reference, candidate))
}

// The first successful outcome is the baseline, so a proxy failure in one
// country is never what everything else gets compared to.
fn reference_index(outcomes: &[CountryOutcome]) -> usize {
    outcomes
        .iter()
        .position(|outcome| !outcome.is_error())
        .unwrap_or(0)
}

fn differs(reference: &CountryOutcome, candidate: &CountryOutcome) -> bool {
    candidate.error != reference.error
        || candidate.status_code != reference.status_code
        || candidate.title != reference.title
        || content_length_differs(reference.content_length, candidate.content_length)
}

fn content_length_differs(reference: usize, candidate: usize) -> bool {
    if (reference == 0) != (candidate == 0) {
        return true;
    }
    if reference == 0 {
        return false;
    }

    let change = 100 * reference.abs_diff(candidate) / reference;
    change > CONTENT_LENGTH_THRESHOLD
}

/// Encodes an outcome as `error:<msg>` or `<status>:<title>:<length>`.
pub fn build_pattern(outcome: &CountryOutcome) -> String {
    match &outcome.error {
        Some(error) => format!("error{}{}", PATTERN_DELIMITER, error),
        None => [
            outcome.status_code.to_string(),
            outcome.title.clone(),
            outcome.content_length.to_string(),
        ]
        .join(PATTERN_DELIMITER),
    }
}

/// True when both runs cover the same countries and every country produced
/// a byte-identical pattern in both.
///
/// Duplicate countries are compared in order of appearance.
pub fn patterns_match(first: &[CountryOutcome], second: &[CountryOutcome]) -> bool {
    first.len() == second.len() && patterns_by_country(first) == patterns_by_country(second)
}

fn patterns_by_country(outcomes: &[CountryOutcome]) -> BTreeMap<&str, Vec<String>> {
    let mut patterns: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for outcome in outcomes {
        patterns
            .entry(outcome.country.as_str())
            .or_default()
            .push(build_pattern(outcome));
    }
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(country: &str, status: u16, title: &str, length: usize) -> CountryOutcome {
        CountryOutcome::succeeded(country, status, title, length)
    }

    fn pair(reference_length: usize, candidate_length: usize) -> Vec<CountryOutcome> {
        vec![
            ok("us", 200, "Home", reference_length),
            ok("de", 200, "Home", candidate_length),
        ]
    }

    #[test]
    fn test_no_difference_with_zero_or_one_outcome() {
        assert!(!has_difference(&[]));
        assert!(!has_difference(&[ok("us", 200, "Home", 1000)]));
        assert!(!has_difference(&[CountryOutcome::failed("us", "boom")]));
    }

    #[test]
    fn test_status_and_title_change_is_a_difference() {
        let outcomes = vec![ok("us", 200, "Home", 1000), ok("cn", 403, "", 50)];
        assert!(has_difference(&outcomes));
    }

    #[test]
    fn test_title_compare_is_case_sensitive() {
        let outcomes = vec![ok("us", 200, "Home", 1000), ok("de", 200, "home", 1000)];
        assert!(has_difference(&outcomes));
    }

    #[test]
    fn test_fifteen_percent_growth_is_noise() {
        assert!(!has_difference(&pair(1000, 1150)));
    }

    #[test]
    fn test_twenty_one_percent_growth_is_a_difference() {
        assert!(has_difference(&pair(1000, 1210)));
    }

    #[test]
    fn test_exactly_twenty_percent_is_not_a_difference() {
        assert!(!has_difference(&pair(1000, 1200)));
        assert!(!has_difference(&pair(1000, 800)));
    }

    #[test]
    fn test_length_threshold_ignores_sign() {
        assert!(has_difference(&pair(1000, 790)));
        assert!(has_difference(&pair(1000, 1210)));
        assert!(!has_difference(&pair(1000, 850)));
        assert!(!has_difference(&pair(1000, 1150)));
    }

    #[test]
    fn test_threshold_uses_integer_arithmetic() {
        // 100 * 209 / 999 == 20 after truncation
        assert!(!has_difference(&pair(999, 1208)));
        // 100 * 210 / 999 == 21
        assert!(has_difference(&pair(999, 1209)));
    }

    #[test]
    fn test_empty_against_non_empty_body_is_a_difference() {
        assert!(has_difference(&pair(0, 10)));
        assert!(has_difference(&pair(10, 0)));
        assert!(!has_difference(&pair(0, 0)));
    }

    #[test]
    fn test_single_country_error_is_a_difference() {
        let outcomes = vec![
            ok("us", 200, "Home", 1000),
            CountryOutcome::failed("cn", "making request: connection failed"),
        ];
        assert!(has_difference(&outcomes));
    }

    #[test]
    fn test_reference_skips_leading_errors() {
        // "cn" failed, so "us" becomes the reference and "de" matches it
        let outcomes = vec![
            CountryOutcome::failed("cn", "proxy error"),
            ok("us", 200, "Home", 1000),
            ok("de", 200, "Home", 1100),
        ];
        assert_eq!(reference_index(&outcomes), 1);
        assert!(has_difference(&outcomes));

        let outcomes = vec![
            CountryOutcome::failed("cn", "proxy error"),
            ok("us", 200, "Home", 1000),
        ];
        assert!(has_difference(&outcomes));
    }

    #[test]
    fn test_identical_errors_everywhere_are_not_a_difference() {
        let outcomes = vec![
            CountryOutcome::failed("us", "making request: request timed out"),
            CountryOutcome::failed("de", "making request: request timed out"),
        ];
        assert_eq!(reference_index(&outcomes), 0);
        assert!(!has_difference(&outcomes));
    }

    #[test]
    fn test_different_errors_everywhere_are_a_difference() {
        let outcomes = vec![
            CountryOutcome::failed("us", "making request: request timed out"),
            CountryOutcome::failed("de", "making request: connection failed"),
        ];
        assert!(has_difference(&outcomes));
    }

    #[test]
    fn test_build_pattern() {
        assert_eq!(build_pattern(&ok("us", 200, "Home", 1000)), "200:Home:1000");
        assert_eq!(build_pattern(&ok("us", 404, "", 12)), "404::12");
        assert_eq!(
            build_pattern(&CountryOutcome::failed("us", "proxy error")),
            "error:proxy error"
        );
    }

    #[test]
    fn test_patterns_match_identical_runs() {
        let first = vec![ok("us", 200, "Home", 1000), ok("cn", 403, "", 50)];
        let second = first.clone();
        assert!(patterns_match(&first, &second));
    }

    #[test]
    fn test_patterns_match_ignores_country_order() {
        let first = vec![ok("us", 200, "Home", 1000), ok("cn", 403, "", 50)];
        let second = vec![ok("cn", 403, "", 50), ok("us", 200, "Home", 1000)];
        assert!(patterns_match(&first, &second));
        assert!(patterns_match(&second, &first));
    }

    #[test]
    fn test_patterns_match_is_symmetric() {
        let first = vec![ok("us", 200, "Home", 1000), ok("cn", 403, "", 50)];
        let second = vec![ok("us", 200, "Home", 1000), ok("cn", 403, "Blocked", 50)];
        assert_eq!(patterns_match(&first, &second), patterns_match(&second, &first));
        assert!(!patterns_match(&first, &second));
    }

    #[test]
    fn test_patterns_require_same_countries() {
        let first = vec![ok("us", 200, "Home", 1000), ok("cn", 403, "", 50)];
        let second = vec![ok("us", 200, "Home", 1000), ok("de", 403, "", 50)];
        assert!(!patterns_match(&first, &second));
        assert!(!patterns_match(&first, &first[..1]));
    }

    #[test]
    fn test_patterns_compare_duplicate_countries_individually() {
        let first = vec![ok("us", 200, "Home", 1000), ok("us", 403, "", 50)];
        let second = vec![ok("us", 200, "Home", 1000), ok("us", 200, "Home", 1000)];
        assert!(!patterns_match(&first, &second));
    }

    // The significance test tolerates 20% length drift but pattern matching
    // does not. Kept deliberately asymmetric.
    #[test]
    fn test_asymmetry_pattern_match_is_exact_while_significance_uses_threshold() {
        let first = vec![ok("us", 200, "Home", 1000), ok("cn", 403, "", 50)];
        let second = vec![ok("us", 200, "Home", 1001), ok("cn", 403, "", 50)];

        // a 1 byte drift is far below the significance threshold...
        assert!(!has_difference(&pair(1000, 1001)));
        // ...but still breaks the cross-run pattern match
        assert!(!patterns_match(&first, &second));
        assert!(!patterns_match(&second, &first));
    }

    #[test]
    fn test_error_pattern_differs_from_response_pattern() {
        let first = vec![ok("us", 200, "Home", 1000), CountryOutcome::failed("cn", "x")];
        let second = vec![ok("us", 200, "Home", 1000), CountryOutcome::failed("cn", "y")];
        assert!(!patterns_match(&first, &second));
    }
}
