// src/checker/outcome.rs
// =============================================================================
// Data types produced by a multi-country check.
//
// - CountryOutcome: what one country saw when fetching a URL
// - CheckResult: every country's outcome for one URL plus the diff decision
//
// Both derive Serialize/Deserialize because they are written straight into
// the JSON snapshot file and the --json output.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::diff;

/// The result of fetching one URL from one country.
///
/// An outcome is either a response (status, title, length) or an error.
/// Use `succeeded` / `failed` to build one so the two never mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryOutcome {
    /// Two-letter country code the request was routed through
    pub country: String,
    /// HTTP status code, 0 when no response was received
    pub status_code: u16,
    /// Trimmed text of the page's <title>, empty when there is none
    pub title: String,
    /// Length of the response body in bytes
    pub content_length: usize,
    /// Why the request failed, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CountryOutcome {
    pub fn succeeded(
        country: impl Into<String>,
        status_code: u16,
        title: impl Into<String>,
        content_length: usize,
    ) -> Self {
        CountryOutcome {
            country: country.into(),
            status_code,
            title: title.into(),
            content_length,
            error: None,
        }
    }

    pub fn failed(country: impl Into<String>, error: impl Into<String>) -> Self {
        CountryOutcome {
            country: country.into(),
            status_code: 0,
            title: String::new(),
            content_length: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// One full check of a URL across all configured countries.
///
/// `outcomes[i]` always belongs to the i-th configured country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub url: String,
    pub outcomes: Vec<CountryOutcome>,
    pub has_difference: bool,
}

impl CheckResult {
    /// Builds a result and derives `has_difference` from the outcomes.
    pub fn new(url: impl Into<String>, outcomes: Vec<CountryOutcome>) -> Self {
        let has_difference = diff::has_difference(&outcomes);
        CheckResult {
            url: url.into(),
            outcomes,
            has_difference,
        }
    }
}
