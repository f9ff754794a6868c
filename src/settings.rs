//! Match settings chosen in the lobby
//!
//! Settings are picked before a match and frozen once it starts.

use garde::Validate;
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::constants::timer::{ALLOWED_SECONDS_PER_QUESTION, DEFAULT_SECONDS_PER_QUESTION};

/// Validates that the seconds-per-question setting is one of the offered values
///
/// # Errors
///
/// Returns a `garde::Error` if the value is not in
/// [`ALLOWED_SECONDS_PER_QUESTION`].
fn validate_seconds(val: &u64, _ctx: &()) -> garde::Result {
    if ALLOWED_SECONDS_PER_QUESTION.contains(val) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "must be one of {ALLOWED_SECONDS_PER_QUESTION:?}"
        )))
    }
}

/// Options for a single match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    /// Seconds a team has to answer before its turn times out
    #[garde(custom(validate_seconds))]
    pub seconds_per_question: u64,
    /// Whether near misses by edit distance count as correct
    #[garde(skip)]
    pub typo_tolerance: bool,
    /// Whether the front end plays sound effects
    #[garde(skip)]
    pub sound: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            typo_tolerance: false,
            sound: true,
        }
    }
}

impl Settings {
    /// Time allotted to each team per question
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.seconds_per_question)
    }
}
