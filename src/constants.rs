//! Configuration constants for the Riddle Rally game
//!
//! This module contains the fixed limits and timings used throughout
//! the game so that the round machine, the matcher and the validation
//! layer all agree on the same boundaries.

/// Round structure of a match
pub mod rounds {
    /// Number of regular rounds in a match, one riddle per round
    pub const ROUND_COUNT: usize = 26;
    /// Number of progress units on the race track
    ///
    /// A correct answer without a hint moves a team two units, a hinted
    /// correct answer moves it one unit, so 26 clean answers fill the track.
    pub const TRACK_UNITS: u32 = 2 * ROUND_COUNT as u32;
    /// Units awarded for a correct answer without a hint
    pub const FULL_STEP_UNITS: u32 = 2;
    /// Units awarded for a correct answer after a hint was shown
    pub const HINTED_STEP_UNITS: u32 = 1;
    /// Upper bound of the progress percentage
    pub const MAX_PROGRESS: f64 = 100.;
}

/// Timer configuration
pub mod timer {
    /// Allowed values for the seconds-per-question setting
    pub const ALLOWED_SECONDS_PER_QUESTION: [u64; 4] = [30, 45, 60, 90];
    /// Default seconds-per-question setting
    pub const DEFAULT_SECONDS_PER_QUESTION: u64 = 60;
    /// Seconds on the clock for every sudden-death attempt window
    pub const SUDDEN_DEATH_SECONDS: u64 = 30;
    /// Interval between two timer ticks in milliseconds
    pub const TICK_MILLIS: u64 = 1000;
}

/// Feedback delays shown before the next transition fires
pub mod feedback {
    /// Delay in milliseconds after a correct answer
    pub const CORRECT_DELAY_MILLIS: u64 = 800;
    /// Delay in milliseconds after a wrong answer or a timeout
    pub const MISS_DELAY_MILLIS: u64 = 1200;
}

/// Answer matching configuration
pub mod matcher {
    /// Minimum similarity for a typo-tolerant match
    pub const SIMILARITY_THRESHOLD: f64 = 0.85;
    /// Shortest answer length at which a single edit is always tolerated
    pub const MIN_SINGLE_TYPO_LENGTH: usize = 6;
}

/// Team configuration
pub mod team {
    /// Maximum length of a team name in characters
    pub const MAX_NAME_LENGTH: usize = 30;
    /// Default name of the first team
    pub const DEFAULT_NAME_A: &str = "Team A";
    /// Default name of the second team
    pub const DEFAULT_NAME_B: &str = "Team B";
}

/// Riddle content configuration
pub mod riddle {
    /// Maximum length of a riddle question in characters
    pub const MAX_QUESTION_LENGTH: usize = 200;
    /// Maximum length of a riddle hint in characters
    pub const MAX_HINT_LENGTH: usize = 200;
    /// Maximum number of accepted answers per riddle
    pub const MAX_ANSWER_COUNT: usize = 16;
    /// Maximum length of an accepted answer in characters
    pub const MAX_ANSWER_LENGTH: usize = 200;
}
