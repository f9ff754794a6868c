//! Per-round bookkeeping
//!
//! A [`RoundState`] lives for one riddle. It tracks which team is acting,
//! which teams already tried, whether the hint was shown and what
//! transient feedback the front end should display.

use enum_map::EnumMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    constants::rounds::{FULL_STEP_UNITS, HINTED_STEP_UNITS},
    teams::Team,
};

/// Transient feedback about the last thing that happened in a round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Nothing to show
    #[default]
    None,
    /// Correct answer without a hint, full step on the track
    CorrectFast,
    /// Correct answer after a hint, half step on the track
    CorrectSlow,
    /// Incorrect answer
    Wrong,
    /// The acting team ran out of time
    Timeout,
    /// The match has a winner
    Winner,
}

/// State of the riddle currently being played
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// Index of the riddle in the deck
    pub(crate) index: usize,
    /// Team allowed to answer right now
    pub(crate) acting: Team,
    /// Teams that already failed this riddle
    pub(crate) attempted: EnumMap<Team, bool>,
    /// Whether the hint was requested, cannot be undone for the round
    pub(crate) used_hint: bool,
    /// Whether the hint text is currently shown
    pub(crate) hint_visible: bool,
    /// Seconds left on the clock of the acting team
    pub(crate) remaining_seconds: u64,
    /// Feedback tag for the front end
    pub(crate) outcome: Outcome,
    /// Answer revealed after both teams failed
    pub(crate) revealed_answer: Option<String>,
    /// Human readable feedback line
    pub(crate) banner: Option<String>,
    /// Text currently typed by the acting team
    pub(crate) draft: String,
}

impl RoundState {
    /// Creates the state of a fresh round
    pub fn new(index: usize, acting: Team, seconds: u64) -> Self {
        Self {
            index,
            acting,
            attempted: EnumMap::default(),
            used_hint: false,
            hint_visible: false,
            remaining_seconds: seconds,
            outcome: Outcome::None,
            revealed_answer: None,
            banner: None,
            draft: String::new(),
        }
    }

    /// Index of the riddle in the deck
    pub fn index(&self) -> usize {
        self.index
    }

    /// Team allowed to answer right now
    pub fn acting(&self) -> Team {
        self.acting
    }

    /// Whether the team already failed this riddle
    pub fn has_attempted(&self, team: Team) -> bool {
        self.attempted[team]
    }

    /// Whether both teams failed this riddle
    pub fn both_attempted(&self) -> bool {
        self.attempted.values().all(|attempted| *attempted)
    }

    /// Whether the hint was requested this round
    pub fn used_hint(&self) -> bool {
        self.used_hint
    }

    /// Whether the hint text is currently shown
    pub fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    /// Seconds left on the clock
    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    /// Feedback tag for the front end
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Answer revealed after both teams failed
    pub fn revealed_answer(&self) -> Option<&str> {
        self.revealed_answer.as_deref()
    }

    /// Human readable feedback line
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Text currently typed by the acting team
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Track units a correct answer is worth right now
    pub fn step_units(&self) -> u32 {
        if self.used_hint {
            HINTED_STEP_UNITS
        } else {
            FULL_STEP_UNITS
        }
    }

    /// Marks the acting team as having failed the riddle
    ///
    /// # Returns
    ///
    /// `true` if the other team had already failed, meaning nobody is left
    /// to answer.
    pub fn mark_attempted(&mut self) -> bool {
        self.attempted[self.acting] = true;
        self.both_attempted()
    }

    /// Requests the hint, marking the round as hinted
    pub fn show_hint(&mut self) {
        self.used_hint = true;
        self.hint_visible = true;
    }

    /// Flips hint visibility, marking the round as hinted either way
    pub fn toggle_hint(&mut self) {
        self.used_hint = true;
        self.hint_visible = !self.hint_visible;
    }

    /// Hands the riddle over to the other team with a fresh clock
    pub fn pass_to_other(&mut self, seconds: u64) {
        self.acting = self.acting.other();
        self.remaining_seconds = seconds;
        self.used_hint = false;
        self.hint_visible = false;
        self.draft.clear();
        self.outcome = Outcome::None;
        self.banner = None;
        self.revealed_answer = None;
    }

    /// Removes the transient feedback
    pub fn clear_feedback(&mut self) {
        self.outcome = Outcome::None;
        self.banner = None;
    }
}
