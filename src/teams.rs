//! The two racing teams and their standings
//!
//! Each team races along a track split into [`TRACK_UNITS`] units. A clean
//! correct answer moves a team two units and a hinted one moves it a
//! single unit, so the track is full after 26 clean answers. Progress is
//! kept in whole units so that two teams can be compared for an exact tie.

use std::fmt::Display;

use enum_map::{Enum, EnumMap, enum_map};
use serde::{Deserialize, Serialize};

use crate::constants::{
    rounds::{MAX_PROGRESS, TRACK_UNITS},
    team::{DEFAULT_NAME_A, DEFAULT_NAME_B},
};

/// Identifier of one of the two teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum Team {
    /// The first team, acts first on even rounds
    A,
    /// The second team, acts first on odd rounds
    B,
}

impl Team {
    /// The opposing team
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// The team that acts first in the given round
    ///
    /// Rounds alternate by parity: team A opens even rounds and
    /// team B opens odd rounds.
    pub fn opening(round: usize) -> Self {
        if round % 2 == 0 { Self::A } else { Self::B }
    }
}

impl Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Score sheet of a single team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TeamStanding {
    /// Display name chosen in the lobby
    name: String,
    /// Number of correct answers
    score: u32,
    /// Distance covered on the track, in units of `1 / TRACK_UNITS`
    progress_units: u32,
    /// Number of correct answers given after showing a hint
    hints_used: u32,
}

impl TeamStanding {
    /// Creates a fresh standing for a team name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Display name of the team
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of correct answers
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Number of correct answers given after showing a hint
    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    /// Raw track units covered
    pub fn progress_units(&self) -> u32 {
        self.progress_units
    }

    /// Progress along the track as a percentage in `[0, 100]`
    pub fn progress(&self) -> f64 {
        f64::from(self.progress_units) * MAX_PROGRESS / f64::from(TRACK_UNITS)
    }

    /// Progress rounded to a whole percentage for display
    pub fn display_progress(&self) -> u32 {
        self.progress().round() as u32
    }

    /// Records a correct answer
    ///
    /// Moves the team `units` along the track, clamped to the end of the
    /// track, and counts the hint when one was used.
    pub fn record_correct(&mut self, units: u32, hinted: bool) {
        self.score += 1;
        self.progress_units = (self.progress_units + units).min(TRACK_UNITS);
        if hinted {
            self.hints_used += 1;
        }
    }

    /// Clears score, progress and hints while keeping the name
    pub fn clear(&mut self) {
        *self = Self::new(std::mem::take(&mut self.name));
    }
}

/// Standings of both teams, keyed by [`Team`]
pub type Standings = EnumMap<Team, TeamStanding>;

/// Standings for the default team names
pub fn default_standings() -> Standings {
    enum_map! {
        Team::A => TeamStanding::new(DEFAULT_NAME_A),
        Team::B => TeamStanding::new(DEFAULT_NAME_B),
    }
}

/// The team strictly ahead on the track, if any
pub fn leader(standings: &Standings) -> Option<Team> {
    let a = standings[Team::A].progress_units;
    let b = standings[Team::B].progress_units;
    match a.cmp(&b) {
        std::cmp::Ordering::Greater => Some(Team::A),
        std::cmp::Ordering::Less => Some(Team::B),
        std::cmp::Ordering::Equal => None,
    }
}
