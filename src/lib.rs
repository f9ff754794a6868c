//! # Riddle Rally Game Library
//!
//! This library provides the core game logic for Riddle Rally, a two-team
//! race where teams take turns answering riddles. It handles the round and
//! turn state machine, timers, hints, the sudden-death tiebreaker and the
//! fuzzy matching of typed answers. Rendering is left to the host, which
//! receives a full snapshot of the game after every transition.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::missing_panics_doc)]
use serde::{Deserialize, Serialize};

pub mod alarms;
pub mod constants;
pub mod game;
pub mod keys;
pub mod matcher;
pub mod names;
pub mod riddles;
pub mod round;
pub mod session;
pub mod settings;
pub mod teams;

/// Messages sent to synchronize the front end with the full game state
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Complete snapshot of the game after a transition
    Snapshot(game::Snapshot),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages sent to notify the front end about rejected requests
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// The match could not be started
    StartRejected(game::Error),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Alarm messages for timed events
///
/// The game schedules these through the host and expects them back once
/// their delay has elapsed, see [`alarms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One second of the acting team's clock has passed
    Tick {
        /// Token of the tick this alarm belongs to
        token: alarms::Token,
    },
    /// A feedback delay has elapsed
    Feedback {
        /// Token of the delay this alarm belongs to
        token: alarms::Token,
        /// Transition to run now
        then: alarms::FollowUp,
    },
}
