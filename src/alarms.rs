//! Scheduled alarms driving the clock and feedback delays
//!
//! The game never sleeps on its own. Whenever it needs something to happen
//! later it hands an [`AlarmMessage`] and a delay to a scheduling callback
//! supplied by the host, and the host feeds the alarm back through
//! [`Game::receive_alarm`](crate::game::Game::receive_alarm) once the delay
//! has elapsed. Every alarm carries a [`Token`]; the game remembers the
//! token of the one outstanding alarm of each kind and drops anything else,
//! so cancelled or superseded alarms are harmless when they arrive.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::{AlarmMessage, constants::timer::TICK_MILLIS, game::Game, session::Tunnel};

/// Identifies one scheduled alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token(u64);

/// Transition to run once a feedback delay has elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowUp {
    /// Move on to the next round
    Advance,
    /// Hand the current riddle to the other team
    SwitchTeam,
    /// Hide the feedback and keep the clock running
    ClearOutcome,
}

/// Tokens of the alarms the game is currently waiting for
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct PendingAlarms {
    /// Source of fresh tokens
    next_token: u64,
    /// Outstanding one-second tick
    tick: Option<Token>,
    /// Outstanding feedback delay
    feedback: Option<Token>,
}

impl PendingAlarms {
    fn fresh(&mut self) -> Token {
        self.next_token += 1;
        Token(self.next_token)
    }

    /// Starts a new tick, superseding any outstanding one
    pub fn start_tick(&mut self) -> Token {
        let token = self.fresh();
        self.tick = Some(token);
        token
    }

    /// Starts a new feedback delay, superseding any outstanding one
    pub fn start_feedback(&mut self) -> Token {
        let token = self.fresh();
        self.feedback = Some(token);
        token
    }

    /// Schedules the next one-second tick through the host
    pub fn schedule_tick<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        let token = self.start_tick();
        schedule_message(
            AlarmMessage::Tick { token },
            Duration::from_millis(TICK_MILLIS),
        );
    }

    /// Schedules a feedback delay through the host
    pub fn schedule_feedback<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        then: FollowUp,
        delay: Duration,
        schedule_message: &mut S,
    ) {
        let token = self.start_feedback();
        schedule_message(AlarmMessage::Feedback { token, then }, delay);
    }

    pub fn cancel_tick(&mut self) {
        self.tick = None;
    }

    pub fn cancel_feedback(&mut self) {
        self.feedback = None;
    }

    pub fn cancel_all(&mut self) {
        self.cancel_tick();
        self.cancel_feedback();
    }

    pub fn is_ticking(&self) -> bool {
        self.tick.is_some()
    }

    pub fn awaiting_feedback(&self) -> bool {
        self.feedback.is_some()
    }

    /// Whether a delivered tick is the outstanding one
    pub fn is_current_tick(&self, token: Token) -> bool {
        self.tick == Some(token)
    }

    /// Consumes the outstanding feedback delay if the token matches
    pub fn take_feedback(&mut self, token: Token) -> bool {
        if self.feedback == Some(token) {
            self.feedback = None;
            true
        } else {
            false
        }
    }
}

/// A deterministic alarm scheduler on a virtual clock
///
/// Useful for hosts without an event loop of their own and for tests:
/// alarms are queued with [`AlarmQueue::schedule`] and delivered in due
/// order by [`AlarmQueue::run_for`].
#[derive(Debug, Default)]
pub struct AlarmQueue {
    /// Current virtual time
    now: Duration,
    /// Sequence number used to deliver alarms due at the same time in order
    sequence: u64,
    /// Queued alarms with their due time
    pending: Vec<(Duration, u64, AlarmMessage)>,
}

impl AlarmQueue {
    /// Queues an alarm to be delivered after `delay`
    pub fn schedule(&mut self, message: AlarmMessage, delay: Duration) {
        self.sequence += 1;
        self.pending.push((self.now + delay, self.sequence, message));
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of queued alarms, including stale ones
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Checks if no alarm is queued
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes the earliest alarm due no later than `until`
    ///
    /// The virtual clock moves forward to the due time of the returned alarm.
    pub fn pop_due(&mut self, until: Duration) -> Option<AlarmMessage> {
        let position = self
            .pending
            .iter()
            .position_min_by_key(|(due, sequence, _)| (*due, *sequence))?;
        if self.pending[position].0 > until {
            return None;
        }
        let (due, _, message) = self.pending.remove(position);
        self.now = self.now.max(due);
        Some(message)
    }

    /// Moves the virtual clock forward, delivering every alarm that falls due
    ///
    /// Alarms scheduled by the game while handling an earlier alarm are
    /// delivered in the same call if they fall due within the window.
    pub fn run_for<T: Tunnel>(&mut self, game: &mut Game, by: Duration, tunnel: &T) {
        let until = self.now + by;
        while let Some(message) = self.pop_due(until) {
            game.receive_alarm(message, |message, delay| self.schedule(message, delay), tunnel);
        }
        self.now = until;
    }
}
