//! Core game logic and state management
//!
//! This module contains the main game struct and the round state machine:
//! starting a match, judging answers, passing riddles between teams,
//! advancing rounds, the sudden-death tiebreaker and the final results.
//! Every transition ends with a full [`Snapshot`] sent to the front end.

use std::fmt::Debug;

use enum_map::EnumMap;
use garde::Validate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use web_time::Duration;

use crate::{
    AlarmMessage, SyncMessage, UpdateMessage,
    alarms::{FollowUp, PendingAlarms},
    constants::{
        feedback::{CORRECT_DELAY_MILLIS, MISS_DELAY_MILLIS},
        timer::SUDDEN_DEATH_SECONDS,
    },
    keys::{KeyAction, KeyPress},
    matcher, names,
    riddles::{Deck, Riddle},
    round::{Outcome, RoundState},
    session::Tunnel,
    settings::Settings,
    teams::{self, Standings, Team, TeamStanding},
};

/// How a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// The winning team, `None` only if the match ended level
    pub winner: Option<Team>,
    /// Whether the winner was decided by the tiebreaker riddle
    pub sudden_death: bool,
}

/// Represents the current phase of the game together with its data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    /// Choosing team names and settings
    Lobby,
    /// One of the regular rounds is being played
    Playing(RoundState),
    /// The tiebreaker riddle is being played
    SuddenDeath(RoundState),
    /// The match is over
    Results(Summary),
}

/// Phase tag of a [`State`], as shown to the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Choosing team names and settings
    Lobby,
    /// A regular round
    Playing,
    /// The tiebreaker
    SuddenDeath,
    /// The match is over
    Results,
}

impl State {
    /// Phase tag of this state
    pub fn phase(&self) -> Phase {
        match self {
            Self::Lobby => Phase::Lobby,
            Self::Playing(_) => Phase::Playing,
            Self::SuddenDeath(_) => Phase::SuddenDeath,
            Self::Results(_) => Phase::Results,
        }
    }

    /// The round being played, if any
    pub fn round(&self) -> Option<&RoundState> {
        match self {
            Self::Playing(round) | Self::SuddenDeath(round) => Some(round),
            Self::Lobby | Self::Results(_) => None,
        }
    }

    fn round_mut(&mut self) -> Option<&mut RoundState> {
        match self {
            Self::Playing(round) | Self::SuddenDeath(round) => Some(round),
            Self::Lobby | Self::Results(_) => None,
        }
    }
}

/// Errors that can occur when starting a match
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// One of the team names was rejected
    #[error("invalid team name: {0}")]
    Name(#[from] names::Error),
    /// The settings failed validation
    #[error("invalid settings: {0}")]
    Settings(String),
}

/// Input events from the front end
#[derive(Debug, Deserialize, Clone)]
pub enum IncomingMessage {
    /// Start a match from the lobby
    StartGame {
        /// Name of team A
        team_a: String,
        /// Name of team B
        team_b: String,
        /// Match settings
        #[serde(default)]
        settings: Settings,
    },
    /// The acting team edited its answer
    UpdateDraft(String),
    /// The acting team submitted an answer
    Submit(String),
    /// The acting team asked for the hint
    RequestHint,
    /// Show or hide the hint
    ToggleHint,
    /// Pause or resume the clock
    TogglePause,
    /// A key was pressed
    Key(KeyPress),
    /// Abandon the match and return to the lobby
    Reset,
}

/// Complete view of the game for the front end
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Current phase
    pub phase: Phase,
    /// Zero-based index of the current round
    pub round: usize,
    /// Number of regular rounds
    pub round_count: usize,
    /// Riddle being asked
    pub question: Option<String>,
    /// Hint text, only while shown
    pub hint: Option<String>,
    /// Name, score, progress and hints of both teams
    pub teams: Standings,
    /// Progress percentage of both teams
    pub progress: EnumMap<Team, f64>,
    /// Team allowed to answer
    pub acting: Option<Team>,
    /// Seconds left on the clock
    pub remaining_seconds: u64,
    /// Feedback tag
    pub outcome: Outcome,
    /// Answer revealed after both teams failed
    pub revealed_answer: Option<String>,
    /// Human readable feedback line
    pub banner: Option<String>,
    /// Answer being typed
    pub draft: String,
    /// Whether the clock is paused
    pub paused: bool,
    /// Winning team once the match is over
    pub winner: Option<Team>,
    /// Match settings
    pub settings: Settings,
}

/// The main game session struct
///
/// A `Game` owns the deck, the settings, both team standings and the
/// current [`State`]. It is driven by [`Game::receive_message`] for input
/// and [`Game::receive_alarm`] for elapsed time.
#[derive(Serialize, Deserialize)]
pub struct Game {
    /// Riddles of the match
    deck: Deck,
    /// Settings chosen in the lobby
    settings: Settings,
    /// Standings of both teams
    standings: Standings,
    /// Current phase of the game
    state: State,
    /// Whether the clock is paused
    paused: bool,
    /// Alarms the game is waiting for
    alarms: PendingAlarms,
}

impl Debug for Game {
    /// Custom debug implementation that avoids printing the whole deck
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::with_deck(Deck::default())
    }
}

impl Game {
    /// Creates a new game in the lobby with a custom deck
    ///
    /// # Errors
    ///
    /// Returns the validation report if the deck does not hold exactly one
    /// riddle per round or any riddle is malformed.
    pub fn new(deck: Deck) -> Result<Self, garde::Report> {
        deck.validate()?;
        Ok(Self::with_deck(deck))
    }

    fn with_deck(deck: Deck) -> Self {
        Self {
            deck,
            settings: Settings::default(),
            standings: teams::default_standings(),
            state: State::Lobby,
            paused: false,
            alarms: PendingAlarms::default(),
        }
    }

    /// Current phase of the game
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The round being played, if any
    pub fn round(&self) -> Option<&RoundState> {
        self.state.round()
    }

    /// Riddles of the match
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Settings of the match
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Standings of both teams
    pub fn standings(&self) -> &Standings {
        &self.standings
    }

    /// Whether the clock is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The riddle currently being asked
    pub fn current_riddle(&self) -> Option<&Riddle> {
        match &self.state {
            State::Playing(round) => Some(self.deck.riddle(round.index)),
            State::SuddenDeath(_) => Some(self.deck.sudden_death()),
            State::Lobby | State::Results(_) => None,
        }
    }

    fn results_banner(&self, summary: Summary) -> String {
        match summary.winner {
            Some(team) if summary.sudden_death => {
                format!("{} wins sudden death!", self.standings[team].name())
            }
            Some(team) => format!("{} wins!", self.standings[team].name()),
            None => "It's a tie!".to_owned(),
        }
    }

    /// Builds the complete view of the game
    pub fn snapshot(&self) -> Snapshot {
        let round = self.state.round();
        let riddle = self.current_riddle();
        let summary = match self.state {
            State::Results(summary) => Some(summary),
            _ => None,
        };

        Snapshot {
            phase: self.state.phase(),
            round: match self.state {
                State::Results(_) => self.deck.len().saturating_sub(1),
                _ => round.map_or(0, RoundState::index),
            },
            round_count: self.deck.len(),
            question: riddle.map(|riddle| riddle.question().to_owned()),
            hint: round
                .filter(|round| round.hint_visible())
                .and(riddle)
                .and_then(Riddle::hint)
                .map(str::to_owned),
            teams: self.standings.clone(),
            progress: EnumMap::from_fn(|team| self.standings[team].progress()),
            acting: round.map(RoundState::acting),
            remaining_seconds: round.map_or(
                self.settings.time_limit().as_secs(),
                RoundState::remaining_seconds,
            ),
            outcome: if summary.is_some() {
                Outcome::Winner
            } else {
                round.map_or(Outcome::None, RoundState::outcome)
            },
            revealed_answer: round
                .and_then(RoundState::revealed_answer)
                .map(str::to_owned),
            banner: match summary {
                Some(summary) => Some(self.results_banner(summary)),
                None => round.and_then(RoundState::banner).map(str::to_owned),
            },
            draft: round.map(RoundState::draft).unwrap_or_default().to_owned(),
            paused: self.paused,
            winner: summary.and_then(|summary| summary.winner),
            settings: self.settings,
        }
    }

    fn publish<T: Tunnel>(&self, tunnel: &T) {
        tunnel.send_state(&self.snapshot().into());
    }

    /// Starts a match from the lobby
    ///
    /// Team names are trimmed and checked, then the first round begins with
    /// team A acting. Outside of the lobby this does nothing. The new state
    /// is not published, see [`Game::receive_message`] for that.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings or either team name are invalid,
    /// leaving the game untouched.
    pub fn start_game<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        team_a: &str,
        team_b: &str,
        settings: Settings,
        schedule_message: &mut S,
    ) -> Result<(), Error> {
        if !matches!(self.state, State::Lobby) {
            debug!("ignoring match start outside of the lobby");
            return Ok(());
        }

        settings
            .validate()
            .map_err(|report| Error::Settings(report.to_string()))?;
        let (team_a, team_b) = names::clean_pair(team_a, team_b)?;

        info!("match started: {team_a} against {team_b}");

        self.settings = settings;
        self.standings[Team::A] = TeamStanding::new(team_a);
        self.standings[Team::B] = TeamStanding::new(team_b);
        self.paused = false;
        self.alarms.cancel_all();
        self.state = State::Playing(RoundState::new(
            0,
            Team::A,
            settings.time_limit().as_secs(),
        ));
        self.alarms.schedule_tick(schedule_message);

        Ok(())
    }

    fn update_draft(&mut self, text: String) {
        if let Some(round) = self.state.round_mut() {
            round.draft = text;
        }
    }

    fn submit<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        answer: String,
        schedule_message: &mut S,
    ) {
        if self.paused {
            debug!("ignoring answer while paused");
            return;
        }

        let typo_tolerance = self.settings.typo_tolerance;
        let mut finished = None;

        match &mut self.state {
            State::Playing(round) => {
                if self.alarms.awaiting_feedback() {
                    debug!("ignoring answer during feedback");
                    return;
                }

                round.draft = answer;
                round.revealed_answer = None;
                let riddle = self.deck.riddle(round.index);

                if matcher::is_correct(&round.draft, riddle.answers(), typo_tolerance) {
                    let hinted = round.used_hint;
                    self.standings[round.acting].record_correct(round.step_units(), hinted);
                    debug!(
                        "team {} answered round {} correctly",
                        round.acting, round.index
                    );

                    let (outcome, banner) = if hinted {
                        (Outcome::CorrectSlow, "Correct! (reduced speed)")
                    } else {
                        (Outcome::CorrectFast, "Correct! (full speed)")
                    };
                    round.outcome = outcome;
                    round.banner = Some(banner.to_owned());

                    self.alarms.cancel_tick();
                    self.alarms.schedule_feedback(
                        FollowUp::Advance,
                        Duration::from_millis(CORRECT_DELAY_MILLIS),
                        schedule_message,
                    );
                } else {
                    miss(
                        round,
                        riddle,
                        &self.standings,
                        Outcome::Wrong,
                        &mut self.alarms,
                        schedule_message,
                    );
                }
            }
            State::SuddenDeath(round) => {
                round.draft = answer;
                let riddle = self.deck.sudden_death();

                if matcher::is_correct(&round.draft, riddle.answers(), typo_tolerance) {
                    let team = round.acting;
                    self.standings[team].record_correct(round.step_units(), round.used_hint);
                    finished = Some(Summary {
                        winner: Some(team),
                        sudden_death: true,
                    });
                } else {
                    round.mark_attempted();
                    round.draft.clear();
                    round.outcome = Outcome::Wrong;
                    round.banner = Some("Wrong answer, keep trying!".to_owned());
                    self.alarms.schedule_feedback(
                        FollowUp::ClearOutcome,
                        Duration::from_millis(MISS_DELAY_MILLIS),
                        schedule_message,
                    );
                }
            }
            State::Lobby | State::Results(_) => {}
        }

        if let Some(summary) = finished {
            self.finish(summary);
        }
    }

    fn request_hint(&mut self) {
        if self.alarms.awaiting_feedback() {
            return;
        }
        if let State::Playing(round) = &mut self.state {
            round.show_hint();
        }
    }

    fn toggle_hint(&mut self) {
        if self.alarms.awaiting_feedback() {
            return;
        }
        if let State::Playing(round) = &mut self.state {
            round.toggle_hint();
        }
    }

    fn toggle_pause<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        let clock_running = match &self.state {
            State::Playing(_) | State::SuddenDeath(_) => !self.alarms.awaiting_feedback(),
            State::Lobby | State::Results(_) => {
                debug!("ignoring pause outside of a round");
                return;
            }
        };

        self.paused = !self.paused;
        debug!("clock paused: {}", self.paused);

        if self.paused {
            self.alarms.cancel_tick();
        } else if clock_running {
            self.alarms.schedule_tick(schedule_message);
        }
    }

    fn receive_key<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        key: &KeyPress,
        schedule_message: &mut S,
    ) {
        let Some(round) = self.state.round() else {
            return;
        };

        match key.action() {
            Some(KeyAction::Submit) => {
                let draft = round.draft.clone();
                self.submit(draft, schedule_message);
            }
            Some(KeyAction::ToggleHint) => self.toggle_hint(),
            Some(KeyAction::TogglePause) => self.toggle_pause(schedule_message),
            None => {}
        }
    }

    fn reset(&mut self) {
        self.alarms.cancel_all();
        self.paused = false;
        for standing in self.standings.values_mut() {
            standing.clear();
        }
        self.state = State::Lobby;
        info!("match reset");
    }

    fn finish(&mut self, summary: Summary) {
        self.alarms.cancel_all();
        self.paused = false;
        match summary.winner {
            Some(team) => info!("match over, {} wins", self.standings[team].name()),
            None => info!("match over without a winner"),
        }
        self.state = State::Results(summary);
    }

    fn tick<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        let Some(round) = self.state.round_mut() else {
            self.alarms.cancel_tick();
            return;
        };

        round.remaining_seconds = round.remaining_seconds.saturating_sub(1);
        if round.remaining_seconds > 0 {
            self.alarms.schedule_tick(schedule_message);
        } else {
            self.alarms.cancel_tick();
            self.time_out(schedule_message);
        }
    }

    fn time_out<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        match &mut self.state {
            State::Playing(round) => {
                debug!("team {} ran out of time", round.acting);
                round.revealed_answer = None;
                let riddle = self.deck.riddle(round.index);
                miss(
                    round,
                    riddle,
                    &self.standings,
                    Outcome::Timeout,
                    &mut self.alarms,
                    schedule_message,
                );
            }
            State::SuddenDeath(round) => {
                round.remaining_seconds = SUDDEN_DEATH_SECONDS;
                round.draft.clear();
                round.outcome = Outcome::Timeout;
                round.banner = Some("Time's up, keep trying!".to_owned());
                self.alarms.schedule_feedback(
                    FollowUp::ClearOutcome,
                    Duration::from_millis(MISS_DELAY_MILLIS),
                    schedule_message,
                );
            }
            State::Lobby | State::Results(_) => {}
        }
    }

    fn follow_up<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        then: FollowUp,
        schedule_message: &mut S,
    ) {
        match then {
            FollowUp::Advance => self.advance(schedule_message),
            FollowUp::SwitchTeam => {
                let seconds = self.settings.time_limit().as_secs();
                if let State::Playing(round) = &mut self.state {
                    round.pass_to_other(seconds);
                    debug!("round {} passed to team {}", round.index, round.acting);
                    if !self.paused {
                        self.alarms.schedule_tick(schedule_message);
                    }
                }
            }
            FollowUp::ClearOutcome => {
                if let State::SuddenDeath(round) = &mut self.state {
                    round.clear_feedback();
                    if !self.paused && !self.alarms.is_ticking() {
                        self.alarms.schedule_tick(schedule_message);
                    }
                }
            }
        }
    }

    fn advance<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        let State::Playing(round) = &self.state else {
            return;
        };
        let next = round.index + 1;
        let revealed_answer = round.revealed_answer.clone();

        self.alarms.cancel_all();

        if next >= self.deck.len() {
            match teams::leader(&self.standings) {
                None => {
                    info!("level after {next} rounds, going to sudden death");
                    self.state = State::SuddenDeath(RoundState::new(
                        self.deck.len() - 1,
                        Team::A,
                        SUDDEN_DEATH_SECONDS,
                    ));
                }
                winner => {
                    self.finish(Summary {
                        winner,
                        sudden_death: false,
                    });
                    return;
                }
            }
        } else {
            let mut round = RoundState::new(
                next,
                Team::opening(next),
                self.settings.time_limit().as_secs(),
            );
            round.revealed_answer = revealed_answer;
            debug!("round {next} begins with team {}", round.acting);
            self.state = State::Playing(round);
        }

        if !self.paused {
            self.alarms.schedule_tick(schedule_message);
        }
    }

    /// Processes an input event from the front end
    ///
    /// Events that make no sense in the current state are ignored. The
    /// resulting state is always published through the tunnel, and a
    /// rejected match start is additionally reported as an
    /// [`UpdateMessage::StartRejected`].
    ///
    /// # Arguments
    ///
    /// * `message` - The input event
    /// * `schedule_message` - Function to schedule alarms after a delay
    /// * `tunnel` - Connection to the front end
    pub fn receive_message<T: Tunnel, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        message: IncomingMessage,
        mut schedule_message: S,
        tunnel: &T,
    ) {
        match message {
            IncomingMessage::StartGame {
                team_a,
                team_b,
                settings,
            } => {
                if let Err(error) =
                    self.start_game(&team_a, &team_b, settings, &mut schedule_message)
                {
                    warn!("match start rejected: {error}");
                    tunnel.send_message(&UpdateMessage::StartRejected(error));
                }
            }
            IncomingMessage::UpdateDraft(text) => self.update_draft(text),
            IncomingMessage::Submit(answer) => self.submit(answer, &mut schedule_message),
            IncomingMessage::RequestHint => self.request_hint(),
            IncomingMessage::ToggleHint => self.toggle_hint(),
            IncomingMessage::TogglePause => self.toggle_pause(&mut schedule_message),
            IncomingMessage::Key(key) => self.receive_key(&key, &mut schedule_message),
            IncomingMessage::Reset => self.reset(),
        }

        self.publish(tunnel);
    }

    /// Processes an alarm that was scheduled earlier
    ///
    /// Alarms that were cancelled or superseded in the meantime are dropped
    /// without publishing anything.
    ///
    /// # Arguments
    ///
    /// * `message` - The alarm being delivered
    /// * `schedule_message` - Function to schedule alarms after a delay
    /// * `tunnel` - Connection to the front end
    pub fn receive_alarm<T: Tunnel, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        message: AlarmMessage,
        mut schedule_message: S,
        tunnel: &T,
    ) {
        match message {
            AlarmMessage::Tick { token } => {
                if !self.alarms.is_current_tick(token) {
                    debug!("dropping stale tick");
                    return;
                }
                self.tick(&mut schedule_message);
            }
            AlarmMessage::Feedback { token, then } => {
                if !self.alarms.take_feedback(token) {
                    debug!("dropping stale feedback");
                    return;
                }
                self.follow_up(then, &mut schedule_message);
            }
        }

        self.publish(tunnel);
    }
}

/// Handles a wrong answer or a timeout in a regular round
///
/// The riddle goes to the other team unless it already failed, in which
/// case the answer is revealed and the round advances.
fn miss<S: FnMut(AlarmMessage, Duration)>(
    round: &mut RoundState,
    riddle: &Riddle,
    standings: &Standings,
    outcome: Outcome,
    alarms: &mut PendingAlarms,
    schedule_message: &mut S,
) {
    let nobody_left = round.mark_attempted();
    round.outcome = outcome;
    alarms.cancel_tick();

    let (lead, both) = if outcome == Outcome::Timeout {
        ("Time's up", "Both teams timed out")
    } else {
        ("Wrong answer", "Both teams failed")
    };

    let then = if nobody_left {
        round.revealed_answer = Some(riddle.first_answer().to_owned());
        round.banner = Some(format!("{both}, answer: {}", riddle.first_answer()));
        FollowUp::Advance
    } else {
        round.banner = Some(format!(
            "{lead}, passing to {}",
            standings[round.acting.other()].name()
        ));
        FollowUp::SwitchTeam
    };

    alarms.schedule_feedback(then, Duration::from_millis(MISS_DELAY_MILLIS), schedule_message);
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use proptest::prelude::*;

    use super::*;
    use crate::{
        alarms::AlarmQueue,
        constants::rounds::{MAX_PROGRESS, ROUND_COUNT, TRACK_UNITS},
    };

    #[derive(Default)]
    struct MockTunnel {
        messages: Rc<RefCell<Vec<UpdateMessage>>>,
        states: Rc<RefCell<Vec<SyncMessage>>>,
    }

    impl Tunnel for MockTunnel {
        fn send_message(&self, message: &UpdateMessage) {
            self.messages.borrow_mut().push(message.clone());
        }

        fn send_state(&self, state: &SyncMessage) {
            self.states.borrow_mut().push(state.clone());
        }
    }

    #[derive(Default)]
    struct Harness {
        game: Game,
        queue: AlarmQueue,
        tunnel: MockTunnel,
    }

    impl Harness {
        fn started() -> Self {
            Self::started_with(Settings::default())
        }

        fn started_with(settings: Settings) -> Self {
            let mut harness = Self::default();
            harness.send(IncomingMessage::StartGame {
                team_a: "Team A".to_string(),
                team_b: "Team B".to_string(),
                settings,
            });
            harness
        }

        fn send(&mut self, message: IncomingMessage) {
            self.game
                .receive_message(message, |m, d| self.queue.schedule(m, d), &self.tunnel);
        }

        fn wait(&mut self, millis: u64) {
            self.queue
                .run_for(&mut self.game, Duration::from_millis(millis), &self.tunnel);
        }

        fn submit(&mut self, answer: &str) {
            self.send(IncomingMessage::Submit(answer.to_string()));
        }

        fn answer(&self) -> String {
            self.game
                .current_riddle()
                .map(|riddle| riddle.first_answer().to_string())
                .unwrap_or_default()
        }

        fn submit_correct(&mut self) {
            let answer = self.answer();
            self.submit(&answer);
        }

        fn last_published(&self) -> Snapshot {
            let states = self.tunnel.states.borrow();
            let Some(SyncMessage::Snapshot(snapshot)) = states.last() else {
                panic!("nothing was published");
            };
            snapshot.clone()
        }

        fn round(&self) -> &RoundState {
            self.game.round().expect("a round is being played")
        }

        /// Plays every regular round with the opening team answering correctly
        fn play_level_match(&mut self) {
            for _ in 0..ROUND_COUNT {
                self.submit_correct();
                self.wait(CORRECT_DELAY_MILLIS);
            }
        }
    }

    #[test]
    fn test_new_game_is_in_lobby() {
        let game = Game::default();
        let snapshot = game.snapshot();

        assert_eq!(snapshot.phase, Phase::Lobby);
        assert_eq!(snapshot.round, 0);
        assert_eq!(snapshot.round_count, ROUND_COUNT);
        assert_eq!(snapshot.remaining_seconds, 60);
        assert_eq!(snapshot.acting, None);
        assert_eq!(snapshot.teams[Team::A].name(), "Team A");
        assert!(!snapshot.paused);
    }

    #[test]
    fn test_new_rejects_short_deck() {
        let deck = Deck::new(
            vec![Riddle::new("What am I?", None, ["nothing"])],
            Riddle::new("Tiebreaker?", None, ["yes"]),
        );
        assert!(Game::new(deck).is_err());
        assert!(Game::new(Deck::default()).is_ok());
    }

    #[test]
    fn test_start_game() {
        let harness = Harness::started();
        let snapshot = harness.last_published();

        assert_eq!(snapshot.phase, Phase::Playing);
        assert_eq!(snapshot.round, 0);
        assert_eq!(snapshot.acting, Some(Team::A));
        assert_eq!(snapshot.remaining_seconds, 60);
        assert_eq!(snapshot.question.as_deref(), Some(harness.game.deck().riddle(0).question()));
        assert_eq!(snapshot.hint, None);
        assert_eq!(snapshot.teams[Team::A].score(), 0);
        assert_eq!(harness.queue.len(), 1);
    }

    #[test]
    fn test_start_game_trims_names() {
        let mut harness = Harness::default();
        harness.send(IncomingMessage::StartGame {
            team_a: "  Owls ".to_string(),
            team_b: "Larks".to_string(),
            settings: Settings::default(),
        });

        assert_eq!(harness.game.standings()[Team::A].name(), "Owls");
        assert_eq!(harness.game.standings()[Team::B].name(), "Larks");
    }

    #[test]
    fn test_start_game_rejects_invalid_names() {
        let mut harness = Harness::default();
        harness.send(IncomingMessage::StartGame {
            team_a: "   ".to_string(),
            team_b: "Larks".to_string(),
            settings: Settings::default(),
        });

        assert_eq!(harness.game.state(), &State::Lobby);
        assert_eq!(harness.game.standings()[Team::A].name(), "Team A");
        assert!(harness.queue.is_empty());

        let messages = harness.tunnel.messages.borrow();
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            UpdateMessage::StartRejected(Error::Name(names::Error::Empty))
        ));
    }

    #[test]
    fn test_start_game_rejects_same_names() {
        let mut game = Game::default();
        let result = game.start_game("Owls", "OWLS", Settings::default(), &mut |_, _| {});

        assert_eq!(result, Err(Error::Name(names::Error::Used)));
        assert_eq!(game.state(), &State::Lobby);
    }

    #[test]
    fn test_start_game_rejects_invalid_settings() {
        let mut game = Game::default();
        let settings = Settings {
            seconds_per_question: 10,
            ..Settings::default()
        };
        let result = game.start_game("Owls", "Larks", settings, &mut |_, _| {});

        assert!(matches!(result, Err(Error::Settings(_))));
        assert_eq!(game.state(), &State::Lobby);
    }

    #[test]
    fn test_start_game_outside_lobby_is_ignored() {
        let mut harness = Harness::started();
        harness.submit_correct();

        let result =
            harness
                .game
                .start_game("Owls", "Larks", Settings::default(), &mut |_, _| {});

        assert_eq!(result, Ok(()));
        assert_eq!(harness.game.standings()[Team::A].score(), 1);
        assert_eq!(harness.game.standings()[Team::A].name(), "Team A");
    }

    #[test]
    fn test_correct_answer_moves_team_and_advances() {
        let mut harness = Harness::started();
        harness.submit("Candle");

        let snapshot = harness.last_published();
        let team_a = &snapshot.teams[Team::A];
        assert_eq!(team_a.score(), 1);
        assert!((team_a.progress() - 100. / 26.).abs() < 1e-9);
        assert_eq!(snapshot.outcome, Outcome::CorrectFast);
        assert_eq!(snapshot.banner.as_deref(), Some("Correct! (full speed)"));
        assert_eq!(snapshot.round, 0);

        harness.wait(CORRECT_DELAY_MILLIS - 1);
        assert_eq!(harness.round().index(), 0);

        harness.wait(1);
        let snapshot = harness.last_published();
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.acting, Some(Team::B));
        assert_eq!(snapshot.outcome, Outcome::None);
        assert_eq!(snapshot.remaining_seconds, 60);
    }

    #[test]
    fn test_submissions_ignored_during_feedback() {
        let mut harness = Harness::started();
        harness.submit_correct();
        harness.submit_correct();

        assert_eq!(harness.game.standings()[Team::A].score(), 1);
    }

    #[test]
    fn test_wrong_answers_pass_then_reveal() {
        let mut harness = Harness::started();
        harness.submit("zzz");

        let snapshot = harness.last_published();
        assert_eq!(snapshot.outcome, Outcome::Wrong);
        assert_eq!(snapshot.banner.as_deref(), Some("Wrong answer, passing to Team B"));
        assert_eq!(snapshot.acting, Some(Team::A));

        harness.wait(MISS_DELAY_MILLIS);
        let snapshot = harness.last_published();
        assert_eq!(snapshot.acting, Some(Team::B));
        assert_eq!(snapshot.round, 0);
        assert_eq!(snapshot.remaining_seconds, 60);
        assert_eq!(snapshot.outcome, Outcome::None);
        assert!(harness.round().has_attempted(Team::A));

        harness.submit("zzz");
        let snapshot = harness.last_published();
        assert_eq!(snapshot.revealed_answer.as_deref(), Some("candle"));
        assert_eq!(snapshot.banner.as_deref(), Some("Both teams failed, answer: candle"));

        harness.wait(MISS_DELAY_MILLIS);
        let snapshot = harness.last_published();
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.acting, Some(Team::B));
        assert_eq!(snapshot.revealed_answer.as_deref(), Some("candle"));
        assert_eq!(snapshot.teams[Team::A].score(), 0);
        assert_eq!(snapshot.teams[Team::B].score(), 0);
    }

    #[test]
    fn test_revealed_answer_clears_on_next_answer() {
        let mut harness = Harness::started();
        harness.submit("zzz");
        harness.wait(MISS_DELAY_MILLIS);
        harness.submit("zzz");
        harness.wait(MISS_DELAY_MILLIS);

        harness.submit("zzz");
        assert_eq!(harness.last_published().revealed_answer, None);
    }

    #[test]
    fn test_empty_answer_is_wrong() {
        let mut harness = Harness::started();
        harness.submit("");

        assert_eq!(harness.round().outcome(), Outcome::Wrong);
        assert!(harness.round().has_attempted(Team::A));
    }

    #[test]
    fn test_clock_ticks_down() {
        let mut harness = Harness::started();
        harness.wait(5_000);

        assert_eq!(harness.round().remaining_seconds(), 55);
        assert_eq!(harness.last_published().remaining_seconds, 55);
    }

    #[test]
    fn test_timeout_passes_to_other_team() {
        let mut harness = Harness::started_with(Settings {
            seconds_per_question: 30,
            ..Settings::default()
        });
        harness.wait(29_000);
        assert_eq!(harness.round().remaining_seconds(), 1);
        assert_eq!(harness.round().outcome(), Outcome::None);

        harness.wait(1_000);
        let snapshot = harness.last_published();
        assert_eq!(snapshot.outcome, Outcome::Timeout);
        assert_eq!(snapshot.remaining_seconds, 0);
        assert_eq!(snapshot.banner.as_deref(), Some("Time's up, passing to Team B"));

        harness.wait(MISS_DELAY_MILLIS);
        let snapshot = harness.last_published();
        assert_eq!(snapshot.acting, Some(Team::B));
        assert_eq!(snapshot.remaining_seconds, 30);
    }

    #[test]
    fn test_both_timeouts_advance_once() {
        let mut harness = Harness::started_with(Settings {
            seconds_per_question: 30,
            ..Settings::default()
        });
        harness.wait(30_000 + MISS_DELAY_MILLIS);
        harness.wait(30_000);

        assert_eq!(
            harness.last_published().banner.as_deref(),
            Some("Both teams timed out, answer: candle")
        );

        harness.wait(MISS_DELAY_MILLIS);
        assert_eq!(harness.round().index(), 1);
        assert_eq!(harness.round().acting(), Team::B);
        assert_eq!(harness.round().remaining_seconds(), 30);
    }

    #[test]
    fn test_hint_halves_the_step() {
        let mut harness = Harness::started();
        harness.send(IncomingMessage::RequestHint);

        let snapshot = harness.last_published();
        assert_eq!(
            snapshot.hint.as_deref(),
            harness.game.deck().riddle(0).hint()
        );
        assert!(snapshot.hint.is_some());

        harness.submit_correct();
        let snapshot = harness.last_published();
        let team_a = &snapshot.teams[Team::A];
        assert!((team_a.progress() - 100. / 52.).abs() < 1e-9);
        assert_eq!(team_a.hints_used(), 1);
        assert_eq!(snapshot.outcome, Outcome::CorrectSlow);
        assert_eq!(snapshot.banner.as_deref(), Some("Correct! (reduced speed)"));
    }

    #[test]
    fn test_hint_does_not_carry_to_other_team() {
        let mut harness = Harness::started();
        harness.send(IncomingMessage::RequestHint);
        harness.submit("zzz");
        harness.wait(MISS_DELAY_MILLIS);

        assert_eq!(harness.last_published().hint, None);
        harness.submit_correct();
        assert_eq!(harness.round().outcome(), Outcome::CorrectFast);
    }

    #[test]
    fn test_toggle_hint_keeps_penalty() {
        let mut harness = Harness::started();
        harness.send(IncomingMessage::ToggleHint);
        assert!(harness.last_published().hint.is_some());

        harness.send(IncomingMessage::ToggleHint);
        assert!(harness.last_published().hint.is_none());

        harness.submit_correct();
        assert_eq!(harness.round().outcome(), Outcome::CorrectSlow);
    }

    #[test]
    fn test_hint_leaves_clock_alone() {
        let mut harness = Harness::started();
        harness.wait(3_000);
        harness.send(IncomingMessage::RequestHint);

        assert_eq!(harness.round().remaining_seconds(), 57);
        assert_eq!(harness.round().outcome(), Outcome::None);
    }

    #[test]
    fn test_pause_stops_clock_and_answers() {
        let mut harness = Harness::started();
        harness.wait(2_000);
        harness.send(IncomingMessage::TogglePause);
        assert!(harness.last_published().paused);

        harness.wait(10_000);
        assert_eq!(harness.round().remaining_seconds(), 58);

        harness.submit_correct();
        assert_eq!(harness.game.standings()[Team::A].score(), 0);
        assert_eq!(harness.round().outcome(), Outcome::None);

        harness.send(IncomingMessage::TogglePause);
        assert!(!harness.last_published().paused);
        harness.wait(3_000);
        assert_eq!(harness.round().remaining_seconds(), 55);
    }

    #[test]
    fn test_pause_in_lobby_is_ignored() {
        let mut harness = Harness::default();
        harness.send(IncomingMessage::TogglePause);
        assert!(!harness.game.is_paused());
    }

    #[test]
    fn test_stale_tick_is_dropped() {
        let mut harness = Harness::started();
        harness.send(IncomingMessage::TogglePause);
        harness.send(IncomingMessage::TogglePause);

        harness.wait(1_000);
        assert_eq!(harness.round().remaining_seconds(), 59);
    }

    #[test]
    fn test_stale_feedback_is_dropped() {
        let mut harness = Harness::started();
        harness.submit_correct();
        harness.send(IncomingMessage::Reset);
        let published = harness.tunnel.states.borrow().len();

        harness.wait(5_000);
        assert_eq!(harness.game.state(), &State::Lobby);
        assert_eq!(harness.tunnel.states.borrow().len(), published);
    }

    #[test]
    fn test_reset_returns_to_fresh_lobby() {
        let mut harness = Harness::started();
        harness.submit_correct();
        harness.wait(CORRECT_DELAY_MILLIS);
        harness.send(IncomingMessage::TogglePause);
        harness.send(IncomingMessage::Reset);

        assert_eq!(harness.last_published(), Game::default().snapshot());
    }

    #[test]
    fn test_reset_from_sudden_death() {
        let mut harness = Harness::started();
        harness.play_level_match();
        assert_eq!(harness.game.state().phase(), Phase::SuddenDeath);

        harness.send(IncomingMessage::Reset);
        assert_eq!(harness.last_published(), Game::default().snapshot());

        harness.wait(SUDDEN_DEATH_SECONDS * 1_000);
        assert_eq!(harness.game.snapshot(), Game::default().snapshot());
    }

    #[test]
    fn test_reset_with_pending_sudden_death_feedback() {
        let mut harness = Harness::started();
        harness.play_level_match();
        harness.submit("zzz");
        assert_eq!(harness.round().outcome(), Outcome::Wrong);

        harness.send(IncomingMessage::Reset);
        harness.wait(MISS_DELAY_MILLIS);

        assert_eq!(harness.game.state(), &State::Lobby);
        assert_eq!(harness.game.snapshot(), Game::default().snapshot());
    }

    #[test]
    fn test_reset_from_results() {
        let mut harness = Harness::started();
        harness.play_level_match();
        harness.submit("seven");
        assert_eq!(harness.game.state().phase(), Phase::Results);

        harness.send(IncomingMessage::Reset);
        assert_eq!(harness.last_published(), Game::default().snapshot());
    }

    #[test]
    fn test_reset_keeps_names_and_settings() {
        let mut harness = Harness::default();
        let settings = Settings {
            seconds_per_question: 45,
            typo_tolerance: true,
            sound: false,
        };
        harness.send(IncomingMessage::StartGame {
            team_a: "Owls".to_string(),
            team_b: "Larks".to_string(),
            settings,
        });
        harness.submit_correct();
        harness.send(IncomingMessage::Reset);

        let snapshot = harness.last_published();
        assert_eq!(snapshot.phase, Phase::Lobby);
        assert_eq!(snapshot.teams[Team::A].name(), "Owls");
        assert_eq!(snapshot.teams[Team::A].score(), 0);
        assert_eq!(snapshot.settings, settings);
        assert_eq!(snapshot.remaining_seconds, 45);
    }

    #[test]
    fn test_typo_tolerance_setting() {
        let mut harness = Harness::started();
        harness.submit("kandle");
        assert_eq!(harness.round().outcome(), Outcome::Wrong);

        let mut harness = Harness::started_with(Settings {
            typo_tolerance: true,
            ..Settings::default()
        });
        harness.submit("kandle");
        assert_eq!(harness.round().outcome(), Outcome::CorrectFast);
    }

    #[test]
    fn test_keys_alias_events() {
        let mut harness = Harness::started();
        let answer = harness.answer();

        harness.send(IncomingMessage::Key(KeyPress::new("h").with_ctrl()));
        assert!(harness.round().hint_visible());

        harness.send(IncomingMessage::UpdateDraft(answer));
        harness.send(IncomingMessage::Key(KeyPress::new("Enter")));
        assert_eq!(harness.round().outcome(), Outcome::CorrectSlow);

        harness.wait(CORRECT_DELAY_MILLIS);
        harness.send(IncomingMessage::Key(KeyPress::new(" ").with_ctrl()));
        assert!(harness.game.is_paused());
    }

    #[test]
    fn test_keys_ignored_in_lobby() {
        let mut harness = Harness::default();
        harness.send(IncomingMessage::Key(KeyPress::new(" ").with_ctrl()));
        harness.send(IncomingMessage::Key(KeyPress::new("Enter")));

        assert_eq!(harness.game.state(), &State::Lobby);
        assert!(!harness.game.is_paused());
    }

    #[test]
    fn test_level_match_goes_to_sudden_death() {
        let mut harness = Harness::started();
        harness.play_level_match();

        let snapshot = harness.last_published();
        assert_eq!(snapshot.phase, Phase::SuddenDeath);
        assert_eq!(snapshot.acting, Some(Team::A));
        assert_eq!(snapshot.remaining_seconds, SUDDEN_DEATH_SECONDS);
        assert_eq!(snapshot.round, ROUND_COUNT - 1);
        assert_eq!(
            snapshot.question.as_deref(),
            Some(harness.game.deck().sudden_death().question())
        );
        assert_eq!(snapshot.teams[Team::A].score(), 13);
        assert_eq!(snapshot.teams[Team::B].score(), 13);
        assert_eq!(
            snapshot.teams[Team::A].progress_units(),
            snapshot.teams[Team::B].progress_units()
        );
    }

    #[test]
    fn test_sudden_death_winner() {
        let mut harness = Harness::started();
        harness.play_level_match();

        harness.submit("eight");
        let snapshot = harness.last_published();
        assert_eq!(snapshot.phase, Phase::SuddenDeath);
        assert_eq!(snapshot.outcome, Outcome::Wrong);
        assert_eq!(snapshot.draft, "");
        assert_eq!(snapshot.acting, Some(Team::A));

        harness.wait(MISS_DELAY_MILLIS);
        assert_eq!(harness.round().outcome(), Outcome::None);

        harness.submit("Seven");
        let snapshot = harness.last_published();
        assert_eq!(snapshot.phase, Phase::Results);
        assert_eq!(snapshot.winner, Some(Team::A));
        assert_eq!(snapshot.outcome, Outcome::Winner);
        assert_eq!(snapshot.banner.as_deref(), Some("Team A wins sudden death!"));
        assert!(harness.game.round().is_none());
    }

    #[test]
    fn test_sudden_death_timeout_resets_clock() {
        let mut harness = Harness::started();
        harness.play_level_match();

        harness.wait(SUDDEN_DEATH_SECONDS * 1_000);
        let snapshot = harness.last_published();
        assert_eq!(snapshot.phase, Phase::SuddenDeath);
        assert_eq!(snapshot.outcome, Outcome::Timeout);
        assert_eq!(snapshot.remaining_seconds, SUDDEN_DEATH_SECONDS);
        assert_eq!(snapshot.acting, Some(Team::A));

        harness.wait(MISS_DELAY_MILLIS);
        assert_eq!(harness.round().outcome(), Outcome::None);

        harness.wait(5_000);
        assert_eq!(harness.round().remaining_seconds(), SUDDEN_DEATH_SECONDS - 5);
    }

    #[test]
    fn test_sudden_death_resume_waits_for_feedback() {
        let mut harness = Harness::started();
        harness.play_level_match();
        harness.wait(SUDDEN_DEATH_SECONDS * 1_000);
        assert_eq!(harness.round().outcome(), Outcome::Timeout);

        harness.send(IncomingMessage::TogglePause);
        harness.send(IncomingMessage::TogglePause);
        harness.wait(1_000);
        assert_eq!(harness.round().remaining_seconds(), SUDDEN_DEATH_SECONDS);

        harness.wait(MISS_DELAY_MILLIS - 1_000);
        assert_eq!(harness.round().outcome(), Outcome::None);
        assert_eq!(harness.round().remaining_seconds(), SUDDEN_DEATH_SECONDS);

        harness.wait(1_000);
        assert_eq!(harness.round().remaining_seconds(), SUDDEN_DEATH_SECONDS - 1);
    }

    #[test]
    fn test_sudden_death_ignores_hints() {
        let mut harness = Harness::started();
        harness.play_level_match();

        harness.send(IncomingMessage::RequestHint);
        harness.send(IncomingMessage::ToggleHint);
        assert!(!harness.round().used_hint());
        assert_eq!(harness.last_published().hint, None);
    }

    #[test]
    fn test_leader_wins_after_last_round() {
        let mut harness = Harness::started();
        for round in 0..ROUND_COUNT {
            if Team::opening(round) == Team::B {
                harness.send(IncomingMessage::RequestHint);
            }
            harness.submit_correct();
            harness.wait(CORRECT_DELAY_MILLIS);
        }

        let snapshot = harness.last_published();
        assert_eq!(snapshot.phase, Phase::Results);
        assert_eq!(snapshot.winner, Some(Team::A));
        assert_eq!(snapshot.banner.as_deref(), Some("Team A wins!"));
        assert_eq!(snapshot.teams[Team::A].display_progress(), 50);
        assert_eq!(snapshot.teams[Team::B].hints_used(), 13);
    }

    #[test]
    fn test_perfect_team_reaches_the_end() {
        let mut harness = Harness::started();
        for _ in 0..ROUND_COUNT {
            if harness.round().acting() == Team::B {
                harness.submit("zzz");
                harness.wait(MISS_DELAY_MILLIS);
            }
            harness.submit_correct();
            harness.wait(CORRECT_DELAY_MILLIS);
        }

        let standings = harness.game.standings();
        assert_eq!(standings[Team::A].progress_units(), TRACK_UNITS);
        assert!((standings[Team::A].progress() - MAX_PROGRESS).abs() < f64::EPSILON);
        assert!(matches!(
            harness.game.state(),
            State::Results(Summary {
                winner: Some(Team::A),
                sudden_death: false,
            })
        ));
    }

    #[test]
    fn test_results_ignore_input() {
        let mut harness = Harness::started();
        harness.play_level_match();
        harness.submit("seven");

        let before = harness.game.snapshot();
        harness.submit("seven");
        harness.send(IncomingMessage::TogglePause);
        harness.send(IncomingMessage::RequestHint);
        assert_eq!(harness.game.snapshot(), before);
    }

    #[test]
    fn test_snapshot_serialization_skips_empty_fields() {
        let json = SyncMessage::from(Game::default().snapshot()).to_message();

        assert!(!json.contains("question"));
        assert!(!json.contains("winner"));
        assert!(json.contains("\"round_count\":26"));
        assert!(json.contains("\"progress\":{\"A\":0.0,\"B\":0.0}"));
    }

    #[test]
    fn test_incoming_message_deserialization() {
        let message: IncomingMessage =
            serde_json::from_str(r#"{"StartGame":{"team_a":"Owls","team_b":"Larks"}}"#).unwrap();
        assert!(matches!(
            message,
            IncomingMessage::StartGame { settings, .. } if settings == Settings::default()
        ));

        let message: IncomingMessage = serde_json::from_str(r#"{"Submit":"candle"}"#).unwrap();
        assert!(matches!(message, IncomingMessage::Submit(answer) if answer == "candle"));
    }

    #[derive(Debug, Clone)]
    enum Action {
        Correct,
        Wrong,
        Hint,
        Pause,
        Wait(u64),
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            3 => Just(Action::Correct),
            2 => Just(Action::Wrong),
            1 => Just(Action::Hint),
            1 => Just(Action::Pause),
            3 => (1..70_000u64).prop_map(Action::Wait),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_progress_invariants(actions in prop::collection::vec(action(), 0..200)) {
            let mut harness = Harness::started_with(Settings {
                seconds_per_question: 30,
                ..Settings::default()
            });

            for action in actions {
                match action {
                    Action::Correct => harness.submit_correct(),
                    Action::Wrong => harness.submit("zzz"),
                    Action::Hint => harness.send(IncomingMessage::RequestHint),
                    Action::Pause => harness.send(IncomingMessage::TogglePause),
                    Action::Wait(millis) => harness.wait(millis),
                }

                for standing in harness.game.standings().values() {
                    prop_assert!(standing.progress() <= MAX_PROGRESS);
                    let expected = (2 * standing.score() - standing.hints_used()).min(TRACK_UNITS);
                    prop_assert_eq!(standing.progress_units(), expected);
                }
                if let Some(round) = harness.game.round() {
                    prop_assert!(round.index() < ROUND_COUNT);
                }
            }
        }
    }
}
