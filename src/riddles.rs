//! Riddle content and the deck played during a match
//!
//! A deck holds exactly one riddle per regular round plus a separate
//! riddle reserved for the sudden-death tiebreaker. Decks can be loaded
//! from JSON and are validated before a game accepts them.

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::constants::{riddle::*, rounds::ROUND_COUNT};

/// A single riddle with its accepted answers
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Riddle {
    /// The riddle text, represents what's being asked
    #[garde(length(chars, min = 1, max = MAX_QUESTION_LENGTH))]
    question: String,
    /// Optional clue that costs half of the progress when used
    #[garde(length(chars, min = 1, max = MAX_HINT_LENGTH))]
    #[serde(default)]
    hint: Option<String>,
    /// Accepted answers in order of preference, the first one is revealed on failure
    #[garde(length(min = 1, max = MAX_ANSWER_COUNT),
        inner(length(chars, min = 1, max = MAX_ANSWER_LENGTH))
    )]
    answers: Vec<String>,
}

impl Riddle {
    /// Creates a riddle from its parts
    pub fn new<Q, A>(question: Q, hint: Option<&str>, answers: A) -> Self
    where
        Q: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            question: question.into(),
            hint: hint.map(str::to_owned),
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    /// The riddle text
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The hint, if the riddle has one
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// All accepted answers
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// The canonical answer revealed when both teams fail
    pub fn first_answer(&self) -> &str {
        self.answers.first().map_or("N/A", String::as_str)
    }
}

/// The ordered riddles of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Deck {
    /// One riddle per regular round, in play order
    #[garde(length(equal = ROUND_COUNT), dive)]
    riddles: Vec<Riddle>,
    /// Tiebreaker riddle, it never shows a hint
    #[garde(dive)]
    sudden_death: Riddle,
}

impl Deck {
    /// Creates a deck from the round riddles and the tiebreaker riddle
    ///
    /// The deck is not validated here, see [`Validate::validate`].
    pub fn new(riddles: Vec<Riddle>, sudden_death: Riddle) -> Self {
        Self {
            riddles,
            sudden_death,
        }
    }

    /// Returns the riddle for a regular round
    ///
    /// # Panics
    ///
    /// Panics if `round` is outside the deck. The round machine never
    /// advances past the last round, so this is a programming error.
    pub fn riddle(&self, round: usize) -> &Riddle {
        assert!(
            round < self.riddles.len(),
            "round {round} is outside of a deck of {} riddles",
            self.riddles.len()
        );
        &self.riddles[round]
    }

    /// Returns the tiebreaker riddle
    pub fn sudden_death(&self) -> &Riddle {
        &self.sudden_death
    }

    /// Number of regular rounds in this deck
    pub fn len(&self) -> usize {
        self.riddles.len()
    }

    /// Checks if the deck has no regular riddles
    pub fn is_empty(&self) -> bool {
        self.riddles.is_empty()
    }
}

const BUILT_IN: [(&str, &str, &[&str]); ROUND_COUNT] = [
    (
        "I'm tall when I'm young, and short when I'm old. What am I?",
        "It melts as it gives light.",
        &["candle"],
    ),
    (
        "What has keys but can't open locks?",
        "It can make music or type a letter.",
        &["piano", "keyboard"],
    ),
    (
        "What must be broken before you can use it?",
        "Common at breakfast.",
        &["egg", "an egg"],
    ),
    (
        "I come once in a minute, twice in a moment, but never in a thousand years. What am I?",
        "Look at letters.",
        &["letter m", "m"],
    ),
    (
        "What has many teeth but can't bite?",
        "You comb your hair with it.",
        &["comb"],
    ),
    (
        "The more you take away, the more I become. What am I?",
        "You make me when you dig.",
        &["hole"],
    ),
    (
        "I have one eye but cannot see. What am I?",
        "Use me to sew.",
        &["needle", "sewing needle"],
    ),
    (
        "What can travel around the world while staying in the same corner?",
        "Put it on an envelope.",
        &["stamp", "postage stamp"],
    ),
    (
        "What gets wetter the more it dries?",
        "You use it after shower.",
        &["towel"],
    ),
    (
        "What comes down but never goes up?",
        "You can carry an umbrella for it.",
        &["rain"],
    ),
    (
        "I'm always in front of you but can't be seen. What am I?",
        "It's yet to happen.",
        &["future"],
    ),
    (
        "What has a neck but no head?",
        "You pour liquids from it.",
        &["bottle"],
    ),
    (
        "I have branches, but no leaves, trunk, or fruit. What am I?",
        "You visit it for transactions.",
        &["bank"],
    ),
    (
        "What can be cracked, made, told and played?",
        "It often makes people laugh.",
        &["joke", "a joke"],
    ),
    (
        "I'm not alive but I grow; I don't have lungs but I need air. What am I?",
        "Keep water away from me.",
        &["fire"],
    ),
    (
        "What has words but never speaks?",
        "You borrow knowledge from it.",
        &["book"],
    ),
    (
        "The more you take, the more you leave behind. What am I?",
        "Walk and see.",
        &["footsteps", "steps", "footstep"],
    ),
    (
        "I run but never walk; I have a mouth but never talk. What am I?",
        "Find me in nature.",
        &["river", "stream", "water"],
    ),
    (
        "I'm light as a feather, yet the strongest person can't hold me for more than a few minutes. What am I?",
        "You breathe me.",
        &["breath", "air"],
    ),
    (
        "What has one head, one foot and four legs?",
        "You use it every night.",
        &["bed"],
    ),
    (
        "What begins with T, ends with T, and has T in it?",
        "Pour me out when it's tea time.",
        &["teapot"],
    ),
    (
        "What has cities, but no houses; mountains but no trees; and water but no fish?",
        "You can fold me.",
        &["map"],
    ),
    (
        "I'm so fragile that saying my name breaks me. What am I?",
        "Be quiet.",
        &["silence", "quiet"],
    ),
    (
        "I am taken before you get it. What am I?",
        "Photographers love me.",
        &["photograph", "photo", "picture", "snapshot"],
    ),
    (
        "What goes up when the rain comes down?",
        "You put it up to stay dry.",
        &["umbrella", "parasol"],
    ),
    (
        "What flies without wings?",
        "It's often said '___ flies.'",
        &["time"],
    ),
];

impl Default for Deck {
    /// The built-in deck of 26 riddles and its tiebreaker
    fn default() -> Self {
        Self::new(
            BUILT_IN
                .iter()
                .map(|(question, hint, answers)| {
                    Riddle::new(*question, Some(*hint), answers.iter().copied())
                })
                .collect(),
            Riddle::new(
                "I am an odd number. Take away a letter and I become even. What number am I?",
                None,
                ["7", "seven"],
            ),
        )
    }
}
