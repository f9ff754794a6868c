//! Free text answer matching
//!
//! Answers typed by a team are compared against the accepted answers of
//! a riddle after normalization. When typo tolerance is enabled, answers
//! that are close enough by edit distance are accepted as well.

use itertools::Itertools;

use crate::constants::matcher::{MIN_SINGLE_TYPO_LENGTH, SIMILARITY_THRESHOLD};

/// Normalizes an answer string for comparison
///
/// Trims the string, lowercases it and collapses every run of whitespace
/// into a single space.
///
/// # Arguments
/// * `answer` - The answer string to clean
///
/// # Returns
/// * Cleaned answer string
pub fn normalize(answer: &str) -> String {
    answer.to_lowercase().split_whitespace().join(" ")
}

/// Whether the character counts as a word character
fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Checks whether a normalized input carries anything worth comparing
///
/// Empty input and input made only of punctuation and symbols never match.
fn is_meaningful(normalized: &str) -> bool {
    normalized.chars().any(is_word)
}

/// Similarity of two strings in `[0, 1]`, one minus the Levenshtein
/// distance over the length of the longer string
///
/// Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Whether two normalized strings are close enough to count as a typo
///
/// Accepted when the similarity reaches [`SIMILARITY_THRESHOLD`], or when a
/// single edit separates strings of at least [`MIN_SINGLE_TYPO_LENGTH`]
/// characters.
fn is_near_miss(input: &str, answer: &str) -> bool {
    if similarity(input, answer) >= SIMILARITY_THRESHOLD {
        return true;
    }
    let longest = input.chars().count().max(answer.chars().count());
    longest >= MIN_SINGLE_TYPO_LENGTH && strsim::levenshtein(input, answer) == 1
}

/// Checks a typed answer against the accepted answers of a riddle
///
/// # Arguments
/// * `input` - The text submitted by a team
/// * `accepted` - Accepted answers, in any casing or spacing
/// * `typo_tolerant` - Whether near misses by edit distance are accepted
///
/// # Returns
/// * `true` if the input matches any accepted answer
pub fn is_correct<S: AsRef<str>>(input: &str, accepted: &[S], typo_tolerant: bool) -> bool {
    let input = normalize(input);
    if !is_meaningful(&input) {
        return false;
    }

    let accepted = accepted.iter().map(|a| normalize(a.as_ref())).collect_vec();

    if accepted.iter().any(|a| *a == input) {
        return true;
    }

    typo_tolerant && accepted.iter().any(|a| is_near_miss(&input, a))
}
