//! Team name validation
//!
//! Team names are chosen in the lobby before a match starts. This module
//! trims them, filters inappropriate content and makes sure both teams
//! can be told apart.

use rustrict::CensorStr;
use serde::Serialize;
use thiserror::Error;

use crate::constants::team::MAX_NAME_LENGTH;

/// Errors that can occur during team name validation
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Both teams requested the same name
    #[error("name already in-use")]
    Used,
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Sinful,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
}

/// Cleans and validates a single team name
///
/// # Returns
///
/// The trimmed name on success, or an error describing why the name
/// was rejected.
///
/// # Errors
///
/// * `Error::TooLong` - Name exceeds 30 characters after trimming
/// * `Error::Empty` - Name is empty after trimming whitespace
/// * `Error::Sinful` - Name contains inappropriate content
pub fn clean_name(name: &str) -> Result<String, Error> {
    let name = rustrict::trim_whitespace(name);
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::TooLong);
    }
    if name.is_empty() {
        return Err(Error::Empty);
    }
    if name.is_inappropriate() {
        return Err(Error::Sinful);
    }
    Ok(name.to_owned())
}

/// Cleans and validates the names of both teams
///
/// # Errors
///
/// Any error of [`clean_name`] for either name, or `Error::Used` when both
/// names are equal ignoring case.
pub fn clean_pair(team_a: &str, team_b: &str) -> Result<(String, String), Error> {
    let team_a = clean_name(team_a)?;
    let team_b = clean_name(team_b)?;
    if team_a.to_lowercase() == team_b.to_lowercase() {
        return Err(Error::Used);
    }
    Ok((team_a, team_b))
}
