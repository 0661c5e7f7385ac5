//! Boundary validation
//!
//! Checks the store itself never performs: email syntax, the score range
//! and the list bounds.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::model::{MAX_SCORE, NewScore, NewUser, UserId, UserUpdate};
use crate::protocol::response::{Response, status};
use crate::service::ScoreFilter;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("score {0} is outside 0..={max}", max = MAX_SCORE)]
    ScoreOutOfRange(u8),
    #[error("upper bound must be greater than lower bound")]
    InvertedBounds,
}

impl From<ValidationError> for Response {
    fn from(err: ValidationError) -> Self {
        let code = match err {
            ValidationError::InvertedBounds => status::BAD_REQUEST,
            _ => status::UNPROCESSABLE,
        };
        Self::error(code, err.to_string())
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

pub fn new_user(user: &NewUser) -> Result<(), ValidationError> {
    check_email(&user.email)
}

/// An empty email means "leave unchanged" and is not checked
pub fn user_update(update: &UserUpdate) -> Result<(), ValidationError> {
    match update.email.as_deref() {
        Some(email) if !email.is_empty() => check_email(email),
        _ => Ok(()),
    }
}

pub fn new_score(score: &NewScore) -> Result<(), ValidationError> {
    if score.score > MAX_SCORE {
        return Err(ValidationError::ScoreOutOfRange(score.score));
    }
    Ok(())
}

/// Build a list filter from raw bounds. Missing bounds default to the full
/// range and an upper bound past [`MAX_SCORE`] is clamped to it.
pub fn score_filter(
    user_id: Option<UserId>,
    lower_bound: Option<u32>,
    upper_bound: Option<u32>,
) -> Result<ScoreFilter, ValidationError> {
    let max = u32::from(MAX_SCORE);
    let lower = lower_bound.unwrap_or(0);
    let upper = upper_bound.unwrap_or(max).min(max);
    if upper <= lower {
        return Err(ValidationError::InvertedBounds);
    }

    // upper <= MAX_SCORE and lower < upper, so both fit
    Ok(ScoreFilter {
        user_id,
        lower: lower as u8,
        upper: upper as u8,
    })
}
