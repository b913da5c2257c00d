use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

use crate::coords::ValidationError;

/// Message shown for every fetch failure, whatever the cause.
pub const FETCH_FAILURE_MESSAGE: &str =
    "Error fetching weather data. Please check your coordinates and try again.";

/// Which request of a provider pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Current,
    Forecast,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchStage::Current => "current",
            FetchStage::Forecast => "forecast",
        })
    }
}

#[derive(Debug, Error)]
pub enum FetchErrorKind {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// A failed provider request, tagged with the stage that failed.
#[derive(Debug, Error)]
#[error("{stage} request failed, {kind}")]
pub struct FetchError {
    pub stage: FetchStage,
    #[source]
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(stage: FetchStage, kind: FetchErrorKind) -> Self {
        Self { stage, kind }
    }

    pub fn transport(stage: FetchStage, err: reqwest::Error) -> Self {
        Self::new(stage, FetchErrorKind::Transport(err))
    }

    pub fn status(stage: FetchStage, status: StatusCode, body: &str) -> Self {
        Self::new(stage, FetchErrorKind::Status { status, body: truncate_body(body) })
    }

    pub fn decode(stage: FetchStage, err: serde_json::Error) -> Self {
        Self::new(stage, FetchErrorKind::Decode(err))
    }

    pub fn malformed(stage: FetchStage, what: impl Into<String>) -> Self {
        Self::new(stage, FetchErrorKind::Malformed(what.into()))
    }
}

/// Outcome of a failed lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl LookupError {
    /// Text for the error banner. Fetch failures collapse to one generic message.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Validation(err) => err.to_string(),
            LookupError::Fetch(_) => FETCH_FAILURE_MESSAGE.to_string(),
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
