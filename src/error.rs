use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::transcript::Strategy;

/// Broad category of a failure, used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InputValidation,
    Upstream,
    Configuration,
    Provider,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InputValidation => write!(f, "input-validation"),
            ErrorKind::Upstream => write!(f, "upstream"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Provider => write!(f, "provider"),
        }
    }
}

/// One failed transcript strategy and why it failed
#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: Strategy,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("{0} is not configured")]
    MissingConfig(&'static str),

    #[error("failed to read config {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    #[error("{service} request failed: {reason}")]
    Upstream { service: &'static str, reason: String },

    #[error("OpenAI API error: {0}")]
    Provider(String),

    #[error("failed to extract video transcript ({})", describe_failures(.0))]
    TranscriptUnavailable(Vec<StrategyFailure>),

    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn upstream(service: &'static str, reason: impl fmt::Display) -> Self {
        Error::Upstream {
            service,
            reason: reason.to_string(),
        }
    }

    /// The message without the category prefix, for callers that add their own
    pub fn detail(&self) -> String {
        match self {
            Error::Provider(message) => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidUrl(_) => ErrorKind::InputValidation,
            Error::MissingConfig(_) | Error::ConfigFile { .. } => ErrorKind::Configuration,
            Error::Provider(_) => ErrorKind::Provider,
            Error::Upstream { .. }
            | Error::TranscriptUnavailable(_)
            | Error::Http(_)
            | Error::Json(_)
            | Error::Xml(_)
            | Error::Io(_) => ErrorKind::Upstream,
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Request URLs can carry credentials, so they are dropped from the message
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.without_url())
    }
}

fn describe_failures(failures: &[StrategyFailure]) -> String {
    if failures.is_empty() {
        return "no strategies configured".to_string();
    }
    failures
        .iter()
        .map(|f| format!("{}: {}", f.strategy, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
