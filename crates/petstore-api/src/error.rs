use std::fmt;

use thiserror::Error;

/// A timestamp did not have the shape its declared format promises.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("timestamp {raw:?} is not valid {format}: {reason}")]
pub struct FormatError {
    pub raw: String,
    pub format: String,
    pub reason: String,
}

impl FormatError {
    pub fn new(raw: &str, format: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.to_string(),
            format: format.to_string(),
            reason: reason.into(),
        }
    }
}

/// Expected/actual mismatch raised by a scenario check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (expected: {}, actual: {})",
            self.message, self.expected, self.actual
        )
    }
}

impl std::error::Error for AssertionFailure {}

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: &'static str,
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("{method} {url} returned status {actual}, expected {expected}; body: {body}")]
    UnexpectedStatus {
        method: &'static str,
        url: String,
        expected: u16,
        actual: u16,
        body: String,
    },
    #[error("assertion failed: {0}")]
    Assertion(AssertionFailure),
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("response does not match schema: {}", .errors.join("; "))]
    Schema { errors: Vec<String> },
    #[error("invalid JSON schema: {0}")]
    InvalidSchema(String),
    #[error("no request/response specs installed")]
    SpecsNotInstalled,
    #[error("request spec requires a base URI")]
    MissingBaseUri,
}

impl SuiteError {
    /// Stable label used when reporting scenario outcomes.
    pub fn category(&self) -> &'static str {
        match self {
            SuiteError::Format(_) => "format",
            SuiteError::Transport { .. } => "transport",
            SuiteError::UnexpectedStatus { .. } => "status",
            SuiteError::Assertion(_) => "assertion",
            SuiteError::Decode { .. } => "decode",
            SuiteError::Schema { .. } => "schema",
            SuiteError::InvalidSchema(_)
            | SuiteError::SpecsNotInstalled
            | SuiteError::MissingBaseUri => "setup",
        }
    }
}

impl From<AssertionFailure> for SuiteError {
    fn from(failure: AssertionFailure) -> Self {
        SuiteError::Assertion(failure)
    }
}
