use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::turn::TurnTransitionError;

/// Turn-local failures. Every variant is recovered inside the turn and
/// surfaces on the response as a [`TurnNotice`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("ungrounded claim replaced for `{subject}.{attribute}`: {reason}")]
    UngroundedClaim { subject: String, attribute: String, reason: String },
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("no intent matched the utterance")]
    AmbiguousIntent,
    #[error("could not detect the utterance language; using `{fallback}`")]
    LanguageDetectionFailure { fallback: String },
}

impl PolicyError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UngroundedClaim { .. } => "ungrounded_claim",
            Self::CatalogUnavailable(_) => "catalog_unavailable",
            Self::AmbiguousIntent => "ambiguous_intent",
            Self::LanguageDetectionFailure { .. } => "language_detection_failure",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnNotice {
    pub code: String,
    pub message: String,
}

impl From<&PolicyError> for TurnNotice {
    fn from(value: &PolicyError) -> Self {
        Self { code: value.code().to_string(), message: value.to_string() }
    }
}

impl From<PolicyError> for TurnNotice {
    fn from(value: PolicyError) -> Self {
        Self::from(&value)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog lookup timed out after {ms}ms")]
    Timeout { ms: u64 },
    #[error("catalog backend unavailable: {0}")]
    Unavailable(String),
    #[error("could not read catalog `{path}`: {source}")]
    Load { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

impl CatalogError {
    pub fn to_policy_error(&self) -> PolicyError {
        PolicyError::CatalogUnavailable(self.to_string())
    }
}

/// Failures that stop a turn before a response exists.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("utterance is empty")]
    EmptyUtterance,
    #[error(transparent)]
    Transition(#[from] TurnTransitionError),
}
