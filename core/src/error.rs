use crate::{money::Money, types::JobId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Invalid amount: {raw}")]
    InvalidAmount { raw: String },

    #[error("Job {job_id} is not in the catalog")]
    UnknownJob { job_id: JobId },

    #[error("Job {job_id} already has a worker")]
    AlreadyOwned { job_id: JobId },

    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: Money, available: Money },

    #[error("Persisted state invalid: {reason}")]
    PersistedStateInvalid { reason: String },

    #[error("Invalid catalog config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GameError {
    /// Expected gameplay outcomes the presentation layer renders as feedback.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownJob { .. } | Self::AlreadyOwned { .. } | Self::InsufficientFunds { .. }
        )
    }

    pub(crate) fn invalid_amount(raw: impl ToString) -> Self {
        Self::InvalidAmount { raw: raw.to_string() }
    }

    pub(crate) fn persisted(reason: impl Into<String>) -> Self {
        Self::PersistedStateInvalid { reason: reason.into() }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig { reason: reason.into() }
    }
}

pub type GameResult<T> = Result<T, GameError>;
