use thiserror::Error;

use crate::models::{RfcStatus, Role};

/// Input problems the user fixes and resubmits. Messages are user-facing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("A PIC must be selected")]
    NoPicSelected,

    #[error("Please enter your passkey")]
    MissingPasskey,

    #[error("Passkey must be at least {min} characters")]
    PasskeyTooShort { min: usize },

    #[error("Sprint team needs at least one member")]
    EmptyTeam,

    #[error("{0} is already on the sprint team")]
    DuplicateMember(String),

    #[error("Sprint needs at least one task")]
    NoTasks,

    #[error("Nothing to update")]
    EmptyPatch,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RFC {0} not found")]
    NotFound(String),

    #[error("RFC {0} already exists")]
    Duplicate(String),

    #[error("RFC {id} was modified concurrently (expected version {expected}, found {found})")]
    Conflict { id: String, expected: u64, found: u64 },

    #[error("RFC {0}: timeline and comments are append-only")]
    HistoryRewrite(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("RFC {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{role} may not {action}")]
    Forbidden { role: Role, action: &'static str },

    #[error("Cannot {action} RFC {id} while it is {from}")]
    InvalidTransition {
        id: String,
        from: RfcStatus,
        action: &'static str,
    },

    #[error("RFC {0} is waiting for a digital signature (TTE)")]
    SignatureRequired(String),

    #[error("RFC {id} was changed by someone else (version {expected} is stale); reload and retry")]
    Conflict { id: String, expected: u64 },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            StoreError::Conflict { id, expected, .. } => EngineError::Conflict { id, expected },
            other => EngineError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
