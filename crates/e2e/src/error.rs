//! Error types for lifecycle verification

use thiserror::Error;

use crate::api::StatusOutcome;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Playwright bridge not found. Install with: npm install playwright")]
    BridgeNotFound,

    #[error("Bridge failed to start: {0}")]
    BridgeStartup(String),

    #[error("Browser command failed: {0}")]
    Bridge(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Login did not reach the dashboard within {timeout_ms} ms")]
    AuthenticationTimeout { timeout_ms: u64 },

    #[error("Username and password must be non-empty")]
    InvalidCredentials,

    #[error("Employee id was not assigned after creating employee")]
    IdentifierNotAssigned,

    #[error("Update of {field} to {value:?} was not verifiable after submit")]
    UpdateVerificationFailed { field: String, value: String },

    #[error("Delete confirmation did not appear or resolve in time")]
    DeleteConfirmationTimeout,

    #[error("Backend read for employee {employee_id} returned {outcome}, expected {expected}")]
    ConsistencyMismatch {
        employee_id: String,
        expected: StatusOutcome,
        outcome: StatusOutcome,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
