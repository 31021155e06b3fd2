//! Error types for the meetbot ecosystem.

use thiserror::Error;

/// Errors that can occur in meetbot operations.
#[derive(Error, Debug)]
pub enum MeetbotError {
    #[error("invalid schedule format {0}")]
    ScheduleFormat(String),

    #[error("invalid schedule duration {0}")]
    InvalidDuration(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Notes creation failed: {0}")]
    NotesCreation(String),

    #[error("Tracker error ({status}): {message}")]
    Tracker { status: u16, message: String },

    #[error("Tracker resource not found: {0}")]
    TrackerNotFound(String),

    #[error("Tracker request failed: {0}")]
    TrackerTransport(String),
}

impl MeetbotError {
    /// Whether this is the tracker's distinct not-found failure
    /// (used to tell a missing template apart from an API outage).
    pub fn is_not_found(&self) -> bool {
        matches!(self, MeetbotError::TrackerNotFound(_))
    }
}

/// Result type alias for meetbot operations.
pub type MeetbotResult<T> = Result<T, MeetbotError>;
