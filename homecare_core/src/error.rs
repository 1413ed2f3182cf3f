//! Error types for the homecare_core library.

use crate::BookingStatus;
use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for homecare_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Bad input to a booking or session operation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown booking, service or provider id
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Status change not allowed by the booking state machine
    #[error("Invalid transition: cannot move booking from '{from}' to '{to}'")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// Another active booking already holds the provider slot
    #[error("Slot conflict: provider '{provider_id}' is already booked on {date} at {time}")]
    SlotConflict {
        provider_id: String,
        date: NaiveDate,
        time: String,
    },

    /// Booking store could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Actor is not allowed to perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }
}
