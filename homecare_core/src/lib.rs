#![forbid(unsafe_code)]

//! Core domain model and business logic for the home care booking system.
//!
//! This crate provides:
//! - Domain types (users, services, providers, bookings)
//! - Catalog of services and pharmacies
//! - Booking lifecycle engine
//! - Persistence (local key/value storage, booking store, session)
//! - CSV export

pub mod types;
pub mod error;
pub mod money;
pub mod slots;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod storage;
pub mod store;
pub mod session;
pub mod engine;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use money::Money;
pub use slots::{all_slots, TimeSlot};
pub use catalog::default_catalog;
pub use config::Config;
pub use storage::LocalStorage;
pub use store::{BookingStore, JsonBookingStore, MemoryBookingStore};
pub use session::{ProfileUpdate, Registration, Session, SessionProvider};
pub use engine::{BookingEngine, BookingStats, NewBooking};
pub use export::export_bookings_csv;
