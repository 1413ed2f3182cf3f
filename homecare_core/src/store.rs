//! Booking collection persistence.
//!
//! The whole collection lives under one storage key as a JSON array.
//! Every mutation runs through [`BookingStore::update`], which holds the
//! key's exclusive lock across load, modify and save.

use crate::storage::LocalStorage;
use crate::{Booking, Error, Result};
use std::sync::Mutex;

/// Durable storage for the booking collection
pub trait BookingStore {
    /// Load every booking in insertion order; a missing store is empty
    fn load_all(&self) -> Result<Vec<Booking>>;

    /// Overwrite the stored collection
    fn save_all(&self, bookings: &[Booking]) -> Result<()>;

    /// Load, apply `f`, and save only if `f` succeeded, all under one lock
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Booking>) -> Result<T>;
}

/// JSON array of bookings under a [`LocalStorage`] key
#[derive(Clone, Debug)]
pub struct JsonBookingStore {
    storage: LocalStorage,
    key: String,
}

impl JsonBookingStore {
    pub fn new(storage: LocalStorage, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the stored collection with an empty one
    ///
    /// Recovery path for a store that no longer parses.
    pub fn reset(&self) -> Result<()> {
        let _guard = self.storage.lock(&self.key)?;
        self.save_all(&[])?;
        tracing::warn!("Reset booking store '{}' to an empty collection", self.key);
        Ok(())
    }
}

impl BookingStore for JsonBookingStore {
    fn load_all(&self) -> Result<Vec<Booking>> {
        let Some(contents) = self.storage.get(&self.key)? else {
            return Ok(Vec::new());
        };

        let bookings: Vec<Booking> = serde_json::from_str(&contents).map_err(|e| {
            Error::Persistence(format!(
                "booking store '{}' is corrupt ({:?}): {}",
                self.key,
                self.storage.value_path(&self.key),
                e
            ))
        })?;

        tracing::debug!("Loaded {} bookings from '{}'", bookings.len(), self.key);
        Ok(bookings)
    }

    fn save_all(&self, bookings: &[Booking]) -> Result<()> {
        let contents = serde_json::to_string(bookings).map_err(|e| {
            Error::Persistence(format!("failed to encode bookings for '{}': {}", self.key, e))
        })?;
        self.storage.set(&self.key, &contents)?;
        tracing::debug!("Saved {} bookings to '{}'", bookings.len(), self.key);
        Ok(())
    }

    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Booking>) -> Result<T>,
    {
        let _guard = self.storage.lock(&self.key)?;
        let mut bookings = self.load_all()?;
        let out = f(&mut bookings)?;
        self.save_all(&bookings)?;
        Ok(out)
    }
}

/// In-process store for headless embedding and tests
#[derive(Debug, Default)]
pub struct MemoryBookingStore {
    bookings: Mutex<Vec<Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bookings(bookings: Vec<Booking>) -> Self {
        Self {
            bookings: Mutex::new(bookings),
        }
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Vec<Booking>>> {
        self.bookings
            .lock()
            .map_err(|_| Error::Persistence("in-memory booking store is poisoned".into()))
    }
}

impl BookingStore for MemoryBookingStore {
    fn load_all(&self) -> Result<Vec<Booking>> {
        Ok(self.guard()?.clone())
    }

    fn save_all(&self, bookings: &[Booking]) -> Result<()> {
        *self.guard()? = bookings.to_vec();
        Ok(())
    }

    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Booking>) -> Result<T>,
    {
        let mut stored = self.guard()?;
        let mut working = stored.clone();
        let out = f(&mut working)?;
        *stored = working;
        Ok(out)
    }
}
