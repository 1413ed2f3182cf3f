//! CSV export of bookings.
//!
//! Writes a report file for spreadsheets. The target is replaced atomically so
//! a reader never sees a half-written report.

use crate::{Booking, Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    service_id: &'a str,
    service_name: &'a str,
    provider_id: &'a str,
    provider_name: &'a str,
    date: String,
    time: String,
    address: &'a str,
    notes: Option<&'a str>,
    price: String,
    status: &'static str,
    created_at: String,
}

impl<'a> From<&'a Booking> for CsvRow<'a> {
    fn from(booking: &'a Booking) -> Self {
        CsvRow {
            id: &booking.id,
            service_id: &booking.service_id,
            service_name: &booking.service_name,
            provider_id: &booking.provider_id,
            provider_name: &booking.provider_name,
            date: booking.scheduled_date.to_string(),
            time: booking.scheduled_time.to_string(),
            address: &booking.address,
            notes: booking.notes.as_deref(),
            price: booking.price.to_string(),
            status: booking.status.as_str(),
            created_at: booking.created_at.to_rfc3339(),
        }
    }
}

/// Write bookings to a CSV file with headers, replacing any previous file
///
/// Returns the number of rows written.
pub fn export_bookings_csv(bookings: &[Booking], path: &Path) -> Result<usize> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(temp.as_file());

    for booking in bookings {
        writer.serialize(CsvRow::from(booking))?;
    }

    // Flush and sync to disk
    writer.flush()?;
    drop(writer);
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} bookings to {:?}", bookings.len(), path);
    Ok(bookings.len())
}
