//! Core domain types for the home care booking system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Users and their roles
//! - Services and providers (pharmacies) from the catalog
//! - Bookings and the booking status state machine

use crate::money::Money;
use crate::slots::TimeSlot;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Users
// ============================================================================

/// Kind of account holding a session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Pharmacy,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Pharmacy => "pharmacy",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "pharmacy" => Ok(Role::Pharmacy),
            other => Err(Error::Validation(format!("unknown role '{}'", other))),
        }
    }
}

/// A user account as stored in the session (never carries a password)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(alias = "type")]
    pub role: Role,
    /// Provider operated by a pharmacy account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Category of home health service
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Measurement,
    Injection,
    Consultation,
    Therapy,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Measurement => "measurement",
            ServiceCategory::Injection => "injection",
            ServiceCategory::Consultation => "consultation",
            ServiceCategory::Therapy => "therapy",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "measurement" => Ok(ServiceCategory::Measurement),
            "injection" => Ok(ServiceCategory::Injection),
            "consultation" => Ok(ServiceCategory::Consultation),
            "therapy" => Ok(ServiceCategory::Therapy),
            other => Err(Error::Validation(format!(
                "unknown service category '{}'",
                other
            ))),
        }
    }
}

/// A bookable home health service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub duration_minutes: u32,
    pub category: ServiceCategory,
}

/// A pharmacy offering a subset of the service catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub address: String,
    pub distance_km: f64,
    pub rating: f64,
    pub review_count: u32,
    pub is_available: bool,
    pub estimated_time_label: String,
    pub serviced_service_ids: Vec<String>,
}

impl Provider {
    pub fn serves(&self, service_id: &str) -> bool {
        self.serviced_service_ids.iter().any(|id| id == service_id)
    }
}

/// The complete set of services and providers
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub services: Vec<Service>,
    pub providers: Vec<Provider>,
}

// ============================================================================
// Booking Types
// ============================================================================

/// Lifecycle status of a booking
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Arabic label shown to customers
    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "في الانتظار",
            BookingStatus::Confirmed => "مؤكد",
            BookingStatus::InProgress => "قيد التنفيذ",
            BookingStatus::Completed => "مكتمل",
            BookingStatus::Cancelled => "ملغي",
        }
    }

    /// Whether the booking still holds its provider slot
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::InProgress
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// The booking state machine.
    ///
    /// ```text
    /// pending ──► confirmed ──► in-progress ──► completed
    ///    │            │
    ///    └────────────┴──► cancelled
    /// ```
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (InProgress, Completed)
        )
    }

    /// Validate a transition, returning the new status
    pub fn transition_to(self, next: BookingStatus) -> Result<BookingStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| Error::Validation(format!("unknown booking status '{}'", s)))
    }
}

/// A request for one service from one provider at a specific date and time
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    /// Owning user; empty for records written before ownership was tracked
    #[serde(default)]
    pub user_id: String,
    pub service_id: String,
    pub service_name: String,
    #[serde(alias = "pharmacyId")]
    pub provider_id: String,
    #[serde(alias = "pharmacyName")]
    pub provider_name: String,
    #[serde(alias = "date", deserialize_with = "calendar_day::deserialize")]
    pub scheduled_date: NaiveDate,
    #[serde(alias = "time")]
    pub scheduled_time: TimeSlot,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub price: Money,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Whether this booking occupies the given provider slot
    pub fn holds_slot(&self, provider_id: &str, date: NaiveDate, time: TimeSlot) -> bool {
        self.status.is_active()
            && self.provider_id == provider_id
            && self.scheduled_date == date
            && self.scheduled_time == time
    }
}

/// Scheduled dates are written as `YYYY-MM-DD`; older records carry a full
/// RFC 3339 timestamp, which is reduced to its local calendar day.
mod calendar_day {
    use chrono::{DateTime, Local, NaiveDate};
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Local).date_naive())
            .map_err(|e| de::Error::custom(format!("invalid scheduled date '{}': {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use BookingStatus::*;
        let legal = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, InProgress),
            (Confirmed, Cancelled),
            (InProgress, Completed),
        ];

        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for to in BookingStatus::ALL {
            assert!(BookingStatus::Completed.transition_to(to).is_err());
            assert!(BookingStatus::Cancelled.transition_to(to).is_err());
        }
    }

    #[test]
    fn test_in_progress_cannot_be_cancelled() {
        let err = BookingStatus::InProgress
            .transition_to(BookingStatus::Cancelled)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: BookingStatus::InProgress,
                to: BookingStatus::Cancelled
            }
        ));
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&BookingStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!(
            "in_progress".parse::<BookingStatus>().unwrap(),
            BookingStatus::InProgress
        );
        assert!("done".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_booking_accepts_legacy_field_names() {
        let json = r#"{
            "id": "1700000000000",
            "serviceId": "1",
            "serviceName": "قياس الضغط",
            "pharmacyId": "1",
            "pharmacyName": "صيدلية النور",
            "date": "2024-01-20",
            "time": "10:30",
            "address": "شارع الملك فهد، الرياض",
            "notes": "",
            "price": 50,
            "status": "pending",
            "createdAt": "2024-01-19T08:00:00.000Z"
        }"#;

        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.provider_id, "1");
        assert_eq!(booking.user_id, "");
        assert_eq!(
            booking.scheduled_date,
            NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
        );
        assert_eq!(booking.scheduled_time.to_string(), "10:30");
        assert_eq!(booking.price, Money::from_major(50));
    }

    #[test]
    fn test_booking_hydrates_timestamp_dates() {
        let json = r#"{
            "id": "b1",
            "userId": "1",
            "serviceId": "1",
            "serviceName": "x",
            "providerId": "1",
            "providerName": "y",
            "scheduledDate": "2024-01-20T12:00:00.000Z",
            "scheduledTime": "09:00",
            "address": "a",
            "price": 50,
            "status": "confirmed",
            "createdAt": "2024-01-19T08:00:00Z"
        }"#;

        let booking: Booking = serde_json::from_str(json).unwrap();
        // Noon UTC is the same calendar day in every timezone within +/-11h
        assert_eq!(
            booking.scheduled_date,
            NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
        );
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_user_accepts_type_alias() {
        let json = r#"{
            "id": "2",
            "name": "صيدلية النور",
            "email": "nour@pharmacy.com",
            "phone": "01987654321",
            "type": "pharmacy",
            "createdAt": "2024-01-19T08:00:00Z"
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::Pharmacy);
        assert!(user.provider_id.is_none());
    }
}
