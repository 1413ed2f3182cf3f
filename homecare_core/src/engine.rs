//! Booking lifecycle engine.
//!
//! Creates bookings against the catalog, enforces the status state machine
//! and scopes every read and write to what the acting session may see:
//! - a customer sees the bookings they created
//! - a pharmacy sees the bookings made with the provider it operates

use crate::money::Money;
use crate::session::Session;
use crate::slots::TimeSlot;
use crate::store::BookingStore;
use crate::{Booking, BookingStatus, Catalog, Error, Result, Role};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;

type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Input to [`BookingEngine::create_booking`]
#[derive(Clone, Debug)]
pub struct NewBooking {
    pub service_id: String,
    pub provider_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub address: String,
    pub notes: Option<String>,
}

/// Dashboard figures over the bookings visible to a session
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStats {
    pub pending: usize,
    pub confirmed: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Sum of completed booking prices
    pub total_revenue: Money,
    /// Completed bookings scheduled for today
    pub today_revenue: Money,
}

pub struct BookingEngine<'a, S> {
    catalog: &'a Catalog,
    store: S,
    session: Session,
    clock: Clock,
}

impl<'a, S: BookingStore> BookingEngine<'a, S> {
    pub fn new(catalog: &'a Catalog, store: S, session: Session) -> Self {
        Self {
            catalog,
            store,
            session,
            clock: Box::new(Local::now),
        }
    }

    /// Replace the wall clock, e.g. to pin "today" in tests
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Local> + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn can_see(&self, booking: &Booking) -> bool {
        match self.session.role {
            Role::User => booking.user_id == self.session.user_id,
            Role::Pharmacy => {
                self.session.provider_id.as_deref() == Some(booking.provider_id.as_str())
            }
        }
    }

    /// Book a service; the new booking starts out `pending`
    ///
    /// Preconditions are checked in order and the first failure is returned.
    /// The slot-conflict check runs under the store lock so two concurrent
    /// requests for the same provider slot cannot both succeed.
    pub fn create_booking(&self, request: NewBooking) -> Result<Booking> {
        if self.session.role != Role::User {
            return Err(Error::Unauthorized(
                "only customer accounts can book services".into(),
            ));
        }

        let service = self
            .catalog
            .service(&request.service_id)
            .ok_or_else(|| Error::not_found("service", &request.service_id))?;
        let provider = self
            .catalog
            .provider(&request.provider_id)
            .ok_or_else(|| Error::not_found("provider", &request.provider_id))?;

        if !provider.is_available {
            return Err(Error::Validation(format!(
                "provider '{}' is not taking bookings",
                provider.id
            )));
        }
        if !provider.serves(&service.id) {
            return Err(Error::Validation(format!(
                "provider '{}' does not offer service '{}'",
                provider.id, service.id
            )));
        }

        let now = (self.clock)();
        if request.date < now.date_naive() {
            return Err(Error::Validation(format!(
                "date {} is in the past",
                request.date
            )));
        }

        let time = TimeSlot::canonical(&request.time)?;

        let address = request.address.trim();
        if address.is_empty() {
            return Err(Error::Validation("address must not be empty".into()));
        }

        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let booking = self.store.update(|bookings| {
            if bookings
                .iter()
                .any(|b| b.holds_slot(&provider.id, request.date, time))
            {
                return Err(Error::SlotConflict {
                    provider_id: provider.id.clone(),
                    date: request.date,
                    time: time.to_string(),
                });
            }

            let mut id = uuid::Uuid::new_v4().to_string();
            while bookings.iter().any(|b| b.id == id) {
                id = uuid::Uuid::new_v4().to_string();
            }

            let booking = Booking {
                id,
                user_id: self.session.user_id.clone(),
                service_id: service.id.clone(),
                service_name: service.name.clone(),
                provider_id: provider.id.clone(),
                provider_name: provider.name.clone(),
                scheduled_date: request.date,
                scheduled_time: time,
                address: address.to_string(),
                notes,
                price: service.price,
                status: BookingStatus::Pending,
                created_at: now.with_timezone(&Utc),
            };
            bookings.push(booking.clone());
            Ok(booking)
        })?;

        tracing::info!(
            "Created booking {} for service '{}' with provider '{}' on {} at {}",
            booking.id,
            booking.service_id,
            booking.provider_id,
            booking.scheduled_date,
            booking.scheduled_time
        );
        Ok(booking)
    }

    /// Bookings visible to the session, in creation order
    ///
    /// With a filter, only bookings whose status is in the filter are returned.
    pub fn list_bookings(&self, filter: Option<&[BookingStatus]>) -> Result<Vec<Booking>> {
        let bookings = self
            .store
            .load_all()?
            .into_iter()
            .filter(|b| self.can_see(b))
            .filter(|b| filter.map_or(true, |statuses| statuses.contains(&b.status)))
            .collect::<Vec<_>>();

        tracing::debug!("Listed {} bookings", bookings.len());
        Ok(bookings)
    }

    pub fn get_booking(&self, booking_id: &str) -> Result<Booking> {
        self.store
            .load_all()?
            .into_iter()
            .find(|b| b.id == booking_id && self.can_see(b))
            .ok_or_else(|| Error::not_found("booking", booking_id))
    }

    /// Move a booking along the state machine
    ///
    /// Pharmacies may apply any legal transition to their own bookings;
    /// customers may only cancel.
    pub fn update_status(&self, booking_id: &str, next: BookingStatus) -> Result<Booking> {
        let updated = self.store.update(|bookings| {
            let booking = bookings
                .iter_mut()
                .find(|b| b.id == booking_id && self.can_see(b))
                .ok_or_else(|| Error::not_found("booking", booking_id))?;

            let status = booking.status.transition_to(next)?;
            if self.session.role == Role::User && status != BookingStatus::Cancelled {
                return Err(Error::Unauthorized(format!(
                    "customers cannot mark bookings as '{}'",
                    status
                )));
            }

            booking.status = status;
            Ok(booking.clone())
        })?;

        tracing::info!("Booking {} is now {}", updated.id, updated.status);
        Ok(updated)
    }

    pub fn stats(&self) -> Result<BookingStats> {
        let today = (self.clock)().date_naive();
        let mut stats = BookingStats::default();

        for booking in self.list_bookings(None)? {
            match booking.status {
                BookingStatus::Pending => stats.pending += 1,
                BookingStatus::Confirmed => stats.confirmed += 1,
                BookingStatus::InProgress => stats.in_progress += 1,
                BookingStatus::Cancelled => stats.cancelled += 1,
                BookingStatus::Completed => {
                    stats.completed += 1;
                    stats.total_revenue += booking.price;
                    if booking.scheduled_date == today {
                        stats.today_revenue += booking.price;
                    }
                }
            }
        }

        Ok(stats)
    }
}
