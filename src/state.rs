use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::engine::eligibility::EligibilityFilter;
use crate::models::booking::Booking;
use crate::models::driver::Driver;
use crate::models::notification::Notification;
use crate::models::slot::ResponseSlot;
use crate::observability::metrics::Metrics;

/// A booking together with every slot created when it was dispatched.
/// Mutations hold the map entry's write guard for their whole duration.
#[derive(Debug, Clone, Serialize)]
pub struct BookingRecord {
    pub booking: Booking,
    pub slots: Vec<ResponseSlot>,
}

pub struct AppState {
    pub drivers: DashMap<Uuid, Driver>,
    pub bookings: DashMap<Uuid, BookingRecord>,
    /// slot id -> owning booking id
    pub slot_index: DashMap<Uuid, Uuid>,
    pub eligibility: EligibilityFilter,
    pub notifications_tx: broadcast::Sender<Notification>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize) -> Self {
        Self::with_eligibility(event_buffer_size, EligibilityFilter::default())
    }

    pub fn with_eligibility(event_buffer_size: usize, eligibility: EligibilityFilter) -> Self {
        let (notifications_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            drivers: DashMap::new(),
            bookings: DashMap::new(),
            slot_index: DashMap::new(),
            eligibility,
            notifications_tx,
            metrics: Metrics::new(),
        }
    }

    pub fn insert_driver(&self, driver: Driver) {
        self.drivers.insert(driver.id, driver);
    }

    pub fn insert_booking(&self, booking: Booking) {
        self.bookings.insert(
            booking.id,
            BookingRecord {
                booking,
                slots: Vec::new(),
            },
        );
    }

    pub(crate) fn notify(&self, notification: Notification) {
        // No subscribers is fine; delivery belongs to the notifier.
        let _ = self.notifications_tx.send(notification);
    }
}
