//! Read-only projections over booking records. Each record is cloned under its
//! shard read guard, so a view never sees a half-applied mutation.

use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::{Booking, BookingSummary, DispatchState, ReviewStatus};
use crate::models::driver::DriverProfile;
use crate::models::slot::{ResponseSlot, SlotStatus};
use crate::state::{AppState, BookingRecord};

#[derive(Debug, Clone, Serialize)]
pub struct AllocationCandidate {
    pub booking: Booking,
    pub accepted: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedResponse {
    pub slot: ResponseSlot,
    /// `None` when the directory no longer knows the respondent.
    pub driver: Option<DriverProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingOffer {
    pub slot: ResponseSlot,
    pub booking: BookingSummary,
}

pub fn get_booking(state: &AppState, booking_id: Uuid) -> Result<BookingRecord, AppError> {
    state
        .bookings
        .get(&booking_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))
}

fn bookings_where(state: &AppState, keep: impl Fn(&Booking) -> bool) -> Vec<Booking> {
    let mut bookings: Vec<Booking> = state
        .bookings
        .iter()
        .filter(|entry| keep(&entry.value().booking))
        .map(|entry| entry.value().booking.clone())
        .collect();

    bookings.sort_by_key(|booking| (booking.scheduled_at, booking.id));
    bookings
}

/// Everything the admin still has to act on.
pub fn list_pending_for_admin(state: &AppState) -> Vec<Booking> {
    bookings_where(state, |booking| !booking.is_allocated())
}

/// Bookings still waiting for a package-type decision.
pub fn list_awaiting_review(state: &AppState) -> Vec<Booking> {
    bookings_where(state, |booking| {
        booking.review_status == ReviewStatus::Unreviewed
            && booking.dispatch_state == DispatchState::NotSent
    })
}

pub fn list_awaiting_allocation(state: &AppState) -> Vec<AllocationCandidate> {
    let mut candidates: Vec<AllocationCandidate> = state
        .bookings
        .iter()
        .filter(|entry| entry.value().booking.dispatch_state == DispatchState::Sent)
        .map(|entry| {
            let record = entry.value();
            AllocationCandidate {
                booking: record.booking.clone(),
                accepted: count_status(&record.slots, SlotStatus::Accepted),
                pending: count_status(&record.slots, SlotStatus::Pending),
            }
        })
        .collect();

    candidates.sort_by_key(|candidate| (candidate.booking.scheduled_at, candidate.booking.id));
    candidates
}

fn count_status(slots: &[ResponseSlot], status: SlotStatus) -> usize {
    slots.iter().filter(|slot| slot.status == status).count()
}

pub fn list_accepted_responses(
    state: &AppState,
    booking_id: Uuid,
) -> Result<Vec<AcceptedResponse>, AppError> {
    let accepted: Vec<ResponseSlot> = state
        .bookings
        .get(&booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?
        .slots
        .iter()
        .filter(|slot| slot.status == SlotStatus::Accepted)
        .cloned()
        .collect();

    Ok(accepted
        .into_iter()
        .map(|slot| {
            let driver = state
                .drivers
                .get(&slot.respondent.id)
                .map(|entry| entry.value().profile());
            AcceptedResponse { slot, driver }
        })
        .collect())
}

pub fn list_pending_for_driver(state: &AppState, driver_id: Uuid) -> Vec<PendingOffer> {
    let mut offers: Vec<PendingOffer> = state
        .bookings
        .iter()
        .flat_map(|entry| {
            let record = entry.value();
            record
                .slots
                .iter()
                .filter(|slot| {
                    slot.respondent.id == driver_id && slot.status == SlotStatus::Pending
                })
                .map(|slot| PendingOffer {
                    slot: slot.clone(),
                    booking: record.booking.summary(),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    offers.sort_by_key(|offer| (offer.booking.scheduled_at, offer.slot.id));
    offers
}
