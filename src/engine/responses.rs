use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::DispatchState;
use crate::models::slot::{ResponseAction, ResponseSlot, SlotStatus};
use crate::state::AppState;

/// Applies an accept/reject to a slot. The caller is assumed to be authorized.
pub fn respond(
    state: &AppState,
    slot_id: Uuid,
    action: ResponseAction,
) -> Result<ResponseSlot, AppError> {
    observed(state, action, || apply(state, slot_id, None, action))
}

/// Like [`respond`], but the slot must belong to `respondent_id`.
pub fn respond_as(
    state: &AppState,
    respondent_id: Uuid,
    slot_id: Uuid,
    action: ResponseAction,
) -> Result<ResponseSlot, AppError> {
    observed(state, action, || {
        apply(state, slot_id, Some(respondent_id), action)
    })
}

fn observed(
    state: &AppState,
    action: ResponseAction,
    run: impl FnOnce() -> Result<ResponseSlot, AppError>,
) -> Result<ResponseSlot, AppError> {
    let start = Instant::now();
    let result = run();

    let outcome = match &result {
        Ok(_) => action.as_str(),
        Err(err) => err.code(),
    };
    state.metrics.record("respond", outcome, start);

    result
}

fn apply(
    state: &AppState,
    slot_id: Uuid,
    respondent_id: Option<Uuid>,
    action: ResponseAction,
) -> Result<ResponseSlot, AppError> {
    let booking_id = state
        .slot_index
        .get(&slot_id)
        .map(|entry| *entry.value())
        .ok_or_else(|| AppError::NotFound(format!("slot {slot_id} not found")))?;

    let mut record = state.bookings.get_mut(&booking_id).ok_or_else(|| {
        AppError::Storage(format!("slot {slot_id} references missing booking {booking_id}"))
    })?;

    let record = &mut *record;
    let slot = record
        .slots
        .iter_mut()
        .find(|slot| slot.id == slot_id)
        .ok_or_else(|| {
            AppError::Storage(format!("slot {slot_id} missing from booking {booking_id}"))
        })?;

    if respondent_id.is_some_and(|id| id != slot.respondent.id) {
        return Err(AppError::NotFound(format!("slot {slot_id} not found")));
    }

    if record.booking.dispatch_state == DispatchState::Allocated {
        return Err(AppError::BookingAlreadyAllocated(booking_id));
    }

    if slot.status != SlotStatus::Pending {
        return Err(AppError::SlotAlreadyResolved {
            slot_id,
            status: slot.status,
        });
    }

    slot.advance(action.target())
        .map_err(|status| AppError::SlotAlreadyResolved { slot_id, status })?;
    let updated = slot.clone();
    record.booking.touch();

    state.metrics.pending_slots.dec();

    info!(
        booking_id = %booking_id,
        slot_id = %slot_id,
        driver_id = %updated.respondent.id,
        status = ?updated.status,
        "response recorded"
    );

    Ok(updated)
}
