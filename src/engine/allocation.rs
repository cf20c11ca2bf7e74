use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::{Booking, DispatchState};
use crate::models::notification::Notification;
use crate::models::slot::SlotStatus;
use crate::state::AppState;

/// Picks exactly one accepted respondent for a sent booking. The winner's slot
/// becomes Allocated and every other open slot is Closed, all under the
/// booking's write guard, so a racing allocation sees Allocated and fails.
pub fn allocate(state: &AppState, booking_id: Uuid, driver_id: Uuid) -> Result<Booking, AppError> {
    let start = Instant::now();
    let result = allocate_inner(state, booking_id, driver_id);

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => err.code(),
    };
    state.metrics.record("allocate", outcome, start);

    result
}

fn allocate_inner(
    state: &AppState,
    booking_id: Uuid,
    driver_id: Uuid,
) -> Result<Booking, AppError> {
    let mut guard = state
        .bookings
        .get_mut(&booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
    let record = &mut *guard;

    match record.booking.dispatch_state {
        DispatchState::Allocated => return Err(AppError::AlreadyAllocated(booking_id)),
        DispatchState::NotSent => {
            return Err(AppError::DriverNotAccepted {
                booking_id,
                driver_id,
            });
        }
        DispatchState::Sent => {}
    }

    let winner_accepted = record
        .slots
        .iter()
        .any(|slot| slot.respondent.id == driver_id && slot.status == SlotStatus::Accepted);
    if !winner_accepted {
        return Err(AppError::DriverNotAccepted {
            booking_id,
            driver_id,
        });
    }

    let plan: Vec<(usize, SlotStatus)> = record
        .slots
        .iter()
        .enumerate()
        .filter_map(|(idx, slot)| {
            if slot.respondent.id == driver_id {
                Some((idx, SlotStatus::Allocated))
            } else if slot.status.is_terminal() {
                None
            } else {
                Some((idx, SlotStatus::Closed))
            }
        })
        .collect();

    if let Some((idx, next)) = plan
        .iter()
        .find(|(idx, next)| !record.slots[*idx].status.can_transition_to(*next))
    {
        return Err(AppError::Storage(format!(
            "slot {} cannot move from {:?} to {next:?}",
            record.slots[*idx].id, record.slots[*idx].status
        )));
    }

    let mut closed_pending = 0;
    for (idx, next) in &plan {
        let slot = &mut record.slots[*idx];
        if slot.status == SlotStatus::Pending {
            closed_pending += 1;
        }
        slot.advance(*next).map_err(|status| {
            AppError::Storage(format!("slot {} rejected move from {status:?}", slot.id))
        })?;
    }
    let closed_slots = plan.len() - 1;

    record.booking.dispatch_state = DispatchState::Allocated;
    record.booking.allocated_driver_id = Some(driver_id);
    record.booking.touch();
    let booking = record.booking.clone();
    drop(guard);

    state.metrics.pending_slots.sub(closed_pending);

    state.notify(Notification::Allocated {
        booking_id,
        driver_id,
        closed_slots,
    });

    info!(
        booking_id = %booking_id,
        driver_id = %driver_id,
        closed_slots,
        "booking allocated"
    );

    Ok(booking)
}
