use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::eligibility::{eligible_respondents, EligibilityQuery};
use crate::error::AppError;
use crate::models::booking::{Booking, DispatchState, ReviewStatus, ServiceCategory};
use crate::models::driver::Respondent;
use crate::models::notification::Notification;
use crate::models::slot::ResponseSlot;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct DispatchReceipt {
    pub booking_id: Uuid,
    pub package_type: ServiceCategory,
    pub drivers_notified: usize,
    pub recipients: Vec<Respondent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchPreview {
    pub booking_id: Uuid,
    pub package_type: ServiceCategory,
    pub eligible_count: usize,
    pub recipients: Vec<Respondent>,
}

/// Records the admin's package-type decision. Allowed until the booking is sent.
pub fn review(state: &AppState, booking_id: Uuid, package_type: &str) -> Result<Booking, AppError> {
    let start = Instant::now();
    let result = review_inner(state, booking_id, package_type);

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => err.code(),
    };
    state.metrics.record("review", outcome, start);

    result
}

fn review_inner(
    state: &AppState,
    booking_id: Uuid,
    package_type: &str,
) -> Result<Booking, AppError> {
    let package_type = package_type.parse::<ServiceCategory>()?;

    let mut record = state
        .bookings
        .get_mut(&booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

    if record.booking.dispatch_state != DispatchState::NotSent {
        return Err(AppError::AlreadyDispatched(booking_id));
    }

    record.booking.review_status = ReviewStatus::Reviewed;
    record.booking.selected_package_type = Some(package_type);
    record.booking.touch();

    info!(booking_id = %booking_id, package_type = ?package_type, "booking reviewed");

    Ok(record.booking.clone())
}

/// Who a dispatch would notify right now. Changes nothing.
pub fn preview(
    state: &AppState,
    booking_id: Uuid,
    package_type: Option<&str>,
) -> Result<DispatchPreview, AppError> {
    let requested = package_type
        .map(str::parse::<ServiceCategory>)
        .transpose()?;

    let query = {
        let record = state
            .bookings
            .get(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
        let package_type = requested
            .or(record.booking.selected_package_type)
            .ok_or(AppError::NotReviewed(booking_id))?;
        EligibilityQuery::new(package_type).in_region(record.booking.region.clone())
    };

    let recipients = eligible_respondents(state, &query);

    Ok(DispatchPreview {
        booking_id,
        package_type: query.category,
        eligible_count: recipients.len(),
        recipients,
    })
}

/// Broadcasts a booking to every eligible respondent, creating one pending
/// slot each. `package_type` overrides the reviewed one and is persisted with
/// the dispatch.
pub fn dispatch(
    state: &AppState,
    booking_id: Uuid,
    package_type: Option<&str>,
) -> Result<DispatchReceipt, AppError> {
    let start = Instant::now();
    let result = dispatch_inner(state, booking_id, package_type);

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => err.code(),
    };
    state.metrics.record("dispatch", outcome, start);

    result
}

fn dispatch_inner(
    state: &AppState,
    booking_id: Uuid,
    package_type: Option<&str>,
) -> Result<DispatchReceipt, AppError> {
    let requested = package_type
        .map(str::parse::<ServiceCategory>)
        .transpose()?;

    let mut record = state
        .bookings
        .get_mut(&booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

    if record.booking.dispatch_state != DispatchState::NotSent || !record.slots.is_empty() {
        return Err(AppError::AlreadyDispatched(booking_id));
    }

    let package_type = requested
        .or(record.booking.selected_package_type)
        .ok_or(AppError::NotReviewed(booking_id))?;

    let query = EligibilityQuery::new(package_type).in_region(record.booking.region.clone());
    let recipients = eligible_respondents(state, &query);

    if recipients.is_empty() {
        warn!(
            booking_id = %booking_id,
            package_type = ?package_type,
            "no eligible drivers; booking left unsent"
        );
        return Err(AppError::NoEligibleDrivers(booking_id));
    }

    let slots: Vec<ResponseSlot> = recipients
        .iter()
        .map(|respondent| ResponseSlot::new(booking_id, *respondent))
        .collect();

    for slot in &slots {
        state.slot_index.insert(slot.id, booking_id);
    }

    record.booking.review_status = ReviewStatus::Reviewed;
    record.booking.selected_package_type = Some(package_type);
    record.booking.dispatch_state = DispatchState::Sent;
    record.booking.touch();
    record.slots.extend(slots.iter().cloned());

    let drivers_notified = slots.len();
    state.metrics.pending_slots.add(drivers_notified as i64);
    state.metrics.eligible_drivers.observe(drivers_notified as f64);

    // Sent under the guard: offers precede any later event for this booking.
    for slot in &slots {
        state.notify(Notification::Offered {
            slot_id: slot.id,
            booking_id,
            respondent: slot.respondent,
        });
    }
    drop(record);

    info!(
        booking_id = %booking_id,
        package_type = ?package_type,
        drivers_notified,
        "booking dispatched"
    );

    Ok(DispatchReceipt {
        booking_id,
        package_type,
        drivers_notified,
        recipients,
    })
}
