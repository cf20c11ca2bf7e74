use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::slot::SlotStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown service category: {0}")]
    InvalidCategory(String),

    #[error("no eligible drivers for booking {0}")]
    NoEligibleDrivers(Uuid),

    #[error("booking {0} has already been dispatched")]
    AlreadyDispatched(Uuid),

    #[error("booking {0} has no package type selected")]
    NotReviewed(Uuid),

    #[error("slot {slot_id} is already {status:?}")]
    SlotAlreadyResolved { slot_id: Uuid, status: SlotStatus },

    #[error("booking {0} is already allocated; responses are closed")]
    BookingAlreadyAllocated(Uuid),

    #[error("booking {0} was already allocated by another request")]
    AlreadyAllocated(Uuid),

    #[error("driver {driver_id} has not accepted booking {booking_id}")]
    DriverNotAccepted { booking_id: Uuid, driver_id: Uuid },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCategory(_) => "invalid_category",
            AppError::NoEligibleDrivers(_) => "no_eligible_drivers",
            AppError::AlreadyDispatched(_) => "already_dispatched",
            AppError::NotReviewed(_) => "not_reviewed",
            AppError::SlotAlreadyResolved { .. } => "slot_already_resolved",
            AppError::BookingAlreadyAllocated(_) => "booking_already_allocated",
            AppError::AlreadyAllocated(_) => "already_allocated",
            AppError::DriverNotAccepted { .. } => "driver_not_accepted",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Storage(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCategory(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NoEligibleDrivers(_) | AppError::DriverNotAccepted { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::AlreadyDispatched(_)
            | AppError::NotReviewed(_)
            | AppError::SlotAlreadyResolved { .. }
            | AppError::BookingAlreadyAllocated(_)
            | AppError::AlreadyAllocated(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
