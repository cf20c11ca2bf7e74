use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::allocation::allocate;
use crate::engine::dispatch::{dispatch, preview, review, DispatchPreview, DispatchReceipt};
use crate::engine::views::{get_booking, list_accepted_responses, AcceptedResponse};
use crate::error::AppError;
use crate::models::booking::{Booking, ServiceCategory};
use crate::state::{AppState, BookingRecord};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", get(booking_detail))
        .route("/bookings/:id/review", post(review_booking))
        .route("/bookings/:id/eligible-drivers", get(preview_dispatch))
        .route("/bookings/:id/dispatch", post(dispatch_booking))
        .route("/bookings/:id/responses", get(accepted_responses))
        .route("/bookings/:id/allocate", post(allocate_booking))
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub customer_name: String,
    pub category: String,
    pub pickup: String,
    pub dropoff: String,
    pub region: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub fare_estimate: f64,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub package_type: String,
}

#[derive(Deserialize, Default)]
pub struct DispatchRequest {
    pub package_type: Option<String>,
}

#[derive(Deserialize)]
pub struct PreviewParams {
    pub package_type: Option<String>,
}

#[derive(Deserialize)]
pub struct AllocateRequest {
    pub driver_id: Uuid,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::BadRequest("customer_name cannot be empty".to_string()));
    }
    if payload.pickup.trim().is_empty() || payload.dropoff.trim().is_empty() {
        return Err(AppError::BadRequest(
            "pickup and dropoff are required".to_string(),
        ));
    }
    if !payload.fare_estimate.is_finite() || payload.fare_estimate < 0.0 {
        return Err(AppError::BadRequest(
            "fare_estimate must be >= 0".to_string(),
        ));
    }

    let category = payload.category.parse::<ServiceCategory>()?;

    let mut booking = Booking::new(
        payload.customer_name,
        category,
        payload.pickup,
        payload.dropoff,
        payload.scheduled_at,
        payload.fare_estimate,
    );
    if let Some(region) = payload.region.filter(|region| !region.trim().is_empty()) {
        booking = booking.with_region(region);
    }

    state.insert_booking(booking.clone());
    Ok(Json(booking))
}

async fn booking_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingRecord>, AppError> {
    Ok(Json(get_booking(&state, id)?))
}

async fn review_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(review(&state, id, &payload.package_type)?))
}

async fn preview_dispatch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<PreviewParams>,
) -> Result<Json<DispatchPreview>, AppError> {
    Ok(Json(preview(&state, id, params.package_type.as_deref())?))
}

async fn dispatch_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<DispatchRequest>>,
) -> Result<Json<DispatchReceipt>, AppError> {
    let payload = payload.map(|Json(body)| body).unwrap_or_default();
    Ok(Json(dispatch(&state, id, payload.package_type.as_deref())?))
}

async fn accepted_responses(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AcceptedResponse>>, AppError> {
    Ok(Json(list_accepted_responses(&state, id)?))
}

async fn allocate_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AllocateRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(allocate(&state, id, payload.driver_id)?))
}
