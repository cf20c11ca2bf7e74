pub mod bookings;
pub mod drivers;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::views::{
    list_awaiting_allocation, list_awaiting_review, list_pending_for_admin, AllocationCandidate,
};
use crate::models::booking::Booking;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(bookings::router())
        .merge(drivers::router())
        .route("/queues/pending", get(pending_queue))
        .route("/queues/review", get(review_queue))
        .route("/queues/allocation", get(allocation_queue))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    drivers: usize,
    bookings: usize,
    slots: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        drivers: state.drivers.len(),
        bookings: state.bookings.len(),
        slots: state.slot_index.len(),
    })
}

async fn pending_queue(State(state): State<Arc<AppState>>) -> Json<Vec<Booking>> {
    Json(list_pending_for_admin(&state))
}

async fn review_queue(State(state): State<Arc<AppState>>) -> Json<Vec<Booking>> {
    Json(list_awaiting_review(&state))
}

async fn allocation_queue(State(state): State<Arc<AppState>>) -> Json<Vec<AllocationCandidate>> {
    Json(list_awaiting_allocation(&state))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
