use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::eligibility::find_eligible_drivers;
use crate::engine::responses::{respond, respond_as};
use crate::engine::views::{list_pending_for_driver, PendingOffer};
use crate::error::AppError;
use crate::models::booking::ServiceCategory;
use crate::models::driver::{Driver, Respondent, RespondentRole};
use crate::models::slot::{ResponseAction, ResponseSlot};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id/availability", patch(update_availability))
        .route("/drivers/:id/package", patch(update_package))
        .route("/drivers/:id/offers", get(pending_offers))
        .route("/drivers/:id/offers/:slot_id", post(answer_offer))
        .route("/slots/:id/response", post(answer_slot))
        .route("/eligibility", get(eligibility))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub phone: String,
    pub vehicle: Option<String>,
    pub role: Option<RespondentRole>,
    pub package: Option<String>,
    pub online: Option<bool>,
    pub region: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub online: bool,
}

#[derive(Deserialize)]
pub struct UpdatePackageRequest {
    pub package: Option<String>,
}

#[derive(Deserialize)]
pub struct RespondRequest {
    pub action: ResponseAction,
}

#[derive(Deserialize)]
pub struct EligibilityParams {
    pub category: String,
    pub region: Option<String>,
}

fn parse_package(raw: Option<&str>) -> Result<Option<ServiceCategory>, AppError> {
    raw.map(str::parse::<ServiceCategory>).transpose()
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    if payload.phone.trim().is_empty() {
        return Err(AppError::BadRequest("phone cannot be empty".to_string()));
    }

    let driver = Driver {
        id: Uuid::new_v4(),
        name: payload.name,
        phone: payload.phone,
        vehicle: payload.vehicle,
        role: payload.role.unwrap_or(RespondentRole::Driver),
        package: parse_package(payload.package.as_deref())?,
        online: payload.online.unwrap_or(false),
        region: payload.region,
        updated_at: Utc::now(),
    };

    state.insert_driver(driver.clone());
    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    let drivers = state
        .drivers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(drivers)
}

async fn update_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Driver>, AppError> {
    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("driver {} not found", id)))?;

    driver.online = payload.online;
    driver.updated_at = Utc::now();

    Ok(Json(driver.clone()))
}

async fn update_package(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePackageRequest>,
) -> Result<Json<Driver>, AppError> {
    let package = parse_package(payload.package.as_deref())?;

    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("driver {} not found", id)))?;

    driver.package = package;
    driver.updated_at = Utc::now();

    Ok(Json(driver.clone()))
}

async fn pending_offers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<PendingOffer>> {
    Json(list_pending_for_driver(&state, id))
}

async fn answer_offer(
    State(state): State<Arc<AppState>>,
    Path((id, slot_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RespondRequest>,
) -> Result<Json<ResponseSlot>, AppError> {
    Ok(Json(respond_as(&state, id, slot_id, payload.action)?))
}

async fn answer_slot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondRequest>,
) -> Result<Json<ResponseSlot>, AppError> {
    Ok(Json(respond(&state, id, payload.action)?))
}

async fn eligibility(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EligibilityParams>,
) -> Result<Json<Vec<Respondent>>, AppError> {
    Ok(Json(find_eligible_drivers(
        &state,
        &params.category,
        params.region.as_deref(),
    )?))
}
