use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::{AppError, AppResult};
use crate::models::{Location, NewLocation};
use crate::notify::{self, notify_or_log};
use crate::schema::locations;
use crate::state::AppState;
use crate::utils::json::{ok, Envelope};

use super::pickups::to_iso;

pub const LOCATION_STATUSES: &[&str] = &["pending", "approved", "rejected", "suspended"];

#[derive(Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub description: Option<String>,
    pub street: String,
    pub city: String,
    pub province: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub pickup_service: bool,
    #[serde(default)]
    pub dropoff_service: bool,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pickup_service: Option<bool>,
    pub dropoff_service: Option<bool>,
}

#[derive(Deserialize)]
pub struct ModerateLocationRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct LocationListQuery {
    #[serde(default)]
    pub mine: bool,
}

#[derive(Serialize)]
pub struct LocationResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub street: String,
    pub city: String,
    pub province: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: String,
    pub pickup_service: bool,
    pub dropoff_service: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn to_location_response(location: Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        owner_id: location.owner_id,
        name: location.name,
        description: location.description,
        street: location.street,
        city: location.city,
        province: location.province,
        latitude: location.latitude,
        longitude: location.longitude,
        status: location.status,
        pickup_service: location.pickup_service,
        dropoff_service: location.dropoff_service,
        created_at: to_iso(location.created_at),
        updated_at: to_iso(location.updated_at),
    }
}

pub async fn create_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateLocationRequest>,
) -> AppResult<(StatusCode, Json<Envelope<LocationResponse>>)> {
    user.require_role(Role::Mitra)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if payload.street.trim().is_empty() || payload.city.trim().is_empty() {
        return Err(AppError::bad_request(
            "address must include at least street and city",
        ));
    }

    let mut conn = state.db()?;
    let new_location = NewLocation {
        id: Uuid::new_v4(),
        owner_id: user.user_id,
        name: payload.name.trim().to_string(),
        description: payload.description,
        street: payload.street.trim().to_string(),
        city: payload.city.trim().to_string(),
        province: payload.province,
        latitude: payload.latitude,
        longitude: payload.longitude,
        status: "pending".to_string(),
        pickup_service: payload.pickup_service,
        dropoff_service: payload.dropoff_service,
    };

    diesel::insert_into(locations::table)
        .values(&new_location)
        .execute(&mut conn)?;

    let location: Location = locations::table.find(new_location.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, ok(to_location_response(location))))
}

pub async fn list_locations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<LocationListQuery>,
) -> AppResult<Json<Envelope<Vec<LocationResponse>>>> {
    let mut conn = state.db()?;

    let mut db_query = locations::table
        .order(locations::name.asc())
        .into_boxed();
    if query.mine {
        user.require_role(Role::Mitra)?;
        db_query = db_query.filter(locations::owner_id.eq(user.user_id));
    } else if !user.is_admin() {
        db_query = db_query.filter(locations::status.eq("approved"));
    }

    let rows: Vec<Location> = db_query.load(&mut conn)?;
    Ok(ok(rows.into_iter().map(to_location_response).collect()))
}

pub async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<LocationResponse>>> {
    let mut conn = state.db()?;
    let location: Location = locations::table.find(location_id).first(&mut conn)?;

    let visible = location.status == "approved"
        || user.is_admin()
        || location.owner_id == user.user_id;
    if !visible {
        return Err(AppError::not_found());
    }

    Ok(ok(to_location_response(location)))
}

pub async fn update_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateLocationRequest>,
) -> AppResult<Json<Envelope<LocationResponse>>> {
    let mut conn = state.db()?;
    let location: Location = locations::table.find(location_id).first(&mut conn)?;

    if location.owner_id != user.user_id && !user.is_admin() {
        return Err(AppError::not_found());
    }

    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
    }

    let now = Utc::now().naive_utc();
    diesel::update(locations::table.find(location_id))
        .set((
            locations::name.eq(payload
                .name
                .as_deref()
                .map(str::trim)
                .unwrap_or(&location.name)),
            locations::description.eq(payload
                .description
                .as_deref()
                .or(location.description.as_deref())),
            locations::street.eq(payload
                .street
                .as_deref()
                .map(str::trim)
                .unwrap_or(&location.street)),
            locations::city.eq(payload
                .city
                .as_deref()
                .map(str::trim)
                .unwrap_or(&location.city)),
            locations::province.eq(payload.province.as_deref().or(location.province.as_deref())),
            locations::latitude.eq(payload.latitude.or(location.latitude)),
            locations::longitude.eq(payload.longitude.or(location.longitude)),
            locations::pickup_service
                .eq(payload.pickup_service.unwrap_or(location.pickup_service)),
            locations::dropoff_service
                .eq(payload.dropoff_service.unwrap_or(location.dropoff_service)),
            locations::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    let updated: Location = locations::table.find(location_id).first(&mut conn)?;
    Ok(ok(to_location_response(updated)))
}

pub async fn moderate_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<ModerateLocationRequest>,
) -> AppResult<Json<Envelope<LocationResponse>>> {
    user.require_role(Role::Admin)?;

    let status = payload.status.as_str();
    if !LOCATION_STATUSES.contains(&status) || status == "pending" {
        return Err(AppError::bad_request(
            "status must be one of approved, rejected, suspended",
        ));
    }

    let mut conn = state.db()?;
    let location: Location = locations::table.find(location_id).first(&mut conn)?;

    diesel::update(locations::table.find(location_id))
        .set((
            locations::status.eq(status),
            locations::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    notify_or_log(
        &mut conn,
        location.owner_id,
        "Location reviewed",
        &format!("Your location {:?} is now {status}", location.name),
        notify::KIND_LOCATION,
        Some(location.id),
    );

    let updated: Location = locations::table.find(location_id).first(&mut conn)?;
    Ok(ok(to_location_response(updated)))
}
