use std::collections::HashMap;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::{AppError, AppResult};
use crate::lifecycle::{
    check_scheduled_date, check_transition, compute_points, total_weight, PickupStatus, TimeSlot,
    DEFAULT_CANCELLATION_REASON,
};
use crate::models::{
    Location, NewPickupRequest, NewPickupWasteItem, PickupRequest, PickupWasteItem, WasteCategory,
};
use crate::notify::{self, notify_or_log};
use crate::points::{self, PointsError};
use crate::schema::{locations, pickup_requests, pickup_waste_items, waste_categories};
use crate::state::AppState;
use crate::utils::json::{ok, Envelope};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Deserialize)]
pub struct WasteItemInput {
    pub category_id: Uuid,
    pub estimated_weight: f64,
    pub unit: Option<String>,
}

#[derive(Deserialize)]
pub struct PickupAddressInput {
    pub street: String,
    pub city: String,
    pub province: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatePickupRequest {
    pub location_id: Uuid,
    pub waste_items: Vec<WasteItemInput>,
    pub address: PickupAddressInput,
    pub scheduled_date: NaiveDate,
    pub time_slot: String,
}

#[derive(Deserialize)]
pub struct ActualWeightInput {
    pub category_id: Uuid,
    pub actual_weight: f64,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub partner_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub actual_weight_items: Option<Vec<ActualWeightInput>>,
}

#[derive(Deserialize)]
pub struct CancelPickupRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct PickupListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Serialize, Clone)]
pub struct PickupItemResponse {
    pub id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub unit: String,
    pub estimated_weight: f64,
    pub actual_weight: Option<f64>,
}

#[derive(Serialize)]
pub struct PickupResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub status: String,
    pub scheduled_date: NaiveDate,
    pub time_slot: String,
    pub street: String,
    pub city: String,
    pub province: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub partner_notes: Option<String>,
    pub estimated_total_weight: f64,
    pub estimated_points: i32,
    pub actual_total_weight: Option<f64>,
    pub actual_points: Option<i32>,
    pub points_awarded: bool,
    pub completed_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<PickupItemResponse>,
}

#[derive(Serialize)]
pub struct PickupPage {
    pub pickups: Vec<PickupResponse>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

#[derive(Serialize)]
pub struct PickupStats {
    pub pending: i64,
    pub accepted: i64,
    pub scheduled: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub total: i64,
}

pub(super) fn to_iso(value: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(value, Utc).to_rfc3339()
}

fn to_pickup_response(pickup: PickupRequest, items: Vec<PickupItemResponse>) -> PickupResponse {
    PickupResponse {
        id: pickup.id,
        user_id: pickup.user_id,
        location_id: pickup.location_id,
        status: pickup.status,
        scheduled_date: pickup.scheduled_date,
        time_slot: pickup.time_slot,
        street: pickup.street,
        city: pickup.city,
        province: pickup.province,
        latitude: pickup.latitude,
        longitude: pickup.longitude,
        notes: pickup.notes,
        partner_notes: pickup.partner_notes,
        estimated_total_weight: pickup.estimated_total_weight,
        estimated_points: pickup.estimated_points,
        actual_total_weight: pickup.actual_total_weight,
        actual_points: pickup.actual_points,
        points_awarded: pickup.points_awarded,
        completed_at: pickup.completed_at.map(to_iso),
        cancelled_at: pickup.cancelled_at.map(to_iso),
        cancellation_reason: pickup.cancellation_reason,
        created_at: to_iso(pickup.created_at),
        items,
    }
}

fn load_items_for_pickups(
    conn: &mut PgConnection,
    pickup_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<PickupItemResponse>>> {
    if pickup_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(PickupWasteItem, WasteCategory)> = pickup_waste_items::table
        .inner_join(waste_categories::table)
        .filter(pickup_waste_items::pickup_request_id.eq_any(pickup_ids))
        .load(conn)?;

    let mut map: HashMap<Uuid, Vec<PickupItemResponse>> = HashMap::new();
    for (item, category) in rows {
        map.entry(item.pickup_request_id)
            .or_default()
            .push(PickupItemResponse {
                id: item.id,
                category_id: item.category_id,
                category_name: category.name,
                unit: item.unit,
                estimated_weight: item.estimated_weight,
                actual_weight: item.actual_weight,
            });
    }
    Ok(map)
}

fn parse_current_status(pickup: &PickupRequest) -> AppResult<PickupStatus> {
    PickupStatus::parse(&pickup.status)
        .ok_or_else(|| AppError::internal(format!("corrupt pickup status {:?}", pickup.status)))
}

fn owned_location_ids(conn: &mut PgConnection, owner_id: Uuid) -> AppResult<Vec<Uuid>> {
    let ids = locations::table
        .filter(locations::owner_id.eq(owner_id))
        .select(locations::id)
        .load(conn)?;
    Ok(ids)
}

/// Loads a pickup and enforces the caller's visibility: requesters see their
/// own, mitra see pickups at locations they own, admins see everything.
fn load_visible_pickup(
    conn: &mut PgConnection,
    pickup_id: Uuid,
    user: &AuthenticatedUser,
) -> AppResult<(PickupRequest, Location)> {
    let pickup: PickupRequest = pickup_requests::table.find(pickup_id).first(conn)?;
    let location: Location = locations::table.find(pickup.location_id).first(conn)?;

    let visible = match user.role {
        Role::Admin => true,
        Role::Public => pickup.user_id == user.user_id,
        Role::Mitra => location.owner_id == user.user_id,
    };
    if !visible {
        return Err(AppError::not_found());
    }

    Ok((pickup, location))
}

pub async fn create_pickup(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePickupRequest>,
) -> AppResult<(StatusCode, Json<Envelope<PickupResponse>>)> {
    user.require_role(Role::Public)?;

    if payload.waste_items.is_empty() {
        return Err(AppError::bad_request("waste_items must not be empty"));
    }
    if payload.address.street.trim().is_empty() || payload.address.city.trim().is_empty() {
        return Err(AppError::bad_request(
            "address must include at least street and city",
        ));
    }
    let time_slot = TimeSlot::parse(&payload.time_slot).ok_or_else(|| {
        AppError::bad_request("time_slot must be one of morning, afternoon, evening")
    })?;
    check_scheduled_date(payload.scheduled_date, Utc::now().date_naive())?;

    let mut conn = state.db()?;

    let (pickup, owner_id) = conn.transaction::<(PickupRequest, Uuid), AppError, _>(|conn| {
        let location: Location = locations::table.find(payload.location_id).first(conn)?;
        if location.status != "approved" {
            return Err(AppError::bad_request("location is not approved"));
        }
        if !location.pickup_service {
            return Err(AppError::bad_request(
                "location does not offer pickup service",
            ));
        }

        let category_ids: Vec<Uuid> = payload
            .waste_items
            .iter()
            .map(|item| item.category_id)
            .collect();
        let categories: Vec<WasteCategory> = waste_categories::table
            .filter(waste_categories::id.eq_any(&category_ids))
            .filter(waste_categories::is_active.eq(true))
            .load(conn)?;
        let rates: HashMap<Uuid, i32> = categories
            .into_iter()
            .map(|category| (category.id, category.points_per_kg))
            .collect();

        let mut weighted: Vec<(f64, i32)> = Vec::with_capacity(payload.waste_items.len());
        let mut seen = std::collections::HashSet::with_capacity(payload.waste_items.len());
        for item in &payload.waste_items {
            if item.estimated_weight <= 0.0 {
                return Err(AppError::bad_request(
                    "estimated_weight must be greater than zero",
                ));
            }
            if !seen.insert(item.category_id) {
                return Err(AppError::bad_request(format!(
                    "duplicate waste category {}",
                    item.category_id
                )));
            }
            let rate = rates.get(&item.category_id).ok_or_else(|| {
                AppError::bad_request(format!(
                    "waste category {} is unknown or inactive",
                    item.category_id
                ))
            })?;
            weighted.push((item.estimated_weight, *rate));
        }

        let weights: Vec<f64> = weighted.iter().map(|(weight, _)| *weight).collect();
        let new_pickup = NewPickupRequest {
            id: Uuid::new_v4(),
            user_id: user.user_id,
            location_id: location.id,
            status: PickupStatus::Pending.as_str().to_string(),
            scheduled_date: payload.scheduled_date,
            time_slot: time_slot.as_str().to_string(),
            street: payload.address.street.trim().to_string(),
            city: payload.address.city.trim().to_string(),
            province: payload.address.province.clone(),
            latitude: payload.address.latitude,
            longitude: payload.address.longitude,
            notes: payload.address.notes.clone(),
            estimated_total_weight: total_weight(&weights),
            estimated_points: compute_points(&weighted),
            points_awarded: false,
        };

        diesel::insert_into(pickup_requests::table)
            .values(&new_pickup)
            .execute(conn)?;

        let new_items: Vec<NewPickupWasteItem> = payload
            .waste_items
            .iter()
            .map(|item| NewPickupWasteItem {
                id: Uuid::new_v4(),
                pickup_request_id: new_pickup.id,
                category_id: item.category_id,
                unit: item.unit.clone().unwrap_or_else(|| "kg".to_string()),
                estimated_weight: item.estimated_weight,
            })
            .collect();
        diesel::insert_into(pickup_waste_items::table)
            .values(&new_items)
            .execute(conn)?;

        let pickup = pickup_requests::table.find(new_pickup.id).first(conn)?;
        Ok((pickup, location.owner_id))
    })?;

    info!(pickup_id = %pickup.id, requester = %user.user_id, "pickup request created");

    notify_or_log(
        &mut conn,
        owner_id,
        "New pickup request",
        &format!(
            "A pickup was requested for {} ({})",
            pickup.scheduled_date, pickup.time_slot
        ),
        notify::KIND_PICKUP,
        Some(pickup.id),
    );
    notify_or_log(
        &mut conn,
        user.user_id,
        "Pickup request submitted",
        &format!(
            "Your pickup for {} is awaiting confirmation",
            pickup.scheduled_date
        ),
        notify::KIND_PICKUP,
        Some(pickup.id),
    );

    let items = load_items_for_pickups(&mut conn, &[pickup.id])?
        .remove(&pickup.id)
        .unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        ok(to_pickup_response(pickup, items)),
    ))
}

pub async fn list_pickups(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PickupListQuery>,
) -> AppResult<Json<Envelope<Vec<PickupResponse>>>> {
    let status_filter = query
        .status
        .as_deref()
        .map(|value| {
            PickupStatus::parse(value)
                .map(|status| status.as_str().to_string())
                .ok_or_else(|| AppError::bad_request(format!("unknown status {value:?}")))
        })
        .transpose()?;

    let mut conn = state.db()?;

    let mut db_query = pickup_requests::table
        .order(pickup_requests::created_at.desc())
        .into_boxed();
    match user.role {
        Role::Public => {
            db_query = db_query.filter(pickup_requests::user_id.eq(user.user_id));
        }
        Role::Mitra => {
            let location_ids = owned_location_ids(&mut conn, user.user_id)?;
            db_query = db_query.filter(pickup_requests::location_id.eq_any(location_ids));
        }
        Role::Admin => {}
    }
    if let Some(status) = status_filter {
        db_query = db_query.filter(pickup_requests::status.eq(status));
    }

    let pickups: Vec<PickupRequest> = db_query.load(&mut conn)?;
    let ids: Vec<Uuid> = pickups.iter().map(|pickup| pickup.id).collect();
    let mut items_map = load_items_for_pickups(&mut conn, &ids)?;

    let response = pickups
        .into_iter()
        .map(|pickup| {
            let items = items_map.remove(&pickup.id).unwrap_or_default();
            to_pickup_response(pickup, items)
        })
        .collect();
    Ok(ok(response))
}

pub async fn get_pickup(
    State(state): State<AppState>,
    Path(pickup_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<PickupResponse>>> {
    let mut conn = state.db()?;
    let (pickup, _location) = load_visible_pickup(&mut conn, pickup_id, &user)?;
    let items = load_items_for_pickups(&mut conn, &[pickup.id])?
        .remove(&pickup.id)
        .unwrap_or_default();
    Ok(ok(to_pickup_response(pickup, items)))
}

pub async fn my_pickups(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Envelope<PickupPage>>> {
    user.require_role(Role::Public)?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let mut conn = state.db()?;

    let total: i64 = pickup_requests::table
        .filter(pickup_requests::user_id.eq(user.user_id))
        .count()
        .get_result(&mut conn)?;

    let pickups: Vec<PickupRequest> = pickup_requests::table
        .filter(pickup_requests::user_id.eq(user.user_id))
        .order(pickup_requests::created_at.desc())
        .offset((page - 1).saturating_mul(per_page))
        .limit(per_page)
        .load(&mut conn)?;

    let ids: Vec<Uuid> = pickups.iter().map(|pickup| pickup.id).collect();
    let mut items_map = load_items_for_pickups(&mut conn, &ids)?;
    let pickups = pickups
        .into_iter()
        .map(|pickup| {
            let items = items_map.remove(&pickup.id).unwrap_or_default();
            to_pickup_response(pickup, items)
        })
        .collect();

    Ok(ok(PickupPage {
        pickups,
        page,
        per_page,
        total,
    }))
}

pub async fn schedule(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<Vec<PickupResponse>>>> {
    user.require_role(Role::Mitra)?;

    let mut conn = state.db()?;
    let location_ids = owned_location_ids(&mut conn, user.user_id)?;

    let active = [
        PickupStatus::Accepted.as_str(),
        PickupStatus::Scheduled.as_str(),
        PickupStatus::InProgress.as_str(),
    ];
    let pickups: Vec<PickupRequest> = pickup_requests::table
        .filter(pickup_requests::location_id.eq_any(location_ids))
        .filter(pickup_requests::status.eq_any(active))
        .order(pickup_requests::scheduled_date.asc())
        .load(&mut conn)?;

    let ids: Vec<Uuid> = pickups.iter().map(|pickup| pickup.id).collect();
    let mut items_map = load_items_for_pickups(&mut conn, &ids)?;
    let response = pickups
        .into_iter()
        .map(|pickup| {
            let items = items_map.remove(&pickup.id).unwrap_or_default();
            to_pickup_response(pickup, items)
        })
        .collect();
    Ok(ok(response))
}

pub async fn stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<PickupStats>>> {
    let mut conn = state.db()?;

    let mut db_query = pickup_requests::table
        .group_by(pickup_requests::status)
        .select((pickup_requests::status, diesel::dsl::count_star()))
        .into_boxed();
    match user.role {
        Role::Public => {
            db_query = db_query.filter(pickup_requests::user_id.eq(user.user_id));
        }
        Role::Mitra => {
            let location_ids = owned_location_ids(&mut conn, user.user_id)?;
            db_query = db_query.filter(pickup_requests::location_id.eq_any(location_ids));
        }
        Role::Admin => {}
    }

    let rows: Vec<(String, i64)> = db_query.load(&mut conn)?;
    let counts: HashMap<String, i64> = rows.into_iter().collect();
    let count = |status: PickupStatus| *counts.get(status.as_str()).unwrap_or(&0);

    let stats = PickupStats {
        pending: count(PickupStatus::Pending),
        accepted: count(PickupStatus::Accepted),
        scheduled: count(PickupStatus::Scheduled),
        in_progress: count(PickupStatus::InProgress),
        completed: count(PickupStatus::Completed),
        cancelled: count(PickupStatus::Cancelled),
        total: counts.values().sum(),
    };
    Ok(ok(stats))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(pickup_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Envelope<PickupResponse>>> {
    let target = PickupStatus::parse(&payload.status)
        .ok_or_else(|| AppError::bad_request(format!("unknown status {:?}", payload.status)))?;

    let mut conn = state.db()?;

    let pickup: PickupRequest = pickup_requests::table.find(pickup_id).first(&mut conn)?;
    let location: Location = locations::table.find(pickup.location_id).first(&mut conn)?;

    match user.role {
        Role::Admin => {}
        Role::Mitra if location.owner_id == user.user_id => {}
        Role::Mitra => return Err(AppError::not_found()),
        Role::Public => {
            return Err(AppError::forbidden(
                "requesters may only cancel through the cancel endpoint",
            ))
        }
    }

    let current = parse_current_status(&pickup)?;
    check_transition(current, target)?;

    let updated = match target {
        PickupStatus::Completed => complete_pickup(&mut conn, &pickup, &payload)?,
        PickupStatus::Cancelled => {
            let reason = payload
                .cancellation_reason
                .as_deref()
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .ok_or_else(|| AppError::bad_request("cancellation_reason is required"))?;
            cancel_pickup_row(&mut conn, &pickup, reason)?
        }
        other => {
            let now = Utc::now().naive_utc();
            diesel::update(pickup_requests::table.find(pickup.id))
                .set((
                    pickup_requests::status.eq(other.as_str()),
                    pickup_requests::partner_notes
                        .eq(payload.partner_notes.as_deref().or(pickup.partner_notes.as_deref())),
                    pickup_requests::updated_at.eq(now),
                ))
                .execute(&mut conn)?;
            pickup_requests::table.find(pickup.id).first(&mut conn)?
        }
    };

    info!(
        pickup_id = %updated.id,
        from = current.as_str(),
        to = target.as_str(),
        actor = %user.user_id,
        "pickup status updated"
    );

    match target {
        PickupStatus::Completed => {
            let earned = updated.actual_points.unwrap_or(0);
            notify_or_log(
                &mut conn,
                updated.user_id,
                "Pickup completed",
                &format!("Your pickup was completed and you earned {earned} points"),
                notify::KIND_PICKUP,
                Some(updated.id),
            );
        }
        PickupStatus::Cancelled => {
            notify_or_log(
                &mut conn,
                updated.user_id,
                "Pickup cancelled",
                updated
                    .cancellation_reason
                    .as_deref()
                    .unwrap_or("Your pickup was cancelled"),
                notify::KIND_PICKUP,
                Some(updated.id),
            );
        }
        other => {
            notify_or_log(
                &mut conn,
                updated.user_id,
                "Pickup status updated",
                &format!("Your pickup is now {}", other.as_str()),
                notify::KIND_PICKUP,
                Some(updated.id),
            );
        }
    }

    let items = load_items_for_pickups(&mut conn, &[updated.id])?
        .remove(&updated.id)
        .unwrap_or_default();
    Ok(ok(to_pickup_response(updated, items)))
}

pub async fn cancel_pickup(
    State(state): State<AppState>,
    Path(pickup_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<CancelPickupRequest>,
) -> AppResult<Json<Envelope<PickupResponse>>> {
    user.require_role(Role::Public)?;

    let mut conn = state.db()?;

    let pickup: PickupRequest = pickup_requests::table.find(pickup_id).first(&mut conn)?;
    if pickup.user_id != user.user_id {
        return Err(AppError::not_found());
    }

    let current = parse_current_status(&pickup)?;
    if !current.cancellable_by_requester() {
        return Err(AppError::bad_request(format!(
            "pickups can only be cancelled while pending, accepted or scheduled (currently {})",
            current.as_str()
        )));
    }

    let reason = payload
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .unwrap_or(DEFAULT_CANCELLATION_REASON);
    let updated = cancel_pickup_row(&mut conn, &pickup, reason)?;

    let location: Location = locations::table.find(updated.location_id).first(&mut conn)?;
    notify_or_log(
        &mut conn,
        location.owner_id,
        "Pickup cancelled",
        &format!("The pickup scheduled for {} was cancelled", updated.scheduled_date),
        notify::KIND_PICKUP,
        Some(updated.id),
    );

    let items = load_items_for_pickups(&mut conn, &[updated.id])?
        .remove(&updated.id)
        .unwrap_or_default();
    Ok(ok(to_pickup_response(updated, items)))
}

fn cancel_pickup_row(
    conn: &mut PgConnection,
    pickup: &PickupRequest,
    reason: &str,
) -> AppResult<PickupRequest> {
    let now = Utc::now().naive_utc();
    diesel::update(pickup_requests::table.find(pickup.id))
        .set((
            pickup_requests::status.eq(PickupStatus::Cancelled.as_str()),
            pickup_requests::cancelled_at.eq(now),
            pickup_requests::cancellation_reason.eq(reason),
            pickup_requests::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(pickup_requests::table.find(pickup.id).first(conn)?)
}

/// Applies the completion transition: item actual weights, totals, points
/// award and the ledger entry all commit or roll back together.
fn complete_pickup(
    conn: &mut PgConnection,
    pickup: &PickupRequest,
    payload: &UpdateStatusRequest,
) -> AppResult<PickupRequest> {
    let provided = payload
        .actual_weight_items
        .as_deref()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| {
            AppError::bad_request("actual_weight_items are required to complete a pickup")
        })?;

    let mut actual_by_category: HashMap<Uuid, f64> = HashMap::with_capacity(provided.len());
    for entry in provided {
        if entry.actual_weight <= 0.0 {
            return Err(AppError::bad_request(
                "actual_weight must be greater than zero",
            ));
        }
        if actual_by_category
            .insert(entry.category_id, entry.actual_weight)
            .is_some()
        {
            return Err(AppError::bad_request(format!(
                "duplicate actual weight for category {}",
                entry.category_id
            )));
        }
    }

    conn.transaction::<PickupRequest, AppError, _>(|conn| {
        let items: Vec<(PickupWasteItem, WasteCategory)> = pickup_waste_items::table
            .inner_join(waste_categories::table)
            .filter(pickup_waste_items::pickup_request_id.eq(pickup.id))
            .load(conn)?;

        let mut weighted: Vec<(f64, i32)> = Vec::with_capacity(items.len());
        for (item, category) in &items {
            let weight = actual_by_category.remove(&item.category_id).ok_or_else(|| {
                AppError::bad_request(format!(
                    "actual_weight_items is missing category {}",
                    item.category_id
                ))
            })?;
            weighted.push((weight, category.points_per_kg));

            diesel::update(pickup_waste_items::table.find(item.id))
                .set(pickup_waste_items::actual_weight.eq(weight))
                .execute(conn)?;
        }
        if let Some(unknown) = actual_by_category.keys().next() {
            return Err(AppError::bad_request(format!(
                "category {unknown} is not part of this pickup"
            )));
        }

        let weights: Vec<f64> = weighted.iter().map(|(weight, _)| *weight).collect();
        let actual_total_weight = total_weight(&weights);
        let actual_points = compute_points(&weighted);
        let now = Utc::now().naive_utc();

        diesel::update(pickup_requests::table.find(pickup.id))
            .set((
                pickup_requests::status.eq(PickupStatus::Completed.as_str()),
                pickup_requests::actual_total_weight.eq(actual_total_weight),
                pickup_requests::actual_points.eq(actual_points),
                pickup_requests::points_awarded.eq(true),
                pickup_requests::completed_at.eq(now),
                pickup_requests::partner_notes
                    .eq(payload.partner_notes.as_deref().or(pickup.partner_notes.as_deref())),
                pickup_requests::updated_at.eq(now),
            ))
            .execute(conn)?;

        points::award_pickup_points(
            conn,
            pickup.user_id,
            actual_points,
            pickup.id,
            &format!("Pickup completed ({actual_total_weight:.2} kg recycled)"),
        )
        .map_err(|err| match err {
            PointsError::UnknownUser => AppError::not_found(),
            PointsError::NegativeAmount => AppError::internal(err),
            PointsError::Database(cause) => AppError::from(cause),
        })?;

        Ok(pickup_requests::table.find(pickup.id).first(conn)?)
    })
}
