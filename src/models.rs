use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub points: i32,
    pub badge: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = locations)]
#[diesel(belongs_to(User, foreign_key = owner_id))]
pub struct Location {
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
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = locations)]
pub struct NewLocation {
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
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = waste_categories)]
pub struct WasteCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub points_per_kg: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = waste_categories)]
pub struct NewWasteCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub points_per_kg: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = pickup_requests)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Location))]
pub struct PickupRequest {
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
    pub completed_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub cancellation_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pickup_requests)]
pub struct NewPickupRequest {
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
    pub estimated_total_weight: f64,
    pub estimated_points: i32,
    pub points_awarded: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = pickup_waste_items)]
#[diesel(belongs_to(PickupRequest))]
#[diesel(belongs_to(WasteCategory, foreign_key = category_id))]
pub struct PickupWasteItem {
    pub id: Uuid,
    pub pickup_request_id: Uuid,
    pub category_id: Uuid,
    pub unit: String,
    pub estimated_weight: f64,
    pub actual_weight: Option<f64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pickup_waste_items)]
pub struct NewPickupWasteItem {
    pub id: Uuid,
    pub pickup_request_id: Uuid,
    pub category_id: Uuid,
    pub unit: String,
    pub estimated_weight: f64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = reviews)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Location))]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub status: String,
    pub flagged_count: i32,
    pub helpful_count: i32,
    pub response_text: Option<String>,
    pub response_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub status: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = review_helpful)]
#[diesel(belongs_to(Review))]
#[diesel(belongs_to(User))]
#[diesel(primary_key(review_id, user_id))]
pub struct ReviewHelpful {
    pub review_id: Uuid,
    pub user_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = review_helpful)]
pub struct NewReviewHelpful {
    pub review_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = notifications)]
#[diesel(belongs_to(User))]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub related_id: Option<Uuid>,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub related_id: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = points_history)]
#[diesel(belongs_to(User))]
pub struct PointsHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i32,
    pub entry_type: String,
    pub source: String,
    pub source_id: Uuid,
    pub description: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = points_history)]
pub struct NewPointsHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i32,
    pub entry_type: String,
    pub source: String,
    pub source_id: Uuid,
    pub description: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
