use axum::extract::{Json, Path, State};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::Notification;
use crate::schema::notifications;
use crate::state::AppState;
use crate::utils::json::{ok, Envelope};

use super::pickups::to_iso;

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub related_id: Option<Uuid>,
    pub read: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct ReadAllResponse {
    pub updated: usize,
}

fn to_notification_response(notification: Notification) -> NotificationResponse {
    NotificationResponse {
        id: notification.id,
        title: notification.title,
        body: notification.body,
        kind: notification.kind,
        related_id: notification.related_id,
        read: notification.read,
        created_at: to_iso(notification.created_at),
    }
}

pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<Vec<NotificationResponse>>>> {
    let mut conn = state.db()?;

    let rows: Vec<Notification> = notifications::table
        .filter(notifications::user_id.eq(user.user_id))
        .order(notifications::created_at.desc())
        .load(&mut conn)?;

    Ok(ok(rows.into_iter().map(to_notification_response).collect()))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<NotificationResponse>>> {
    let mut conn = state.db()?;

    let notification: Notification = notifications::table
        .find(notification_id)
        .first(&mut conn)?;
    if notification.user_id != user.user_id {
        return Err(AppError::not_found());
    }

    diesel::update(notifications::table.find(notification_id))
        .set(notifications::read.eq(true))
        .execute(&mut conn)?;

    let updated: Notification = notifications::table
        .find(notification_id)
        .first(&mut conn)?;
    Ok(ok(to_notification_response(updated)))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<ReadAllResponse>>> {
    let mut conn = state.db()?;

    let updated = diesel::update(
        notifications::table
            .filter(notifications::user_id.eq(user.user_id))
            .filter(notifications::read.eq(false)),
    )
    .set(notifications::read.eq(true))
    .execute(&mut conn)?;

    Ok(ok(ReadAllResponse { updated }))
}
