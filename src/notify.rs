use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::models::NewNotification;
use crate::schema::notifications;

pub const KIND_PICKUP: &str = "pickup";
pub const KIND_LOCATION: &str = "location";
pub const KIND_REVIEW: &str = "review";

pub fn create_notification(
    conn: &mut PgConnection,
    user_id: Uuid,
    title: &str,
    body: &str,
    kind: &str,
    related_id: Option<Uuid>,
) -> Result<(), diesel::result::Error> {
    let row = NewNotification {
        id: Uuid::new_v4(),
        user_id,
        title: title.to_string(),
        body: body.to_string(),
        kind: kind.to_string(),
        related_id,
    };

    diesel::insert_into(notifications::table)
        .values(&row)
        .execute(conn)?;

    Ok(())
}

/// Best-effort variant: notification delivery must never fail the request
/// that triggered it, so errors are logged and dropped.
pub fn notify_or_log(
    conn: &mut PgConnection,
    user_id: Uuid,
    title: &str,
    body: &str,
    kind: &str,
    related_id: Option<Uuid>,
) {
    if let Err(err) = create_notification(conn, user_id, title, body, kind, related_id) {
        tracing::warn!(
            recipient = %user_id,
            kind,
            cause = %err,
            "failed to record notification"
        );
    }
}
