use diesel::pg::PgConnection;
use diesel::prelude::*;
use thiserror::Error;
use uuid::Uuid;

use crate::models::NewPointsHistoryEntry;
use crate::schema::{points_history, users};

pub const ENTRY_EARNED: &str = "earned";
pub const SOURCE_PICKUP: &str = "pickup";

#[derive(Debug, Error)]
pub enum PointsError {
    #[error("point amount must be non-negative")]
    NegativeAmount,
    #[error("user not found")]
    UnknownUser,
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

pub type PointsResult<T> = Result<T, PointsError>;

/// Credits `amount` points to the user and appends one ledger entry.
/// The balance update is an in-place increment, so concurrent awards for
/// the same user cannot lose each other; the ledger stays append-only and
/// doubles as the audit trail for the running total.
pub fn award_pickup_points(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i32,
    pickup_id: Uuid,
    description: &str,
) -> PointsResult<()> {
    if amount < 0 {
        return Err(PointsError::NegativeAmount);
    }

    let updated = diesel::update(users::table.find(user_id))
        .set(users::points.eq(users::points + amount))
        .execute(conn)?;

    if updated == 0 {
        return Err(PointsError::UnknownUser);
    }

    let entry = NewPointsHistoryEntry {
        id: Uuid::new_v4(),
        user_id,
        points: amount,
        entry_type: ENTRY_EARNED.to_string(),
        source: SOURCE_PICKUP.to_string(),
        source_id: pickup_id,
        description: description.to_string(),
    };

    diesel::insert_into(points_history::table)
        .values(&entry)
        .execute(conn)?;

    Ok(())
}
