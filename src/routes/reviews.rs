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
use crate::lifecycle::REVIEW_FLAG_THRESHOLD;
use crate::models::{Location, NewReview, NewReviewHelpful, Review};
use crate::notify::{self, notify_or_log};
use crate::schema::{locations, review_helpful, reviews};
use crate::state::AppState;
use crate::utils::json::{ok, Envelope};

use super::pickups::to_iso;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_FLAGGED: &str = "flagged";
pub const STATUS_HIDDEN: &str = "hidden";

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub location_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

#[derive(Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct RespondReviewRequest {
    pub response: String,
}

#[derive(Deserialize)]
pub struct ModerateReviewRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct ReviewListQuery {
    pub location_id: Uuid,
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub status: String,
    pub flagged_count: i32,
    pub helpful_count: i32,
    pub response_text: Option<String>,
    pub response_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct HelpfulResponse {
    pub marked: bool,
    pub helpful_count: i32,
}

fn to_review_response(review: Review) -> ReviewResponse {
    ReviewResponse {
        id: review.id,
        user_id: review.user_id,
        location_id: review.location_id,
        rating: review.rating,
        comment: review.comment,
        status: review.status,
        flagged_count: review.flagged_count,
        helpful_count: review.helpful_count,
        response_text: review.response_text,
        response_at: review.response_at.map(to_iso),
        created_at: to_iso(review.created_at),
        updated_at: to_iso(review.updated_at),
    }
}

fn check_rating(rating: i32) -> AppResult<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::bad_request("rating must be between 1 and 5"))
    }
}

pub async fn create_review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<Envelope<ReviewResponse>>)> {
    user.require_role(Role::Public)?;
    check_rating(payload.rating)?;
    if payload.comment.trim().is_empty() {
        return Err(AppError::bad_request("comment must not be empty"));
    }

    let mut conn = state.db()?;
    let location: Location = locations::table.find(payload.location_id).first(&mut conn)?;
    if location.status != "approved" {
        return Err(AppError::bad_request("location is not approved"));
    }
    if location.owner_id == user.user_id {
        return Err(AppError::bad_request("cannot review your own location"));
    }

    let existing = reviews::table
        .filter(reviews::user_id.eq(user.user_id))
        .filter(reviews::location_id.eq(location.id))
        .first::<Review>(&mut conn)
        .optional()?;
    if existing.is_some() {
        return Err(AppError::bad_request(
            "you have already reviewed this location",
        ));
    }

    let new_review = NewReview {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        location_id: location.id,
        rating: payload.rating,
        comment: payload.comment.trim().to_string(),
        status: STATUS_ACTIVE.to_string(),
    };
    diesel::insert_into(reviews::table)
        .values(&new_review)
        .execute(&mut conn)?;

    notify_or_log(
        &mut conn,
        location.owner_id,
        "New review",
        &format!("Your location {:?} received a new review", location.name),
        notify::KIND_REVIEW,
        Some(new_review.id),
    );

    let review: Review = reviews::table.find(new_review.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, ok(to_review_response(review))))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ReviewListQuery>,
) -> AppResult<Json<Envelope<Vec<ReviewResponse>>>> {
    let mut conn = state.db()?;

    let rows: Vec<Review> = reviews::table
        .filter(reviews::location_id.eq(query.location_id))
        .filter(reviews::status.eq(STATUS_ACTIVE))
        .order(reviews::created_at.desc())
        .load(&mut conn)?;

    Ok(ok(rows.into_iter().map(to_review_response).collect()))
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateReviewRequest>,
) -> AppResult<Json<Envelope<ReviewResponse>>> {
    let mut conn = state.db()?;
    let review: Review = reviews::table.find(review_id).first(&mut conn)?;

    if review.user_id != user.user_id {
        return Err(AppError::not_found());
    }
    if review.status != STATUS_ACTIVE {
        return Err(AppError::bad_request("only active reviews can be edited"));
    }
    if let Some(rating) = payload.rating {
        check_rating(rating)?;
    }
    if let Some(comment) = payload.comment.as_deref() {
        if comment.trim().is_empty() {
            return Err(AppError::bad_request("comment must not be empty"));
        }
    }

    diesel::update(reviews::table.find(review_id))
        .set((
            reviews::rating.eq(payload.rating.unwrap_or(review.rating)),
            reviews::comment.eq(payload
                .comment
                .as_deref()
                .map(str::trim)
                .unwrap_or(&review.comment)),
            reviews::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated: Review = reviews::table.find(review_id).first(&mut conn)?;
    Ok(ok(to_review_response(updated)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let review: Review = reviews::table.find(review_id).first(&mut conn)?;

    if review.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::not_found());
    }

    conn.transaction::<_, AppError, _>(|conn| {
        diesel::delete(review_helpful::table.filter(review_helpful::review_id.eq(review_id)))
            .execute(conn)?;
        diesel::delete(reviews::table.find(review_id)).execute(conn)?;
        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn flag_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<ReviewResponse>>> {
    let mut conn = state.db()?;

    let updated = conn.transaction::<Review, AppError, _>(|conn| {
        let review: Review = reviews::table.find(review_id).first(conn)?;
        if review.user_id == user.user_id {
            return Err(AppError::bad_request("cannot flag your own review"));
        }

        let flagged_count = review.flagged_count + 1;
        let next_status = if review.status == STATUS_ACTIVE && flagged_count >= REVIEW_FLAG_THRESHOLD
        {
            STATUS_FLAGGED
        } else {
            review.status.as_str()
        };

        diesel::update(reviews::table.find(review_id))
            .set((
                reviews::flagged_count.eq(flagged_count),
                reviews::status.eq(next_status),
                reviews::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        Ok(reviews::table.find(review_id).first(conn)?)
    })?;

    if updated.status == STATUS_FLAGGED {
        notify_or_log(
            &mut conn,
            updated.user_id,
            "Review flagged",
            "Your review was flagged for moderation",
            notify::KIND_REVIEW,
            Some(updated.id),
        );
    }

    Ok(ok(to_review_response(updated)))
}

pub async fn mark_helpful(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<HelpfulResponse>>> {
    let mut conn = state.db()?;

    let (marked, helpful_count) = conn.transaction::<(bool, i32), AppError, _>(|conn| {
        let review: Review = reviews::table.find(review_id).first(conn)?;
        if review.user_id == user.user_id {
            return Err(AppError::bad_request(
                "cannot mark your own review as helpful",
            ));
        }
        if review.status != STATUS_ACTIVE {
            return Err(AppError::bad_request(
                "only active reviews accept helpful marks",
            ));
        }

        let existing = review_helpful::table
            .find((review_id, user.user_id))
            .first::<crate::models::ReviewHelpful>(conn)
            .optional()?;

        let (marked, delta) = if existing.is_some() {
            diesel::delete(review_helpful::table.find((review_id, user.user_id)))
                .execute(conn)?;
            (false, -1)
        } else {
            diesel::insert_into(review_helpful::table)
                .values(&NewReviewHelpful {
                    review_id,
                    user_id: user.user_id,
                })
                .execute(conn)?;
            (true, 1)
        };

        let helpful_count = (review.helpful_count + delta).max(0);
        diesel::update(reviews::table.find(review_id))
            .set(reviews::helpful_count.eq(helpful_count))
            .execute(conn)?;

        Ok((marked, helpful_count))
    })?;

    Ok(ok(HelpfulResponse {
        marked,
        helpful_count,
    }))
}

pub async fn respond_to_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<RespondReviewRequest>,
) -> AppResult<Json<Envelope<ReviewResponse>>> {
    user.require_role(Role::Mitra)?;
    if payload.response.trim().is_empty() {
        return Err(AppError::bad_request("response must not be empty"));
    }

    let mut conn = state.db()?;
    let review: Review = reviews::table.find(review_id).first(&mut conn)?;
    let location: Location = locations::table.find(review.location_id).first(&mut conn)?;

    if location.owner_id != user.user_id {
        return Err(AppError::not_found());
    }
    if review.status != STATUS_ACTIVE {
        return Err(AppError::bad_request(
            "only active reviews accept responses",
        ));
    }
    if review.response_text.is_some() {
        return Err(AppError::bad_request(
            "this review already has a response",
        ));
    }

    let now = Utc::now().naive_utc();
    diesel::update(reviews::table.find(review_id))
        .set((
            reviews::response_text.eq(payload.response.trim()),
            reviews::response_at.eq(now),
            reviews::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    notify_or_log(
        &mut conn,
        review.user_id,
        "Review response",
        &format!("{} responded to your review", location.name),
        notify::KIND_REVIEW,
        Some(review.id),
    );

    let updated: Review = reviews::table.find(review_id).first(&mut conn)?;
    Ok(ok(to_review_response(updated)))
}

pub async fn moderate_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<ModerateReviewRequest>,
) -> AppResult<Json<Envelope<ReviewResponse>>> {
    user.require_role(Role::Admin)?;

    let status = payload.status.as_str();
    if status != STATUS_ACTIVE && status != STATUS_HIDDEN {
        return Err(AppError::bad_request("status must be active or hidden"));
    }

    let mut conn = state.db()?;
    reviews::table.find(review_id).first::<Review>(&mut conn)?;

    diesel::update(reviews::table.find(review_id))
        .set((
            reviews::status.eq(status),
            reviews::flagged_count.eq(0),
            reviews::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated: Review = reviews::table.find(review_id).first(&mut conn)?;
    Ok(ok(to_review_response(updated)))
}
