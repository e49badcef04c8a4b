use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::{AppError, AppResult};
use crate::models::{NewWasteCategory, WasteCategory};
use crate::schema::waste_categories;
use crate::state::AppState;
use crate::utils::json::{ok, Envelope};

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub points_per_kg: i32,
}

#[derive(Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub points_per_kg: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub points_per_kg: i32,
    pub is_active: bool,
}

impl From<WasteCategory> for CategoryResponse {
    fn from(category: WasteCategory) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            icon: category.icon,
            points_per_kg: category.points_per_kg,
            is_active: category.is_active,
        }
    }
}

pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Envelope<Vec<CategoryResponse>>>> {
    let mut conn = state.db()?;

    let mut db_query = waste_categories::table
        .order(waste_categories::name.asc())
        .into_boxed();
    if !user.is_admin() {
        db_query = db_query.filter(waste_categories::is_active.eq(true));
    }

    let rows: Vec<WasteCategory> = db_query.load(&mut conn)?;
    Ok(ok(rows.into_iter().map(CategoryResponse::from).collect()))
}

pub async fn create_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<Envelope<CategoryResponse>>)> {
    user.require_role(Role::Admin)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if payload.points_per_kg <= 0 {
        return Err(AppError::bad_request(
            "points_per_kg must be greater than zero",
        ));
    }

    let mut conn = state.db()?;
    let new_category = NewWasteCategory {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        description: payload.description,
        icon: payload.icon,
        points_per_kg: payload.points_per_kg,
        is_active: true,
    };

    match diesel::insert_into(waste_categories::table)
        .values(&new_category)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::bad_request("category name already exists"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let category: WasteCategory = waste_categories::table
        .find(new_category.id)
        .first(&mut conn)?;
    Ok((StatusCode::CREATED, ok(CategoryResponse::from(category))))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateCategoryRequest>,
) -> AppResult<Json<Envelope<CategoryResponse>>> {
    user.require_role(Role::Admin)?;

    let mut conn = state.db()?;
    let existing: WasteCategory = waste_categories::table.find(category_id).first(&mut conn)?;

    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
    }
    if let Some(rate) = payload.points_per_kg {
        if rate <= 0 {
            return Err(AppError::bad_request(
                "points_per_kg must be greater than zero",
            ));
        }
    }

    diesel::update(waste_categories::table.find(category_id))
        .set((
            waste_categories::name.eq(payload
                .name
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.name)),
            waste_categories::description.eq(payload
                .description
                .as_deref()
                .or(existing.description.as_deref())),
            waste_categories::icon.eq(payload.icon.as_deref().or(existing.icon.as_deref())),
            waste_categories::points_per_kg
                .eq(payload.points_per_kg.unwrap_or(existing.points_per_kg)),
            waste_categories::is_active.eq(payload.is_active.unwrap_or(existing.is_active)),
        ))
        .execute(&mut conn)?;

    let updated: WasteCategory = waste_categories::table.find(category_id).first(&mut conn)?;
    Ok(ok(CategoryResponse::from(updated)))
}
