mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
struct Env<T> {
    success: bool,
    data: T,
}

#[derive(Deserialize)]
struct LocationData {
    id: Uuid,
    name: String,
    status: String,
    pickup_service: bool,
}

#[derive(Deserialize)]
struct NotificationData {
    kind: String,
    related_id: Option<Uuid>,
}

#[tokio::test]
async fn location_lifecycle_from_submission_to_approval() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    app.insert_user("depot-owner", "hunter2pass", "mitra").await?;
    app.insert_user("moderator", "hunter2pass", "admin").await?;
    app.insert_user("resident", "hunter2pass", "public").await?;
    let mitra_token = app.login_token("depot-owner", "hunter2pass").await?;
    let admin_token = app.login_token("moderator", "hunter2pass").await?;
    let public_token = app.login_token("resident", "hunter2pass").await?;

    let created = app
        .post_json(
            "/api/locations",
            &json!({
                "name": "Bank Sampah Kenanga",
                "street": "Jl. Kenanga 12",
                "city": "Surabaya",
                "province": "Jawa Timur",
                "pickup_service": true
            }),
            Some(&mitra_token),
        )
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = body_to_vec(created.into_body()).await?;
    let parsed: Env<LocationData> = serde_json::from_slice(&body)?;
    assert!(parsed.success);
    assert_eq!(parsed.data.status, "pending");
    assert!(parsed.data.pickup_service);
    let location_id = parsed.data.id;

    // Public users cannot submit locations.
    let as_public = app
        .post_json(
            "/api/locations",
            &json!({
                "name": "My Backyard",
                "street": "Jl. Rahasia 1",
                "city": "Surabaya"
            }),
            Some(&public_token),
        )
        .await?;
    assert_eq!(as_public.status(), StatusCode::FORBIDDEN);

    // Pending locations are invisible to the public, visible to owner and admin.
    let detail_public = app
        .get(&format!("/api/locations/{location_id}"), Some(&public_token))
        .await?;
    assert_eq!(detail_public.status(), StatusCode::NOT_FOUND);
    for token in [&mitra_token, &admin_token] {
        let detail = app
            .get(&format!("/api/locations/{location_id}"), Some(token))
            .await?;
        assert_eq!(detail.status(), StatusCode::OK);
    }

    let listed = app.get("/api/locations", Some(&public_token)).await?;
    let body = body_to_vec(listed.into_body()).await?;
    let parsed: Env<Vec<LocationData>> = serde_json::from_slice(&body)?;
    assert!(parsed.data.is_empty());

    // Only admins may moderate, and only to a real decision.
    let as_mitra = app
        .put_json(
            &format!("/api/locations/{location_id}/moderate"),
            &json!({ "status": "approved" }),
            Some(&mitra_token),
        )
        .await?;
    assert_eq!(as_mitra.status(), StatusCode::FORBIDDEN);

    let back_to_pending = app
        .put_json(
            &format!("/api/locations/{location_id}/moderate"),
            &json!({ "status": "pending" }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(back_to_pending.status(), StatusCode::BAD_REQUEST);

    let approved = app
        .put_json(
            &format!("/api/locations/{location_id}/moderate"),
            &json!({ "status": "approved" }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(approved.status(), StatusCode::OK);
    let body = body_to_vec(approved.into_body()).await?;
    let parsed: Env<LocationData> = serde_json::from_slice(&body)?;
    assert_eq!(parsed.data.status, "approved");

    // Now the public listing includes it.
    let listed = app.get("/api/locations", Some(&public_token)).await?;
    let body = body_to_vec(listed.into_body()).await?;
    let parsed: Env<Vec<LocationData>> = serde_json::from_slice(&body)?;
    assert_eq!(parsed.data.len(), 1);
    assert_eq!(parsed.data[0].name, "Bank Sampah Kenanga");

    // The owner was notified about the decision.
    let notifications = app.get("/api/notifications", Some(&mitra_token)).await?;
    let body = body_to_vec(notifications.into_body()).await?;
    let parsed: Env<Vec<NotificationData>> = serde_json::from_slice(&body)?;
    assert_eq!(parsed.data.len(), 1);
    assert_eq!(parsed.data[0].kind, "location");
    assert_eq!(parsed.data[0].related_id, Some(location_id));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn owner_updates_and_mine_filter() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let owner_id = app.insert_user("depot-owner", "hunter2pass", "mitra").await?;
    let rival_id = app.insert_user("rival-owner", "hunter2pass", "mitra").await?;
    let owner_token = app.login_token("depot-owner", "hunter2pass").await?;
    let rival_token = app.login_token("rival-owner", "hunter2pass").await?;

    let mine = app
        .insert_location(owner_id, "Depot Anggrek", "pending", false)
        .await?;
    app.insert_location(rival_id, "Depot Rival", "approved", true)
        .await?;

    // mine=true only returns the caller's locations, whatever their status.
    let listed = app.get("/api/locations?mine=true", Some(&owner_token)).await?;
    let body = body_to_vec(listed.into_body()).await?;
    let parsed: Env<Vec<LocationData>> = serde_json::from_slice(&body)?;
    assert_eq!(parsed.data.len(), 1);
    assert_eq!(parsed.data[0].name, "Depot Anggrek");

    let updated = app
        .patch_json(
            &format!("/api/locations/{mine}"),
            &json!({ "name": "Depot Anggrek Baru", "pickup_service": true }),
            Some(&owner_token),
        )
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);
    let body = body_to_vec(updated.into_body()).await?;
    let parsed: Env<LocationData> = serde_json::from_slice(&body)?;
    assert_eq!(parsed.data.name, "Depot Anggrek Baru");
    assert!(parsed.data.pickup_service);

    // Another mitra cannot touch it.
    let foreign = app
        .patch_json(
            &format!("/api/locations/{mine}"),
            &json!({ "name": "Hostile Takeover" }),
            Some(&rival_token),
        )
        .await?;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn category_management_is_admin_only() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    app.insert_user("moderator", "hunter2pass", "admin").await?;
    app.insert_user("resident", "hunter2pass", "public").await?;
    let admin_token = app.login_token("moderator", "hunter2pass").await?;
    let public_token = app.login_token("resident", "hunter2pass").await?;

    #[derive(Deserialize)]
    struct CategoryData {
        id: Uuid,
        name: String,
        points_per_kg: i32,
        is_active: bool,
    }

    let created = app
        .post_json(
            "/api/categories",
            &json!({ "name": "Paper", "points_per_kg": 10 }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = body_to_vec(created.into_body()).await?;
    let parsed: Env<CategoryData> = serde_json::from_slice(&body)?;
    assert_eq!(parsed.data.name, "Paper");
    assert_eq!(parsed.data.points_per_kg, 10);
    assert!(parsed.data.is_active);
    let category_id = parsed.data.id;

    let duplicate = app
        .post_json(
            "/api/categories",
            &json!({ "name": "Paper", "points_per_kg": 12 }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let bad_rate = app
        .post_json(
            "/api/categories",
            &json!({ "name": "Styrofoam", "points_per_kg": 0 }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(bad_rate.status(), StatusCode::BAD_REQUEST);

    let as_public = app
        .post_json(
            "/api/categories",
            &json!({ "name": "Gold", "points_per_kg": 1000 }),
            Some(&public_token),
        )
        .await?;
    assert_eq!(as_public.status(), StatusCode::FORBIDDEN);

    // Deactivated categories drop out of the public listing.
    let deactivated = app
        .patch_json(
            &format!("/api/categories/{category_id}"),
            &json!({ "is_active": false }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(deactivated.status(), StatusCode::OK);

    let public_list = app.get("/api/categories", Some(&public_token)).await?;
    let body = body_to_vec(public_list.into_body()).await?;
    let parsed: Env<Vec<CategoryData>> = serde_json::from_slice(&body)?;
    assert!(parsed.data.is_empty());

    let admin_list = app.get("/api/categories", Some(&admin_token)).await?;
    let body = body_to_vec(admin_list.into_body()).await?;
    let parsed: Env<Vec<CategoryData>> = serde_json::from_slice(&body)?;
    assert_eq!(parsed.data.len(), 1);
    assert!(!parsed.data[0].is_active);

    app.cleanup().await?;
    Ok(())
}
