mod common;

use anyhow::{anyhow, Result};
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
struct Profile {
    user_id: Uuid,
    username: String,
    role: String,
    points: i32,
    badge: String,
}

#[derive(Deserialize)]
struct Tokens {
    access_token: String,
    token_type: String,
    expires_in: i64,
}

fn refresh_cookie(response: &hyper::Response<axum::body::Body>) -> Result<String> {
    let header = response
        .headers()
        .get("set-cookie")
        .ok_or_else(|| anyhow!("missing Set-Cookie header"))?
        .to_str()?;
    let pair = header
        .split(';')
        .next()
        .ok_or_else(|| anyhow!("empty Set-Cookie header"))?;
    Ok(pair.trim().to_string())
}

#[tokio::test]
async fn register_validates_input() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let created = app
        .post_json(
            "/api/auth/register",
            &json!({ "username": "warga-baru", "password": "hunter2pass", "role": "public" }),
            None,
        )
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = body_to_vec(created.into_body()).await?;
    let parsed: Env<Profile> = serde_json::from_slice(&body)?;
    assert!(parsed.success);
    let profile = parsed.data;
    assert_eq!(profile.username, "warga-baru");
    assert_eq!(profile.role, "public");
    assert_eq!(profile.points, 0);
    assert_eq!(profile.badge, "bronze");

    let duplicate = app
        .post_json(
            "/api/auth/register",
            &json!({ "username": "warga-baru", "password": "hunter2pass", "role": "public" }),
            None,
        )
        .await?;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let weak_password = app
        .post_json(
            "/api/auth/register",
            &json!({ "username": "lemah", "password": "short", "role": "public" }),
            None,
        )
        .await?;
    assert_eq!(weak_password.status(), StatusCode::BAD_REQUEST);

    // Nobody self-registers as admin.
    let as_admin = app
        .post_json(
            "/api/auth/register",
            &json!({ "username": "sneaky", "password": "hunter2pass", "role": "admin" }),
            None,
        )
        .await?;
    assert_eq!(as_admin.status(), StatusCode::BAD_REQUEST);

    let bad_role = app
        .post_json(
            "/api/auth/register",
            &json!({ "username": "confused", "password": "hunter2pass", "role": "wizard" }),
            None,
        )
        .await?;
    assert_eq!(bad_role.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn login_and_profile() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let user_id = app.insert_user("warga", "hunter2pass", "public").await?;

    let wrong_password = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "warga", "password": "not-the-password" }),
            None,
        )
        .await?;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);

    let unknown_user = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "nobody", "password": "hunter2pass" }),
            None,
        )
        .await?;
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let login = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "warga", "password": "hunter2pass" }),
            None,
        )
        .await?;
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = refresh_cookie(&login)?;
    assert!(cookie.starts_with("refresh_token="));
    let body = body_to_vec(login.into_body()).await?;
    let tokens: Tokens = serde_json::from_slice::<Env<Tokens>>(&body)?.data;
    assert_eq!(tokens.token_type, "Bearer");
    assert!(tokens.expires_in > 0);

    let me = app.get("/api/auth/me", Some(&tokens.access_token)).await?;
    assert_eq!(me.status(), StatusCode::OK);
    let body = body_to_vec(me.into_body()).await?;
    let profile = serde_json::from_slice::<Env<Profile>>(&body)?.data;
    assert_eq!(profile.user_id, user_id);
    assert_eq!(profile.username, "warga");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    for path in [
        "/api/pickups",
        "/api/locations",
        "/api/categories",
        "/api/notifications",
        "/api/auth/me",
    ] {
        let response = app.get(path, None).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "path {path}");
    }

    let garbage = app.get("/api/pickups", Some("not-a-jwt")).await?;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_and_revokes_the_old_cookie() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    app.insert_user("warga", "hunter2pass", "public").await?;

    let login = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "warga", "password": "hunter2pass" }),
            None,
        )
        .await?;
    assert_eq!(login.status(), StatusCode::OK);
    let first_cookie = refresh_cookie(&login)?;

    let refreshed = app
        .post_with_cookie("/api/auth/refresh", &first_cookie, None)
        .await?;
    assert_eq!(refreshed.status(), StatusCode::OK);
    let second_cookie = refresh_cookie(&refreshed)?;
    assert_ne!(first_cookie, second_cookie);
    let body = body_to_vec(refreshed.into_body()).await?;
    let tokens: Tokens = serde_json::from_slice::<Env<Tokens>>(&body)?.data;
    assert!(!tokens.access_token.is_empty());

    // The rotated-out cookie is single use.
    let replayed = app
        .post_with_cookie("/api/auth/refresh", &first_cookie, None)
        .await?;
    assert_eq!(replayed.status(), StatusCode::UNAUTHORIZED);

    let no_cookie = app.post_json("/api/auth/refresh", &json!({}), None).await?;
    assert_eq!(no_cookie.status(), StatusCode::UNAUTHORIZED);

    // Logout revokes the current cookie as well.
    let logout = app
        .post_with_cookie("/api/auth/logout", &second_cookie, Some(&tokens.access_token))
        .await?;
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);
    let after_logout = app
        .post_with_cookie("/api/auth/refresh", &second_cookie, None)
        .await?;
    assert_eq!(after_logout.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}
