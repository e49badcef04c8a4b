use axum::http::HeaderValue;
use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod auth;
pub mod categories;
pub mod health;
pub mod locations;
pub mod notifications;
pub mod pickups;
pub mod reviews;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let pickups_routes = Router::new()
        .route("/", get(pickups::list_pickups).post(pickups::create_pickup))
        .route("/my-pickups", get(pickups::my_pickups))
        .route("/schedule", get(pickups::schedule))
        .route("/stats", get(pickups::stats))
        .route("/:id", get(pickups::get_pickup))
        .route("/:id/status", put(pickups::update_status))
        .route("/:id/cancel", put(pickups::cancel_pickup));

    let locations_routes = Router::new()
        .route(
            "/",
            get(locations::list_locations).post(locations::create_location),
        )
        .route(
            "/:id",
            get(locations::get_location).patch(locations::update_location),
        )
        .route("/:id/moderate", put(locations::moderate_location));

    let categories_routes = Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/:id", patch(categories::update_category));

    let reviews_routes = Router::new()
        .route("/", get(reviews::list_reviews).post(reviews::create_review))
        .route(
            "/:id",
            patch(reviews::update_review).delete(reviews::delete_review),
        )
        .route("/:id/flag", post(reviews::flag_review))
        .route("/:id/helpful", post(reviews::mark_helpful))
        .route("/:id/response", post(reviews::respond_to_review))
        .route("/:id/moderate", put(reviews::moderate_review));

    let notifications_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/read-all", put(notifications::mark_all_read))
        .route("/:id/read", put(notifications::mark_read));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/pickups", pickups_routes)
        .nest("/api/locations", locations_routes)
        .nest("/api/categories", categories_routes)
        .nest("/api/reviews", reviews_routes)
        .nest("/api/notifications", notifications_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
}
