pub mod auth;
pub mod middleware;
pub mod profiles;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use rest::ApiDoc;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

/// Builds the complete application router: public auth routes, protected
/// profile/donation/media routes, static photo serving and the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    let config = app_state.config.clone();

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/profiles", post(profiles::create_profile_handler))
        .route("/profiles/{user_id}", get(profiles::get_profile_handler))
        .route(
            "/donations",
            get(rest::list_donations_handler).post(rest::create_donation_handler),
        )
        .route(
            "/donations/{id}",
            get(rest::get_donation_handler).delete(rest::delete_donation_handler),
        )
        .route("/donations/{id}/accept", post(rest::accept_donation_handler))
        .route("/uploads", post(rest::upload_media_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let mut api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/media", ServeDir::new(&config.media_root))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => {
            let cors = CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
            api_router = api_router.layer(cors);
        }
        Err(e) => warn!("Ignoring invalid CORS origin '{}': {}", config.cors_origin, e),
    }

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router.with_state(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
