//! API layer - HTTP handlers and routing
//!
//! Three groups of routes share one router:
//! - public pages, which still see the signed-in user when there is one
//! - member pages, which send anonymous visitors to the login page
//! - the admin console, which answers 401/403 instead of redirecting

pub mod admin;
pub mod auth;
pub mod common;
pub mod content;
pub mod directory;
pub mod events;
pub mod flash;
pub mod middleware;
pub mod profile;

#[cfg(test)]
mod tests;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser, CurrentUser};

/// Build the routes without the outer layers
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin console (admin role)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Member pages (login required)
    let member_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/stories/new", post(content::create_story))
        .route("/recipes/new", post(content::create_recipe))
        .route("/knowledge/new", post(content::create_knowledge))
        .route("/directory/suggest", post(content::suggest_business))
        .route("/events/new", post(events::propose))
        .route("/profile", get(profile::show).post(profile::update))
        .route("/profile/avatar/delete", post(profile::delete_avatar))
        .route("/users", get(profile::list))
        .route("/businesses/new", post(directory::create))
        .route("/businesses/{id}/edit", post(directory::update))
        .route("/businesses/{id}/delete", post(directory::delete))
        .route("/businesses/{id}/comments", post(directory::add_comment))
        .route("/businesses/{id}/ratings", post(directory::add_rating))
        .route("/businesses/{id}/review", post(directory::review))
        .route("/businesses/{id}/messages", post(directory::send_message))
        .route("/inbox", get(directory::inbox))
        .route("/inbox/{id}/read", post(directory::mark_read))
        .route("/claims", post(directory::claim))
        .route(
            "/comments/{id}/report",
            get(directory::report_form).post(directory::report),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_login,
        ));

    // Public pages
    let public_routes = Router::new()
        .route("/", get(content::home))
        .route("/library", get(content::library))
        .route("/map", get(content::map))
        .route("/events", get(events::calendar))
        .route("/businesses", get(directory::list))
        .route("/businesses/{id}", get(directory::detail))
        .route("/users/{username}", get(profile::public))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::optional_auth,
        ));

    // Forms that never need a session
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/messages", get(flash::take_messages))
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
            cors
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    build_api_router(state.clone())
        .fallback(|| async { ApiError::not_found("Page not found") })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
