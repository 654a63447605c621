//! HTTP service managing a single table of user records.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod services;

use std::path::Path;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{
    create_user, delete_user, get_user, handle_panic, list_users, not_found, update_user,
    SharedUsers,
};
use crate::repositories::UserRepository;

/// Build the application router.
///
/// `static_dir` must contain the frontend's `index.html`, which is served at
/// `/`; every file in it is also reachable under `/static`.
pub fn app<R: UserRepository>(users: SharedUsers<R>, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/users", get(list_users::<R>).post(create_user::<R>))
        .route(
            "/api/users/:id",
            get(get_user::<R>)
                .put(update_user::<R>)
                .delete(delete_user::<R>),
        )
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(Any)
                .expose_headers([header::CONTENT_TYPE]),
        )
        .with_state(users)
}
