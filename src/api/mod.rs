/// API routes and handlers
pub mod auth;
pub mod gist;
pub mod home;
pub mod oembed;
mod pages;

use crate::context::AppContext;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(home::routes())
        .merge(auth::routes())
        .merge(oembed::routes())
}

/// 302 Found redirect
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
