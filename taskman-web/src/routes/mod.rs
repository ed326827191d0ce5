/// Route handlers, one module per resource
///
/// - `health`: JSON health check
/// - `welcome`: home page
/// - `sessions`: sign in and sign out
/// - `users`: registration and account management
/// - `catalog`: statuses and labels, which share their pages
/// - `tasks`: task CRUD and the filtered task list

pub mod catalog;
pub mod health;
pub mod sessions;
pub mod tasks;
pub mod users;
pub mod welcome;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;

use crate::app::AppState;
use crate::flash::{self, FlashKind};

/// 302 Found to `location`
pub fn redirect_to(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Queues a flash message and redirects
pub fn flash_redirect(
    cookies: &Cookies,
    state: &AppState,
    kind: FlashKind,
    key: &str,
    location: &str,
) -> Response {
    flash::push(cookies, &state.config.session.secret, kind, key);
    redirect_to(location)
}
