//! Sign in and sign out

use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Form,
};
use minijinja::context;
use taskman_shared::services::users;
use tower_cookies::Cookies;
use tracing::info;

use super::flash_redirect;
use crate::app::AppState;
use crate::error::WebResult;
use crate::flash::FlashKind;
use crate::forms::{FormData, FormValues};
use crate::session::{self, Page};
use crate::views::NO_ERRORS;

pub async fn new(State(state): State<AppState>, page: Page) -> WebResult<Response> {
    state.views.render(
        "sessions/new.html",
        &page,
        context! { form => FormValues::default(), errors => NO_ERRORS },
    )
}

pub async fn create(
    State(state): State<AppState>,
    cookies: Cookies,
    mut page: Page,
    Form(fields): Form<Vec<(String, String)>>,
) -> WebResult<Response> {
    let form = FormData::from(fields);
    let email = form.text("email");

    match users::authenticate(&state.repos, &email, &form.text("password")).await? {
        Some(user) => {
            session::sign_in(&cookies, &state, &user)?;
            info!(user_id = user.id, "Signed in");
            Ok(flash_redirect(&cookies, &state, FlashKind::Success, "flash.session.create.success", "/"))
        }
        None => {
            info!("Rejected sign-in attempt");
            page.flash_now(FlashKind::Error, "flash.session.create.error");
            state.views.render_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                "sessions/new.html",
                &page,
                context! { form => form.echo(), errors => NO_ERRORS },
            )
        }
    }
}

pub async fn delete(State(state): State<AppState>, cookies: Cookies) -> Response {
    session::sign_out(&cookies);
    flash_redirect(&cookies, &state, FlashKind::Info, "flash.session.delete.success", "/")
}
