//! Registration and account management
//!
//! The user list and registration are public. Only the account owner may
//! edit or delete an account; anyone else is sent back to the list with
//! `flash.users.permissionDenied`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Form,
};
use minijinja::context;
use taskman_shared::models::User;
use taskman_shared::services::users;
use taskman_shared::ServiceError;
use tower_cookies::Cookies;

use super::flash_redirect;
use crate::app::AppState;
use crate::error::WebResult;
use crate::flash::FlashKind;
use crate::forms::{FormData, FormValues};
use crate::session::{self, AuthUser, Page};
use crate::views::NO_ERRORS;

fn profile_values(user: &User) -> FormValues {
    FormValues::default()
        .with("first_name", &user.first_name)
        .with("last_name", &user.last_name)
        .with("email", &user.email)
}

fn permission_denied(cookies: &Cookies, state: &AppState) -> Response {
    flash_redirect(cookies, state, FlashKind::Error, "flash.users.permissionDenied", "/users")
}

pub async fn index(State(state): State<AppState>, page: Page) -> WebResult<Response> {
    let users = users::list(&state.repos).await?;
    state.views.render("users/index.html", &page, context! { users })
}

pub async fn new(State(state): State<AppState>, page: Page) -> WebResult<Response> {
    state.views.render(
        "users/new.html",
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

    match users::register(&state.repos, form.registration()).await {
        Ok(_) => Ok(flash_redirect(&cookies, &state, FlashKind::Success, "flash.users.create.success", "/")),
        Err(ServiceError::Validation(errors)) => {
            page.flash_now(FlashKind::Error, "flash.users.create.error");
            state.views.render_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                "users/new.html",
                &page,
                context! { form => form.echo(), errors => errors.by_field() },
            )
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn edit(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(acting): AuthUser,
    page: Page,
    Path(id): Path<i64>,
) -> WebResult<Response> {
    if acting.id != id {
        return Ok(permission_denied(&cookies, &state));
    }

    state.views.render(
        "users/edit.html",
        &page,
        context! { user_id => id, form => profile_values(&acting), errors => NO_ERRORS },
    )
}

pub async fn update(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(acting): AuthUser,
    mut page: Page,
    Path(id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> WebResult<Response> {
    let form = FormData::from(fields);

    match users::update_profile(&state.repos, acting.id, id, form.profile_update()).await {
        Ok(_) => Ok(flash_redirect(&cookies, &state, FlashKind::Success, "flash.users.edit.success", "/users")),
        Err(ServiceError::Authorization(_)) => Ok(permission_denied(&cookies, &state)),
        Err(ServiceError::Validation(errors)) => {
            page.flash_now(FlashKind::Error, "flash.users.edit.error");
            state.views.render_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                "users/edit.html",
                &page,
                context! { user_id => id, form => form.echo(), errors => errors.by_field() },
            )
        }
        Err(err) => Err(err.into()),
    }
}

/// Deleting one's own account also ends the session
pub async fn delete(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(acting): AuthUser,
    Path(id): Path<i64>,
) -> WebResult<Response> {
    match users::delete_account(&state.repos, acting.id, id).await {
        Ok(_) => {
            session::sign_out(&cookies);
            Ok(flash_redirect(&cookies, &state, FlashKind::Success, "flash.users.delete.success", "/users"))
        }
        Err(ServiceError::Authorization(_)) => Ok(permission_denied(&cookies, &state)),
        Err(ServiceError::ReferentialConflict { .. }) => {
            Ok(flash_redirect(&cookies, &state, FlashKind::Error, "flash.users.delete.error", "/users"))
        }
        Err(err) => Err(err.into()),
    }
}
