//! Status and label pages
//!
//! Statuses and labels are both a bare name that tasks refer to, so one set
//! of handlers, generic over [`CatalogPage`], serves `/statuses` and
//! `/labels`. Every page requires a signed-in user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Form,
};
use minijinja::context;
use serde::Serialize;
use taskman_shared::models::{Label, Status};
use taskman_shared::repository::{Repositories, Repository};
use taskman_shared::services::catalog::{self, CatalogEntity};
use taskman_shared::ServiceError;
use tower_cookies::Cookies;
use validator::Validate;

use super::flash_redirect;
use crate::app::AppState;
use crate::error::WebResult;
use crate::flash::FlashKind;
use crate::forms::{FormData, FormValues};
use crate::session::{AuthUser, Page};
use crate::views::NO_ERRORS;

/// A catalog entity with its own section of the site
pub trait CatalogPage: CatalogEntity + Serialize {
    /// URL prefix and message key segment, e.g. `statuses`
    const SECTION: &'static str;

    fn repository(repos: &Repositories) -> &dyn Repository<Self>;
}

impl CatalogPage for Status {
    const SECTION: &'static str = "statuses";

    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        &*repos.statuses
    }
}

impl CatalogPage for Label {
    const SECTION: &'static str = "labels";

    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        &*repos.labels
    }
}

fn flash_key<E: CatalogPage>(action: &str, outcome: &str) -> String {
    format!("flash.{}.{action}.{outcome}", E::SECTION)
}

fn list_path<E: CatalogPage>() -> String {
    format!("/{}", E::SECTION)
}

pub async fn index<E: CatalogPage>(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    page: Page,
) -> WebResult<Response> {
    let items = catalog::list::<E, _>(E::repository(&state.repos)).await?;
    state.views.render(
        "catalog/index.html",
        &page,
        context! { section => E::SECTION, items },
    )
}

pub async fn new<E: CatalogPage>(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    page: Page,
) -> WebResult<Response> {
    state.views.render(
        "catalog/new.html",
        &page,
        context! { section => E::SECTION, form => FormValues::default(), errors => NO_ERRORS },
    )
}

pub async fn create<E>(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(_): AuthUser,
    mut page: Page,
    Form(fields): Form<Vec<(String, String)>>,
) -> WebResult<Response>
where
    E: CatalogPage,
    E::New: Validate,
{
    let form = FormData::from(fields);

    match catalog::create::<E, _>(E::repository(&state.repos), &form.text("name")).await {
        Ok(_) => Ok(flash_redirect(
            &cookies,
            &state,
            FlashKind::Success,
            &flash_key::<E>("create", "success"),
            &list_path::<E>(),
        )),
        Err(ServiceError::Validation(errors)) => {
            page.flash_now(FlashKind::Error, &flash_key::<E>("create", "error"));
            state.views.render_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                "catalog/new.html",
                &page,
                context! { section => E::SECTION, form => form.echo(), errors => errors.by_field() },
            )
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn edit<E: CatalogPage>(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    page: Page,
    Path(id): Path<i64>,
) -> WebResult<Response> {
    let item = catalog::get::<E, _>(E::repository(&state.repos), id).await?;
    let form = FormValues::default().with("name", item.name());

    state.views.render(
        "catalog/edit.html",
        &page,
        context! { section => E::SECTION, item_id => id, form, errors => NO_ERRORS },
    )
}

pub async fn update<E>(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(_): AuthUser,
    mut page: Page,
    Path(id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> WebResult<Response>
where
    E: CatalogPage,
    E::Patch: Validate,
{
    let form = FormData::from(fields);

    match catalog::rename::<E, _>(E::repository(&state.repos), id, &form.text("name")).await {
        Ok(_) => Ok(flash_redirect(
            &cookies,
            &state,
            FlashKind::Success,
            &flash_key::<E>("edit", "success"),
            &list_path::<E>(),
        )),
        Err(ServiceError::Validation(errors)) => {
            page.flash_now(FlashKind::Error, &flash_key::<E>("edit", "error"));
            state.views.render_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                "catalog/edit.html",
                &page,
                context! { section => E::SECTION, item_id => id, form => form.echo(), errors => errors.by_field() },
            )
        }
        Err(err) => Err(err.into()),
    }
}

/// Refused with a flash while any task still uses the entity
pub async fn delete<E: CatalogPage>(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(_): AuthUser,
    Path(id): Path<i64>,
) -> WebResult<Response> {
    let outcome = match catalog::delete::<E, _, _>(E::repository(&state.repos), &*state.repos.tasks, id).await {
        Ok(_) => (FlashKind::Success, "success"),
        Err(ServiceError::ReferentialConflict { .. }) => (FlashKind::Error, "error"),
        Err(err) => return Err(err.into()),
    };

    Ok(flash_redirect(
        &cookies,
        &state,
        outcome.0,
        &flash_key::<E>("delete", outcome.1),
        &list_path::<E>(),
    ))
}
