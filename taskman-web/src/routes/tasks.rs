//! Task pages
//!
//! Every signed-in user sees and edits every task; the list can be narrowed
//! with the `status`, `executor`, `label` and `isCreatorUser` query
//! parameters. Only the creator may delete a task.

use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Form,
};
use minijinja::{context, Value};
use taskman_shared::filter::{TaskFilter, TaskQuery};
use taskman_shared::repository::Repository;
use taskman_shared::services::tasks;
use taskman_shared::validation::ValidationErrors;
use taskman_shared::ServiceError;
use tower_cookies::Cookies;

use super::flash_redirect;
use crate::app::AppState;
use crate::error::WebResult;
use crate::flash::FlashKind;
use crate::forms::{FormData, FormValues};
use crate::session::{AuthUser, Page};

/// Statuses, users and labels offered by the task form
async fn choices(state: &AppState) -> WebResult<Value> {
    let repos = &state.repos;
    let statuses = repos.statuses.list().await.map_err(ServiceError::from)?;
    let users = repos.users.list().await.map_err(ServiceError::from)?;
    let labels = repos.labels.list().await.map_err(ServiceError::from)?;
    Ok(context! { statuses, users, labels })
}

/// What the task form shows besides the choices
#[derive(Default)]
struct TaskForm {
    values: FormValues,
    selected_labels: BTreeSet<i64>,
    errors: ValidationErrors,
}

async fn render_form(
    state: &AppState,
    page: &Page,
    status: StatusCode,
    template: &str,
    task_id: Option<i64>,
    form: TaskForm,
) -> WebResult<Response> {
    let choices = choices(state).await?;
    state.views.render_with_status(
        status,
        template,
        page,
        context! {
            form => form.values,
            selected_labels => form.selected_labels,
            errors => form.errors.by_field(),
            task_id,
            ..choices
        },
    )
}

pub async fn index(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    page: Page,
    Query(params): Query<Vec<(String, String)>>,
) -> WebResult<Response> {
    let query: TaskQuery = params.into_iter().collect();
    let filter = TaskFilter::from_query(&query, user.id);
    let tasks = tasks::list(&state.repos, &filter).await?;
    let choices = choices(&state).await?;

    state.views.render(
        "tasks/index.html",
        &page,
        context! { tasks, filter => filter.state(), ..choices },
    )
}

pub async fn new(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    page: Page,
) -> WebResult<Response> {
    render_form(
        &state,
        &page,
        StatusCode::OK,
        "tasks/new.html",
        None,
        TaskForm::default(),
    )
    .await
}

pub async fn create(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    mut page: Page,
    Form(fields): Form<Vec<(String, String)>>,
) -> WebResult<Response> {
    let form = FormData::from(fields);
    let draft = form.task_draft();
    let selected_labels = draft.label_ids.clone();

    match tasks::create(&state.repos, user.id, draft).await {
        Ok(_) => Ok(flash_redirect(&cookies, &state, FlashKind::Success, "flash.tasks.create.success", "/tasks")),
        Err(ServiceError::Validation(errors)) => {
            page.flash_now(FlashKind::Error, "flash.tasks.create.error");
            render_form(
                &state,
                &page,
                StatusCode::UNPROCESSABLE_ENTITY,
                "tasks/new.html",
                None,
                TaskForm {
                    values: form.echo(),
                    selected_labels,
                    errors,
                },
            )
            .await
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn show(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    page: Page,
    Path(id): Path<i64>,
) -> WebResult<Response> {
    let task = tasks::get_details(&state.repos, id).await?;
    state.views.render("tasks/show.html", &page, context! { task })
}

pub async fn edit(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    page: Page,
    Path(id): Path<i64>,
) -> WebResult<Response> {
    let details = tasks::get_details(&state.repos, id).await?;
    let task = &details.task;

    let mut values = FormValues::default()
        .with("name", &task.name)
        .with("description", task.description.as_deref().unwrap_or_default())
        .with("status_id", task.status_id);
    if let Some(executor_id) = task.executor_id {
        values = values.with("executor_id", executor_id);
    }

    render_form(
        &state,
        &page,
        StatusCode::OK,
        "tasks/edit.html",
        Some(id),
        TaskForm {
            values,
            selected_labels: details.label_ids(),
            errors: ValidationErrors::new(),
        },
    )
    .await
}

/// Overwrites every field, the label set included
pub async fn update(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    mut page: Page,
    Path(id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> WebResult<Response> {
    let form = FormData::from(fields);
    let draft = form.task_draft();
    let selected_labels = draft.label_ids.clone();

    match tasks::update(&state.repos, user.id, id, draft.into_patch()).await {
        Ok(_) => Ok(flash_redirect(&cookies, &state, FlashKind::Success, "flash.tasks.edit.success", "/tasks")),
        Err(ServiceError::Validation(errors)) => {
            page.flash_now(FlashKind::Error, "flash.tasks.edit.error");
            render_form(
                &state,
                &page,
                StatusCode::UNPROCESSABLE_ENTITY,
                "tasks/edit.html",
                Some(id),
                TaskForm {
                    values: form.echo(),
                    selected_labels,
                    errors,
                },
            )
            .await
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> WebResult<Response> {
    match tasks::delete(&state.repos, user.id, id).await {
        Ok(_) => Ok(flash_redirect(&cookies, &state, FlashKind::Success, "flash.tasks.delete.success", "/tasks")),
        Err(ServiceError::Authorization(_)) => {
            Ok(flash_redirect(&cookies, &state, FlashKind::Error, "flash.tasks.delete.error", "/tasks"))
        }
        Err(err) => Err(err.into()),
    }
}
