use axum::{extract::State, response::Response};
use minijinja::context;

use crate::app::AppState;
use crate::error::WebResult;
use crate::session::Page;

pub async fn index(State(state): State<AppState>, page: Page) -> WebResult<Response> {
    state.views.render("welcome.html", &page, context! {})
}
