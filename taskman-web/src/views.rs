//! Server-rendered views
//!
//! Templates are embedded at compile time and loaded into one minijinja
//! environment at startup. Every page extends `layout.html`, which reads
//! `current_user` and `flash` from the context; [`Views::render`] adds both
//! from the request's [`Page`].

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use minijinja::{context, Environment, Value};

use crate::error::WebResult;
use crate::i18n;
use crate::session::Page;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("welcome.html", include_str!("../templates/welcome.html")),
    ("sessions/new.html", include_str!("../templates/sessions/new.html")),
    ("users/index.html", include_str!("../templates/users/index.html")),
    ("users/new.html", include_str!("../templates/users/new.html")),
    ("users/edit.html", include_str!("../templates/users/edit.html")),
    ("catalog/index.html", include_str!("../templates/catalog/index.html")),
    ("catalog/new.html", include_str!("../templates/catalog/new.html")),
    ("catalog/edit.html", include_str!("../templates/catalog/edit.html")),
    ("tasks/index.html", include_str!("../templates/tasks/index.html")),
    ("tasks/form.html", include_str!("../templates/tasks/form.html")),
    ("tasks/new.html", include_str!("../templates/tasks/new.html")),
    ("tasks/edit.html", include_str!("../templates/tasks/edit.html")),
    ("tasks/show.html", include_str!("../templates/tasks/show.html")),
];

/// Per-field errors of a form that has not been submitted yet
pub const NO_ERRORS: BTreeMap<String, Vec<String>> = BTreeMap::new();

/// `2024-01-02T03:04:05Z` → `02.01.2024 03:04`
fn datetime(value: String) -> String {
    chrono::DateTime::parse_from_rfc3339(&value)
        .map(|parsed| parsed.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or(value)
}

pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        env.add_function("t", i18n::t);
        env.add_filter("datetime", datetime);
        Ok(Self { env })
    }

    fn render_string(&self, name: &str, page: &Page, ctx: Value) -> WebResult<String> {
        let template = self.env.get_template(name)?;
        let rendered = template.render(context! {
            current_user => &page.user,
            flash => &page.flash,
            ..ctx
        })?;
        Ok(rendered)
    }

    /// Renders a page with status 200
    pub fn render(&self, name: &str, page: &Page, ctx: Value) -> WebResult<Response> {
        self.render_with_status(StatusCode::OK, name, page, ctx)
    }

    /// Renders a page with an explicit status, e.g. 422 for a rejected form
    pub fn render_with_status(
        &self,
        status: StatusCode,
        name: &str,
        page: &Page,
        ctx: Value,
    ) -> WebResult<Response> {
        let html = self.render_string(name, page, ctx)?;
        page.mark_shown();
        Ok((status, Html(html)).into_response())
    }
}
