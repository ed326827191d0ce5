//! HTTP method override for HTML forms
//!
//! Browsers only submit forms as GET or POST. A POST whose query string
//! carries `_method=PATCH` or `_method=DELETE` is rewritten to that method.
//! The rewrite has to happen before routing, so it wraps the whole router
//! with [`tower::util::MapRequestLayer`] instead of being a router layer.

use axum::{extract::Request, http::Method};

const OVERRIDE_PARAM: &str = "_method";

/// The overriding method named in `query`, if any
fn requested_method(query: &str) -> Option<Method> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == OVERRIDE_PARAM)
        .and_then(|(_, value)| match value.to_ascii_uppercase().as_str() {
            "PATCH" => Some(Method::PATCH),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            _ => None,
        })
}

/// Rewrites the method of an overridden POST; other requests pass unchanged
pub fn method_override(mut request: Request) -> Request {
    if request.method() != Method::POST {
        return request;
    }

    if let Some(method) = request.uri().query().and_then(requested_method) {
        tracing::trace!(%method, path = %request.uri().path(), "Overriding form method");
        *request.method_mut() = method;
    }
    request
}
