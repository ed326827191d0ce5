/// Error handling for the web server
///
/// Handlers return `WebResult<Response>`. Recoverable service errors are
/// usually handled in place (flash and redirect, or a re-rendered form);
/// whatever reaches this type becomes a small HTML error page.
///
/// # Example
///
/// ```
/// use taskman_web::error::{WebError, WebResult};
///
/// fn lookup(found: bool) -> WebResult<&'static str> {
///     if found {
///         Ok("task")
///     } else {
///         Err(WebError::NotFound("Task not found".to_string()))
///     }
/// }
///
/// assert!(lookup(false).is_err());
/// ```

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use taskman_shared::validation::ValidationErrors;
use taskman_shared::ServiceError;
use thiserror::Error;

pub type WebResult<T> = Result<T, WebError>;

#[derive(Debug, Error)]
pub enum WebError {
    /// 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// 422, for forms that have no page to re-render
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// 409
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 403
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 500, logged and never shown in detail
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WebError::Conflict(_) => StatusCode::CONFLICT,
            WebError::Forbidden(_) => StatusCode::FORBIDDEN,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let reason = status.canonical_reason().unwrap_or("Error");
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{code} {reason}</title></head>\n<body>\n<h1>{code} {reason}</h1>\n<p>{message}</p>\n<p><a href=\"/\">Task manager</a></p>\n</body>\n</html>\n",
        code = status.as_u16(),
    ))
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            WebError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Something went wrong. Please try again later.".to_string()
            }
            WebError::Validation(errors) => format!("Invalid input: {} errors", errors.details().len()),
            WebError::NotFound(msg) | WebError::Conflict(msg) | WebError::Forbidden(msg) => msg,
        };

        (status, error_page(status, &message)).into_response()
    }
}

impl From<ServiceError> for WebError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => WebError::Validation(errors),
            ServiceError::NotFound { kind, id } => WebError::NotFound(format!("No {kind} with id {id}")),
            ServiceError::ReferentialConflict { kind, id } => {
                WebError::Conflict(format!("The {kind} {id} is still used by tasks"))
            }
            ServiceError::Authorization(msg) => WebError::Forbidden(msg),
            other => WebError::Internal(other.to_string()),
        }
    }
}

impl From<minijinja::Error> for WebError {
    fn from(err: minijinja::Error) -> Self {
        WebError::Internal(format!("Template error: {err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskman_shared::models::EntityKind;

    #[test]
    fn test_error_display() {
        let err = WebError::NotFound("Task 3".to_string());
        assert_eq!(err.to_string(), "Not found: Task 3");

        let err = WebError::Forbidden("not yours".to_string());
        assert_eq!(err.to_string(), "Forbidden: not yours");
    }

    #[test]
    fn test_service_error_mapping() {
        let err: WebError = ServiceError::not_found(EntityKind::Label, 4).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: WebError = ServiceError::ReferentialConflict {
            kind: EntityKind::Status,
            id: 1,
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: WebError = ServiceError::Validation(ValidationErrors::single("name", "Name is required")).into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: WebError = ServiceError::Authorization("no".to_string()).into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let response = WebError::Internal("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
