/// Session cookie and request extractors
///
/// The `session` cookie holds a signed session token naming the user. Two
/// extractors read it:
///
/// - [`AuthUser`]: the signed-in user, or a 302 to `/` with the
///   `flash.authError` message
/// - [`Page`]: the signed-in user, if any, plus the pending flash messages, for
///   handlers that render a template
///
/// The cookie itself lives for the browser session; the token carries the
/// expiry. A token that is expired, forged or names a deleted user is treated
/// as no session, and the stale cookie is removed.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use taskman_shared::auth::session::{issue_session_token, verify_session_token};
use taskman_shared::models::User;
use taskman_shared::repository::Repository;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use tracing::debug;

use crate::app::AppState;
use crate::error::WebError;
use crate::flash::{self, FlashKind, FlashMessage};
use crate::routes::redirect_to;

pub const SESSION_COOKIE: &str = "session";

async fn cookie_jar(parts: &mut Parts, state: &AppState) -> Result<Cookies, WebError> {
    Cookies::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| WebError::Internal(msg.to_string()))
}

/// Signs `user` in by setting the session cookie
pub fn sign_in(cookies: &Cookies, state: &AppState, user: &User) -> Result<(), WebError> {
    let session = &state.config.session;
    let token = issue_session_token(user.id, &session.secret, session.ttl())
        .map_err(|e| WebError::Internal(format!("Failed to issue session token: {e}")))?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(session.secure_cookies)
        .build();
    cookies.add(cookie);
    Ok(())
}

pub fn sign_out(cookies: &Cookies) {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookies.remove(cookie);
}

async fn session_user(cookies: &Cookies, state: &AppState) -> Result<Option<User>, WebError> {
    let Some(cookie) = cookies.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    let user_id = verify_session_token(cookie.value(), &state.config.session.secret)
        .and_then(|claims| claims.user_id());
    let user = match user_id {
        Ok(id) => state
            .repos
            .users
            .find_by_id(id)
            .await
            .map_err(|e| WebError::Internal(format!("Failed to load session user: {e}")))?,
        Err(err) => {
            debug!(error = %err, "Ignoring invalid session token");
            None
        }
    };

    if user.is_none() {
        sign_out(cookies);
    }
    Ok(user)
}

/// A signed-in user; anonymous requests are sent to `/`
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = cookie_jar(parts, state).await.map_err(IntoResponse::into_response)?;
        match session_user(&cookies, state).await {
            Ok(Some(user)) => Ok(AuthUser(user)),
            Ok(None) => {
                debug!(path = %parts.uri.path(), "Anonymous request to a protected page");
                flash::push(&cookies, &state.config.session.secret, FlashKind::Error, "flash.authError");
                Err(redirect_to("/"))
            }
            Err(err) => Err(err.into_response()),
        }
    }
}

/// Everything the layout needs: the user and the flash messages to show
///
/// The flash cookie is only cleared once the page is rendered, so a handler
/// that redirects instead keeps earlier messages queued.
#[derive(Clone)]
pub struct Page {
    pub user: Option<User>,
    pub flash: Vec<FlashMessage>,
    cookies: Option<Cookies>,
}

impl Page {
    /// A page detached from any request cookies
    pub fn new(user: Option<User>, flash: Vec<FlashMessage>) -> Self {
        Self {
            user,
            flash,
            cookies: None,
        }
    }

    pub(crate) fn mark_shown(&self) {
        if let Some(cookies) = &self.cookies {
            flash::clear(cookies);
        }
    }

    /// Shows a message on the page being rendered instead of the next one
    pub fn flash_now(&mut self, kind: FlashKind, key: &str) {
        self.flash.push(FlashMessage::new(kind, key));
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|user| user.id)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Page {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = cookie_jar(parts, state).await?;
        let user = session_user(&cookies, state).await?;
        let flash = flash::peek(&cookies, &state.config.session.secret);
        Ok(Page {
            user,
            flash,
            cookies: Some(cookies),
        })
    }
}
