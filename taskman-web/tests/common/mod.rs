//! Shared helpers for HTTP tests
//!
//! Each test drives its own app over the in-memory store with
//! `tower::ServiceExt::oneshot`, carrying cookies by hand.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use taskman_shared::auth::session::issue_session_token;
use taskman_shared::models::{NewStatus, NewUser, Status, User};
use taskman_shared::repository::{Repositories, Repository};
use taskman_web::app::{build_app, App, AppState};
use taskman_web::config::{Config, DatabaseConfig, ServerConfig, SessionConfig};
use tower::ServiceExt;

pub const SECRET: &str = "http-test-secret-at-least-32-bytes-long";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
        },
        session: SessionConfig {
            secret: SECRET.to_string(),
            ttl_hours: 1,
            secure_cookies: false,
        },
    }
}

pub struct TestContext {
    pub app: App,
    pub repos: Repositories,
}

/// A response with its body read
pub struct Page {
    pub status: StatusCode,
    pub location: Option<String>,
    /// `name=value` pairs from Set-Cookie, removals excluded
    pub cookies: Vec<String>,
    pub body: String,
}

impl Page {
    pub fn cookie_header(&self) -> String {
        self.cookies.join("; ")
    }

    pub fn sets_cookie(&self, name: &str) -> bool {
        self.cookies.iter().any(|c| c.starts_with(&format!("{name}=")))
    }
}

async fn read(response: Response) -> Page {
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let cookies = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().unwrap().split(';').next().map(str::to_string))
        .filter(|pair| !pair.ends_with('='))
        .collect();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    Page {
        status,
        location,
        cookies,
        body: String::from_utf8(body.to_vec()).unwrap(),
    }
}

impl TestContext {
    pub fn new() -> Self {
        let repos = Repositories::in_memory();
        let state = AppState::new(repos.clone(), test_config(), None).unwrap();
        Self {
            app: build_app(state),
            repos,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, cookie: Option<&str>, form: Option<&str>) -> Page {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        read(response).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Page {
        self.send(Method::GET, uri, cookie, None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, form: &str) -> Page {
        self.send(Method::POST, uri, cookie, Some(form)).await
    }

    /// Inserts a user without going through password hashing
    pub async fn user(&self, first_name: &str) -> User {
        self.repos
            .users
            .insert(NewUser {
                first_name: first_name.to_string(),
                last_name: "Tester".to_string(),
                email: format!("{}@example.com", first_name.to_lowercase()),
                password_digest: "unused".to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn status(&self, name: &str) -> Status {
        self.repos
            .statuses
            .insert(NewStatus {
                name: name.to_string(),
            })
            .await
            .unwrap()
    }
}

/// Cookie header for a signed-in `user`
pub fn session_cookie(user: &User) -> String {
    let token = issue_session_token(user.id, SECRET, chrono::Duration::hours(1)).unwrap();
    format!("session={token}")
}
