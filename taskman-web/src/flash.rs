//! Flash messages
//!
//! A flash is a message key shown once, on the next rendered page; a
//! redirect carries pending messages along until a page shows them. Pending
//! messages travel in the `flash` cookie as `<hex payload>.<hex signature>`,
//! where the payload is the JSON list of messages and the signature is
//! HMAC-SHA256 over the hex payload with the session secret. A cookie that
//! fails verification is dropped.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tower_cookies::{Cookie, Cookies};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    /// Catalogue key, translated when rendered
    pub key: String,
}

impl FlashMessage {
    pub fn new(kind: FlashKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

fn signature(secret: &str, payload: &str) -> Option<Hmac<Sha256>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    Some(mac)
}

/// Encodes and signs `messages` as a cookie value
pub fn encode(secret: &str, messages: &[FlashMessage]) -> Option<String> {
    let payload = hex::encode(serde_json::to_vec(messages).ok()?);
    let mac = signature(secret, &payload)?;
    Some(format!("{}.{}", payload, hex::encode(mac.finalize().into_bytes())))
}

/// Verifies and decodes a cookie value; `None` if tampered or malformed
pub fn decode(secret: &str, value: &str) -> Option<Vec<FlashMessage>> {
    let (payload, sig) = value.split_once('.')?;
    let sig = hex::decode(sig).ok()?;
    signature(secret, payload)?.verify_slice(&sig).ok()?;

    serde_json::from_slice(&hex::decode(payload).ok()?).ok()
}

/// The queued messages, left in place
pub fn peek(cookies: &Cookies, secret: &str) -> Vec<FlashMessage> {
    cookies
        .get(FLASH_COOKIE)
        .and_then(|cookie| decode(secret, cookie.value()))
        .unwrap_or_default()
}

/// Queues a message for the next rendered page
pub fn push(cookies: &Cookies, secret: &str, kind: FlashKind, key: &str) {
    let mut messages = peek(cookies, secret);
    messages.push(FlashMessage::new(kind, key));

    match encode(secret, &messages) {
        Some(value) => {
            let mut cookie = Cookie::new(FLASH_COOKIE, value);
            cookie.set_path("/");
            cookie.set_http_only(true);
            cookies.add(cookie);
        }
        None => tracing::warn!(key, "Could not encode flash message"),
    }
}

/// Drops the queued messages once they have been shown
pub fn clear(cookies: &Cookies) {
    if cookies.get(FLASH_COOKIE).is_none() {
        return;
    }
    let mut expired = Cookie::from(FLASH_COOKIE);
    expired.set_path("/");
    cookies.remove(expired);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "flash-test-secret-flash-test-secret";

    #[test]
    fn test_signed_value_decodes() {
        let messages = vec![
            FlashMessage::new(FlashKind::Success, "flash.tasks.create.success"),
            FlashMessage::new(FlashKind::Error, "flash.authError"),
        ];
        let value = encode(SECRET, &messages).unwrap();

        assert_eq!(decode(SECRET, &value), Some(messages));
    }

    #[test]
    fn test_tampered_value_is_rejected() {
        let value = encode(SECRET, &[FlashMessage::new(FlashKind::Info, "a")]).unwrap();
        let (_, sig) = value.split_once('.').unwrap();
        let forged_payload = hex::encode(br#"[{"kind":"info","key":"b"}]"#);

        assert_eq!(decode(SECRET, &format!("{forged_payload}.{sig}")), None);
        assert_eq!(decode("another-secret-another-secret-1234", &value), None);
        assert_eq!(decode(SECRET, "not-a-flash"), None);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&FlashMessage::new(FlashKind::Error, "k")).unwrap();
        assert_eq!(json, r#"{"kind":"error","key":"k"}"#);
    }
}
