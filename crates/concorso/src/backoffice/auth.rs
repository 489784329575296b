//! Back-office authentication boundary.
//!
//! Deliberately thin: a single static credential verified through a
//! pluggable trait, and an opaque bearer token whose only server-side check
//! is a minimum length. Real authorization is out of scope.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde_json::json;

use crate::config::AdminConfig;

/// Tokens shorter than this are rejected as implausible.
pub const MIN_TOKEN_LEN: usize = 10;

/// Credential check behind the login endpoint. Swappable for a real
/// identity provider without touching the rest of the back office.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Fixed username/password pair resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

/// Opaque session token: base64 of `username:millis`. Not a signature; the
/// back office only ever checks its length.
pub fn issue_session_token(username: &str) -> String {
    BASE64.encode(format!("{username}:{}", Utc::now().timestamp_millis()))
}

pub fn token_is_plausible(token: &str) -> bool {
    token.len() >= MIN_TOKEN_LEN
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Guard shared by every back-office route: a syntactically plausible
/// bearer token is sufficient proof.
pub fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    match bearer_token(headers) {
        Some(token) if token_is_plausible(token) => Ok(()),
        Some(_) => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "token non valido" })),
        )
            .into_response()),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "non autorizzato" })),
        )
            .into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    fn credentials() -> StaticCredentials {
        StaticCredentials::new(&AdminConfig {
            username: "admin".to_string(),
            password: "segretissima".to_string(),
        })
    }

    #[test]
    fn static_credentials_match_exactly() {
        let verifier = credentials();
        assert!(verifier.verify("admin", "segretissima"));
        assert!(!verifier.verify("admin", "wrong"));
        assert!(!verifier.verify("Admin", "segretissima"));
    }

    #[test]
    fn issued_tokens_pass_the_plausibility_check() {
        let token = issue_session_token("admin");
        assert!(token_is_plausible(&token));
    }

    #[test]
    fn short_or_missing_bearer_is_rejected() {
        assert!(!token_is_plausible("short"));

        let empty = HeaderMap::new();
        assert!(authorize(&empty).is_err());

        let mut short = HeaderMap::new();
        short.insert(AUTHORIZATION, "Bearer abc".parse().expect("header"));
        assert!(authorize(&short).is_err());

        let mut ok = HeaderMap::new();
        ok.insert(
            AUTHORIZATION,
            "Bearer abcdefghijklmnop".parse().expect("header"),
        );
        assert!(authorize(&ok).is_ok());
    }
}
