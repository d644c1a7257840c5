//! Admin credentials and sessions.
//!
//! There is exactly one admin identity: the email and SHA-256 password hash
//! from `[admin]` in config. An empty hash disables login entirely.
//!
//! A successful login mints a random session token that lives in memory
//! until it expires (`admin.session_hours`) or the admin logs out. A server
//! restart logs everyone out.

use crate::config::AdminConfig;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Lowercase hex SHA-256 of a password, the format `admin.password_sha256`
/// expects.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Byte comparison that does not stop at the first difference.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Clone)]
pub struct Credentials {
    email: String,
    password_sha256: String,
}

impl Credentials {
    pub fn from_config(config: &AdminConfig) -> Self {
        Self {
            email: config.email.trim().to_lowercase(),
            password_sha256: config.password_sha256.trim().to_lowercase(),
        }
    }

    pub fn login_enabled(&self) -> bool {
        !self.password_sha256.is_empty()
    }

    /// Email is compared case-insensitively, the password by hash.
    pub fn verify(&self, email: &str, password: &str) -> bool {
        if !self.login_enabled() {
            return false;
        }
        let email_ok = email.trim().to_lowercase() == self.email;
        let password_ok = constant_time_eq(
            hash_password(password).as_bytes(),
            self.password_sha256.as_bytes(),
        );
        email_ok && password_ok
    }
}

/// Live admin sessions keyed by token.
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new(session_hours: u32) -> Self {
        Self {
            ttl: Duration::hours(i64::from(session_hours)),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session and return its token.
    pub async fn create(&self) -> String {
        let token = Uuid::new_v4().to_string();
        let expires = Utc::now() + self.ttl;
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, expiry| *expiry > Utc::now());
        sessions.insert(token.clone(), expires);
        token
    }

    pub async fn is_valid(&self, token: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(token)
            .is_some_and(|expiry| *expiry > Utc::now())
    }

    pub async fn revoke(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    #[cfg(test)]
    async fn expire_all(&self) {
        let past = Utc::now() - Duration::seconds(1);
        for expiry in self.sessions.write().await.values_mut() {
            *expiry = past;
        }
    }
}
