use std::env;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

pub const SESSION_SECRET_ENV: &str = "FACEGATE_SESSION_SECRET";
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionCredential {
    pub token: String,
    pub expires_at: i64,
}

pub trait SessionIssuer {
    fn issue(&self, identity_id: &str, display_name: &str) -> AppResult<SessionCredential>;
}

pub fn resolve_session_secret(config_value: Option<String>) -> AppResult<String> {
    env::var(SESSION_SECRET_ENV)
        .ok()
        .or(config_value)
        .ok_or(AppError::MissingSessionSecret {
            env: SESSION_SECRET_ENV,
        })
}

pub struct JwtSessionIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtSessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtSessionIssuer {
    pub fn new(secret: &str, ttl: Duration) -> AppResult<Self> {
        if secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(AppError::WeakSessionSecret {
                length: secret.len(),
                minimum: MIN_SESSION_SECRET_LEN,
            });
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }
}

impl SessionIssuer for JwtSessionIssuer {
    fn issue(&self, identity_id: &str, display_name: &str) -> AppResult<SessionCredential> {
        let issued_at = Utc::now().timestamp();
        let expires_at = issued_at + self.ttl.as_secs() as i64;
        let claims = SessionClaims {
            sub: identity_id.to_string(),
            name: display_name.to_string(),
            iat: issued_at,
            exp: expires_at,
        };

        let token =
            encode(&Header::default(), &claims, &self.encoding_key).map_err(|err| {
                AppError::SessionIssue {
                    message: err.to_string(),
                }
            })?;

        Ok(SessionCredential { token, expires_at })
    }
}
