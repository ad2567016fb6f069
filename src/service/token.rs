use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::{entities::accounts::AccountKind, error::ApiError};

/// Claims carried by the stateless bearer token: who, their role, and which
/// account kind they are. Nothing is persisted server-side and there is no
/// revocation list; expiry is the only lifetime control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: i64,
    pub role: String,
    pub kind: AccountKind,
    pub iat: i64,
    pub exp: i64,
}

pub trait TokenService: Send + Sync {
    fn issue(&self, account_id: i64, role: &str, kind: AccountKind) -> Result<String, ApiError>;
    fn verify(&self, token: &str) -> Result<AccessClaims, ApiError>;
}

pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl JwtTokenService {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, account_id: i64, role: &str, kind: AccountKind) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: account_id,
            role: role.to_string(),
            kind,
            iat: now,
            exp: now + self.ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| ApiError::Internal(format!("token signing failed: {err}")))
    }

    fn verify(&self, token: &str) -> Result<AccessClaims, ApiError> {
        let mut validation = Validation::default();
        // An expired token must fail the moment it expires, not a minute
        // later.
        validation.leeway = 0;
        match decode::<AccessClaims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => {
                let reason = match err.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    _ => "Invalid token",
                };
                Err(ApiError::Unauthorized(format!(
                    "Authentication failed: {reason}"
                )))
            }
        }
    }
}
