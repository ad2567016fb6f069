pub mod accounts;
pub mod auth;
pub mod health;
pub mod lands;

use axum::{
    async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts,
};
use std::sync::Arc;

use crate::{error::ApiError, service::token::AccessClaims, state::AppState};

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
/// Routes that must reject anonymous callers take this as an argument.
pub struct AuthUser(pub AccessClaims);

/// Like [`AuthUser`] but anonymous-tolerant: a missing or broken token
/// yields `None` instead of a rejection. Used where the response merely
/// varies by viewer.
pub struct MaybeAuthUser(pub Option<AccessClaims>);

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let Some(rest) = header.and_then(|value| value.strip_prefix("Bearer ")) else {
        return Err(ApiError::Unauthorized(
            "Access denied: No token provided or invalid format".to_string(),
        ));
    };

    // Scheme and token split on a single space; a doubled space reads as an
    // empty token, not as a token with a leading space.
    let token = rest.split(' ').next().unwrap_or_default();
    if token.is_empty() {
        return Err(ApiError::Unauthorized(
            "Access denied: Token missing".to_string(),
        ));
    }
    Ok(token)
}

fn claims_from_parts(parts: &Parts, state: &AppState) -> Result<AccessClaims, ApiError> {
    state.tokens().verify(bearer_token(parts)?)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        claims_from_parts(parts, state).map(AuthUser)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(claims_from_parts(parts, state).ok()))
    }
}

/// Role gate for routes restricted beyond plain authentication.
pub fn require_role(claims: &AccessClaims, allowed: &[&str]) -> Result<(), ApiError> {
    if allowed.contains(&claims.role.as_str()) {
        return Ok(());
    }
    Err(ApiError::Forbidden(format!(
        "Access denied: Your role ({}) is not authorized",
        claims.role
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    fn unauthorized_message(value: Option<&str>) -> String {
        match bearer_token(&parts_with_auth(value)) {
            Err(ApiError::Unauthorized(message)) => message,
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn missing_and_malformed_headers_read_as_no_token() {
        let expected = "Access denied: No token provided or invalid format";
        assert_eq!(unauthorized_message(None), expected);
        assert_eq!(unauthorized_message(Some("Token abc")), expected);
        assert_eq!(unauthorized_message(Some("bearer abc")), expected);
    }

    #[test]
    fn bearer_with_empty_token_reads_as_token_missing() {
        assert_eq!(
            unauthorized_message(Some("Bearer ")),
            "Access denied: Token missing"
        );
        assert_eq!(
            unauthorized_message(Some("Bearer  second")),
            "Access denied: Token missing"
        );
    }

    #[test]
    fn well_formed_header_yields_the_raw_token() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn role_gate_names_the_rejected_role() {
        let claims = AccessClaims {
            sub: 9,
            role: "buyer".to_string(),
            kind: crate::entities::accounts::AccountKind::User,
            iat: 0,
            exp: 0,
        };
        assert!(require_role(&claims, &["buyer", "investor"]).is_ok());
        let err = require_role(&claims, &["landlord", "agent"]).unwrap_err();
        match err {
            ApiError::Forbidden(message) => {
                assert_eq!(message, "Access denied: Your role (buyer) is not authorized")
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
    }
}
