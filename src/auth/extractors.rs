use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::{error, warn};

use super::{jwt::JwtKeys, repo::IdentityResolver, repo_types::User};
use crate::{error::AppError, state::AppState};

/// The verified caller. Any handler taking this runs behind the access gate.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(&parts.headers, &state.keys, state.users.as_ref()).await?;
        Ok(AuthUser(user))
    }
}

/// Turns the `Authorization` header into a known user or a classified failure.
pub async fn authenticate<R>(
    headers: &HeaderMap,
    keys: &JwtKeys,
    resolver: &R,
) -> Result<User, AppError>
where
    R: IdentityResolver + ?Sized,
{
    let token = bearer_token(headers)?;

    let user_id = keys.verify_subject(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        AppError::from(e)
    })?;

    match resolver.find_by_id(user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            warn!(%user_id, "token subject has no user");
            Err(AppError::UnknownIdentity)
        }
        Err(e) => {
            error!(error = %e, %user_id, "identity lookup failed");
            Err(e.into())
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        warn!("missing Authorization header");
        return Err(AppError::MissingCredential);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            warn!("Authorization header without Bearer prefix");
            AppError::MalformedCredential
        })?;

    if token.is_empty() {
        warn!("empty bearer token");
        return Err(AppError::MissingCredential);
    }
    Ok(token)
}
