use std::collections::BTreeMap;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::{
    dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo::UserStore,
    repo_types::NewUser,
};
use crate::error::AppError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registers a user and hands back a token bound to it.
pub async fn signup<U>(
    users: &U,
    keys: &JwtKeys,
    payload: SignupRequest,
) -> Result<AuthResponse, AppError>
where
    U: UserStore + ?Sized,
{
    let name = payload.name.map(|n| n.trim().to_string()).unwrap_or_default();
    let email = payload.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let mut errors = BTreeMap::new();
    if name.is_empty() {
        errors.insert("name", "Name is required".to_string());
    }
    if email.is_empty() {
        errors.insert("email", "Email is required".to_string());
    }
    if password.is_empty() {
        errors.insert("password", "Password is required".to_string());
    }
    if !errors.is_empty() {
        warn!(fields = ?errors.keys().collect::<Vec<_>>(), "signup missing fields");
        return Err(AppError::invalid_fields("All fields are required", errors));
    }

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::invalid_fields(
            "Validation failed",
            BTreeMap::from([("email", "Please enter a valid email".to_string())]),
        ));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::DuplicateIdentity);
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("join password hashing task")??;
    let user = users
        .create(NewUser {
            name: &name,
            email: &email,
            password_hash: &password_hash,
        })
        .await?;

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        token,
        user: PublicUser::from(&user),
    })
}

/// Unknown email and wrong password fail the same way.
pub async fn login<U>(
    users: &U,
    keys: &JwtKeys,
    payload: LoginRequest,
) -> Result<AuthResponse, AppError>
where
    U: UserStore + ?Sized,
{
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        warn!("login without email or password");
        return Err(AppError::InvalidCredentials);
    }

    let Some(user) = users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    let stored_hash = user.password_hash.clone();
    let password = payload.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .context("join password verification task")??;
    if !matches {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthResponse {
        token,
        user: PublicUser::from(&user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::extractors::authenticate, config::JwtConfig, memstore::MemoryStore,
    };
    use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "test-secret".into(),
        })
    }

    fn signup_req(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header"),
        );
        headers
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example.com"));
    }

    #[tokio::test]
    async fn signup_then_login_resolve_to_same_user() {
        let store = MemoryStore::default();
        let keys = keys();

        let signed_up = signup(&store, &keys, signup_req("Ada", "Ada@Example.com ", "hunter22"))
            .await
            .expect("signup");
        assert_eq!(signed_up.user.email, "ada@example.com");

        let logged_in = login(
            &store,
            &keys,
            LoginRequest {
                email: "ada@example.com".into(),
                password: "hunter22".into(),
            },
        )
        .await
        .expect("login");

        let a = authenticate(&bearer(&signed_up.token), &keys, &store)
            .await
            .expect("signup token accepted");
        let b = authenticate(&bearer(&logged_in.token), &keys, &store)
            .await
            .expect("login token accepted");
        assert_eq!(a.id, signed_up.user.id);
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn signup_stores_hash_not_plaintext() {
        let store = MemoryStore::default();
        signup(&store, &keys(), signup_req("Ada", "ada@example.com", "hunter22"))
            .await
            .expect("signup");
        let user = store
            .find_by_email("ada@example.com")
            .await
            .expect("lookup")
            .expect("stored");
        assert_ne!(user.password_hash, "hunter22");
        assert!(verify_password("hunter22", &user.password_hash).expect("verify"));
    }

    #[tokio::test]
    async fn signup_reports_each_missing_field() {
        let store = MemoryStore::default();
        let err = signup(
            &store,
            &keys(),
            SignupRequest {
                name: Some("Ada".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        match err {
            AppError::InvalidInput { errors, .. } => {
                assert!(!errors.contains_key("name"));
                assert!(errors.contains_key("email"));
                assert!(errors.contains_key("password"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email() {
        let store = MemoryStore::default();
        signup(&store, &keys(), signup_req("Ada", "ada@example.com", "pw"))
            .await
            .expect("first signup");
        let err = signup(&store, &keys(), signup_req("Eve", "ADA@example.com", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = MemoryStore::default();
        signup(&store, &keys(), signup_req("Ada", "ada@example.com", "right"))
            .await
            .expect("signup");

        let wrong_password = login(
            &store,
            &keys(),
            LoginRequest {
                email: "ada@example.com".into(),
                password: "wrong".into(),
            },
        )
        .await
        .unwrap_err();
        let unknown_email = login(
            &store,
            &keys(),
            LoginRequest {
                email: "nobody@example.com".into(),
                password: "right".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }
}
