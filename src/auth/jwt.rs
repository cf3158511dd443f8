use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{config::JwtConfig, error::AppError};

/// Lifetime of every issued token.
pub const TOKEN_TTL: Duration = Duration::days(7);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature or structure is invalid")]
    Invalid,
    #[error("token has expired")]
    Expired,
    #[error("token carries no usable subject")]
    MissingSubject,
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => AppError::InvalidCredential,
            TokenError::Expired => AppError::ExpiredCredential,
            TokenError::MissingSubject => AppError::MalformedCredential,
        }
    }
}

/// Signing and verification keys, built once from the process-wide secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Mints a token bound to `user_id`, valid for [`TOKEN_TTL`].
    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: Some(user_id.to_string()),
            iat: now.unix_timestamp(),
            exp: (now + TOKEN_TTL).unix_timestamp(),
        };
        let token = self.encode_claims(&claims)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> anyhow::Result<String> {
        Ok(encode(&Header::default(), claims, &self.encoding)?)
    }

    /// Checks signature and expiry. Expiry is only reported for otherwise valid tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        Ok(data.claims)
    }

    /// Verifies the token and extracts the user it is bound to.
    pub fn verify_subject(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims = self.verify(token)?;
        let sub = claims.sub.ok_or(TokenError::MissingSubject)?;
        let user_id = Uuid::parse_str(&sub).map_err(|_| TokenError::MissingSubject)?;
        debug!(user_id = %user_id, "jwt verified");
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
        })
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign");
        assert_eq!(keys.verify_subject(&token), Ok(user_id));
    }

    #[test]
    fn token_expires_after_seven_days() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(Uuid::new_v4()).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn other_secret_is_invalid() {
        let token = make_keys("secret-a").sign(Uuid::new_v4()).expect("sign");
        assert_eq!(
            make_keys("secret-b").verify_subject(&token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn altered_signature_is_invalid() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(Uuid::new_v4()).expect("sign");
        let sig_start = token.rfind('.').expect("three segments") + 1;
        let mut bytes = token.into_bytes();
        let i = sig_start + 10;
        bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).expect("ascii");
        assert_eq!(keys.verify_subject(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_invalid() {
        let keys = make_keys("dev-secret");
        assert_eq!(keys.verify_subject("not.a.jwt"), Err(TokenError::Invalid));
        assert_eq!(keys.verify_subject("abc"), Err(TokenError::Invalid));
    }

    #[test]
    fn elapsed_expiry_is_expired() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = keys
            .encode_claims(&Claims {
                sub: Some(Uuid::new_v4().to_string()),
                iat: now - 8 * 24 * 60 * 60,
                exp: now - 60,
            })
            .expect("encode");
        assert_eq!(keys.verify_subject(&token), Err(TokenError::Expired));
    }

    #[test]
    fn expired_token_from_other_secret_is_invalid() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = make_keys("secret-a")
            .encode_claims(&Claims {
                sub: Some(Uuid::new_v4().to_string()),
                iat: now - 8 * 24 * 60 * 60,
                exp: now - 60,
            })
            .expect("encode");
        assert_eq!(
            make_keys("secret-b").verify_subject(&token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn missing_or_bad_subject() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let no_sub = keys
            .encode_claims(&Claims {
                sub: None,
                iat: now,
                exp: now + 60,
            })
            .expect("encode");
        assert_eq!(keys.verify_subject(&no_sub), Err(TokenError::MissingSubject));

        let bad_sub = keys
            .encode_claims(&Claims {
                sub: Some("42".into()),
                iat: now,
                exp: now + 60,
            })
            .expect("encode");
        assert_eq!(keys.verify_subject(&bad_sub), Err(TokenError::MissingSubject));
    }

    #[test]
    fn non_string_subject_is_missing_not_invalid() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp();
        for sub in [
            serde_json::json!(42),
            serde_json::json!(null),
            serde_json::json!({ "id": "x" }),
        ] {
            let token = encode(
                &Header::default(),
                &serde_json::json!({ "sub": sub, "iat": now, "exp": now + 3600 }),
                &EncodingKey::from_secret(b"dev-secret"),
            )
            .expect("encode");
            assert_eq!(
                keys.verify_subject(&token),
                Err(TokenError::MissingSubject),
                "{sub}"
            );
        }
    }
}
