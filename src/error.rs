use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Every failure a request can end in. Each variant maps to exactly one status code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No token, authorization denied")]
    MissingCredential,
    #[error("Invalid token format")]
    MalformedCredential,
    #[error("Token is not valid")]
    InvalidCredential,
    #[error("Token has expired")]
    ExpiredCredential,
    #[error("User not found")]
    UnknownIdentity,
    #[error("{message}")]
    InvalidInput {
        message: String,
        errors: BTreeMap<&'static str, String>,
    },
    #[error("User already exists")]
    DuplicateIdentity,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Server error")]
    InternalFault(anyhow::Error),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            errors: BTreeMap::new(),
        }
    }

    pub fn invalid_fields(
        message: impl Into<String>,
        errors: BTreeMap<&'static str, String>,
    ) -> Self {
        Self::InvalidInput {
            message: message.into(),
            errors,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential
            | Self::MalformedCredential
            | Self::InvalidCredential
            | Self::ExpiredCredential
            | Self::UnknownIdentity
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InvalidInput { .. } | Self::DuplicateIdentity => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InternalFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalFault(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => Self::DuplicateIdentity,
            StoreError::Backend(e) => Self::InternalFault(e),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<&'static str, String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let errors = match self {
            Self::InvalidInput { errors, .. } => errors,
            Self::DuplicateIdentity => {
                BTreeMap::from([("email", "This email is already registered".to_string())])
            }
            Self::InternalFault(e) => {
                // details stay in the log, the client only sees the short message
                error!(error = %format!("{e:#}"), "internal fault");
                BTreeMap::new()
            }
            _ => BTreeMap::new(),
        };
        (status, Json(ErrorBody { message, errors })).into_response()
    }
}

/// Failures surfaced by the store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
