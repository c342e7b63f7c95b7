use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided (or no longer valid)
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Unknown username or wrong password - deliberately indistinct
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Invalid request data (missing/empty required field)
    #[error("{message}")]
    Validation { message: String },

    /// Identity provider denial, exchange error, or malformed profile
    #[error("Identity provider error: {reason}")]
    OAuth { reason: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::OAuth { .. } => StatusCode::BAD_GATEWAY,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Where the browser is sent instead of an error page, per the surface
    /// policy: auth failures go back to the login form, a registration
    /// conflict goes back to the registration form.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Error::Unauthenticated { .. } | Error::InvalidCredentials | Error::OAuth { .. } => Some("/login"),
            Error::Database(DbError::UniqueViolation { .. }) => Some("/register"),
            _ => None,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InvalidCredentials => "Invalid username or password".to_string(),
            Error::Validation { message } => message.clone(),
            Error::OAuth { .. } => "Sign-in with the identity provider failed".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } if db_err.violates_unique("username") => {
                    "This username is already taken".to_string()
                }
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::OAuth { .. } => {
                tracing::warn!("Federation error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InvalidCredentials => {
                tracing::info!("Authentication error: {}", self);
            }
            Error::Validation { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        if let Some(target) = self.redirect_target() {
            return Redirect::to(target).into_response();
        }

        let status = self.status_code();
        let message = self.user_message();
        match crate::views::render("error", minijinja::context! { message }) {
            Ok(page) => (status, page).into_response(),
            Err(_) => (status, message).into_response(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
