//! Expense Tracker is a web app for recording what you spend.
//!
//! Users register with an email and password, log in, and manage their
//! expenses, each tagged with one of a shared set of categories.
//!
//! This library provides a JSON REST API for single-page clients and a
//! server-rendered fallback that serves HTML pages with plain forms.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod db;
mod endpoints;
mod expense;
mod health;
mod html;
mod internal_server_error;
mod logging;
mod not_found;
mod routing;
#[cfg(test)]
mod test_utils;
mod user;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use category::{CategoryStore, DEFAULT_CATEGORIES, SQLiteCategoryStore, seed_categories};
pub use db::initialize as initialize_db;
pub use expense::FieldErrors;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use user::{SQLiteUserStore, User, UserID, UserStore};

use crate::internal_server_error::InternalServerError;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email is not registered or the password does not match.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request has no valid session: the token cookie is missing, could
    /// not be decrypted, has expired, or names a user that no longer exists.
    #[error("authentication required")]
    Unauthenticated,

    /// The expense exists but belongs to another user.
    #[error("the expense belongs to another user")]
    Forbidden,

    /// The request body could not be parsed as a non-empty JSON object.
    #[error("the request body is not a valid JSON object")]
    InvalidJson,

    /// An expense was created without a category name.
    #[error("a category is required")]
    CategoryRequired,

    /// The category name did not match any category.
    #[error("the category \"{0}\" does not exist")]
    CategoryNotFound(String),

    /// One or more expense fields failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The string used to register a user is not an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The email used to register a user already belongs to another user.
    #[error("the email is already registered")]
    DuplicateEmail,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The session token could not be serialized into the auth cookie.
    #[error("could not create the session cookie: {0}")]
    CookieError(String),

    /// No expense has the requested ID.
    #[error("the expense could not be found")]
    ExpenseNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error occurs when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update an expense that does not exist
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// Tried to delete an expense that does not exist
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// Tried to delete a user that does not exist
    #[error("tried to delete a user that is not in the database")]
    DeleteMissingUser,

    /// A user or category ID did not refer to an existing row.
    #[error("a foreign key does not refer to an existing row")]
    InvalidForeignKey,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 =>
            {
                Error::InvalidForeignKey
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON request body: {rejection}");
        Error::InvalidJson
    }
}

impl Error {
    /// The status code and client-facing message for this error.
    ///
    /// Internal errors are logged here and replaced with a generic message so
    /// that SQL errors and the like never reach the client.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_owned(),
            ),
            Error::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Authentication Required".to_owned(),
            ),
            Error::Forbidden => (StatusCode::FORBIDDEN, "Unauthorized".to_owned()),
            Error::InvalidJson => (StatusCode::BAD_REQUEST, "Invalid JSON".to_owned()),
            Error::CategoryRequired => (StatusCode::BAD_REQUEST, "Category is required".to_owned()),
            Error::CategoryNotFound(_) => (StatusCode::NOT_FOUND, "Category not found".to_owned()),
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed".to_owned()),
            Error::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "Invalid email address".to_owned()),
            Error::TooWeak(feedback) if feedback.is_empty() => {
                (StatusCode::BAD_REQUEST, "Password is too weak".to_owned())
            }
            Error::TooWeak(feedback) => (
                StatusCode::BAD_REQUEST,
                format!("Password is too weak: {feedback}"),
            ),
            Error::DuplicateEmail => (
                StatusCode::CONFLICT,
                "Email is already registered".to_owned(),
            ),
            Error::ExpenseNotFound | Error::UpdateMissingExpense | Error::DeleteMissingExpense => {
                (StatusCode::NOT_FOUND, "Expense not found".to_owned())
            }
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_owned(),
                )
            }
        }
    }

    /// Render the error as a full HTML page for the server-rendered views.
    pub(crate) fn into_page_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return InternalServerError::default().into_response();
        }

        let fix = match status {
            StatusCode::FORBIDDEN => "You can only view and change your own expenses.",
            StatusCode::NOT_FOUND => "Check the link or go back to your expenses.",
            _ => "Go back and try again.",
        };

        (
            status,
            html::error_view(&message, status.as_str(), &message, fix),
        )
            .into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let body = match self {
            Error::Validation(fields) => json!({
                "error": message,
                "fields": fields,
            }),
            _ => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
