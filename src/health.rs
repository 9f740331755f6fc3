//! Endpoints for checking that the server is up and can reach its database.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{AppState, Error, db::lock};

const APPLICATION_NAME: &str = "Expense Tracker";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The state needed for the health check.
#[derive(Debug, Clone)]
pub struct HealthState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HealthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The result of each health check, "ok" or "error".
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthChecks {
    pub database: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" if every check passed, otherwise "error".
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub application: String,
    pub version: String,
    pub timestamp: String,
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|error| {
            tracing::error!("Could not format the current time: {error}");
            String::new()
        })
}

fn check_database(connection: &Arc<Mutex<Connection>>) -> Result<(), Error> {
    let connection = lock(connection)?;
    connection.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;

    Ok(())
}

/// Report whether the server can query its database.
///
/// Responds with 503 if the database check fails.
pub async fn get_health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let (status_code, status, database) = match check_database(&state.db_connection) {
        Ok(()) => (StatusCode::OK, "ok", "ok"),
        Err(error) => {
            tracing::error!("Database health check failed: {error}");
            (StatusCode::SERVICE_UNAVAILABLE, "error", "error")
        }
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_owned(),
            timestamp: now_rfc3339(),
            version: VERSION.to_owned(),
            checks: HealthChecks {
                database: database.to_owned(),
            },
        }),
    )
}

/// Report the application name and version.
pub async fn get_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        application: APPLICATION_NAME.to_owned(),
        version: VERSION.to_owned(),
        timestamp: now_rfc3339(),
    })
}
