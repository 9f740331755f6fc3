//! The JSON endpoints for managing the authenticated user's expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::JsonRejection, rejection::PathRejection},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::{AppState, Error, SQLiteCategoryStore, UserID};

use super::{
    domain::{Expense, ExpenseId},
    service,
    store::SQLiteExpenseStore,
};

/// The state needed by the expense endpoints.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for reading and writing expenses and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

impl ExpenseState {
    pub(crate) fn categories(&self) -> SQLiteCategoryStore {
        SQLiteCategoryStore::new(self.db_connection.clone())
    }

    pub(crate) fn expenses(&self) -> SQLiteExpenseStore {
        SQLiteExpenseStore::new(self.db_connection.clone())
    }
}

/// A route handler for creating a new expense.
///
/// Responds with 201 and the ID of the new expense.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Json(body), _): WithRejection<Json<Value>, Error>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let today = OffsetDateTime::now_utc().date();
    let expense = service::create_expense(
        user_id,
        &body,
        today,
        &state.categories(),
        &state.expenses(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Expense created successfully",
            "id": expense.id,
        })),
    ))
}

/// A route handler for listing the user's expenses.
pub async fn get_expenses_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Expense>>, Error> {
    service::list_expenses(user_id, &state.expenses()).map(Json)
}

/// A route handler for getting a single expense.
pub async fn get_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<ExpenseId>, PathRejection>,
) -> Result<Json<Expense>, Error> {
    let id = expense_id(path)?;

    service::get_expense(user_id, id, &state.expenses()).map(Json)
}

/// A route handler for changing some or all fields of an expense.
///
/// The body is only parsed after the expense is found to exist and belong to
/// the user, so a malformed body sent for someone else's expense still gets 403.
pub async fn update_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<ExpenseId>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, Error> {
    let id = expense_id(path)?;
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!("Could not parse expense update body: {rejection}");
            Value::Null
        }
    };

    service::update_expense(
        user_id,
        id,
        &body,
        &state.categories(),
        &state.expenses(),
    )?;

    Ok(Json(json!({"message": "Expense updated successfully"})))
}

/// A route handler for deleting an expense.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<ExpenseId>, PathRejection>,
) -> Result<Json<Value>, Error> {
    let id = expense_id(path)?;

    service::delete_expense(user_id, id, &state.expenses())?;

    Ok(Json(json!({"message": "Expense deleted"})))
}

/// An ID that is not an integer cannot match any expense.
pub(super) fn expense_id(path: Result<Path<ExpenseId>, PathRejection>) -> Result<ExpenseId, Error> {
    path.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!("Invalid expense ID: {rejection}");
        Error::ExpenseNotFound
    })
}
