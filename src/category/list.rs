//! The endpoint listing category names for expense forms.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{AppState, Error, category::CategoryStore};

use super::store::SQLiteCategoryStore;

/// The state needed to list categories.
#[derive(Debug, Clone)]
pub struct CategoryListState {
    /// The database connection for reading categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the names of all categories, ordered by ID.
pub async fn get_categories_endpoint(
    State(state): State<CategoryListState>,
) -> Result<Json<Vec<String>>, Error> {
    let categories = SQLiteCategoryStore::new(state.db_connection).get_all()?;

    Ok(Json(
        categories
            .into_iter()
            .map(|category| category.name.into())
            .collect(),
    ))
}
