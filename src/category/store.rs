//! Category persistence: the store trait, its SQLite implementation and default seeding.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    category::{Category, CategoryName},
    db::{CreateTable, MapRow, lock},
};

/// The categories every database starts with.
pub const DEFAULT_CATEGORIES: [&str; 11] = [
    "Housing",
    "Transportation",
    "Food",
    "Utilities",
    "Healthcare",
    "Insurance",
    "Entertainment",
    "Shopping",
    "Education",
    "Debt Payments",
    "Other",
];

/// Looks up the shared categories. They are only ever added by [seed_categories].
pub trait CategoryStore {
    /// Get the category whose name is exactly `name`.
    ///
    /// The match is case-sensitive and `name` is not trimmed. Returns `None`
    /// when no category matches; categories are never created on demand.
    fn find_by_name(&self, name: &str) -> Result<Option<Category>, Error>;

    /// Get every category ordered by ID.
    fn get_all(&self) -> Result<Vec<Category>, Error>;
}

/// A category store backed by the application's SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteCategoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteCategoryStore {
    /// Create a new category store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl CategoryStore for SQLiteCategoryStore {
    fn find_by_name(&self, name: &str) -> Result<Option<Category>, Error> {
        lock(&self.connection)?
            .prepare("SELECT id, name FROM category WHERE name = :name")?
            .query_row(&[(":name", name)], SQLiteCategoryStore::map_row)
            .optional()
            .map_err(|error| error.into())
    }

    fn get_all(&self) -> Result<Vec<Category>, Error> {
        lock(&self.connection)?
            .prepare("SELECT id, name FROM category ORDER BY id ASC")?
            .query_map([], SQLiteCategoryStore::map_row)?
            .map(|maybe_category| maybe_category.map_err(Error::from))
            .collect()
    }
}

impl CreateTable for SQLiteCategoryStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteCategoryStore {
    type ReturnType = Category;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let raw_name: String = row.get(offset + 1)?;

        Ok(Category {
            id,
            name: CategoryName::new_unchecked(&raw_name),
        })
    }
}

/// Insert the [DEFAULT_CATEGORIES] that are not in the database yet.
///
/// # Errors
///
/// Returns an error if the SQL query failed.
pub fn seed_categories(connection: &Connection) -> Result<(), Error> {
    let mut statement = connection.prepare("INSERT OR IGNORE INTO category (name) VALUES (?1)")?;

    for name in DEFAULT_CATEGORIES {
        statement.execute([name])?;
    }

    tracing::debug!("Seeded {} default categories", DEFAULT_CATEGORIES.len());

    Ok(())
}
