/*! This module defines the traits shared by the SQLite stores and the function that sets up the application's database. */

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, Transaction, TransactionBehavior};

use crate::{
    Error, SQLiteCategoryStore, SQLiteUserStore, category::seed_categories,
    expense::SQLiteExpenseStore,
};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create a table for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a concrete rust type.
pub trait MapRow {
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// **Note:** This function expects that the row object contains all the table columns in the order they were defined.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type.
    ///
    /// The `offset` indicates which column the row should be read from.
    /// This is useful in cases where tables have been joined and you want to construct two different types from the one query.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// Acquire the lock on the shared database connection.
///
/// # Errors
///
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub(crate) fn lock(
    connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Create the application tables and seed the default categories.
///
/// Foreign key enforcement is switched on for `connection`, so deleting a
/// user also deletes their expenses. Calling this on an existing database is
/// safe: tables are only created when missing and seeding skips categories
/// that already exist.
///
/// # Errors
/// Returns an error if a table could not be created or the categories could not be inserted.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    SQLiteUserStore::create_table(&transaction)?;
    SQLiteCategoryStore::create_table(&transaction)?;
    SQLiteExpenseStore::create_table(&transaction)?;
    seed_categories(&transaction)?;

    transaction.commit()?;

    Ok(())
}
