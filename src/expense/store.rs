//! Expense persistence: the store trait and its SQLite implementation.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error, SQLiteCategoryStore, UserID,
    db::{CreateTable, MapRow, lock},
};

use super::domain::{Expense, ExpenseId, NewExpense};

/// Handles the creation, retrieval, modification and deletion of expenses.
///
/// Stores do not check ownership; that is left to the expense service.
pub trait ExpenseStore {
    /// Insert a new expense and return it with its ID.
    ///
    /// Returns [Error::InvalidForeignKey] if the user or category does not exist.
    fn create(&self, expense: NewExpense) -> Result<Expense, Error>;

    /// Get an expense by its ID.
    ///
    /// Returns [Error::NotFound] if no expense has the ID.
    fn get(&self, id: ExpenseId) -> Result<Expense, Error>;

    /// Get every expense owned by `user_id`, in insertion order.
    fn get_by_user(&self, user_id: UserID) -> Result<Vec<Expense>, Error>;

    /// Overwrite the label, amount, date and category of the expense with the same ID as `expense`.
    ///
    /// Returns [Error::UpdateMissingExpense] if no expense has the ID.
    fn update(&self, expense: &Expense) -> Result<(), Error>;

    /// Delete an expense.
    ///
    /// Returns [Error::DeleteMissingExpense] if no expense has the ID.
    fn delete(&self, id: ExpenseId) -> Result<(), Error>;
}

/// An expense store backed by the application's SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteExpenseStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteExpenseStore {
    /// Create a new expense store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

const SELECT_EXPENSE: &str = "SELECT expense.id, expense.label, expense.amount, expense.date, \
    expense.user_id, category.id, category.name \
    FROM expense INNER JOIN category ON category.id = expense.category_id";

impl ExpenseStore for SQLiteExpenseStore {
    fn create(&self, expense: NewExpense) -> Result<Expense, Error> {
        let connection = lock(&self.connection)?;

        connection.execute(
            "INSERT INTO expense (label, amount, date, category_id, user_id) \
            VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &expense.label,
                expense.amount,
                expense.date,
                expense.category.id,
                expense.user_id.as_i64(),
            ),
        )?;

        let id = connection.last_insert_rowid();

        Ok(Expense {
            id,
            label: expense.label,
            amount: expense.amount,
            date: expense.date,
            category: expense.category,
            user_id: expense.user_id,
        })
    }

    fn get(&self, id: ExpenseId) -> Result<Expense, Error> {
        lock(&self.connection)?
            .prepare(&format!("{SELECT_EXPENSE} WHERE expense.id = :id"))?
            .query_row(&[(":id", &id)], SQLiteExpenseStore::map_row)
            .map_err(|error| error.into())
    }

    fn get_by_user(&self, user_id: UserID) -> Result<Vec<Expense>, Error> {
        lock(&self.connection)?
            .prepare(&format!(
                "{SELECT_EXPENSE} WHERE expense.user_id = :user_id ORDER BY expense.id ASC"
            ))?
            .query_map(&[(":user_id", &user_id.as_i64())], SQLiteExpenseStore::map_row)?
            .map(|maybe_expense| maybe_expense.map_err(Error::from))
            .collect()
    }

    fn update(&self, expense: &Expense) -> Result<(), Error> {
        let rows_affected = lock(&self.connection)?.execute(
            "UPDATE expense SET label = ?1, amount = ?2, date = ?3, category_id = ?4 \
            WHERE id = ?5",
            (
                &expense.label,
                expense.amount,
                expense.date,
                expense.category.id,
                expense.id,
            ),
        )?;

        if rows_affected == 0 {
            return Err(Error::UpdateMissingExpense);
        }

        Ok(())
    }

    fn delete(&self, id: ExpenseId) -> Result<(), Error> {
        let rows_affected =
            lock(&self.connection)?.execute("DELETE FROM expense WHERE id = ?1", [id])?;

        if rows_affected == 0 {
            return Err(Error::DeleteMissingExpense);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteExpenseStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                label TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 0),
                date TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
            )",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_expense_user_id ON expense(user_id)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteExpenseStore {
    type ReturnType = Expense;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Expense {
            id: row.get(offset)?,
            label: row.get(offset + 1)?,
            amount: row.get(offset + 2)?,
            date: row.get(offset + 3)?,
            user_id: UserID::new(row.get(offset + 4)?),
            category: SQLiteCategoryStore::map_row_with_offset(row, offset + 5)?,
        })
    }
}
