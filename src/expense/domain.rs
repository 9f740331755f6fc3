//! Core expense domain types.

use serde::Serialize;
use time::Date;

use crate::{UserID, category::Category};

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

/// Database identifier for an expense.
pub type ExpenseId = i64;

/// A single spending record owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    /// The ID of the expense in the application database.
    pub id: ExpenseId,
    /// A short description of what the money was spent on.
    pub label: String,
    /// How much was spent, never negative.
    pub amount: f64,
    /// The day the money was spent.
    #[serde(with = "date_format")]
    pub date: Date,
    /// The category the expense belongs to.
    pub category: Category,
    /// The user that owns the expense.
    #[serde(skip_serializing)]
    pub user_id: UserID,
}

/// The data needed to create a new expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub label: String,
    pub amount: f64,
    pub date: Date,
    pub category: Category,
    pub user_id: UserID,
}
