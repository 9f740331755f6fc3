//! Expenses: the records of what a user spent, when, and on which category.
//!
//! Both the JSON API in [api] and the HTML pages in [pages] go through the
//! functions in [service], which check ownership and validate input against
//! the schema in [schema].

mod api;
mod domain;
mod form;
mod pages;
mod schema;
mod service;
mod store;

pub use api::{
    ExpenseState, create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
    get_expenses_endpoint, update_expense_endpoint,
};
pub use domain::{Expense, ExpenseId, NewExpense};
pub use pages::{
    create_expense_page, delete_expense_page, get_edit_expense_page, get_expense_page,
    get_expenses_page, get_new_expense_page, update_expense_page,
};
pub use schema::FieldErrors;
pub use store::{ExpenseStore, SQLiteExpenseStore};
