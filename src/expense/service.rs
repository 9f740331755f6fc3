//! Expense operations scoped to the authenticated user.
//!
//! Every function takes the [UserID] of the user making the request. Reading
//! or changing an expense owned by someone else fails with [Error::Forbidden],
//! while an ID that matches no expense fails with [Error::ExpenseNotFound].

use serde_json::{Map, Value};
use time::Date;

use crate::{CategoryStore, Error, UserID, category::Category};

use super::{
    domain::{Expense, ExpenseId, NewExpense},
    schema::{self, Mode},
    store::ExpenseStore,
};

/// Create an expense owned by `user_id` from a JSON request body.
///
/// The checks run in this order: the body must be a non-empty JSON object,
/// the category must be given, the fields must pass the schema, and the
/// category must exist. A missing date defaults to `today`.
///
/// # Errors
///
/// - [Error::InvalidJson] if `body` is not a non-empty object.
/// - [Error::CategoryRequired] if the category is missing or blank.
/// - [Error::Validation] if any field fails validation.
/// - [Error::CategoryNotFound] if no category has the given name.
pub fn create_expense<C, E>(
    user_id: UserID,
    body: &Value,
    today: Date,
    categories: &C,
    expenses: &E,
) -> Result<Expense, Error>
where
    C: CategoryStore,
    E: ExpenseStore,
{
    let body = match body.as_object() {
        Some(body) if !body.is_empty() => body,
        _ => return Err(Error::InvalidJson),
    };

    let category_name = schema::category_name(body).ok_or(Error::CategoryRequired)?;
    let fields = schema::validate(body, Mode::Create)?;
    let category = resolve_category(&category_name, categories)?;

    let (label, amount) = match (fields.label, fields.amount) {
        (Some(label), Some(amount)) => (label, amount),
        // Both are required on create, so validation has already failed if either is missing.
        _ => return Err(Error::InvalidJson),
    };

    let expense = expenses.create(NewExpense {
        label,
        amount,
        date: fields.date.unwrap_or(today),
        category,
        user_id,
    })?;

    tracing::info!("User {user_id} created expense {}", expense.id);

    Ok(expense)
}

/// Get every expense owned by `user_id`, in the order they were created.
pub fn list_expenses<E>(user_id: UserID, expenses: &E) -> Result<Vec<Expense>, Error>
where
    E: ExpenseStore,
{
    expenses.get_by_user(user_id)
}

/// Get the expense with `id` if `user_id` owns it.
///
/// # Errors
///
/// - [Error::ExpenseNotFound] if no expense has the ID.
/// - [Error::Forbidden] if the expense belongs to another user.
pub fn get_expense<E>(user_id: UserID, id: ExpenseId, expenses: &E) -> Result<Expense, Error>
where
    E: ExpenseStore,
{
    let expense = expenses.get(id).map_err(|error| match error {
        Error::NotFound => Error::ExpenseNotFound,
        error => error,
    })?;

    if expense.user_id != user_id {
        tracing::warn!(
            "User {user_id} tried to access expense {id} owned by user {}",
            expense.user_id
        );
        return Err(Error::Forbidden);
    }

    Ok(expense)
}

/// Overwrite the fields supplied in `body` on the expense with `id`.
///
/// Existence and ownership are checked before the body is looked at. Fields
/// left out of `body` keep their current values. An unknown category name is
/// rejected and nothing is changed.
///
/// # Errors
///
/// - [Error::ExpenseNotFound] or [Error::Forbidden] as for [get_expense].
/// - [Error::InvalidJson] if `body` is not a JSON object.
/// - [Error::Validation] if any supplied field fails validation.
/// - [Error::CategoryNotFound] if no category has the given name.
pub fn update_expense<C, E>(
    user_id: UserID,
    id: ExpenseId,
    body: &Value,
    categories: &C,
    expenses: &E,
) -> Result<Expense, Error>
where
    C: CategoryStore,
    E: ExpenseStore,
{
    let mut expense = get_expense(user_id, id, expenses)?;

    let body: &Map<String, Value> = body.as_object().ok_or(Error::InvalidJson)?;
    let fields = schema::validate(body, Mode::Update)?;
    let category = schema::category_name(body)
        .map(|name| resolve_category(&name, categories))
        .transpose()?;

    if let Some(label) = fields.label {
        expense.label = label;
    }
    if let Some(amount) = fields.amount {
        expense.amount = amount;
    }
    if let Some(date) = fields.date {
        expense.date = date;
    }
    if let Some(category) = category {
        expense.category = category;
    }

    expenses.update(&expense)?;

    tracing::info!("User {user_id} updated expense {id}");

    Ok(expense)
}

/// Delete the expense with `id` if `user_id` owns it.
///
/// # Errors
///
/// - [Error::ExpenseNotFound] or [Error::Forbidden] as for [get_expense].
pub fn delete_expense<E>(user_id: UserID, id: ExpenseId, expenses: &E) -> Result<(), Error>
where
    E: ExpenseStore,
{
    get_expense(user_id, id, expenses)?;
    expenses.delete(id)?;

    tracing::info!("User {user_id} deleted expense {id}");

    Ok(())
}

fn resolve_category<C>(name: &str, categories: &C) -> Result<Category, Error>
where
    C: CategoryStore,
{
    categories
        .find_by_name(name)?
        .ok_or_else(|| Error::CategoryNotFound(name.to_owned()))
}

#[cfg(test)]
mod expense_service_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use email_address::EmailAddress;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::{Date, macros::date};

    use crate::{
        Error, PasswordHash, SQLiteCategoryStore, SQLiteUserStore, UserID, UserStore,
        category::CategoryName, db::initialize, expense::SQLiteExpenseStore,
    };

    use super::{create_expense, delete_expense, get_expense, list_expenses, update_expense};

    const TODAY: Date = date!(2025 - 05 - 20);

    struct Fixture {
        categories: SQLiteCategoryStore,
        expenses: SQLiteExpenseStore,
        owner: UserID,
        intruder: UserID,
    }

    fn get_fixture() -> Fixture {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let connection = Arc::new(Mutex::new(connection));
        let users = SQLiteUserStore::new(connection.clone());
        let owner = users
            .create(
                EmailAddress::from_str("owner@example.com").unwrap(),
                PasswordHash::new_unchecked("hunter2"),
            )
            .unwrap();
        let intruder = users
            .create(
                EmailAddress::from_str("intruder@example.com").unwrap(),
                PasswordHash::new_unchecked("hunter3"),
            )
            .unwrap();

        Fixture {
            categories: SQLiteCategoryStore::new(connection.clone()),
            expenses: SQLiteExpenseStore::new(connection),
            owner: owner.id,
            intruder: intruder.id,
        }
    }

    fn create(fixture: &Fixture, body: Value) -> Result<crate::expense::Expense, Error> {
        create_expense(
            fixture.owner,
            &body,
            TODAY,
            &fixture.categories,
            &fixture.expenses,
        )
    }

    #[test]
    fn create_succeeds() {
        let fixture = get_fixture();

        let expense = create(
            &fixture,
            json!({"label": "Groceries", "amount": 42.5, "date": "2025-01-05", "category": "Food"}),
        )
        .unwrap();

        assert_eq!(expense.label, "Groceries");
        assert_eq!(expense.amount, 42.5);
        assert_eq!(expense.date, date!(2025 - 01 - 05));
        assert_eq!(expense.category.name, CategoryName::new_unchecked("Food"));
        assert_eq!(expense.user_id, fixture.owner);
    }

    #[test]
    fn create_defaults_date_to_today() {
        let fixture = get_fixture();

        let expense = create(
            &fixture,
            json!({"label": "Bus", "amount": 3, "category": "Transportation"}),
        )
        .unwrap();

        assert_eq!(expense.date, TODAY);
    }

    #[test]
    fn create_rejects_empty_and_non_object_bodies() {
        let fixture = get_fixture();

        for body in [json!({}), json!([]), json!("label"), Value::Null] {
            assert_eq!(create(&fixture, body), Err(Error::InvalidJson));
        }
    }

    #[test]
    fn create_requires_category_before_validating() {
        let fixture = get_fixture();

        let result = create(&fixture, json!({"label": "Bus", "amount": -1}));

        assert_eq!(result, Err(Error::CategoryRequired));
    }

    #[test]
    fn create_validates_before_looking_up_category() {
        let fixture = get_fixture();

        let result = create(
            &fixture,
            json!({"label": "Bus", "amount": -1, "category": "Nope"}),
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn create_rejects_unknown_category() {
        let fixture = get_fixture();

        let result = create(
            &fixture,
            json!({"label": "Flight", "amount": 300, "category": "Travel"}),
        );

        assert_eq!(result, Err(Error::CategoryNotFound("Travel".to_owned())));
        assert_eq!(list_expenses(fixture.owner, &fixture.expenses), Ok(vec![]));
    }

    #[test]
    fn list_only_returns_own_expenses() {
        let fixture = get_fixture();
        let mine = create(
            &fixture,
            json!({"label": "Rent", "amount": 1000, "category": "Housing"}),
        )
        .unwrap();

        assert_eq!(list_expenses(fixture.owner, &fixture.expenses), Ok(vec![mine]));
        assert_eq!(list_expenses(fixture.intruder, &fixture.expenses), Ok(vec![]));
    }

    #[test]
    fn get_checks_existence_then_ownership() {
        let fixture = get_fixture();
        let expense = create(
            &fixture,
            json!({"label": "Rent", "amount": 1000, "category": "Housing"}),
        )
        .unwrap();

        assert_eq!(
            get_expense(fixture.owner, expense.id, &fixture.expenses),
            Ok(expense.clone())
        );
        assert_eq!(
            get_expense(fixture.intruder, expense.id, &fixture.expenses),
            Err(Error::Forbidden)
        );
        assert_eq!(
            get_expense(fixture.intruder, expense.id + 1, &fixture.expenses),
            Err(Error::ExpenseNotFound)
        );
    }

    #[test]
    fn update_overwrites_only_supplied_fields() {
        let fixture = get_fixture();
        let expense = create(
            &fixture,
            json!({"label": "Rent", "amount": 1000, "date": "2025-01-01", "category": "Housing"}),
        )
        .unwrap();

        let updated = update_expense(
            fixture.owner,
            expense.id,
            &json!({"amount": "1100", "date": "", "category": ""}),
            &fixture.categories,
            &fixture.expenses,
        )
        .unwrap();

        assert_eq!(updated.amount, 1100.0);
        assert_eq!(updated.label, "Rent");
        assert_eq!(updated.date, date!(2025 - 01 - 01));
        assert_eq!(updated.category, expense.category);
        assert_eq!(
            get_expense(fixture.owner, expense.id, &fixture.expenses),
            Ok(updated)
        );
    }

    #[test]
    fn update_with_unknown_category_changes_nothing() {
        let fixture = get_fixture();
        let expense = create(
            &fixture,
            json!({"label": "Rent", "amount": 1000, "category": "Housing"}),
        )
        .unwrap();

        let result = update_expense(
            fixture.owner,
            expense.id,
            &json!({"label": "Hotel", "category": "Travel"}),
            &fixture.categories,
            &fixture.expenses,
        );

        assert_eq!(result, Err(Error::CategoryNotFound("Travel".to_owned())));
        assert_eq!(
            get_expense(fixture.owner, expense.id, &fixture.expenses),
            Ok(expense)
        );
    }

    #[test]
    fn update_by_other_user_is_forbidden_even_with_bad_body() {
        let fixture = get_fixture();
        let expense = create(
            &fixture,
            json!({"label": "Rent", "amount": 1000, "category": "Housing"}),
        )
        .unwrap();

        let result = update_expense(
            fixture.intruder,
            expense.id,
            &Value::Null,
            &fixture.categories,
            &fixture.expenses,
        );

        assert_eq!(result, Err(Error::Forbidden));
    }

    #[test]
    fn delete_checks_ownership() {
        let fixture = get_fixture();
        let expense = create(
            &fixture,
            json!({"label": "Rent", "amount": 1000, "category": "Housing"}),
        )
        .unwrap();

        assert_eq!(
            delete_expense(fixture.intruder, expense.id, &fixture.expenses),
            Err(Error::Forbidden)
        );
        assert_eq!(delete_expense(fixture.owner, expense.id, &fixture.expenses), Ok(()));
        assert_eq!(
            delete_expense(fixture.owner, expense.id, &fixture.expenses),
            Err(Error::ExpenseNotFound)
        );
    }
}
