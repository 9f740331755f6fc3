//! The HTML form for creating and editing expenses.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    Error,
    category::Category,
    html::{BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

use super::{
    domain::Expense,
    schema::{AMOUNT, CATEGORY, DATE, FieldErrors, LABEL, LABEL_MAX_LENGTH},
};

/// The raw values submitted by the expense form.
///
/// Every field is kept as text so the form can be shown again exactly as the
/// user filled it in when validation fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseForm {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category: String,
}

impl ExpenseForm {
    /// Convert the form into the JSON object the expense service validates.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert(LABEL.to_owned(), Value::String(self.label.clone()));
        body.insert(AMOUNT.to_owned(), Value::String(self.amount.clone()));
        body.insert(DATE.to_owned(), Value::String(self.date.clone()));
        body.insert(CATEGORY.to_owned(), Value::String(self.category.clone()));

        Value::Object(body)
    }
}

impl From<&Expense> for ExpenseForm {
    fn from(expense: &Expense) -> Self {
        Self {
            label: expense.label.clone(),
            amount: expense.amount.to_string(),
            date: expense.date.to_string(),
            category: expense.category.name.to_string(),
        }
    }
}

/// Turn an error from the expense service into messages shown next to the form fields.
///
/// Returns the error back if it is not caused by the form input.
pub fn form_errors(error: Error) -> Result<FieldErrors, Error> {
    match error {
        Error::Validation(errors) => Ok(errors),
        Error::CategoryRequired => {
            let mut errors = FieldErrors::default();
            errors.insert(CATEGORY, "Category is required");
            Ok(errors)
        }
        Error::CategoryNotFound(_) => {
            let mut errors = FieldErrors::default();
            errors.insert(CATEGORY, "Category not found");
            Ok(errors)
        }
        Error::InvalidJson => {
            let mut errors = FieldErrors::default();
            errors.insert(LABEL, "Fill in the form before saving");
            Ok(errors)
        }
        error => Err(error),
    }
}

fn error_message(errors: &FieldErrors, field: &str) -> Markup {
    html! {
        @if let Some(message) = errors.get(field) {
            p class=(FORM_ERROR_STYLE) { (message) }
        }
    }
}

pub fn expense_form(
    action: &str,
    submit_text: &str,
    values: &ExpenseForm,
    categories: &[Category],
    errors: &FieldErrors,
) -> Markup {
    html! {
        form method="post" action=(action) class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="label" class=(FORM_LABEL_STYLE) { "Label" }

                input
                    type="text"
                    name="label"
                    id="label"
                    placeholder="Groceries"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    maxlength=(LABEL_MAX_LENGTH)
                    value=(values.label);

                (error_message(errors, LABEL))
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    type="number"
                    name="amount"
                    id="amount"
                    step="0.01"
                    min="0"
                    placeholder="0.00"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(values.amount);

                (error_message(errors, AMOUNT))
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    type="date"
                    name="date"
                    id="date"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(values.date);

                (error_message(errors, DATE))
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE) required
                {
                    option value="" selected[values.category.is_empty()] { "Choose a category" }

                    @for category in categories {
                        @let name = category.name.as_ref();
                        option value=(name) selected[values.category == name] { (name) }
                    }
                }

                (error_message(errors, CATEGORY))
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
