//! The validation schema for expense input.
//!
//! Input arrives as a JSON object, either straight from an API request or
//! converted from a submitted form. Every field in [EXPENSE_SCHEMA] is checked
//! and all failures are collected into one [FieldErrors] before any domain
//! record is built.

use std::{collections::BTreeMap, fmt::Display};

use serde::Serialize;
use serde_json::{Map, Value};
use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::Error;

/// The longest label accepted, in characters.
pub const LABEL_MAX_LENGTH: usize = 255;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

pub const LABEL_REQUIRED: &str = "Label is required";
pub const LABEL_NOT_TEXT: &str = "Label must be text";
pub const LABEL_TOO_LONG: &str = "Label must be at most 255 characters";
pub const AMOUNT_REQUIRED: &str = "Amount is required";
pub const AMOUNT_NOT_A_NUMBER: &str = "Amount must be a number";
pub const AMOUNT_NEGATIVE: &str = "Amount must not be negative";
pub const DATE_INVALID: &str = "Date must be a valid date (YYYY-MM-DD)";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Record `message` as the error for `field`.
    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_owned(), message.to_owned());
    }

    /// The error message for `field`, if it failed validation.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether every field passed validation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();

        write!(f, "{}", messages.join(", "))
    }
}

/// Whether a field must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Missing the field is a validation error.
    Required,
    /// The field may be left out.
    Optional,
}

/// The check applied to a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// A string of 1 to [LABEL_MAX_LENGTH] characters after trimming.
    Label,
    /// A finite, non-negative number or a string holding one.
    Amount,
    /// A `YYYY-MM-DD` date or an RFC 3339 date-time.
    Date,
}

/// One entry of the schema: a field name, how it is checked and whether creating an expense needs it.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub constraint: Constraint,
    pub on_create: Presence,
    /// Whether a blank string counts as leaving the field out. Otherwise a
    /// blank string fails as missing, even on update.
    pub blank_is_omitted: bool,
}

pub const LABEL: &str = "label";
pub const AMOUNT: &str = "amount";
pub const DATE: &str = "date";
pub const CATEGORY: &str = "category";

/// The expense fields and their constraints.
///
/// The category is not listed since it is resolved against the database
/// instead of being checked in isolation.
pub const EXPENSE_SCHEMA: [FieldRule; 3] = [
    FieldRule {
        name: LABEL,
        constraint: Constraint::Label,
        blank_is_omitted: false,
        on_create: Presence::Required,
    },
    FieldRule {
        name: AMOUNT,
        constraint: Constraint::Amount,
        blank_is_omitted: false,
        on_create: Presence::Required,
    },
    FieldRule {
        name: DATE,
        constraint: Constraint::Date,
        blank_is_omitted: true,
        on_create: Presence::Optional,
    },
];

/// Whether the fields are for a new expense or for changing an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// The fields that passed validation. `None` means the field was not supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFields {
    pub label: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<Date>,
}

/// A field value after validation.
enum Checked {
    Label(String),
    Amount(f64),
    Date(Date),
}

/// Validate the expense fields in `body` against [EXPENSE_SCHEMA].
///
/// `null` values count as missing. A blank string is missing for fields whose
/// rule allows it and fails as required otherwise. On update every field is
/// optional.
///
/// # Errors
///
/// Returns [Error::Validation] with a message for every failing field.
pub fn validate(body: &Map<String, Value>, mode: Mode) -> Result<ExpenseFields, Error> {
    let mut errors = FieldErrors::default();
    let mut fields = ExpenseFields::default();

    for rule in EXPENSE_SCHEMA {
        let presence = match mode {
            Mode::Create => rule.on_create,
            Mode::Update => Presence::Optional,
        };

        let value = match body.get(rule.name) {
            None | Some(Value::Null) => {
                if presence == Presence::Required {
                    errors.insert(rule.name, missing_message(rule.constraint));
                }
                continue;
            }
            Some(value) if is_blank(value) => {
                if !rule.blank_is_omitted || presence == Presence::Required {
                    errors.insert(rule.name, missing_message(rule.constraint));
                }
                continue;
            }
            Some(value) => value,
        };

        match check(rule.constraint, value) {
            Ok(Checked::Label(label)) => fields.label = Some(label),
            Ok(Checked::Amount(amount)) => fields.amount = Some(amount),
            Ok(Checked::Date(date)) => fields.date = Some(date),
            Err(message) => errors.insert(rule.name, message),
        }
    }

    if errors.is_empty() {
        Ok(fields)
    } else {
        Err(Error::Validation(errors))
    }
}

/// The category name in `body`, or `None` if it is missing, `null` or blank.
///
/// Non-string values are turned into their JSON text so that they fail the
/// category lookup instead of being treated as missing.
pub fn category_name(body: &Map<String, Value>) -> Option<String> {
    match body.get(CATEGORY)? {
        Value::Null => None,
        Value::String(name) if name.trim().is_empty() => None,
        Value::String(name) => Some(name.to_owned()),
        other => Some(other.to_string()),
    }
}

fn is_blank(value: &Value) -> bool {
    value.as_str().is_some_and(|text| text.trim().is_empty())
}

fn missing_message(constraint: Constraint) -> &'static str {
    match constraint {
        Constraint::Label => LABEL_REQUIRED,
        Constraint::Amount => AMOUNT_REQUIRED,
        Constraint::Date => DATE_INVALID,
    }
}

fn check(constraint: Constraint, value: &Value) -> Result<Checked, &'static str> {
    match constraint {
        Constraint::Label => parse_label(value).map(Checked::Label),
        Constraint::Amount => parse_amount(value).map(Checked::Amount),
        Constraint::Date => parse_date(value).map(Checked::Date),
    }
}

fn parse_label(value: &Value) -> Result<String, &'static str> {
    let label = value.as_str().ok_or(LABEL_NOT_TEXT)?.trim();

    if label.is_empty() {
        Err(LABEL_REQUIRED)
    } else if label.chars().count() > LABEL_MAX_LENGTH {
        Err(LABEL_TOO_LONG)
    } else {
        Ok(label.to_owned())
    }
}

fn parse_amount(value: &Value) -> Result<f64, &'static str> {
    let amount = match value {
        Value::Number(number) => number.as_f64().ok_or(AMOUNT_NOT_A_NUMBER)?,
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| AMOUNT_NOT_A_NUMBER)?,
        _ => return Err(AMOUNT_NOT_A_NUMBER),
    };

    if !amount.is_finite() {
        Err(AMOUNT_NOT_A_NUMBER)
    } else if amount < 0.0 {
        Err(AMOUNT_NEGATIVE)
    } else {
        Ok(amount)
    }
}

fn parse_date(value: &Value) -> Result<Date, &'static str> {
    let text = value.as_str().ok_or(DATE_INVALID)?.trim();

    Date::parse(text, DATE_FORMAT)
        .or_else(|_| OffsetDateTime::parse(text, &Rfc3339).map(|date_time| date_time.date()))
        .map_err(|_| DATE_INVALID)
}
