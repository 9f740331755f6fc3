//! The server-rendered pages for viewing, creating, editing and deleting expenses.

use axum::{
    Extension, Form,
    extract::{Path, State, rejection::PathRejection},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use time::OffsetDateTime;

use crate::{
    CategoryStore, Error, UserID,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, nav_bar,
    },
};

use super::{
    api::{ExpenseState, expense_id},
    domain::{Expense, ExpenseId},
    form::{ExpenseForm, expense_form, form_errors},
    schema::FieldErrors,
    service,
};

fn expenses_view(expenses: &[Expense]) -> Markup {
    let content = html! {
        (nav_bar())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between w-full max-w-4xl mb-4"
            {
                h1 class="text-xl font-bold" { "Expenses" }
                a href=(endpoints::NEW_EXPENSE_VIEW) class=(LINK_STYLE) { "Add expense" }
            }

            @if expenses.is_empty() {
                p { "No expenses yet." }
            } @else {
                table class="w-full max-w-4xl text-sm text-left"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Label" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for expense in expenses {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (expense.date) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a href=(format_endpoint(endpoints::EXPENSE_VIEW, expense.id)) class=(LINK_STYLE)
                                    {
                                        (expense.label)
                                    }
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    span class=(CATEGORY_BADGE_STYLE) { (expense.category.name) }
                                }
                                td class=(TABLE_CELL_STYLE) { (format_currency(expense.amount)) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a href=(format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id)) class=(LINK_STYLE)
                                    {
                                        "Edit"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Expenses", &content)
}

fn expense_view(expense: &Expense) -> Markup {
    let content = html! {
        (nav_bar())

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { (expense.label) }

            dl class="w-full space-y-2"
            {
                dt class="font-semibold" { "Amount" }
                dd { (format_currency(expense.amount)) }
                dt class="font-semibold" { "Date" }
                dd { (expense.date) }
                dt class="font-semibold" { "Category" }
                dd { span class=(CATEGORY_BADGE_STYLE) { (expense.category.name) } }
            }

            div class="flex gap-4 mt-4"
            {
                a href=(format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id)) class=(LINK_STYLE) { "Edit" }

                form method="post" action=(format_endpoint(endpoints::DELETE_EXPENSE_VIEW, expense.id))
                {
                    button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }
                }
            }
        }
    };

    base(&expense.label, &content)
}

fn expense_form_view(
    title: &str,
    action: &str,
    values: &ExpenseForm,
    state: &ExpenseState,
    errors: &FieldErrors,
) -> Result<Markup, Error> {
    let categories = state.categories().get_all()?;

    let content = html! {
        (nav_bar())

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { (title) }

            (expense_form(action, "Save", values, &categories, errors))
        }
    };

    Ok(base(title, &content))
}

/// Show a form page, or re-render it with the errors if they came from the input.
fn render_form_or_error(
    title: &str,
    action: &str,
    values: &ExpenseForm,
    state: &ExpenseState,
    error: Error,
) -> Response {
    match form_errors(error) {
        Ok(errors) => match expense_form_view(title, action, values, state, &errors) {
            Ok(markup) => markup.into_response(),
            Err(error) => error.into_page_response(),
        },
        Err(error) => error.into_page_response(),
    }
}

/// Display the user's expenses as a table.
pub async fn get_expenses_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    match service::list_expenses(user_id, &state.expenses()) {
        Ok(expenses) => expenses_view(&expenses).into_response(),
        Err(error) => error.into_page_response(),
    }
}

/// Display a single expense.
pub async fn get_expense_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<ExpenseId>, PathRejection>,
) -> Response {
    expense_id(path)
        .and_then(|id| service::get_expense(user_id, id, &state.expenses()))
        .map(|expense| expense_view(&expense).into_response())
        .unwrap_or_else(Error::into_page_response)
}

/// Display the form for creating an expense.
pub async fn get_new_expense_page(State(state): State<ExpenseState>) -> Response {
    let values = ExpenseForm {
        date: OffsetDateTime::now_utc().date().to_string(),
        ..Default::default()
    };

    match expense_form_view(
        "New Expense",
        endpoints::NEW_EXPENSE_VIEW,
        &values,
        &state,
        &FieldErrors::default(),
    ) {
        Ok(markup) => markup.into_response(),
        Err(error) => error.into_page_response(),
    }
}

/// Create an expense from the submitted form and go back to the expense list.
pub async fn create_expense_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let today = OffsetDateTime::now_utc().date();

    match service::create_expense(
        user_id,
        &form.to_json(),
        today,
        &state.categories(),
        &state.expenses(),
    ) {
        Ok(_) => Redirect::to(endpoints::EXPENSES_VIEW).into_response(),
        Err(error) => render_form_or_error(
            "New Expense",
            endpoints::NEW_EXPENSE_VIEW,
            &form,
            &state,
            error,
        ),
    }
}

/// Display the form for editing an expense, filled in with its current values.
pub async fn get_edit_expense_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<ExpenseId>, PathRejection>,
) -> Response {
    let expense = match expense_id(path)
        .and_then(|id| service::get_expense(user_id, id, &state.expenses()))
    {
        Ok(expense) => expense,
        Err(error) => return error.into_page_response(),
    };

    match expense_form_view(
        "Edit Expense",
        &format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id),
        &ExpenseForm::from(&expense),
        &state,
        &FieldErrors::default(),
    ) {
        Ok(markup) => markup.into_response(),
        Err(error) => error.into_page_response(),
    }
}

/// Save the edited expense and go to its page.
pub async fn update_expense_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<ExpenseId>, PathRejection>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let id = match expense_id(path) {
        Ok(id) => id,
        Err(error) => return error.into_page_response(),
    };

    match service::update_expense(
        user_id,
        id,
        &form.to_json(),
        &state.categories(),
        &state.expenses(),
    ) {
        Ok(_) => Redirect::to(&format_endpoint(endpoints::EXPENSE_VIEW, id)).into_response(),
        Err(error) => render_form_or_error(
            "Edit Expense",
            &format_endpoint(endpoints::EDIT_EXPENSE_VIEW, id),
            &form,
            &state,
            error,
        ),
    }
}

/// Delete the expense and go back to the expense list.
pub async fn delete_expense_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<ExpenseId>, PathRejection>,
) -> Response {
    match expense_id(path).and_then(|id| service::delete_expense(user_id, id, &state.expenses())) {
        Ok(()) => Redirect::to(endpoints::EXPENSES_VIEW).into_response(),
        Err(error) => error.into_page_response(),
    }
}
