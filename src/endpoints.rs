//! The endpoint URIs for the JSON API and the server-rendered pages.
//!
//! For endpoints that take a parameter, e.g., '/api/expense/{expense_id}', use [format_endpoint].

/// The root route which redirects to the expense list.
pub const ROOT: &str = "/";
/// The route for static files, e.g. the built single-page client.
pub const STATIC: &str = "/static";

/// The page with the log-in form.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page with the registration form.
pub const SIGN_UP_VIEW: &str = "/sign_up";
/// The route that logs out the user and redirects to the log-in page.
pub const LOG_OUT_VIEW: &str = "/log_out";
/// The page listing the user's expenses.
pub const EXPENSES_VIEW: &str = "/user/expense/";
/// The page for creating a new expense.
pub const NEW_EXPENSE_VIEW: &str = "/user/expense/new";
/// The page showing a single expense.
pub const EXPENSE_VIEW: &str = "/user/expense/{expense_id}";
/// The page for editing an expense.
pub const EDIT_EXPENSE_VIEW: &str = "/user/expense/{expense_id}/edit";
/// The form target for deleting an expense.
pub const DELETE_EXPENSE_VIEW: &str = "/user/expense/{expense_id}/delete";

/// The JSON log-in route used by the single-page client.
pub const LOG_IN: &str = "/login";
/// The JSON log-in route under the API prefix.
pub const LOG_IN_API: &str = "/api/login";
/// The JSON registration route.
pub const REGISTER: &str = "/register";
/// The JSON registration route under the API prefix.
pub const REGISTER_API: &str = "/api/register";
/// The route for the client to log out the current user.
pub const LOG_OUT_API: &str = "/api/logout";
/// The route to create an expense.
pub const EXPENSE_API: &str = "/api/expense";
/// The route to list the user's expenses.
pub const EXPENSES_API: &str = "/api/expenses";
/// The route to get, update or delete a single expense.
pub const EXPENSE_ITEM_API: &str = "/api/expense/{expense_id}";
/// The route to list category names.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route reporting whether the server and its database are healthy.
pub const HEALTH_API: &str = "/api/health";
/// The route reporting the application name and version.
pub const STATUS_API: &str = "/api/status";
/// The prefix shared by the JSON API routes.
pub const API_PREFIX: &str = "/api/";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace, e.g.
/// '{expense_id}' in '/api/expense/{expense_id}'. Only the first parameter is
/// replaced. If there is none, `endpoint_path` is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
