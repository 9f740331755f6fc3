//! Registration of new users, through the JSON endpoint or the sign-up page.
use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, WithRejection, cookie::Key};
use email_address::EmailAddress;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, SQLiteUserStore, User, UserStore,
    auth::cookie::set_auth_cookie,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, email_input, log_in_register, password_input,
    },
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The bcrypt cost for hashing the new password.
    pub password_cost: u32,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            password_cost: state.password_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// Check the email and password, then store the new user.
///
/// # Errors
///
/// - [Error::InvalidEmail] if `email` is not an email address.
/// - [Error::TooWeak] if the password is too easy to guess.
/// - [Error::DuplicateEmail] if the email is already registered.
fn register_user(email: &str, password: &str, state: &RegistrationState) -> Result<User, Error> {
    let email =
        EmailAddress::from_str(email.trim()).map_err(|_| Error::InvalidEmail(email.to_owned()))?;
    let password_hash = PasswordHash::from_raw_password(password, state.password_cost)?;

    let user = SQLiteUserStore::new(state.db_connection.clone()).create(email, password_hash)?;
    tracing::info!("Registered user {}", user.id);

    Ok(user)
}

/// The details sent to the JSON registration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Handler for JSON registration requests.
pub async fn post_register_api(
    State(state): State<RegistrationState>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, Error>,
) -> Result<(StatusCode, Json<Value>), Error> {
    register_user(&request.email, &request.password, &state)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "User registered successfully"})),
    ))
}

fn confirm_password_input(error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="confirm-password" class=(FORM_LABEL_STYLE) { "Confirm Password" }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required;

            @if let Some(error_message) = error_message
            {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }
        }
    }
}

/// Error messages to show next to the sign-up form fields.
#[derive(Debug, Default)]
struct SignUpErrors<'a> {
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn sign_up_page(email: &str, errors: SignUpErrors) -> Markup {
    let form = html! {
        form method="post" action=(endpoints::SIGN_UP_VIEW) class="space-y-4 md:space-y-6"
        {
            (email_input(email, errors.email))
            (password_input(errors.password))
            (confirm_password_input(errors.confirm_password))

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE) { "Sign up" }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Log in here" }
            }
        }
    };
    let content = log_in_register("Create an account", &form);

    base("Sign Up", &content)
}

/// Display the sign-up page.
pub async fn get_sign_up_page() -> Response {
    sign_up_page("", SignUpErrors::default()).into_response()
}

#[derive(Serialize, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Handler for the sign-up form.
///
/// A new user is logged in straight away and sent to their expense list.
pub async fn post_sign_up_page(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<SignUpForm>,
) -> Response {
    if form.password != form.confirm_password {
        return sign_up_page(
            &form.email,
            SignUpErrors {
                confirm_password: Some("Passwords do not match"),
                ..Default::default()
            },
        )
        .into_response();
    }

    let user = match register_user(&form.email, &form.password, &state) {
        Ok(user) => user,
        Err(error @ (Error::InvalidEmail(_) | Error::DuplicateEmail)) => {
            let message = error.to_string();
            return sign_up_page(
                &form.email,
                SignUpErrors {
                    email: Some(&message),
                    ..Default::default()
                },
            )
            .into_response();
        }
        Err(error @ Error::TooWeak(_)) => {
            let message = error.to_string();
            return sign_up_page(
                &form.email,
                SignUpErrors {
                    password: Some(&message),
                    ..Default::default()
                },
            )
            .into_response();
        }
        Err(error) => return error.into_page_response(),
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => (jar, Redirect::to(endpoints::EXPENSES_VIEW)).into_response(),
        Err(error) => error.into_page_response(),
    }
}
