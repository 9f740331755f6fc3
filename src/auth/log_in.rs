//! This file defines the routes for logging in, both the JSON endpoint used by
//! the single-page client and the log-in page with its form.
//! The cookie module handles the lower level cookie auth logic.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json,
    extract::{FromRef, Query, State},
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
    AppState, Error, SQLiteUserStore, User,
    auth::{cookie::set_auth_cookie, redirect::normalize_redirect_url},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, base, email_input, log_in_register, password_input},
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect email or password.";

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

impl LoginState {
    fn cookie_duration(&self, remember_me: bool) -> Duration {
        if remember_me {
            REMEMBER_ME_COOKIE_DURATION
        } else {
            self.cookie_duration
        }
    }
}

/// Find the user with `email` and check their password.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is malformed or not
/// registered, or the password does not match. Returns [Error::HashingError]
/// if the stored hash could not be checked.
fn verify_credentials(email: &str, password: &str, state: &LoginState) -> Result<User, Error> {
    let email = EmailAddress::from_str(email.trim()).map_err(|_| Error::InvalidCredentials)?;

    let user = SQLiteUserStore::new(state.db_connection.clone())
        .find_by_email(&email)?
        .ok_or(Error::InvalidCredentials)?;

    match user.password_hash.verify(password) {
        Ok(true) => Ok(user),
        Ok(false) => Err(Error::InvalidCredentials),
        Err(error) => Err(Error::HashingError(error.to_string())),
    }
}

/// The credentials sent to the JSON log-in endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Handler for JSON log-in requests.
///
/// Sets the auth cookie and responds with a message on success.
pub async fn post_log_in_api(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    WithRejection(Json(request), _): WithRejection<Json<LogInRequest>, Error>,
) -> Result<(PrivateCookieJar, Json<Value>), Error> {
    let user = match verify_credentials(&request.email, &request.password, &state) {
        Ok(user) => user,
        Err(error) => {
            tracing::info!("Failed log-in attempt for {}", request.email);
            return Err(error);
        }
    };

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration(request.remember_me))?;
    tracing::info!("User {} logged in", user.id);

    Ok((jar, Json(json!({"message": "Login successful"}))))
}

fn log_in_form(email: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form method="post" action=(endpoints::LOG_IN_VIEW) class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (email_input(email, None))
            (password_input(error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE) { "Log in" }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a href=(endpoints::SIGN_UP_VIEW) class=(LINK_STYLE) { "Sign up here" }
            }
        }
    }
}

fn log_in_page(email: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    let form = log_in_form(email, error_message, redirect_url);
    let content = log_in_register("Log in to your account", &form);

    base("Log In", &content)
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");

    log_in_page("", None, redirect_url.as_deref()).into_response()
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInForm {
    pub email: String,
    pub password: String,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// `Some` means the box was ticked.
    pub remember_me: Option<String>,

    /// Optional URL to redirect to after logging in.
    pub redirect_url: Option<String>,
}

/// Handler for the log-in form.
///
/// On success the auth cookie is set and the client is redirected to the
/// page it originally asked for, or the expense list. Otherwise the page is
/// shown again with an error message.
pub async fn post_log_in_page(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(form): Form<LogInForm>,
) -> Response {
    let redirect_url = parse_redirect_url(form.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();

    let user = match verify_credentials(&form.email, &form.password, &state) {
        Ok(user) => user,
        Err(Error::InvalidCredentials) => {
            tracing::info!("Failed log-in attempt for {}", form.email);
            return log_in_page(
                &form.email,
                Some(INVALID_CREDENTIALS_ERROR_MSG),
                redirect_url,
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_page(
                &form.email,
                Some("An internal error occurred. Please try again later."),
                redirect_url,
            )
            .into_response();
        }
    };

    let cookie_duration = state.cookie_duration(form.remember_me.is_some());

    match set_auth_cookie(jar, user.id, cookie_duration) {
        Ok(jar) => {
            tracing::info!("User {} logged in", user.id);
            let redirect_url = redirect_url.unwrap_or(endpoints::EXPENSES_VIEW);
            (jar, Redirect::to(redirect_url)).into_response()
        }
        Err(error) => error.into_page_response(),
    }
}

#[cfg(test)]
mod log_in_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    use crate::{
        PasswordHash, SQLiteUserStore, UserStore, ValidatedPassword,
        app_state::create_cookie_key,
        auth::cookie::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION},
        db::initialize,
        endpoints,
    };

    use super::{LoginState, REMEMBER_ME_COOKIE_DURATION, post_log_in_api};

    pub(super) fn get_state() -> LoginState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));
        SQLiteUserStore::new(connection.clone())
            .create(
                EmailAddress::from_str("test@example.com").unwrap(),
                PasswordHash::new(ValidatedPassword::new_unchecked("test"), 4).unwrap(),
            )
            .unwrap();

        LoginState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: connection,
        }
    }

    fn get_server() -> TestServer {
        let app = Router::new()
            .route(endpoints::LOG_IN, post(post_log_in_api))
            .route(endpoints::LOG_IN_API, post(post_log_in_api))
            .with_state(get_state());

        TestServer::try_new(app).expect("Could not create test server.")
    }

    /// Asserts that two date times are within two seconds of each other.
    macro_rules! assert_date_time_close {
        ($left:expr, $right:expr$(,)?) => {
            assert!(
                ($left - $right).abs() < Duration::seconds(2),
                "got date time {:?}, want {:?}",
                $left,
                $right
            );
        };
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_server();

        for endpoint in [endpoints::LOG_IN, endpoints::LOG_IN_API] {
            let response = server
                .post(endpoint)
                .json(&json!({"email": "test@example.com", "password": "test"}))
                .await;

            response.assert_status_ok();
            response.assert_json(&json!({"message": "Login successful"}));
            let cookie = response.cookie(COOKIE_TOKEN);
            assert_date_time_close!(
                cookie.expires_datetime().unwrap(),
                OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION
            );
        }
    }

    #[tokio::test]
    async fn remember_me_extends_cookie() {
        let server = get_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .json(&json!({"email": "test@example.com", "password": "test", "remember_me": true}))
            .await;

        response.assert_status_ok();
        let cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close!(
            cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + REMEMBER_ME_COOKIE_DURATION
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = get_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .json(&json!({"email": "test@example.com", "password": "wrong"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({"error": "Invalid email or password"}));
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_none());
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let server = get_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .json(&json!({"email": "nobody@example.com", "password": "test"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({"error": "Invalid email or password"}));
    }

    #[tokio::test]
    async fn log_in_fails_with_malformed_json() {
        let server = get_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .text("{\"email\":")
            .content_type("application/json")
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({"error": "Invalid JSON"}));
    }
}

#[cfg(test)]
mod log_in_page_tests {
    use axum::{
        Form,
        extract::{Query, State},
        http::{StatusCode, header::LOCATION},
    };
    use axum_extra::extract::PrivateCookieJar;
    use scraper::Selector;

    use crate::{
        auth::cookie::COOKIE_TOKEN,
        endpoints,
        test_utils::{
            assert_form_error_message, assert_form_input, assert_form_submit_button,
            assert_valid_html, get_header, must_get_form, parse_html_document,
        },
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInForm, RedirectQuery, get_log_in_page,
        log_in_tests::get_state, post_log_in_page,
    };

    fn form(password: &str, redirect_url: Option<&str>) -> LogInForm {
        LogInForm {
            email: "test@example.com".to_owned(),
            password: password.to_owned(),
            remember_me: None,
            redirect_url: redirect_url.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let response = get_log_in_page(Query(RedirectQuery { redirect_url: None })).await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_eq!(form.value().attr("action"), Some(endpoints::LOG_IN_VIEW));
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_submit_button(&form);
        let sign_up_link = form
            .select(&Selector::parse("a[href]").unwrap())
            .next()
            .expect("No sign-up link found");
        assert_eq!(sign_up_link.value().attr("href"), Some(endpoints::SIGN_UP_VIEW));
    }

    #[tokio::test]
    async fn log_in_page_preserves_redirect_url() {
        let redirect_url = "/user/expense/3";

        let response = get_log_in_page(Query(RedirectQuery {
            redirect_url: Some(redirect_url.to_owned()),
        }))
        .await;

        let document = parse_html_document(response).await;
        let input = document
            .select(&Selector::parse("input[name=redirect_url]").unwrap())
            .next()
            .expect("No redirect_url input found");
        assert_eq!(input.value().attr("value"), Some(redirect_url));
    }

    #[tokio::test]
    async fn log_in_page_drops_foreign_redirect_url() {
        let response = get_log_in_page(Query(RedirectQuery {
            redirect_url: Some("https://example.com".to_owned()),
        }))
        .await;

        let document = parse_html_document(response).await;
        let inputs = document
            .select(&Selector::parse("input[name=redirect_url]").unwrap())
            .count();
        assert_eq!(inputs, 0);
    }

    #[tokio::test]
    async fn log_in_form_redirects_to_expenses() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_log_in_page(State(state), jar, Form(form("test", None))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, LOCATION.as_str()), endpoints::EXPENSES_VIEW);
        assert!(get_header(&response, "set-cookie").starts_with(COOKIE_TOKEN));
    }

    #[tokio::test]
    async fn log_in_form_redirects_to_requested_url() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_log_in_page(
            State(state),
            jar,
            Form(form("test", Some("/user/expense/new"))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, LOCATION.as_str()), "/user/expense/new");
    }

    #[tokio::test]
    async fn log_in_form_shows_error_on_wrong_password() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_log_in_page(State(state), jar, Form(form("wrong", None))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        let form = must_get_form(&document);
        assert_form_error_message(&form, INVALID_CREDENTIALS_ERROR_MSG);
    }
}
