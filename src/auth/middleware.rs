//! Authentication middleware that validates cookies, extends sessions, and handles redirects.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error, SQLiteUserStore, UserID, UserStore,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
    endpoints,
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for checking that the user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Find the user named by the session cookie.
///
/// Returns [Error::Unauthenticated] if there is no valid session or the user has been deleted.
fn authenticate(jar: &PrivateCookieJar, state: &AuthState) -> Result<UserID, Error> {
    let token = get_token_from_cookies(jar)?;

    match SQLiteUserStore::new(state.db_connection.clone()).get(token.user_id) {
        Ok(user) => Ok(user.id),
        Err(Error::NotFound) => {
            tracing::info!("Session names user {} who no longer exists", token.user_id);
            Err(Error::Unauthenticated)
        }
        Err(error) => Err(error),
    }
}

/// Checks for a valid session before running the request.
///
/// The user ID is placed into the request extensions and the request executed
/// normally if the session is valid, otherwise the response from `reject` is
/// returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    reject: impl Fn(Error, &Request) -> Response,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}.");
            return reject(Error::Unauthenticated, &Request::from_parts(parts, body));
        }
    };

    let user_id = match authenticate(&jar, &state) {
        Ok(user_id) => user_id,
        Err(error) => return reject(error, &Request::from_parts(parts, body)),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Middleware for pages that redirects to the log-in page when there is no valid session.
///
/// The log-in page is given the requested URL so it can send the user back after logging in.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |error, request| {
        if error != Error::Unauthenticated {
            return error.into_page_response();
        }

        let log_in_redirect_url = build_log_in_redirect_url(request).unwrap_or_else(|| {
            tracing::warn!("Invalid redirect URL from request URI. Falling back to expenses.");

            build_log_in_redirect_url_from_target(endpoints::EXPENSES_VIEW)
                .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
        });

        Redirect::to(&log_in_redirect_url).into_response()
    })
    .await
}

/// Middleware for the JSON API that responds with 401 when there is no valid session.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard_api(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |error, _| error.into_response()).await
}
