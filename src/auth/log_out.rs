//! Log-out route handlers that invalidate the auth cookie.

use axum::{
    Json,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde_json::{Value, json};

use crate::{auth::cookie::invalidate_auth_cookie, endpoints};

/// Invalidate the auth cookie and redirect the client to the log-in page.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}

/// Invalidate the auth cookie for the single-page client.
pub async fn post_log_out_api(jar: PrivateCookieJar) -> (PrivateCookieJar, Json<Value>) {
    (
        invalidate_auth_cookie(jar),
        Json(json!({"message": "Logged out"})),
    )
}
