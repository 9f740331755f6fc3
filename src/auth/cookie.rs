//! Defines functions for handling user authentication with cookies.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID};

use super::token::Token;

/// The name of the cookie holding the session [Token].
pub(crate) const COOKIE_TOKEN: &str = "token";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

fn build_token_cookie(value: String, expires_at: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((COOKIE_TOKEN, value))
        .path("/")
        .expires(expires_at)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

fn add_token(jar: PrivateCookieJar, token: &Token) -> Result<PrivateCookieJar, Error> {
    let value =
        serde_json::to_string(token).map_err(|error| Error::CookieError(error.to_string()))?;

    Ok(jar.add(build_token_cookie(value, token.expires_at)))
}

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// The cookie expires `duration` from now.
///
/// # Errors
///
/// Returns [Error::CookieError] if the token cannot be serialized.
pub(crate) fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    add_token(jar, &Token::new(user_id, duration))
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub(crate) fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let mut cookie = build_token_cookie("deleted".to_owned(), OffsetDateTime::UNIX_EPOCH);
    cookie.set_max_age(Duration::ZERO);

    jar.add(cookie)
}

/// Read the session token from `jar`.
///
/// # Errors
///
/// Returns [Error::Unauthenticated] if the cookie is missing, could not be
/// decrypted, does not hold a token or the token has expired.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::Unauthenticated)?;

    let token: Token = serde_json::from_str(cookie.value_trimmed()).map_err(|error| {
        tracing::debug!("Could not parse token cookie: {error}");
        Error::Unauthenticated
    })?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::Unauthenticated);
    }

    Ok(token)
}

/// Set the expiry of the auth cookie in `jar` to the later of now plus
/// `duration` and the cookie's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns:
/// - [Error::Unauthenticated] if there is no valid token in the jar.
/// - [Error::CookieError] if extending by `duration` overflows or the token cannot be serialized.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let mut token = get_token_from_cookies(&jar)?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::CookieError(format!("cannot extend session by {duration}")))?;

    token.expires_at = max(token.expires_at, new_expiry);

    add_token(jar, &token)
}
