//! Session cookies, log-in, registration and log-out, and the middleware that
//! guards the routes that need a logged in user.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::{LoginState, get_log_in_page, post_log_in_api, post_log_in_page};
pub use log_out::{get_log_out, post_log_out_api};
pub use middleware::{AuthState, auth_guard, auth_guard_api};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{RegistrationState, get_sign_up_page, post_register_api, post_sign_up_page};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
