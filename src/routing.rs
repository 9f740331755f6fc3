//! Application router configuration with protected and unprotected route definitions.

use std::path::Path;

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_api, get_log_in_page, get_log_out, get_sign_up_page,
        post_log_in_api, post_log_in_page, post_log_out_api, post_register_api, post_sign_up_page,
    },
    category::get_categories_endpoint,
    endpoints,
    expense::{
        create_expense_endpoint, create_expense_page, delete_expense_endpoint,
        delete_expense_page, get_edit_expense_page, get_expense_endpoint, get_expense_page,
        get_expenses_endpoint, get_expenses_page, get_new_expense_page, update_expense_endpoint,
        update_expense_page,
    },
    health::{get_health, get_status},
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
///
/// Files under `static_dir` are served from [endpoints::STATIC].
pub fn build_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let unprotected_routes = Router::new()
        .route(
            endpoints::LOG_IN_VIEW,
            get(get_log_in_page).post(post_log_in_page),
        )
        .route(endpoints::LOG_IN, post(post_log_in_api))
        .route(endpoints::LOG_IN_API, post(post_log_in_api))
        .route(endpoints::LOG_OUT_VIEW, get(get_log_out))
        .route(endpoints::LOG_OUT_API, post(post_log_out_api))
        .route(
            endpoints::SIGN_UP_VIEW,
            get(get_sign_up_page).post(post_sign_up_page),
        )
        .route(endpoints::REGISTER, post(post_register_api))
        .route(endpoints::REGISTER_API, post(post_register_api))
        .route(endpoints::HEALTH_API, get(get_health))
        .route(endpoints::STATUS_API, get(get_status));

    // Pages send unauthenticated users to the log-in page.
    let protected_pages = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(
            endpoints::NEW_EXPENSE_VIEW,
            get(get_new_expense_page).post(create_expense_page),
        )
        .route(endpoints::EXPENSE_VIEW, get(get_expense_page))
        .route(
            endpoints::EDIT_EXPENSE_VIEW,
            get(get_edit_expense_page).post(update_expense_page),
        )
        .route(endpoints::DELETE_EXPENSE_VIEW, post(delete_expense_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // The API answers unauthenticated requests with 401 JSON instead.
    let protected_api = Router::new()
        .route(endpoints::EXPENSE_API, post(create_expense_endpoint))
        .route(endpoints::EXPENSES_API, get(get_expenses_endpoint))
        .route(
            endpoints::EXPENSE_ITEM_API,
            get(get_expense_endpoint)
                .put(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(endpoints::CATEGORIES_API, get(get_categories_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_api));

    protected_pages
        .merge(protected_api)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new(static_dir))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the expense list.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::EXPENSES_VIEW)
}


#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::Duration;

    use crate::{
        AppState,
        endpoints::{self, format_endpoint},
    };

    use super::build_router;

    const STRONG_PASSWORD: &str = "correct horse battery staple";

    fn get_server() -> TestServer {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "foobar")
            .unwrap()
            .with_password_cost(4);

        TestServer::try_new(build_router(state, "static/")).expect("Could not create test server.")
    }

    async fn register_and_log_in(server: &TestServer, email: &str) -> Cookie<'static> {
        server
            .post(endpoints::REGISTER_API)
            .json(&json!({"email": email, "password": STRONG_PASSWORD}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::LOG_IN_API)
            .json(&json!({"email": email, "password": STRONG_PASSWORD}))
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({"message": "Login successful"}));

        response.cookie("token")
    }

    async fn create_expense(server: &TestServer, cookie: Cookie<'static>, label: &str) -> i64 {
        let response = server
            .post(endpoints::EXPENSE_API)
            .add_cookie(cookie)
            .json(&json!({
                "label": label,
                "amount": 12.5,
                "date": "2025-03-01",
                "category": "Food",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn user_can_manage_expenses_through_api() {
        let server = get_server();
        let cookie = register_and_log_in(&server, "alice@example.com").await;

        let id = create_expense(&server, cookie.clone(), "Lunch").await;

        let response = server
            .get(endpoints::EXPENSES_API)
            .add_cookie(cookie.clone())
            .await;
        response.assert_status_ok();
        response.assert_json(&json!([{
            "id": id,
            "label": "Lunch",
            "amount": 12.5,
            "date": "2025-03-01",
            "category": {"name": "Food"},
        }]));

        server
            .put(&format_endpoint(endpoints::EXPENSE_ITEM_API, id))
            .add_cookie(cookie.clone())
            .json(&json!({"amount": 20}))
            .await
            .assert_status_ok();
        let response = server
            .get(&format_endpoint(endpoints::EXPENSE_ITEM_API, id))
            .add_cookie(cookie.clone())
            .await;
        assert_eq!(response.json::<Value>()["amount"], json!(20.0));

        server
            .delete(&format_endpoint(endpoints::EXPENSE_ITEM_API, id))
            .add_cookie(cookie.clone())
            .await
            .assert_status_ok();
        server
            .get(&format_endpoint(endpoints::EXPENSE_ITEM_API, id))
            .add_cookie(cookie)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn other_users_expense_is_forbidden() {
        let server = get_server();
        let alice = register_and_log_in(&server, "alice@example.com").await;
        let bob = register_and_log_in(&server, "bob@example.com").await;
        let id = create_expense(&server, alice, "Lunch").await;

        let response = server
            .get(&format_endpoint(endpoints::EXPENSE_ITEM_API, id))
            .add_cookie(bob)
            .await;

        response.assert_status_forbidden();
    }

    #[tokio::test]
    async fn categories_require_log_in() {
        let server = get_server();

        let response = server.get(endpoints::CATEGORIES_API).await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({"error": "Authentication Required"}));
    }

    #[tokio::test]
    async fn categories_are_listed_for_logged_in_user() {
        let server = get_server();
        let cookie = register_and_log_in(&server, "alice@example.com").await;

        let response = server
            .get(endpoints::CATEGORIES_API)
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        let names = response.json::<Vec<String>>();
        assert!(names.contains(&"Food".to_owned()));
    }

    #[tokio::test]
    async fn expense_page_redirects_to_log_in() {
        let server = get_server();

        let response = server.get(endpoints::NEW_EXPENSE_VIEW).await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            "/log_in?redirect_url=%2Fuser%2Fexpense%2Fnew"
        );
    }

    #[tokio::test]
    async fn expense_list_page_shows_expenses() {
        let server = get_server();
        let cookie = register_and_log_in(&server, "alice@example.com").await;
        create_expense(&server, cookie.clone(), "Train ticket").await;

        let response = server
            .get(endpoints::EXPENSES_VIEW)
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("Train ticket"));
    }

    #[tokio::test]
    async fn log_out_clears_session() {
        let server = get_server();
        let cookie = register_and_log_in(&server, "alice@example.com").await;

        let response = server
            .post(endpoints::LOG_OUT_API)
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        assert_eq!(response.cookie("token").max_age(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn health_is_public() {
        let server = get_server();

        let response = server.get(endpoints::HEALTH_API).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_api_route_is_json_not_found() {
        let server = get_server();

        let response = server.get("/api/nothing_here").await;

        response.assert_status_not_found();
        response.assert_json(&json!({"error": "Not found"}));
    }
}
