//! The response for requests to paths with no route.
use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{endpoints, html::error_view};

/// Respond with 404, as JSON for API paths and as a page for everything else.
pub async fn get_404_not_found(request: Request) -> Response {
    if request.uri().path().starts_with(endpoints::API_PREFIX) {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"}))).into_response();
    }

    (
        StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "Something's missing.",
            "Sorry, we can't find that page. You'll find lots to explore on the home page.",
        ),
    )
        .into_response()
}

#[cfg(test)]
mod not_found_tests {
    use axum::{Router, http::StatusCode};
    use axum_test::TestServer;
    use serde_json::json;

    use super::get_404_not_found;

    fn get_server() -> TestServer {
        let app = Router::new().fallback(get_404_not_found);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn api_paths_get_json() {
        let response = get_server().get("/api/nothing/here").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({"error": "Not found"}));
    }

    #[tokio::test]
    async fn other_paths_get_page() {
        let response = get_server().get("/nothing/here").await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.text().contains("<title>Not Found - Expense Tracker</title>"));
    }
}
