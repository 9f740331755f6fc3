//! The page shown when a request fails because of a problem on the server.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// An HTML 500 page. The details of the underlying error are never shown.
pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        let page = error_view("Internal Server Error", "500", self.description, self.fix);

        (StatusCode::INTERNAL_SERVER_ERROR, Html(page.into_string())).into_response()
    }
}

#[cfg(test)]
mod internal_server_error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{
        Error,
        test_utils::{assert_valid_html, parse_html_document},
    };

    #[tokio::test]
    async fn database_errors_render_error_page() {
        let response = Error::DatabaseLockError.into_page_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Sorry, something went wrong."));
        assert!(!text.contains("database lock"));
    }

    #[tokio::test]
    async fn page_is_html() {
        let response = super::InternalServerError::default().into_response();

        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/html"));
    }
}
