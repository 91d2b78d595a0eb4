use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use vitrina_api_types::{ApiErrorBody, ApiErrorMessage};

use crate::application::error::ErrorReport;
use crate::cache::CatalogError;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const SOURCE_UNAVAILABLE: &str = "source_unavailable";
    pub const INTERNAL: &str = "internal_error";
}

/// JSON error response with a stable machine-readable code. The optional
/// hint is safe to show to clients; the full cause chain travels in the
/// attached `ErrorReport` and is only logged.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            report: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "invalidation token or admin session required",
            None,
        )
    }

    pub fn source_unavailable(source: &'static str, err: &CatalogError) -> Self {
        let mut api_error = Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::SOURCE_UNAVAILABLE,
            "catalog temporarily unavailable",
            None,
        );
        api_error.report = Some(ErrorReport::from_error(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            err,
        ));
        api_error
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint.clone(),
            },
        };

        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                "infra::http::api_error",
                self.status,
                self.hint.unwrap_or_else(|| self.message.to_string()),
            )
        });

        let mut response = (self.status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_401() {
        let err = ApiError::unauthorized();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bad_request_keeps_hint() {
        let response = ApiError::bad_request(
            "invalid pagination parameter",
            Some("page must be a positive integer".to_string()),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.messages[0], "page must be a positive integer");
    }
}
