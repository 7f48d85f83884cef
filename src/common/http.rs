use axum::response::{IntoResponse, Response};

/// JSON reply envelope of the dispatch API: `{"data": ...}`.
pub(crate) struct GenericResponse<T = ()> {
    pub(crate) status: http::StatusCode,
    pub(crate) data: T,
}

impl From<http::StatusCode> for GenericResponse {
    fn from(status: http::StatusCode) -> Self {
        Self { status, data: () }
    }
}

impl<T> GenericResponse<T> {
    pub(crate) fn new(status: http::StatusCode, data: T) -> Self {
        Self { status, data }
    }
}

impl GenericResponse<serde_json::Value> {
    pub(crate) fn error(status: http::StatusCode, message: impl ToString) -> Self {
        Self {
            status,
            data: serde_json::json!({ "error": message.to_string() }),
        }
    }
}

impl<T: serde::Serialize> IntoResponse for GenericResponse<T> {
    fn into_response(self) -> Response {
        let mut response = Response::new(
            serde_json::json!({
                "data": self.data,
            })
            .to_string()
            .into(),
        );
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        response
    }
}
