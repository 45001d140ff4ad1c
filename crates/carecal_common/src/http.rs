// --- File: crates/carecal_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{CarecalError, HttpStatusCode};

/// Implement IntoResponse for CarecalError so handlers can return it directly.
impl IntoResponse for CarecalError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "code": status_code.as_u16(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Converts a domain result into a JSON handler result.
pub fn handle_json_result<T, E>(result: Result<T, E>) -> Result<Json<T>, CarecalError>
where
    T: serde::Serialize,
    E: Into<CarecalError>,
{
    result.map(Json).map_err(Into::into)
}
