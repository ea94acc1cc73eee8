use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;

/// Failure modes of the ingestion webhook. Decode and validation errors never
/// produce partial writes: the pipeline stops before touching the store.
#[derive(Debug)]
pub enum IngestError {
    /// The uplink's device identifier has no channel mapping.
    UnknownDevice(String),
    /// The envelope's `received_at` could not be parsed.
    MalformedTimestamp(String),
    /// The decode succeeded but the append did not; the reading is lost
    /// (retry policy belongs to the gateway, not this service).
    Store(sqlx::Error),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDevice(device_id) => write!(f, "Unknown device_id: {device_id}"),
            Self::MalformedTimestamp(raw) => write!(f, "Malformed received_at timestamp: {raw}"),
            Self::Store(err) => write!(f, "Failed to store reading: {err}"),
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match &self {
            // Unmapped devices are a gateway configuration problem.
            Self::UnknownDevice(_) => StatusCode::BAD_REQUEST,
            Self::MalformedTimestamp(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match &self {
            Self::UnknownDevice(device_id) => {
                tracing::warn!(device_id = %device_id, "uplink from unmapped device");
            }
            other => {
                tracing::error!(error = %other, "uplink ingestion failed");
            }
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Missing rows are handled by the callers (`fetch_optional` plus the
/// latest endpoint's 404 body), so every error that lands here is a real
/// database failure.
pub fn map_db_error(err: sqlx::Error) -> (StatusCode, String) {
    tracing::error!(error = %err, "database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Database error".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_device_maps_to_client_error() {
        let resp = IngestError::UnknownDevice("eui-0".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failure_maps_to_server_error() {
        let resp = IngestError::Store(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn database_errors_map_to_server_error() {
        let (status, message) = map_db_error(sqlx::Error::PoolTimedOut);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Database error");
    }
}
