use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::channel;
use crate::error::IngestError;
use crate::services::decoder::{self, UplinkEnvelope};
use crate::state::AppState;
use crate::store;
use crate::time::parse_received_at;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct IngestAck {
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/ttn/data",
    tag = "uplink",
    request_body = UplinkEnvelope,
    responses(
        (status = 200, description = "Reading stored", body = IngestAck),
        (status = 400, description = "Unknown device"),
        (status = 500, description = "Malformed timestamp or storage failure")
    )
)]
pub(crate) async fn ttn_webhook(
    State(state): State<AppState>,
    Json(envelope): Json<UplinkEnvelope>,
) -> Result<Json<IngestAck>, IngestError> {
    let device_id = envelope.end_device_ids.device_id;
    let channel =
        channel::for_device(&device_id).ok_or_else(|| IngestError::UnknownDevice(device_id.clone()))?;

    let received_at = parse_received_at(&envelope.received_at)
        .map_err(IngestError::MalformedTimestamp)?
        .with_timezone(&Utc);

    let values = decoder::decode_values(channel, &envelope.uplink_message.decoded_payload.messages);
    store::insert_reading(&state.db, channel, received_at, &values)
        .await
        .map_err(IngestError::Store)?;

    tracing::info!(device_id = %device_id, channel = channel.slug, "uplink stored");
    Ok(Json(IngestAck {
        message: "Data added successfully".to_string(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ttn/data", post(ttn_webhook))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;
    use std::sync::OnceLock;
    use tower::ServiceExt;

    static STATE: OnceLock<AppState> = OnceLock::new();

    fn state() -> AppState {
        STATE.get_or_init(crate::test_support::test_state).clone()
    }

    fn app() -> Router {
        Router::new()
            .route("/api/ttn/data", post(ttn_webhook))
            .with_state(state())
    }

    async fn post_json(body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let resp = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/ttn/data")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn unknown_device_is_rejected_before_any_write() {
        // The test pool can never connect, so reaching the store would turn
        // this into a 500. A 400 proves the lookup short-circuits first.
        let (status, body) = post_json(json!({
            "end_device_ids": {"device_id": "eui-ffffffffffffffff"},
            "received_at": "2024-06-10T08:00:00Z",
            "uplink_message": {"decoded_payload": {"messages": [
                {"measurementValue": 812.5}
            ]}}
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown device_id: eui-ffffffffffffffff");
    }

    #[tokio::test]
    async fn malformed_timestamp_is_a_server_error() {
        let (status, body) = post_json(json!({
            "end_device_ids": {"device_id": "eui-2cf7f1c04430094f"},
            "received_at": "yesterday-ish",
            "uplink_message": {"decoded_payload": {"messages": [
                {"measurementValue": 812.5}
            ]}}
        }))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .starts_with("Malformed received_at timestamp"));
    }

    #[tokio::test]
    async fn empty_envelope_is_an_unknown_device() {
        let (status, body) = post_json(json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown device_id: ");
    }
}
