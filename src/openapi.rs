use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "greenhouse-core-rs",
        description = "Greenhouse sensor ingestion and aggregation API"
    ),
    paths(
        crate::routes::health::healthz_handler,
        crate::routes::uplink::ttn_webhook,
        crate::routes::readings::latest_reading,
        crate::routes::readings::day_readings,
        crate::routes::readings::day_average,
        crate::routes::readings::day_pic_average,
        crate::routes::readings::week_average,
        crate::routes::readings::month_average,
        crate::routes::readings::last_three_days,
        crate::routes::readings::insights,
    ),
    components(schemas(
        crate::routes::health::HealthResponse,
        crate::routes::uplink::IngestAck,
        crate::services::decoder::UplinkEnvelope,
        crate::services::decoder::EndDeviceIds,
        crate::services::decoder::UplinkMessage,
        crate::services::decoder::DecodedPayload,
        crate::services::decoder::PayloadMessage,
        crate::services::trend::TrendReport,
        crate::services::trend::FieldTrend,
        crate::services::trend::TrendDirection,
        crate::services::trend::DailyAverage,
    ))
)]
pub struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or_default()
}

pub(crate) async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}
