use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, Duration, Utc};
use serde_json::{json, Map, Value};

use crate::channel::{ChannelDef, ChannelKind};
use crate::error::map_db_error;
use crate::services::aggregate;
use crate::services::trend;
use crate::state::AppState;
use crate::store::{self, Reading};
use crate::time::local_day_window;

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct OffsetQuery {
    /// Signed period offset relative to the current one (weeks for /week,
    /// 30-day periods for /month).
    #[serde(default)]
    offset: i64,
}

fn channel_or_404(slug: &str) -> Result<&'static ChannelDef, (StatusCode, String)> {
    crate::channel::by_slug(slug)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown channel: {slug}")))
}

/// Integral floats serialize as JSON integers, matching how the listings
/// historically rendered whole-number sensor values.
fn json_number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

fn reading_json(channel: &ChannelDef, reading: &Reading, include_id: bool) -> Value {
    let mut map = Map::new();
    if include_id {
        if let Some(id) = reading.id {
            map.insert("id".to_string(), json!(id));
        }
    }
    map.insert(
        "datetime".to_string(),
        json!(reading.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
    );
    for (field, value) in channel.fields.iter().zip(&reading.values) {
        let rendered = value.map(json_number).unwrap_or(Value::Null);
        map.insert(field.key.to_string(), rendered);
    }
    Value::Object(map)
}

fn averages_json(channel: &ChannelDef, averages: &[f64]) -> Map<String, Value> {
    channel
        .fields
        .iter()
        .zip(averages)
        .map(|(field, average)| (format!("average_{}", field.key), json!(average)))
        .collect()
}

/// Pic-average keys carry the field label as a suffix; the single-field
/// light channels use the bare key.
fn peak_key(prefix: &str, label: &str) -> String {
    if label.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}_{label}")
    }
}

#[utoipa::path(
    get,
    path = "/api/sensors/{channel}/latest",
    tag = "readings",
    params(("channel" = String, Path, description = "Channel slug")),
    responses(
        (status = 200, description = "Most recent reading"),
        (status = 404, description = "Unknown channel or no data")
    )
)]
pub(crate) async fn latest_reading(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let channel = channel_or_404(&slug)?;
    let reading = store::fetch_latest(&state.db, channel, state.config.display_timezone)
        .await
        .map_err(map_db_error)?;
    Ok(latest_response(channel, reading))
}

/// An empty channel is a 404 with an explanatory body, never a default
/// reading.
fn latest_response(channel: &ChannelDef, reading: Option<Reading>) -> Response {
    match reading {
        Some(reading) => Json(reading_json(channel, &reading, false)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No data available" })),
        )
            .into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/sensors/{channel}/day",
    tag = "readings",
    params(("channel" = String, Path, description = "Channel slug")),
    responses((status = 200, description = "Raw readings of the current local day"))
)]
pub(crate) async fn day_readings(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let channel = channel_or_404(&slug)?;
    let tz = state.config.display_timezone;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let (start, end) = local_day_window(tz, today, 1);

    let readings = store::fetch_range(&state.db, channel, start, end, tz)
        .await
        .map_err(map_db_error)?;
    let rows: Vec<Value> = readings
        .iter()
        .map(|reading| reading_json(channel, reading, true))
        .collect();
    Ok(Json(json!(rows)))
}

#[utoipa::path(
    get,
    path = "/api/sensors/{channel}/day/average",
    tag = "readings",
    params(("channel" = String, Path, description = "Channel slug")),
    responses((status = 200, description = "Hour-of-day averages for the current local day"))
)]
pub(crate) async fn day_average(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let channel = channel_or_404(&slug)?;
    let tz = state.config.display_timezone;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let (start, end) = local_day_window(tz, today, 1);

    let readings = store::fetch_range(&state.db, channel, start, end, tz)
        .await
        .map_err(map_db_error)?;
    let rows: Vec<Value> = aggregate::hourly_averages(&readings, channel.fields.len())
        .into_iter()
        .map(|bucket| {
            let mut map = Map::new();
            map.insert("hour".to_string(), json!(bucket.hour));
            map.extend(averages_json(channel, &bucket.averages));
            Value::Object(map)
        })
        .collect();
    Ok(Json(json!(rows)))
}

#[utoipa::path(
    get,
    path = "/api/sensors/{channel}/day/pic-average",
    tag = "readings",
    params(("channel" = String, Path, description = "Channel slug")),
    responses((status = 200, description = "Day/night maxima and their midpoint"))
)]
pub(crate) async fn day_pic_average(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let channel = channel_or_404(&slug)?;
    let tz = state.config.display_timezone;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let (start, end) = local_day_window(tz, today, 1);

    let readings = store::fetch_range(&state.db, channel, start, end, tz)
        .await
        .map_err(map_db_error)?;
    let summary = aggregate::peak_averages(&readings, channel.fields.len());

    let mut map = Map::new();
    for (index, field) in channel.fields.iter().enumerate() {
        map.insert(peak_key("max_day", field.label), json!(summary.max_day[index]));
        map.insert(
            peak_key("max_night", field.label),
            json!(summary.max_night[index]),
        );
        map.insert(
            peak_key("pic_average", field.label),
            json!(summary.pic_average[index]),
        );
    }
    Ok(Json(Value::Object(map)))
}

#[utoipa::path(
    get,
    path = "/api/sensors/{channel}/week",
    tag = "readings",
    params(
        ("channel" = String, Path, description = "Channel slug"),
        OffsetQuery
    ),
    responses((status = 200, description = "Daily averages for a Monday-to-Sunday week"))
)]
pub(crate) async fn week_average(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<OffsetQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let channel = channel_or_404(&slug)?;
    let tz = state.config.display_timezone;
    let reference = Utc::now().with_timezone(&tz).date_naive() + Duration::days(query.offset * 7);
    let monday = reference - Duration::days(reference.weekday().num_days_from_monday() as i64);
    let (start, end) = local_day_window(tz, monday, 7);

    let readings = store::fetch_range(&state.db, channel, start, end, tz)
        .await
        .map_err(map_db_error)?;
    let rows: Vec<Value> = aggregate::weekly_averages(&readings, monday, channel.fields.len())
        .into_iter()
        .map(|bucket| {
            let mut map = Map::new();
            map.insert(
                "date".to_string(),
                json!(bucket.date.format("%Y-%m-%d").to_string()),
            );
            map.extend(averages_json(channel, &bucket.averages));
            Value::Object(map)
        })
        .collect();
    Ok(Json(json!(rows)))
}

#[utoipa::path(
    get,
    path = "/api/sensors/{channel}/month",
    tag = "readings",
    params(
        ("channel" = String, Path, description = "Channel slug"),
        OffsetQuery
    ),
    responses((status = 200, description = "Four-hour interval averages over a trailing 30-day period"))
)]
pub(crate) async fn month_average(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<OffsetQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let channel = channel_or_404(&slug)?;
    let tz = state.config.display_timezone;
    let end = Utc::now() + Duration::days(query.offset * 30);
    let start = end - Duration::days(30);

    let readings = store::fetch_range(&state.db, channel, start, end, tz)
        .await
        .map_err(map_db_error)?;
    let rows: Vec<Value> = aggregate::monthly_part_averages(&readings, channel.fields.len())
        .into_iter()
        .map(|bucket| {
            let mut map = Map::new();
            map.insert(
                "date".to_string(),
                json!(bucket.start.format("%Y-%m-%d %H:%M:%S").to_string()),
            );
            map.extend(averages_json(channel, &bucket.averages));
            Value::Object(map)
        })
        .collect();
    Ok(Json(json!(rows)))
}

#[utoipa::path(
    get,
    path = "/api/sensors/{channel}/last_3_days",
    tag = "readings",
    params(("channel" = String, Path, description = "Channel slug")),
    responses((status = 200, description = "Raw readings of the trailing 3 days, ascending"))
)]
pub(crate) async fn last_three_days(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let channel = channel_or_404(&slug)?;
    let readings = fetch_trailing_days(&state, channel, 3)
        .await
        .map_err(map_db_error)?;
    let rows: Vec<Value> = readings
        .iter()
        .map(|reading| reading_json(channel, reading, false))
        .collect();
    Ok(Json(json!(rows)))
}

#[utoipa::path(
    get,
    path = "/api/sensors/{channel}/insights",
    tag = "readings",
    params(("channel" = String, Path, description = "Channel slug")),
    responses(
        (status = 200, description = "3-day trend report with rendered summary"),
        (status = 404, description = "Unknown channel or not an environment channel")
    )
)]
pub(crate) async fn insights(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let channel = channel_or_404(&slug)?;
    if channel.kind != ChannelKind::Environment {
        return Err((
            StatusCode::NOT_FOUND,
            format!("No insights for channel: {slug}"),
        ));
    }

    let readings = fetch_trailing_days(&state, channel, 3)
        .await
        .map_err(map_db_error)?;
    let report = trend::analyze(&readings);
    let summary = state.summarizer.summarize(&report);

    Ok(Json(json!({
        "summary": summary,
        "trends": report,
    })))
}

async fn fetch_trailing_days(
    state: &AppState,
    channel: &ChannelDef,
    days: i64,
) -> Result<Vec<Reading>, sqlx::Error> {
    let end = Utc::now();
    let start = end - Duration::days(days);
    store::fetch_range(&state.db, channel, start, end, state.config.display_timezone).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sensors/{channel}/latest", get(latest_reading))
        .route("/sensors/{channel}/day", get(day_readings))
        .route("/sensors/{channel}/day/average", get(day_average))
        .route("/sensors/{channel}/day/pic-average", get(day_pic_average))
        .route("/sensors/{channel}/week", get(week_average))
        .route("/sensors/{channel}/month", get(month_average))
        .route("/sensors/{channel}/last_3_days", get(last_three_days))
        .route("/sensors/{channel}/insights", get(insights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ENV_INT, LIGHT_EXT, SOIL_1};
    use axum::body::Body;
    use axum::http::Request;
    use chrono::TimeZone;
    use chrono_tz::Europe::Dublin;
    use std::sync::OnceLock;
    use tower::ServiceExt;

    static STATE: OnceLock<AppState> = OnceLock::new();

    fn state() -> AppState {
        STATE.get_or_init(crate::test_support::test_state).clone()
    }

    fn app() -> Router {
        router().with_state(state())
    }

    async fn get_status(uri: &str) -> StatusCode {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
            .status()
    }

    #[tokio::test]
    async fn unknown_channel_is_404_on_every_endpoint() {
        for endpoint in [
            "latest", "day", "day/average", "day/pic-average", "week", "month", "last_3_days",
            "insights",
        ] {
            let status = get_status(&format!("/sensors/sensor_bogus/{endpoint}")).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "endpoint {endpoint}");
        }
    }

    #[tokio::test]
    async fn insights_on_non_environment_channel_is_404() {
        // Resolving the channel and rejecting its kind happens before any
        // database access, so the never-connected pool cannot interfere.
        assert_eq!(
            get_status("/sensors/sensor_light_ext/insights").await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status("/sensors/sensor_smtempec_2/insights").await,
            StatusCode::NOT_FOUND
        );
    }

    fn reading(hour: u32, values: &[Option<f64>]) -> Reading {
        Reading {
            id: Some(7),
            timestamp: Dublin
                .with_ymd_and_hms(2024, 6, 10, hour, 30, 0)
                .single()
                .expect("unambiguous local time"),
            values: values.to_vec(),
        }
    }

    #[test]
    fn reading_json_renders_integral_values_as_integers() {
        let rendered = reading_json(&ENV_INT, &reading(8, &[Some(600.0), Some(21.5), None]), true);
        assert_eq!(rendered["id"], 7);
        assert_eq!(rendered["datetime"], "2024-06-10 08:30:00");
        assert_eq!(rendered["valueCO2"], 600);
        assert_eq!(rendered["valueTemp"], 21.5);
        assert!(rendered["valueHum"].is_null());
    }

    #[tokio::test]
    async fn latest_on_empty_channel_is_404_not_a_default_record() {
        let resp = latest_response(&ENV_INT, None);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body, json!({ "message": "No data available" }));
    }

    #[tokio::test]
    async fn latest_with_a_reading_serializes_it() {
        let resp = latest_response(&ENV_INT, Some(reading(8, &[Some(600.0), Some(21.5), None])));
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["valueCO2"], 600);
        assert!(body.get("id").is_none());
    }

    #[test]
    fn latest_serialization_omits_the_row_id() {
        let rendered = reading_json(&SOIL_1, &reading(8, &[Some(41.0), Some(19.0), Some(0.8)]), false);
        assert!(rendered.get("id").is_none());
        assert_eq!(rendered["valueSM"], 41);
    }

    #[test]
    fn light_peak_keys_are_unsuffixed() {
        assert_eq!(peak_key("max_day", LIGHT_EXT.fields[0].label), "max_day");
        assert_eq!(peak_key("pic_average", ENV_INT.fields[0].label), "pic_average_CO2");
        assert_eq!(peak_key("max_night", SOIL_1.fields[2].label), "max_night_EC");
    }

    #[test]
    fn average_keys_follow_field_keys() {
        let map = averages_json(&ENV_INT, &[612.0, 21.4, 55.0]);
        assert_eq!(map["average_valueCO2"], 612.0);
        assert_eq!(map["average_valueTemp"], 21.4);
        assert_eq!(map["average_valueHum"], 55.0);
    }
}
