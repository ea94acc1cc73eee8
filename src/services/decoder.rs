use crate::channel::{ChannelDef, DecodeMode};
use serde::Deserialize;
use serde_json::Value;

/// The subset of the TTN uplink webhook envelope this service reads.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UplinkEnvelope {
    #[serde(default)]
    pub end_device_ids: EndDeviceIds,
    #[serde(default)]
    pub received_at: String,
    #[serde(default)]
    pub uplink_message: UplinkMessage,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct EndDeviceIds {
    #[serde(default)]
    pub device_id: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UplinkMessage {
    #[serde(default)]
    pub decoded_payload: DecodedPayload,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct DecodedPayload {
    #[serde(default)]
    pub messages: Vec<PayloadMessage>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PayloadMessage {
    #[serde(rename = "measurementId", default)]
    pub measurement_id: Option<i64>,
    /// Numbers and numeric strings are both accepted.
    #[serde(rename = "measurementValue", default)]
    #[schema(value_type = Option<Object>)]
    pub measurement_value: Option<Value>,
}

/// Maps payload entries onto the channel's fields. Missing, empty, or
/// non-numeric entries decode to `None`; they are stored as NULL rather than
/// failing the whole uplink.
pub fn decode_values(channel: &ChannelDef, messages: &[PayloadMessage]) -> Vec<Option<f64>> {
    let mut values = vec![None; channel.fields.len()];
    match channel.decode {
        DecodeMode::Positional { order } => {
            for (position, field_index) in order.iter().enumerate() {
                if let Some(message) = messages.get(position) {
                    values[*field_index] = numeric_value(message.measurement_value.as_ref());
                }
            }
        }
        DecodeMode::Keyed { ids } => {
            for message in messages {
                let Some(id) = message.measurement_id else {
                    continue;
                };
                if let Some((_, field_index)) = ids.iter().find(|(candidate, _)| *candidate == id) {
                    values[*field_index] = numeric_value(message.measurement_value.as_ref());
                }
            }
        }
    }
    values
}

/// Gateways report values as JSON numbers or as numeric strings, and flag
/// missing probes with `""`.
fn numeric_value(raw: Option<&Value>) -> Option<f64> {
    match raw {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}
