use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One scope-qualified attribute as the platform returns it. The value slot
/// carries whatever the writer stored: a scalar, or a whole JSON document
/// serialized into a string.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub(crate) struct AttributeRecord {
    pub(crate) key: String,
    pub(crate) value: Value,
    #[serde(rename = "lastUpdateTs", default)]
    pub(crate) last_update_ts: Option<i64>,
}

/// One timestamped telemetry sample. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TelemetrySample {
    pub(crate) ts: i64,
    pub(crate) value: Value,
}

/// key -> samples, newest first per the platform's convention.
pub(crate) type SeriesMap = HashMap<String, Vec<TelemetrySample>>;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub(crate) token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChartPoint {
    pub(crate) t: i64,
    pub(crate) y: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChartPayload {
    pub(crate) label: String,
    pub(crate) points: Vec<ChartPoint>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AskRequest {
    #[serde(default)]
    pub(crate) question: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AskResponse {
    pub(crate) response: String,
    pub(crate) data_used: serde_json::Map<String, Value>,
    pub(crate) chart: Option<ChartPayload>,
}
