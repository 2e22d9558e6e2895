//! Websocket message types.
//!
//! Messages are JSON objects discriminated by their `type` field. Outbound
//! messages are [`ClientMessage`]; everything the server sends decodes into
//! [`ServerMessage`], so an unknown or missing `type` is rejected at decode
//! time rather than deep inside the exchange.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::window::DayWindow;

/// Path of the websocket API on a Home Assistant server.
pub const WEBSOCKET_PATH: &str = "/api/websocket";

/// Messages sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Authentication with a long-lived access token.
    #[serde(rename = "auth")]
    Auth { access_token: String },

    /// Recorder statistics query.
    #[serde(rename = "recorder/statistics_during_period")]
    StatisticsDuringPeriod(StatisticsRequest),
}

impl ClientMessage {
    /// The `type` tag this message serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::StatisticsDuringPeriod(_) => "recorder/statistics_during_period",
        }
    }
}

/// Statistics aggregation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Hour,
}

/// Statistic metric to return per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticType {
    Change,
}

/// Unit conversion requested from the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Units {
    pub energy: String,
}

/// Body of a `recorder/statistics_during_period` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRequest {
    pub id: u64,
    pub start_time: String,
    pub end_time: String,
    pub statistic_ids: Vec<String>,
    pub period: Period,
    pub types: Vec<StatisticType>,
    pub units: Units,
}

impl StatisticsRequest {
    /// Hourly energy change in kWh for one sensor over `window`.
    pub fn hourly_change(id: u64, window: &DayWindow, sensor_id: &str) -> Self {
        Self {
            id,
            start_time: window.start_time(),
            end_time: window.end_time(),
            statistic_ids: vec![sensor_id.to_string()],
            period: Period::Hour,
            types: vec![StatisticType::Change],
            units: Units {
                energy: "kWh".to_string(),
            },
        }
    }
}

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Greeting sent as soon as the socket opens.
    AuthRequired {
        #[serde(default)]
        ha_version: Option<String>,
    },

    /// The access token was accepted.
    AuthOk {
        #[serde(default)]
        ha_version: Option<String>,
    },

    /// The access token was rejected.
    AuthInvalid {
        #[serde(default)]
        message: Option<String>,
    },

    /// Reply to a command carrying an `id`.
    Result(StatisticsResponse),
}

impl ServerMessage {
    /// The `type` tag this message was decoded from.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthRequired { .. } => "auth_required",
            Self::AuthOk { .. } => "auth_ok",
            Self::AuthInvalid { .. } => "auth_invalid",
            Self::Result(_) => "result",
        }
    }
}

/// Reply to a statistics request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatisticsResponse {
    pub id: u64,
    pub success: bool,
    /// Buckets keyed by statistic id.
    #[serde(default)]
    pub result: Option<HashMap<String, Vec<Bucket>>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl StatisticsResponse {
    /// Buckets returned for `sensor_id`, empty when the sensor is absent.
    pub fn buckets(&self, sensor_id: &str) -> &[Bucket] {
        self.result
            .as_ref()
            .and_then(|r| r.get(sensor_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// One hour of aggregated statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Bucket {
    /// Energy change during the hour; `null` reads as zero.
    #[serde(default)]
    pub change: Option<f64>,
    /// Bucket start, epoch milliseconds.
    #[serde(default)]
    pub start: Option<f64>,
    /// Bucket end, epoch milliseconds.
    #[serde(default)]
    pub end: Option<f64>,
}

impl Bucket {
    pub fn change_or_zero(&self) -> f64 {
        self.change.unwrap_or(0.0)
    }
}

/// Error detail attached to an unsuccessful result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
