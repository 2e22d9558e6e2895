//! Hourly statistics collection and aggregation.
//!
//! The collector runs one request/response exchange per trailing day and
//! assembles a [`ResultsMatrix`] of hourly energy changes. Row 0 is the most
//! recent complete day; higher rows reach further into the past.

use time::OffsetDateTime;
use tracing::debug;

use crate::error::{Error, Result};
use crate::messages::{ClientMessage, ServerMessage, StatisticsRequest};
use crate::session::Session;
use crate::window::DayWindow;

/// Number of hourly buckets in a day.
pub const HOURS_PER_DAY: usize = 24;

/// Hourly energy change for one day, indexed by UTC hour.
pub type HourlyRow = [f64; HOURS_PER_DAY];

/// Column labels `"0"` through `"23"`.
pub fn hour_headers() -> Vec<String> {
    (0..HOURS_PER_DAY).map(|h| h.to_string()).collect()
}

/// Day × hour grid of energy-change values.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsMatrix {
    rows: Vec<HourlyRow>,
    configured_days: u32,
}

impl ResultsMatrix {
    pub fn new(rows: Vec<HourlyRow>, configured_days: u32) -> Self {
        Self {
            rows,
            configured_days,
        }
    }

    pub fn rows(&self) -> &[HourlyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The day count the collection was configured with.
    pub fn configured_days(&self) -> u32 {
        self.configured_days
    }

    /// Mean of each hour column.
    ///
    /// The divisor is the configured day count, not the number of rows.
    pub fn averages(&self) -> HourlyRow {
        let mut averages = [0.0; HOURS_PER_DAY];
        if self.configured_days == 0 {
            return averages;
        }
        for row in &self.rows {
            for (sum, value) in averages.iter_mut().zip(row) {
                *sum += value;
            }
        }
        let divisor = f64::from(self.configured_days);
        for avg in &mut averages {
            *avg /= divisor;
        }
        averages
    }
}

/// Drives the per-day statistics exchanges over an authenticated session.
pub struct StatisticsCollector<'a> {
    session: &'a mut Session,
    sensor_id: String,
    days: u32,
}

impl<'a> StatisticsCollector<'a> {
    pub fn new(session: &'a mut Session, sensor_id: impl Into<String>, days: u32) -> Self {
        Self {
            session,
            sensor_id: sensor_id.into(),
            days,
        }
    }

    /// Collect all rows relative to the current time.
    pub async fn collect(self) -> Result<ResultsMatrix> {
        self.collect_at(OffsetDateTime::now_utc()).await
    }

    /// Collect all rows relative to `now`.
    ///
    /// Any failure discards the rows gathered so far.
    pub async fn collect_at(self, now: OffsetDateTime) -> Result<ResultsMatrix> {
        let Self {
            session,
            sensor_id,
            days,
        } = self;

        if sensor_id.trim().is_empty() {
            return Err(Error::invalid_config("sensor_id is required"));
        }
        if days == 0 {
            return Err(Error::invalid_config("days must be at least 1"));
        }

        let mut rows = Vec::with_capacity(days as usize);
        for index in 0..days as usize {
            let id = session.next_id();
            let window = DayWindow::for_row(now, index);
            debug!(
                row = index,
                id,
                start = %window.start_time(),
                end = %window.end_time(),
                "requesting statistics"
            );

            let request = StatisticsRequest::hourly_change(id, &window, &sensor_id);
            session
                .send(&ClientMessage::StatisticsDuringPeriod(request))
                .await?;
            let message = session.recv().await?;
            rows.push(extract_row(message, id, &sensor_id)?);
        }

        Ok(ResultsMatrix::new(rows, days))
    }
}

/// Convenience wrapper over [`StatisticsCollector`].
pub async fn collect(session: &mut Session, days: u32, sensor_id: &str) -> Result<ResultsMatrix> {
    StatisticsCollector::new(session, sensor_id, days)
        .collect()
        .await
}

/// Turn one statistics reply into a row of 24 hourly changes.
fn extract_row(message: ServerMessage, id: u64, sensor_id: &str) -> Result<HourlyRow> {
    let response = match message {
        ServerMessage::Result(response) => response,
        other => {
            return Err(Error::UnexpectedMessage {
                expected: "result",
                actual: other.kind().to_string(),
            });
        }
    };

    if response.id != id {
        return Err(Error::IdMismatch {
            expected: id,
            actual: response.id,
        });
    }

    if !response.success {
        let error = response.error.unwrap_or_default();
        return Err(Error::Upstream {
            code: error.code,
            message: error.message,
        });
    }

    let buckets = response.buckets(sensor_id);
    if buckets.is_empty() {
        return Err(Error::NoStatistics {
            sensor_id: sensor_id.to_string(),
        });
    }
    if buckets.len() < HOURS_PER_DAY {
        return Err(Error::InsufficientBuckets {
            sensor_id: sensor_id.to_string(),
            expected: HOURS_PER_DAY,
            actual: buckets.len(),
        });
    }
    debug!(buckets = buckets.len(), "statistics received");

    let mut row = [0.0; HOURS_PER_DAY];
    for (value, bucket) in row.iter_mut().zip(buckets) {
        *value = bucket.change_or_zero();
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::messages::{ApiError, Bucket, StatisticsResponse};

    const SENSOR: &str = "sensor.grid_import";

    fn response(id: u64, changes: &[f64]) -> ServerMessage {
        let buckets = changes
            .iter()
            .map(|&c| Bucket {
                change: Some(c),
                ..Default::default()
            })
            .collect();
        ServerMessage::Result(StatisticsResponse {
            id,
            success: true,
            result: Some(HashMap::from([(SENSOR.to_string(), buckets)])),
            error: None,
        })
    }

    #[test]
    fn test_hour_headers() {
        let headers = hour_headers();
        assert_eq!(headers.len(), HOURS_PER_DAY);
        assert_eq!(headers[0], "0");
        assert_eq!(headers[23], "23");
    }

    #[test]
    fn test_averages_divide_by_configured_days() {
        let matrix = ResultsMatrix::new(vec![[1.0; HOURS_PER_DAY], [1.0; HOURS_PER_DAY]], 2);
        assert_eq!(matrix.averages(), [1.0; HOURS_PER_DAY]);

        // One collected row but four configured days.
        let matrix = ResultsMatrix::new(vec![[2.0; HOURS_PER_DAY]], 4);
        assert_eq!(matrix.averages(), [0.5; HOURS_PER_DAY]);
    }

    #[test]
    fn test_averages_per_column() {
        let mut first = [0.0; HOURS_PER_DAY];
        let mut second = [0.0; HOURS_PER_DAY];
        for h in 0..HOURS_PER_DAY {
            first[h] = h as f64;
            second[h] = 3.0 * h as f64;
        }
        let averages = ResultsMatrix::new(vec![first, second], 2).averages();
        for (h, avg) in averages.iter().enumerate() {
            assert!((avg - 2.0 * h as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_averages_with_zero_days() {
        let matrix = ResultsMatrix::new(Vec::new(), 0);
        assert!(matrix.is_empty());
        assert_eq!(matrix.averages(), [0.0; HOURS_PER_DAY]);
    }

    #[test]
    fn test_extract_row_takes_first_day_of_longer_window() {
        let changes: Vec<f64> = (0..48).map(|i| i as f64).collect();
        let row = extract_row(response(3, &changes), 3, SENSOR).unwrap();
        assert_eq!(row[0], 0.0);
        assert_eq!(row[23], 23.0);
    }

    #[test]
    fn test_extract_row_rejects_short_day() {
        let err = extract_row(response(2, &[1.0; 23]), 2, SENSOR).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientBuckets {
                expected: 24,
                actual: 23,
                ..
            }
        ));
    }

    #[test]
    fn test_extract_row_empty_names_sensor() {
        let err = extract_row(response(2, &[]), 2, SENSOR).unwrap_err();
        assert!(matches!(err, Error::NoStatistics { .. }));
        assert!(err.to_string().contains(SENSOR));
    }

    #[test]
    fn test_extract_row_upstream_failure() {
        let message = ServerMessage::Result(StatisticsResponse {
            id: 2,
            success: false,
            result: None,
            error: Some(ApiError {
                code: "invalid_format".to_string(),
                message: "bad statistic_ids".to_string(),
            }),
        });
        let err = extract_row(message, 2, SENSOR).unwrap_err();
        assert!(matches!(err, Error::Upstream { ref code, .. } if code == "invalid_format"));
    }

    #[test]
    fn test_extract_row_id_mismatch() {
        let err = extract_row(response(5, &[1.0; 24]), 2, SENSOR).unwrap_err();
        assert!(matches!(
            err,
            Error::IdMismatch {
                expected: 2,
                actual: 5
            }
        ));
    }

    #[test]
    fn test_extract_row_unexpected_message() {
        let message = ServerMessage::AuthOk { ha_version: None };
        let err = extract_row(message, 2, SENSOR).unwrap_err();
        assert!(matches!(err, Error::UnexpectedMessage { expected: "result", .. }));
    }
}
