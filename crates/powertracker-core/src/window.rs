//! Day windows for statistics queries.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, Time, UtcOffset};

/// Millisecond-precision UTC timestamp, e.g. `2024-03-09T00:00:00.000Z`.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

/// Time range `[start, end)` requested for one row of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl DayWindow {
    /// Window for matrix row `index` as seen at `now`.
    ///
    /// The start lies `index + 1` days before today's UTC midnight and the
    /// end is today's UTC midnight, so row `index` spans `index + 1` days.
    pub fn for_row(now: OffsetDateTime, index: usize) -> Self {
        let offset = Duration::days(index as i64 + 1);
        Self {
            start: truncate_to_midnight(now - offset),
            end: truncate_to_midnight(now),
        }
    }

    pub fn start_time(&self) -> String {
        format_timestamp(self.start)
    }

    pub fn end_time(&self) -> String {
        format_timestamp(self.end)
    }
}

/// Midnight UTC of the day containing `dt`.
pub fn truncate_to_midnight(dt: OffsetDateTime) -> OffsetDateTime {
    dt.to_offset(UtcOffset::UTC).replace_time(Time::MIDNIGHT)
}

/// Format `dt` in UTC with millisecond precision.
pub fn format_timestamp(dt: OffsetDateTime) -> String {
    dt.to_offset(UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .expect("static format description covers every OffsetDateTime component")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn test_first_row_is_yesterday_to_today() {
        let now = datetime!(2024-03-10 15:42:07.123 UTC);
        let window = DayWindow::for_row(now, 0);
        assert_eq!(window.start_time(), "2024-03-09T00:00:00.000Z");
        assert_eq!(window.end_time(), "2024-03-10T00:00:00.000Z");
    }

    #[test]
    fn test_later_rows_reach_further_back_with_fixed_end() {
        let now = datetime!(2024-03-10 00:30 UTC);
        let window = DayWindow::for_row(now, 2);
        assert_eq!(window.start_time(), "2024-03-07T00:00:00.000Z");
        assert_eq!(window.end_time(), "2024-03-10T00:00:00.000Z");
    }

    #[test]
    fn test_window_crosses_month_boundary() {
        let now = datetime!(2024-03-01 08:00 UTC);
        let window = DayWindow::for_row(now, 0);
        assert_eq!(window.start_time(), "2024-02-29T00:00:00.000Z");
    }

    #[test]
    fn test_non_utc_input_is_normalized() {
        // 01:30 at +02:00 is still the previous day in UTC.
        let now = datetime!(2024-03-10 01:30 +02:00);
        assert_eq!(
            truncate_to_midnight(now),
            datetime!(2024-03-09 00:00 UTC)
        );
        assert_eq!(truncate_to_midnight(now).offset(), offset!(UTC));
    }

    #[test]
    fn test_format_timestamp_keeps_milliseconds() {
        let dt = datetime!(2024-03-10 15:42:07.123456 UTC);
        assert_eq!(format_timestamp(dt), "2024-03-10T15:42:07.123Z");
    }
}
