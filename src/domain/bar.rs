//! OHLCV bar representation.
//!
//! Bars may be daily or intraday. The `date` field is the calendar-day key
//! used by day-rollover logic; sequences fed to the engine must be ascending
//! by `datetime`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub symbol: String,
    pub datetime: NaiveDateTime,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    /// Build a bar from a timestamp, deriving the calendar-day and time keys.
    pub fn from_datetime(
        symbol: String,
        datetime: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Self {
        Bar {
            symbol,
            date: datetime.date(),
            time: datetime.time(),
            datetime,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn from_datetime_derives_date_and_time() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let bar = Bar::from_datetime("SOFI".into(), dt, 10.0, 10.5, 9.8, 10.2, 50_000);

        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(bar.time.to_string(), "14:30:00");
        assert_eq!(bar.datetime, dt);
        assert_eq!(bar.symbol, "SOFI");
        assert!((bar.close - 10.2).abs() < f64::EPSILON);
        assert_eq!(bar.volume, 50_000);
    }

    #[test]
    fn midnight_bar_is_a_daily_bar() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bar = Bar::from_datetime("SOFI".into(), dt, 10.0, 10.5, 9.8, 10.2, 0);
        assert_eq!(bar.time, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }
}
