//! Date, time and weekday helpers
//!
//! Dates travel as `YYYY-MM-DD`, times of day as `HH:MM:SS` (input also
//! accepts `HH:MM`), weekdays as their English names.

use chrono::{NaiveDate, NaiveTime, Weekday};

use crate::error::{AppError, AppResult, ErrorCode};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Inclusive calendar date range with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::new(ErrorCode::InvalidDateRange)
                .with_detail("start_date", format_date(start))
                .with_detail("end_date", format_date(end)));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every calendar day in the range, both ends included
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Number of calendar days, both ends included
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

pub fn parse_date(value: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("{field} must be a date in YYYY-MM-DD format"),
        )
        .with_detail("field", field)
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_time(value: &str, field: &str) -> AppResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| {
            AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("{field} must be a time in HH:MM:SS format"),
            )
            .with_detail("field", field)
        })
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// English weekday name (`Monday` .. `Sunday`)
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse a weekday name, full or abbreviated, case-insensitive
pub fn parse_weekday(value: &str) -> AppResult<Weekday> {
    value.trim().parse::<Weekday>().map_err(|_| {
        AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("invalid weekday: {}", value.trim()),
        )
    })
}

/// ISO weekday number, Monday = 1 .. Sunday = 7
pub fn weekday_to_iso(day: Weekday) -> i16 {
    day.number_from_monday() as i16
}

pub fn weekday_from_iso(n: i16) -> Option<Weekday> {
    if !(1..=7).contains(&n) {
        return None;
    }
    Weekday::try_from((n - 1) as u8).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_date_range_rejects_reversed() {
        let err = DateRange::new(d("2023-12-26"), d("2023-12-25")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateRange);
        assert_eq!(err.message, "start date must be before or equal to end date");
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(d("2023-12-25"), d("2023-12-25")).unwrap();
        assert_eq!(range.len_days(), 1);
        assert_eq!(range.days().collect::<Vec<_>>(), vec![d("2023-12-25")]);
    }

    #[test]
    fn test_days_crosses_month_boundary() {
        let range = DateRange::new(d("2024-01-30"), d("2024-02-02")).unwrap();
        let days: Vec<_> = range.days().map(format_date).collect();
        assert_eq!(
            days,
            vec!["2024-01-30", "2024-01-31", "2024-02-01", "2024-02-02"]
        );
        assert_eq!(range.len_days(), 4);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2023-12-25", "start_date").unwrap(), d("2023-12-25"));
        let err = parse_date("25/12/2023", "start_date").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_parse_time_accepts_short_form() {
        let t = parse_time("08:30", "check_in_start").unwrap();
        assert_eq!(format_time(t), "08:30:00");
        let t = parse_time("17:05:09", "check_out_end").unwrap();
        assert_eq!(format_time(t), "17:05:09");
        assert!(parse_time("25:00", "x").is_err());
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(parse_weekday("monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("Fri").unwrap(), Weekday::Fri);
        assert!(parse_weekday("Funday").is_err());
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
    }

    #[test]
    fn test_iso_numbers() {
        assert_eq!(weekday_to_iso(Weekday::Mon), 1);
        assert_eq!(weekday_to_iso(Weekday::Sun), 7);
        assert_eq!(weekday_from_iso(6), Some(Weekday::Sat));
        assert_eq!(weekday_from_iso(0), None);
        assert_eq!(weekday_from_iso(8), None);
    }
}
