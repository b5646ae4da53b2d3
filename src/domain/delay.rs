//! Delay between symptom onset and hospital admission.
//!
//! The value is bounded to the clinically relevant admission window and never
//! fails: malformed or absent dates fall back to zero.

use chrono::{NaiveDate, NaiveDateTime};

use super::record::{FieldValue, RawRecord, DELAY_DAYS, HOSPITAL_VISIT, SYMPTOM_ONSET};

/// Upper bound of the admission window, in days.
pub const MAX_DELAY_DAYS: i64 = 30;

/// Formats tried in order; the first that parses wins.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d", "%Y%m%d"];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a date cell. Unrecognized input yields `None`.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    None
}

fn date_value(value: Option<&FieldValue>) -> Option<NaiveDate> {
    match value? {
        FieldValue::Date(d) => Some(*d),
        FieldValue::Text(s) => parse_date(s),
        _ => None,
    }
}

/// Clamp any day count to `[0, MAX_DELAY_DAYS]`.
#[must_use]
pub fn clamp_delay(days: f64) -> f64 {
    if days.is_nan() {
        return 0.0;
    }
    days.clamp(0.0, MAX_DELAY_DAYS as f64)
}

/// Computes `delay_days` from a pair of optional dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateDeltaComputer;

impl DateDeltaComputer {
    /// Whole days from onset to visit, clamped to the admission window.
    ///
    /// Either date missing gives 0.
    #[must_use]
    pub fn delay_days(&self, onset: Option<NaiveDate>, visit: Option<NaiveDate>) -> i64 {
        match (onset, visit) {
            (Some(onset), Some(visit)) => {
                (visit - onset).num_days().clamp(0, MAX_DELAY_DAYS)
            }
            _ => 0,
        }
    }

    /// Resolve `delay_days` for a record.
    ///
    /// An explicit value wins (clamped); otherwise it is derived from
    /// `sym_on`/`hosp_vis`, where unparseable dates count as missing.
    #[must_use]
    pub fn resolve(&self, record: &RawRecord) -> f64 {
        if let Some(explicit) = record.number(DELAY_DAYS) {
            return clamp_delay(explicit);
        }

        let onset = date_value(record.get(SYMPTOM_ONSET));
        let visit = date_value(record.get(HOSPITAL_VISIT));
        if onset.is_none() && record.get(SYMPTOM_ONSET).is_some() {
            tracing::debug!("Unparseable symptom onset date, treating as missing");
        }
        if visit.is_none() && record.get(HOSPITAL_VISIT).is_some() {
            tracing::debug!("Unparseable hospital visit date, treating as missing");
        }

        self.delay_days(onset, visit) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    #[test]
    fn test_exact_difference_within_window() {
        let c = DateDeltaComputer;
        let onset = d(2020, 1, 1);
        for days in 0..=30 {
            let visit = onset + chrono::Duration::days(days);
            assert_eq!(c.delay_days(Some(onset), Some(visit)), days);
        }
    }

    #[test]
    fn test_visit_before_onset_is_zero() {
        let c = DateDeltaComputer;
        assert_eq!(c.delay_days(Some(d(2020, 2, 10)), Some(d(2020, 2, 1))), 0);
        assert_eq!(c.delay_days(Some(d(2020, 2, 10)), Some(d(2019, 2, 1))), 0);
    }

    #[test]
    fn test_long_delay_is_capped() {
        let c = DateDeltaComputer;
        assert_eq!(c.delay_days(Some(d(2020, 1, 1)), Some(d(2020, 2, 1))), 30);
        assert_eq!(c.delay_days(Some(d(2020, 1, 1)), Some(d(2021, 1, 1))), 30);
    }

    #[test]
    fn test_missing_date_is_zero() {
        let c = DateDeltaComputer;
        assert_eq!(c.delay_days(None, Some(d(2020, 1, 5))), 0);
        assert_eq!(c.delay_days(Some(d(2020, 1, 5)), None), 0);
        assert_eq!(c.delay_days(None, None), 0);
    }

    #[test]
    fn test_explicit_delay_wins_and_is_clamped() {
        let c = DateDeltaComputer;
        let dates = RawRecord::new()
            .with(SYMPTOM_ONSET, "2020-01-01")
            .with(HOSPITAL_VISIT, "2020-01-10");

        assert_eq!(c.resolve(&dates.clone().with(DELAY_DAYS, 4.0)), 4.0);
        assert_eq!(c.resolve(&dates.clone().with(DELAY_DAYS, 45.0)), 30.0);
        assert_eq!(c.resolve(&dates.clone().with(DELAY_DAYS, -2.0)), 0.0);
        assert_eq!(c.resolve(&RawRecord::new().with(DELAY_DAYS, 7.0)), 7.0);
        assert_eq!(c.resolve(&dates), 9.0);
    }

    #[test]
    fn test_csv_dates() {
        let c = DateDeltaComputer;
        let row = RawRecord::from_text_fields(&["sym_on", "hosp_vis"], &["2020-01-01", "2020-01-10"]);
        assert_eq!(c.resolve(&row), 9.0);

        let reversed = RawRecord::from_text_fields(&["sym_on", "hosp_vis"], &["2020-01-10", "2020-01-01"]);
        assert_eq!(c.resolve(&reversed), 0.0);
    }

    #[test]
    fn test_malformed_dates_fall_back_to_zero() {
        let c = DateDeltaComputer;
        let row = RawRecord::new()
            .with(SYMPTOM_ONSET, "not a date")
            .with(HOSPITAL_VISIT, "2020-01-10");
        assert_eq!(c.resolve(&row), 0.0);
        assert_eq!(c.resolve(&RawRecord::new()), 0.0);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2020-01-21"), Some(d(2020, 1, 21)));
        assert_eq!(parse_date("1/21/2020"), Some(d(2020, 1, 21)));
        assert_eq!(parse_date("21.01.2020"), Some(d(2020, 1, 21)));
        assert_eq!(parse_date("2020/01/21"), Some(d(2020, 1, 21)));
        assert_eq!(parse_date("20200121"), Some(d(2020, 1, 21)));
        assert_eq!(parse_date("2020-01-21 08:30:00"), Some(d(2020, 1, 21)));
        assert_eq!(parse_date("2020-02-30"), None);
        assert_eq!(parse_date(""), None);
    }
}
