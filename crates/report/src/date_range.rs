//! Inclusive calendar-day ranges over UTC timestamps.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Inclusive range of calendar days, `start_date <= end_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if start_date > end_date {
            return Err(ReportError::InvalidDateRange(
                "Start date must not be after end date".to_string(),
            ));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Midnight at the start of `start_date`.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start_date.and_time(NaiveTime::MIN).and_utc()
    }

    /// 23:59:59 on `end_date`.
    pub fn end_instant(&self) -> DateTime<Utc> {
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        self.end_date.and_time(last_second).and_utc()
    }
}

/// Validates report ranges and tests timestamps against them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRangeFilter;

impl DateRangeFilter {
    /// Builds a range from optional bounds, as they arrive from a query.
    pub fn validate_and_create(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<DateRange> {
        match (start_date, end_date) {
            (Some(start), Some(end)) => DateRange::new(start, end),
            _ => Err(ReportError::InvalidDateRange(
                "Start date and end date must not be null".to_string(),
            )),
        }
    }

    /// True if `timestamp` falls within `[start 00:00:00, end 23:59:59]`.
    pub fn is_within_range(&self, timestamp: DateTime<Utc>, range: &DateRange) -> bool {
        timestamp >= range.start_instant() && timestamp <= range.end_instant()
    }
}
