use chrono::{Days, Local, NaiveDate};

/// Number of days past today covered by a forecast window.
pub const FORECAST_SPAN_DAYS: u64 = 14;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar window used to parametrize hourly forecast requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Window starting on `start` and ending [`FORECAST_SPAN_DAYS`] later.
    pub fn starting(start: NaiveDate) -> Self {
        // Only overflows at the very end of chrono's supported range.
        let end = start.checked_add_days(Days::new(FORECAST_SPAN_DAYS)).unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Window starting on today's date in the local calendar.
    pub fn today() -> Self {
        Self::starting(Local::now().date_naive())
    }

    pub fn start_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}
