use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderId;

/// Upper bound on hourly rows shown for a single lookup.
pub const HOURLY_ROW_LIMIT: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
}

impl Location {
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    /// Absolute URL of the provider's icon image.
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition: Option<Condition>,
}

/// Which part of the hourly series is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HourlyWindow {
    /// The series already starts at the current hour; take it from the front.
    Leading,
    /// Skip entries before the given instant.
    AtOrAfter(DateTime<Utc>),
}

/// Everything a single successful lookup produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub provider: ProviderId,
    pub location: Option<Location>,
    pub current_temp_c: f64,
    pub hourly: Vec<HourlyPoint>,
    pub window: HourlyWindow,
}

impl WeatherSnapshot {
    /// Hourly points to display, in source order, capped at [`HOURLY_ROW_LIMIT`].
    pub fn upcoming_hours(&self) -> impl Iterator<Item = &HourlyPoint> {
        let window = self.window;
        self.hourly
            .iter()
            .filter(move |point| match window {
                HourlyWindow::Leading => true,
                HourlyWindow::AtOrAfter(now) => point.time >= now,
            })
            .take(HOURLY_ROW_LIMIT)
    }
}
