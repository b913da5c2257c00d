use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::{
    Coordinates, WeatherSnapshot,
    model::HourlyPoint,
    surface::{Element, HourlyRow, RowCondition, Surface},
};

/// `Oct 18, 03:00 PM`
const HOUR_FORMAT: &str = "%b %-d, %I:%M %p";

pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.1}°C")
}

pub fn format_hour<Tz>(time: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.with_timezone(tz).format(HOUR_FORMAT).to_string()
}

fn hourly_row<Tz>(point: &HourlyPoint, tz: &Tz) -> HourlyRow
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    HourlyRow {
        time: format_hour(point.time, tz),
        temperature: format_temperature(point.temperature_c),
        condition: point
            .condition
            .as_ref()
            .map(|c| RowCondition { text: c.text.clone(), icon_url: c.icon.clone() }),
    }
}

/// Write a snapshot onto `surface`, replacing whatever the previous lookup rendered.
///
/// Timestamps are shown in `tz`. The results panel is made visible last.
pub fn render<S, Tz>(surface: &S, snapshot: &WeatherSnapshot, coords: &Coordinates, tz: &Tz)
where
    S: Surface + ?Sized,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    surface.set_text(Element::Coordinates, &coords.to_string());
    surface.set_text(Element::CurrentTemp, &format_temperature(snapshot.current_temp_c));

    match &snapshot.location {
        Some(location) => {
            surface.set_text(Element::Location, &location.label());
            surface.set_visible(Element::Location, true);
        }
        None => {
            surface.set_text(Element::Location, "");
            surface.set_visible(Element::Location, false);
        }
    }

    surface.clear_rows();
    for point in snapshot.upcoming_hours() {
        surface.append_row(hourly_row(point, tz));
    }

    surface.set_visible(Element::Results, true);
}
