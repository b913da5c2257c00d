use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use crate::{
    Coordinates,
    error::{FetchError, FetchStage},
    model::{Condition, HourlyPoint, HourlyWindow, Location, WeatherSnapshot},
    provider::{ProviderId, get_json},
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";
const FORECAST_DAYS: &str = "2";

/// WeatherAPI.com: current conditions followed by a two-day hourly forecast.
#[derive(Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

// Keeps the key out of debug logs.
impl std::fmt::Debug for WeatherApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl WeatherApiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn current_request(&self, coords: &Coordinates) -> RequestBuilder {
        let url = format!("{}/v1/current.json", self.base_url);

        self.http.get(url).query(&[
            ("key", self.api_key.as_str()),
            ("q", coords.to_query().as_str()),
            ("aqi", "yes"),
        ])
    }

    fn forecast_request(&self, coords: &Coordinates) -> RequestBuilder {
        let url = format!("{}/v1/forecast.json", self.base_url);

        self.http.get(url).query(&[
            ("key", self.api_key.as_str()),
            ("q", coords.to_query().as_str()),
            ("days", FORECAST_DAYS),
            ("aqi", "yes"),
            ("alerts", "no"),
        ])
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaCurrentResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    time_epoch: i64,
    temp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

/// Combine both stages into one snapshot. Hours before `now` are dropped at render time.
fn build_snapshot(
    current: WaCurrentResponse,
    forecast: WaForecastResponse,
    now: DateTime<Utc>,
) -> Result<WeatherSnapshot, FetchError> {
    let hourly = forecast
        .forecast
        .forecastday
        .into_iter()
        .flat_map(|day| day.hour)
        .map(|hour| -> Result<HourlyPoint, FetchError> {
            let time = DateTime::from_timestamp(hour.time_epoch, 0).ok_or_else(|| {
                FetchError::malformed(
                    FetchStage::Forecast,
                    format!("hour epoch {} out of range", hour.time_epoch),
                )
            })?;
            Ok(HourlyPoint {
                time,
                temperature_c: hour.temp_c,
                condition: Some(Condition {
                    text: hour.condition.text,
                    icon: absolute_icon_url(&hour.condition.icon),
                }),
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    Ok(WeatherSnapshot {
        provider: ProviderId::WeatherApi,
        location: Some(Location { name: current.location.name, country: current.location.country }),
        current_temp_c: current.current.temp_c,
        hourly,
        window: HourlyWindow::AtOrAfter(now),
    })
}

/// Icons come back protocol-relative, e.g. `//cdn.weatherapi.com/...`.
fn absolute_icon_url(icon: &str) -> String {
    if icon.starts_with("//") { format!("https:{icon}") } else { icon.to_string() }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    async fn fetch(
        &self,
        coords: &Coordinates,
        now: DateTime<Utc>,
    ) -> Result<WeatherSnapshot, FetchError> {
        log::debug!("weatherapi current conditions for {}", coords.to_query());
        let current: WaCurrentResponse =
            get_json(self.current_request(coords), FetchStage::Current).await?;

        log::debug!("weatherapi {FORECAST_DAYS}-day forecast for {}", coords.to_query());
        let forecast: WaForecastResponse =
            get_json(self.forecast_request(coords), FetchStage::Forecast).await?;

        build_snapshot(current, forecast, now)
    }
}
