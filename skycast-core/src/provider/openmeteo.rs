use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use crate::{
    Coordinates,
    dates::DateRange,
    error::{FetchError, FetchStage},
    model::{HourlyPoint, HourlyWindow, WeatherSnapshot},
    provider::{ProviderId, get_json},
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

/// Open-Meteo hourly temperature forecast. No API key required.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn forecast_request(&self, coords: &Coordinates, range: &DateRange) -> RequestBuilder {
        let url = format!("{}/v1/forecast", self.base_url);

        self.http.get(url).query(&[
            ("latitude", coords.latitude().to_string()),
            ("longitude", coords.longitude().to_string()),
            ("hourly", "temperature_2m".to_string()),
            ("start_date", range.start_param()),
            ("end_date", range.end_param()),
        ])
    }
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    #[serde(default)]
    utc_offset_seconds: i64,
    hourly: OmHourly,
}

impl OmForecastResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, FetchError> {
        let stage = FetchStage::Forecast;
        let OmHourly { time, temperature_2m } = self.hourly;

        if time.len() != temperature_2m.len() {
            return Err(FetchError::malformed(
                stage,
                format!(
                    "hourly series length mismatch: {} timestamps, {} temperatures",
                    time.len(),
                    temperature_2m.len()
                ),
            ));
        }

        let current_temp_c = *temperature_2m
            .first()
            .ok_or_else(|| FetchError::malformed(stage, "hourly series is empty"))?;

        let offset = TimeDelta::try_seconds(self.utc_offset_seconds).ok_or_else(|| {
            FetchError::malformed(
                stage,
                format!("utc offset {}s out of range", self.utc_offset_seconds),
            )
        })?;
        let hourly = time
            .iter()
            .zip(temperature_2m)
            .map(|(raw, temperature_c)| -> Result<HourlyPoint, FetchError> {
                let local = parse_local_time(raw).ok_or_else(|| {
                    FetchError::malformed(stage, format!("bad hourly timestamp '{raw}'"))
                })?;
                let time = local.and_utc().checked_sub_signed(offset).ok_or_else(|| {
                    FetchError::malformed(stage, format!("timestamp '{raw}' out of range"))
                })?;
                Ok(HourlyPoint { time, temperature_c, condition: None })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        Ok(WeatherSnapshot {
            provider: ProviderId::OpenMeteo,
            location: None,
            current_temp_c,
            hourly,
            window: HourlyWindow::Leading,
        })
    }
}

fn parse_local_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn fetch(
        &self,
        coords: &Coordinates,
        _now: DateTime<Utc>,
    ) -> Result<WeatherSnapshot, FetchError> {
        let range = DateRange::today();
        log::debug!(
            "open-meteo forecast for {} from {} to {}",
            coords.to_query(),
            range.start_param(),
            range.end_param()
        );

        let parsed: OmForecastResponse =
            get_json(self.forecast_request(coords, &range), FetchStage::Forecast).await?;

        parsed.into_snapshot()
    }
}
