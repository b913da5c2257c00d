use crate::{
    Config, Coordinates, WeatherSnapshot,
    error::{FetchError, FetchStage},
    provider::{openmeteo::OpenMeteoProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{convert::TryFrom, fmt::Debug};

pub mod openmeteo;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenMeteo,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "openmeteo",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::WeatherApi]
    }

    /// Whether the provider refuses requests without an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::WeatherApi)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openmeteo" | "open-meteo" => Ok(ProviderId::OpenMeteo),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openmeteo, weatherapi."
            )),
        }
    }
}

impl std::str::FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::try_from(s)
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Fetch a fresh snapshot for `coords`. `now` marks the start of the lookup.
    async fn fetch(
        &self,
        coords: &Coordinates,
        now: DateTime<Utc>,
    ) -> Result<WeatherSnapshot, FetchError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenMeteo => Box::new(OpenMeteoProvider::new()),
        ProviderId::WeatherApi => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for provider '{id}'.\n\
                     Hint: run `skycast configure {id}` or set {}.",
                    crate::config::WEATHERAPI_KEY_ENV
                )
            })?;
            Box::new(WeatherApiProvider::new(api_key))
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

/// Send `request`, treat any non-2xx status as failure and decode the JSON body.
///
/// Transport errors are stripped of their URL, which may carry an API key.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    stage: FetchStage,
) -> Result<T, FetchError> {
    let (client, request) = request.build_split();
    let request = request.map_err(|e| FetchError::transport(stage, e.without_url()))?;
    log::debug!("{stage} request: {} {}", request.method(), redacted_url(request.url()));

    let res = client
        .execute(request)
        .await
        .map_err(|e| FetchError::transport(stage, e.without_url()))?;

    let status = res.status();
    let body = res.text().await.map_err(|e| FetchError::transport(stage, e.without_url()))?;

    if !status.is_success() {
        return Err(FetchError::status(stage, status, &body));
    }

    serde_json::from_str(&body).map_err(|e| FetchError::decode(stage, e))
}

/// `url` with the value of any `key` query parameter replaced.
fn redacted_url(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if !pairs.iter().any(|(name, _)| name == "key") {
        return url.to_string();
    }

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs.iter().map(|(name, value)| {
        let value = if name == "key" { "REDACTED" } else { value.as_str() };
        (name.as_str(), value)
    }));
    redacted.to_string()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, error::FetchErrorKind};
    use reqwest::{Client, StatusCode};
    use stub_server::StubServer;

    #[derive(Debug, Deserialize)]
    struct Payload {
        ok: bool,
    }

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("WeatherAPI").unwrap(), ProviderId::WeatherApi);
        assert_eq!(ProviderId::try_from("Open-Meteo").unwrap(), ProviderId::OpenMeteo);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn open_meteo_needs_no_key() {
        let cfg = Config::default();
        let provider = provider_from_config(ProviderId::OpenMeteo, &cfg).expect("no key needed");
        assert_eq!(provider.id(), ProviderId::OpenMeteo);
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::WeatherApi, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn default_provider_is_open_meteo() {
        let cfg = Config::default();
        let provider = default_provider_from_config(&cfg).expect("default provider");
        assert_eq!(provider.id(), ProviderId::OpenMeteo);
    }

    #[test]
    fn default_provider_from_config_works_when_set_and_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "KEY".to_string());
        cfg.set_default_provider(ProviderId::WeatherApi);

        let provider = default_provider_from_config(&cfg).expect("configured provider");
        assert_eq!(provider.id(), ProviderId::WeatherApi);
    }

    #[test]
    fn redacts_key_parameter() {
        let url =
            Url::parse("https://api.example.com/v1/current.json?key=TOPSECRET&q=1%2C2").unwrap();
        let shown = redacted_url(&url);

        assert!(!shown.contains("TOPSECRET"));
        assert!(shown.contains("key=REDACTED"));
        assert!(shown.contains("q=1%2C2"));
    }

    #[test]
    fn url_without_key_is_unchanged() {
        let url = Url::parse("https://api.example.com/v1/forecast?latitude=1&longitude=2").unwrap();
        assert_eq!(redacted_url(&url), url.to_string());
    }

    #[tokio::test]
    async fn transport_error_omits_the_request_url() {
        let request = Client::new().get("http://127.0.0.1:1/v1/current.json?key=TOPSECRETKEY");

        let err = get_json::<Payload>(request, FetchStage::Current).await.unwrap_err();
        assert!(matches!(err.kind, FetchErrorKind::Transport(_)));
        assert!(!err.to_string().contains("TOPSECRETKEY"));
        assert!(!format!("{err:?}").contains("TOPSECRETKEY"));
    }

    #[tokio::test]
    async fn non_success_status_keeps_code_and_body() {
        let server =
            StubServer::start(vec![(403, r#"{"error":{"message":"bad key"}}"#.into())]).await;
        let request = Client::new().get(format!("{}/v1/current.json", server.base_url));

        let err = get_json::<Payload>(request, FetchStage::Current).await.unwrap_err();
        assert_eq!(err.stage, FetchStage::Current);
        match err.kind {
            FetchErrorKind::Status { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert!(body.contains("bad key"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn success_with_garbage_body_is_a_decode_error() {
        let server = StubServer::start(vec![(200, "<html>".into())]).await;
        let request = Client::new().get(format!("{}/anything", server.base_url));

        let err = get_json::<Payload>(request, FetchStage::Forecast).await.unwrap_err();
        assert_eq!(err.stage, FetchStage::Forecast);
        assert!(matches!(err.kind, FetchErrorKind::Decode(_)));
    }

    #[tokio::test]
    async fn success_decodes_body() {
        let server = StubServer::start(vec![(200, r#"{"ok": true}"#.into())]).await;
        let request = Client::new().get(format!("{}/anything", server.base_url));

        let parsed: Payload = get_json(request, FetchStage::Forecast).await.unwrap();
        assert!(parsed.ok);
    }
}
