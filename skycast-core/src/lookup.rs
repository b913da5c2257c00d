use std::fmt::Display;

use chrono::{Local, TimeZone, Utc};

use crate::{
    Coordinates,
    error::LookupError,
    presenter::Presenter,
    provider::WeatherProvider,
    render::render,
};

/// Validate, fetch and render, one lookup at a time per caller.
///
/// Concurrent calls are not serialized: each runs to completion and the last
/// one to finish owns the surface.
#[derive(Debug)]
pub struct Lookup<Tz: TimeZone = Local> {
    provider: Box<dyn WeatherProvider>,
    presenter: Presenter,
    tz: Tz,
}

impl Lookup<Local> {
    pub fn new(provider: Box<dyn WeatherProvider>, presenter: Presenter) -> Self {
        Self::with_timezone(provider, presenter, Local)
    }
}

impl<Tz> Lookup<Tz>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Display,
{
    /// Like [`Lookup::new`], rendering hourly timestamps in `tz`.
    pub fn with_timezone(provider: Box<dyn WeatherProvider>, presenter: Presenter, tz: Tz) -> Self {
        Self { provider, presenter, tz }
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn provider(&self) -> &dyn WeatherProvider {
        self.provider.as_ref()
    }

    /// Run one lookup for raw user input.
    ///
    /// Failures are already shown on the surface when this returns `Err`; the
    /// error is returned for callers that want the detail.
    pub async fn run(&self, latitude: &str, longitude: &str) -> Result<(), LookupError> {
        let coords = match Coordinates::parse(latitude, longitude) {
            Ok(coords) => coords,
            Err(err) => {
                log::debug!("rejected input ({latitude:?}, {longitude:?}): {err}");
                self.presenter.show_error(&err.to_string());
                return Err(err.into());
            }
        };

        let _loading = self.presenter.begin_loading();

        match self.provider.fetch(&coords, Utc::now()).await {
            Ok(snapshot) => {
                render(self.presenter.surface(), &snapshot, &coords, &self.tz);
                log::info!(
                    "{} lookup for {} rendered {} hourly rows",
                    self.provider.id(),
                    coords.to_query(),
                    snapshot.upcoming_hours().count()
                );
                Ok(())
            }
            Err(err) => {
                log::error!("{} fetch failed: {err}", self.provider.id());
                let err = LookupError::from(err);
                self.presenter.show_error(&err.user_message());
                Err(err)
            }
        }
    }
}
