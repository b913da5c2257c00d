use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use skycast_core::{
    Config, DefaultLocation, Lookup, Presenter, ProviderId, Surface, provider::provider_from_config,
};

use crate::terminal::TerminalSurface;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Current and hourly weather by coordinates")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show weather for a latitude/longitude pair.
    ///
    /// Without coordinates, the configured default location is used.
    Show {
        /// Latitude in decimal degrees, -90 to 90.
        #[arg(allow_negative_numbers = true)]
        latitude: Option<String>,

        /// Longitude in decimal degrees, -180 to 180.
        #[arg(allow_negative_numbers = true)]
        longitude: Option<String>,

        /// Provider to query instead of the configured default.
        #[arg(long, short)]
        provider: Option<ProviderId>,
    },

    /// Look up the default location, then keep prompting for coordinates.
    Watch {
        #[arg(long, short)]
        provider: Option<ProviderId>,
    },

    /// Configure credentials for a provider and make it the default.
    Configure {
        /// Provider short name, "openmeteo" or "weatherapi".
        provider: ProviderId,
    },

    /// Store the location used when no coordinates are given.
    Location {
        #[arg(allow_negative_numbers = true)]
        latitude: String,

        #[arg(allow_negative_numbers = true)]
        longitude: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Show { latitude, longitude, provider } => {
                let config = Config::load()?;
                let lookup = build_lookup(&config, provider)?;
                let (latitude, longitude) =
                    resolve_input(latitude, longitude, config.location.as_ref());

                // Failures were already printed by the surface.
                match lookup.run(&latitude, &longitude).await {
                    Ok(()) => Ok(ExitCode::SUCCESS),
                    Err(_) => Ok(ExitCode::FAILURE),
                }
            }
            Command::Watch { provider } => {
                let config = Config::load()?;
                let lookup = build_lookup(&config, provider)?;
                watch(&lookup, config.location).await?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Configure { provider } => {
                configure(provider).await?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Location { latitude, longitude } => {
                let mut config = Config::load()?;
                let coords = config.set_default_location(&latitude, &longitude)?;
                config.save()?;
                println!("Default location set to {coords}");
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn build_lookup(config: &Config, provider: Option<ProviderId>) -> anyhow::Result<Lookup> {
    let id = match provider {
        Some(id) => id,
        None => config.default_provider_id()?,
    };
    log::debug!("using provider {id}");

    let provider = provider_from_config(id, config)?;
    let surface: Arc<dyn Surface> = Arc::new(TerminalSurface::stdio());
    let presenter = Presenter::new(surface, config.error_dismissal);

    Ok(Lookup::new(provider, presenter))
}

/// Explicit arguments win; a missing pair falls back to the stored location.
///
/// A half-given pair is passed through so validation reports the blank field.
fn resolve_input(
    latitude: Option<String>,
    longitude: Option<String>,
    default: Option<&DefaultLocation>,
) -> (String, String) {
    match (latitude, longitude, default) {
        (None, None, Some(loc)) => (loc.latitude.clone(), loc.longitude.clone()),
        (lat, lon, _) => (lat.unwrap_or_default(), lon.unwrap_or_default()),
    }
}

async fn watch(lookup: &Lookup, default: Option<DefaultLocation>) -> anyhow::Result<()> {
    let (mut latitude, mut longitude) = match default {
        Some(loc) => {
            let _ = lookup.run(&loc.latitude, &loc.longitude).await;
            (loc.latitude, loc.longitude)
        }
        None => (String::new(), String::new()),
    };

    println!("Enter coordinates to look up; press Esc to quit.");

    while let Some((lat, lon)) = prompt_coordinates(latitude, longitude).await? {
        let _ = lookup.run(&lat, &lon).await;
        latitude = lat;
        longitude = lon;
    }

    Ok(())
}

/// Ask for a coordinate pair, pre-filled with the previous one. `None` when the user quits.
async fn prompt_coordinates(
    latitude: String,
    longitude: String,
) -> anyhow::Result<Option<(String, String)>> {
    tokio::task::spawn_blocking(move || {
        let pair = Text::new("Latitude:")
            .with_initial_value(&latitude)
            .prompt()
            .and_then(|lat| {
                Text::new("Longitude:")
                    .with_initial_value(&longitude)
                    .prompt()
                    .map(|lon| (lat, lon))
            });

        match pair {
            Ok(pair) => Ok(Some(pair)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(err) => Err(err).context("Failed to read coordinates"),
        }
    })
    .await
    .context("Coordinate prompt task failed")?
}

async fn configure(provider: ProviderId) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if provider.requires_api_key() {
        let api_key = tokio::task::spawn_blocking(move || {
            Password::new(&format!("API key for {provider}:"))
                .with_display_mode(PasswordDisplayMode::Masked)
                .without_confirmation()
                .prompt()
        })
        .await
        .context("API key prompt task failed")?
        .context("Failed to read API key")?;

        let api_key = api_key.trim().to_string();
        anyhow::ensure!(!api_key.is_empty(), "API key must not be empty");
        config.upsert_provider_api_key(provider, api_key);
    }

    config.set_default_provider(provider);
    config.save()?;

    println!(
        "Provider '{provider}' is now the default. Config saved to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}
