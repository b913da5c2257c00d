//! Core library for the `skycast` CLI.
//!
//! This crate defines:
//! - Coordinate validation and the forecast date window
//! - Abstraction over weather providers (Open-Meteo, WeatherAPI.com)
//! - A write-only display surface, the renderer and the error/loading presenter
//! - The lookup pipeline tying them together
//! - Configuration & credentials handling
//!
//! It is used by `skycast-cli`, but any front end that implements [`Surface`]
//! can drive a [`Lookup`].

pub mod config;
pub mod coords;
pub mod dates;
pub mod error;
pub mod lookup;
pub mod model;
pub mod presenter;
pub mod provider;
pub mod render;
pub mod surface;

pub use config::{Config, DefaultLocation, ProviderConfig};
pub use coords::{Coordinates, ValidationError};
pub use error::{FetchError, FetchStage, LookupError};
pub use lookup::Lookup;
pub use model::{HourlyPoint, WeatherSnapshot};
pub use presenter::{ErrorDismissal, Presenter};
pub use provider::{ProviderId, WeatherProvider};
pub use surface::{Element, HourlyRow, MemorySurface, Surface};
