//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Geocoding and forecast clients for Open-Meteo
//! - A debounced autocomplete controller for city search
//! - The forecast view-model and its payload normalization
//! - Configuration handling
//!
//! It is used by `cityweather-cli`, but any front end that can drive a tokio
//! runtime can reuse it.

pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod search;

pub use config::Config;
pub use error::LookupError;
pub use forecast::{ForecastState, ForecastView, normalize};
pub use model::{CurrentConditions, DailyForecastEntry, ForecastSnapshot, Location, WeatherCategory};
pub use provider::{ForecastSource, Geocoder, clients_from_config};
pub use search::{Direction, SearchController, SearchOptions, SearchState, SearchStatus};
