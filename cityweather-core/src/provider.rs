use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    Config, LookupError, Location,
    provider::{forecast::OpenMeteoForecast, geocoding::OpenMeteoGeocoder},
};

pub mod forecast;
pub mod geocoding;

pub use forecast::{CurrentWeatherPayload, DailyPayload, ForecastPayload, HourlyPayload};

/// Resolves free-text place queries into candidate locations.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Returns at most `limit` candidates in relevance order.
    ///
    /// An empty candidate list is reported as [`LookupError::NoResults`],
    /// never as `Ok(vec![])`.
    async fn resolve(&self, query: &str, limit: usize) -> Result<Vec<Location>, LookupError>;
}

/// Fetches the raw forecast payload for a location.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch(&self, location: &Location) -> Result<ForecastPayload, LookupError>;
}

/// Construct both Open-Meteo clients from config.
pub fn clients_from_config(
    config: &Config,
) -> Result<(Arc<dyn Geocoder>, Arc<dyn ForecastSource>), LookupError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let geocoder: Arc<dyn Geocoder> =
        Arc::new(OpenMeteoGeocoder::new(config.geocoding_url.clone(), timeout)?);
    let forecast: Arc<dyn ForecastSource> =
        Arc::new(OpenMeteoForecast::new(config.forecast_url.clone(), timeout)?);

    Ok((geocoder, forecast))
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, LookupError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LookupError::Network(format!("Failed to build HTTP client: {e}")))
}

/// Send a GET and return the body of a successful response.
pub(crate) async fn get_body(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
    what: &str,
) -> Result<String, LookupError> {
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| LookupError::Network(format!("Failed to send {what} request: {e}")))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| LookupError::Network(format!("Failed to read {what} response body: {e}")))?;

    if !status.is_success() {
        return Err(LookupError::Network(format!(
            "{what} request failed with status {status}: {}",
            truncate_body(&body),
        )));
    }

    Ok(body)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(join_url("http://x/v1/", "search"), "http://x/v1/search");
        assert_eq!(join_url("http://x/v1", "forecast"), "http://x/v1/forecast");
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_body_cuts_on_char_boundary() {
        let long = "é".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }

    #[test]
    fn clients_from_default_config() {
        let cfg = Config::default();
        assert!(clients_from_config(&cfg).is_ok());
    }
}
