use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    LookupError, Location,
    provider::{Geocoder, get_body, http_client, join_url},
};

/// Open-Meteo geocoding search client.
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    base_url: String,
    http: Client,
}

impl OpenMeteoGeocoder {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, LookupError> {
        Ok(Self {
            base_url,
            http: http_client(timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    results: Option<Vec<GeoResult>>,
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    admin1: Option<String>,
}

impl From<GeoResult> for Location {
    fn from(r: GeoResult) -> Self {
        Location::new(
            r.name,
            r.country.unwrap_or_default(),
            r.admin1,
            r.latitude,
            r.longitude,
        )
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn resolve(&self, query: &str, limit: usize) -> Result<Vec<Location>, LookupError> {
        let url = join_url(&self.base_url, "search");
        debug!(url = %url, "Geocoding query");

        let body = get_body(
            &self.http,
            &url,
            &[
                ("name", query.to_string()),
                ("count", limit.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ],
            "geocoding",
        )
        .await?;

        let parsed: GeoResponse = serde_json::from_str(&body).map_err(|e| {
            LookupError::MalformedResponse(format!("Failed to parse geocoding JSON: {e}"))
        })?;

        let locations: Vec<Location> = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(Location::from)
            .collect();

        if locations.is_empty() {
            return Err(LookupError::NoResults(query.to_string()));
        }

        debug!(count = locations.len(), "Geocoding resolved");
        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_result_with_missing_optional_fields() {
        let json = r#"{"results":[{"name":"Nowhere","latitude":1.5,"longitude":2.5}]}"#;
        let parsed: GeoResponse = serde_json::from_str(json).expect("valid json");
        let loc = Location::from(parsed.results.unwrap().remove(0));

        assert_eq!(loc.name(), "Nowhere");
        assert_eq!(loc.country(), "");
        assert_eq!(loc.region(), None);
        assert_eq!(loc.to_string(), "Nowhere");
    }

    #[test]
    fn absent_results_parse_as_none() {
        let parsed: GeoResponse = serde_json::from_str(r#"{"generationtime_ms":0.5}"#).unwrap();
        assert!(parsed.results.is_none());
    }
}
