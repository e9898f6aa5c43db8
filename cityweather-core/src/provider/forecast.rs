use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    LookupError, Location,
    provider::{ForecastSource, get_body, http_client, join_url},
};

const HOURLY_FIELDS: &str = "relative_humidity_2m,precipitation";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,weathercode";

/// Raw Open-Meteo forecast body. Every section is optional here so that a
/// missing one surfaces as a normalization error instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub current_weather: Option<CurrentWeatherPayload>,
    #[serde(default)]
    pub hourly: Option<HourlyPayload>,
    #[serde(default)]
    pub daily: Option<DailyPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeatherPayload {
    pub temperature: f64,
    pub windspeed: f64,
    #[serde(default)]
    pub weathercode: Option<i32>,
}

/// Hourly series. Open-Meteo reports unavailable measurements as `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyPayload {
    #[serde(default)]
    pub relative_humidity_2m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub precipitation: Option<Vec<Option<f64>>>,
}

/// Parallel arrays, one element per day; values may be `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyPayload {
    #[serde(default)]
    pub time: Option<Vec<String>>,
    #[serde(default)]
    pub temperature_2m_max: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub temperature_2m_min: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub weathercode: Option<Vec<Option<i32>>>,
}

/// Open-Meteo forecast client.
#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    base_url: String,
    http: Client,
}

impl OpenMeteoForecast {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, LookupError> {
        Ok(Self {
            base_url,
            http: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoForecast {
    #[instrument(skip(self, location), fields(lat = %location.latitude(), lon = %location.longitude()))]
    async fn fetch(&self, location: &Location) -> Result<ForecastPayload, LookupError> {
        let url = join_url(&self.base_url, "forecast");
        debug!(url = %url, "Fetching forecast");

        let body = get_body(
            &self.http,
            &url,
            &[
                ("latitude", location.latitude().to_string()),
                ("longitude", location.longitude().to_string()),
                ("current_weather", "true".to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ],
            "forecast",
        )
        .await?;

        serde_json::from_str(&body).map_err(|e| {
            LookupError::MalformedResponse(format!("Failed to parse forecast JSON: {e}"))
        })
    }
}
