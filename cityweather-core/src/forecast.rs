//! Forecast view-model: fetches a location's forecast and reshapes the raw
//! payload into a [`ForecastSnapshot`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{
    Location, LookupError,
    model::{CurrentConditions, DailyForecastEntry, ForecastSnapshot},
    provider::{ForecastPayload, ForecastSource},
};

/// Days kept for display.
pub const MAX_DAILY_ENTRIES: usize = 7;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to fetch weather data";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastState {
    /// Location of the most recent `load` call.
    pub target: Option<Location>,
    pub loading: bool,
    pub snapshot: Option<ForecastSnapshot>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    state: ForecastState,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct ForecastView {
    source: Arc<dyn ForecastSource>,
    inner: Arc<Mutex<Inner>>,
}

impl ForecastView {
    pub fn new(source: Arc<dyn ForecastSource>) -> Self {
        Self {
            source,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn state(&self) -> ForecastState {
        self.lock().state.clone()
    }

    /// Fetch and normalize the forecast for `location`.
    ///
    /// The outcome is always returned to the caller, but it only reaches
    /// [`state`](Self::state) if no newer `load` was started meanwhile.
    pub async fn load(&self, location: Location) -> Result<ForecastSnapshot, LookupError> {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.state.target = Some(location.clone());
            inner.state.loading = true;
            inner.generation
        };

        debug!(%location, generation, "Loading forecast");
        let result = match self.source.fetch(&location).await {
            Ok(payload) => normalize(payload),
            Err(err) => Err(err),
        };

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(%location, "Discarding forecast for superseded location");
            return result;
        }

        inner.state.loading = false;
        match &result {
            Ok(snapshot) => {
                inner.state.snapshot = Some(snapshot.clone());
                inner.state.error = None;
            }
            Err(err) => {
                warn!(%location, error = %err, "Forecast load failed");
                inner.state.snapshot = None;
                inner.state.error = Some(LOAD_FAILED_MESSAGE.to_string());
            }
        }

        result
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn malformed(msg: impl Into<String>) -> LookupError {
    LookupError::MalformedResponse(msg.into())
}

/// Turn the raw upstream payload into display-ready data.
///
/// The four daily arrays must have equal length. Days with a `null` maximum,
/// minimum or weather code are skipped, and the result keeps the first
/// [`MAX_DAILY_ENTRIES`] complete days. Humidity and precipitation come from
/// hourly index 0, which approximates "now" only at the start of the day;
/// `null`s at later hours are ignored.
pub fn normalize(payload: ForecastPayload) -> Result<ForecastSnapshot, LookupError> {
    let current = payload
        .current_weather
        .ok_or_else(|| malformed("missing current_weather"))?;
    let hourly = payload.hourly.ok_or_else(|| malformed("missing hourly"))?;
    let daily = payload.daily.ok_or_else(|| malformed("missing daily"))?;

    let humidity_now = first_value(hourly.relative_humidity_2m, "hourly.relative_humidity_2m")?;
    let precipitation_now = first_value(hourly.precipitation, "hourly.precipitation")?;

    let time = daily.time.ok_or_else(|| malformed("missing daily.time"))?;
    let max = daily
        .temperature_2m_max
        .ok_or_else(|| malformed("missing daily.temperature_2m_max"))?;
    let min = daily
        .temperature_2m_min
        .ok_or_else(|| malformed("missing daily.temperature_2m_min"))?;
    let codes = daily
        .weathercode
        .ok_or_else(|| malformed("missing daily.weathercode"))?;

    let n = time.len();
    if max.len() != n || min.len() != n || codes.len() != n {
        return Err(malformed(format!(
            "daily arrays differ in length: time={n}, max={}, min={}, weathercode={}",
            max.len(),
            min.len(),
            codes.len(),
        )));
    }

    let daily = time
        .iter()
        .zip(max)
        .zip(min)
        .zip(codes)
        .filter_map(|(((date, temp_max), temp_min), weather_code)| {
            Some((date, temp_max?, temp_min?, weather_code?))
        })
        .take(MAX_DAILY_ENTRIES)
        .map(|(date, temp_max, temp_min, weather_code)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| malformed(format!("invalid date '{date}': {e}")))?;
            Ok(DailyForecastEntry {
                date,
                temp_max,
                temp_min,
                weather_code,
            })
        })
        .collect::<Result<Vec<_>, LookupError>>()?;

    Ok(ForecastSnapshot {
        current: CurrentConditions {
            temperature: current.temperature,
            windspeed: current.windspeed,
            weather_code: current.weathercode,
        },
        humidity_now,
        precipitation_now,
        daily,
    })
}

fn first_value(values: Option<Vec<Option<f64>>>, field: &str) -> Result<f64, LookupError> {
    values
        .and_then(|v| v.first().copied().flatten())
        .ok_or_else(|| malformed(format!("{field} is missing, empty or null at index 0")))
}
