use std::{
    fmt,
    hash::{Hash, Hasher},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Decimal places the geocoding API reports coordinates with.
const COORD_SCALE: f64 = 10_000.0;

/// A resolved place. Two locations are equal when their coordinates match
/// at API precision, regardless of how the names are spelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    name: String,
    country: String,
    region: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl Location {
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        region: Option<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            region: region.filter(|r| !r.trim().is_empty()),
            latitude,
            longitude,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    fn coord_key(&self) -> (i64, i64) {
        (
            (self.latitude * COORD_SCALE).round() as i64,
            (self.longitude * COORD_SCALE).round() as i64,
        )
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.coord_key() == other.coord_key()
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coord_key().hash(state);
    }
}

/// Canonical display string: `"<name>[, <region>], <country>"`.
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(region) = &self.region {
            write!(f, ", {region}")?;
        }
        if !self.country.is_empty() {
            write!(f, ", {}", self.country)?;
        }
        Ok(())
    }
}

/// Display category for a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCategory {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Storm,
    Unknown,
}

impl WeatherCategory {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1 | 2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            61 | 63 | 65 | 80 | 81 | 82 => Self::Rain,
            71 | 73 | 75 => Self::Snow,
            95 | 96 | 99 => Self::Storm,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Storm => "Storm",
            Self::Unknown => "Unknown",
        }
    }

    /// Icon asset shipped with the web front end; `None` for unmapped codes.
    pub fn icon_name(&self) -> Option<&'static str> {
        match self {
            Self::Clear => Some("icon-sunny.webp"),
            Self::PartlyCloudy => Some("icon-partly-cloudy.webp"),
            Self::Overcast => Some("icon-overcast.webp"),
            Self::Fog => Some("icon-fog.webp"),
            Self::Drizzle => Some("icon-drizzle.webp"),
            Self::Rain => Some("icon-rain.webp"),
            Self::Snow => Some("icon-snow.webp"),
            Self::Storm => Some("icon-storm.webp"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastEntry {
    pub date: NaiveDate,
    pub temp_max: f64,
    pub temp_min: f64,
    pub weather_code: i32,
}

impl DailyForecastEntry {
    pub fn category(&self) -> WeatherCategory {
        WeatherCategory::from_code(self.weather_code)
    }

    /// Abbreviated weekday, e.g. "Tue".
    pub fn weekday_short(&self) -> String {
        self.date.format("%a").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub windspeed: f64,
    pub weather_code: Option<i32>,
}

impl CurrentConditions {
    pub fn category(&self) -> WeatherCategory {
        self.weather_code
            .map(WeatherCategory::from_code)
            .unwrap_or(WeatherCategory::Unknown)
    }
}

/// Display-ready forecast for one location, rebuilt on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub current: CurrentConditions,
    pub humidity_now: f64,
    pub precipitation_now: f64,
    pub daily: Vec<DailyForecastEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris() -> Location {
        Location::new("Paris", "France", Some("Île-de-France".into()), 48.85341, 2.3488)
    }

    #[test]
    fn display_includes_region_when_present() {
        assert_eq!(paris().to_string(), "Paris, Île-de-France, France");
    }

    #[test]
    fn display_skips_missing_or_blank_region() {
        let monaco = Location::new("Monaco", "Monaco", None, 43.73333, 7.41667);
        assert_eq!(monaco.to_string(), "Monaco, Monaco");

        let blank = Location::new("Monaco", "Monaco", Some("  ".into()), 43.73333, 7.41667);
        assert_eq!(blank.region(), None);
        assert_eq!(blank.to_string(), "Monaco, Monaco");
    }

    #[test]
    fn display_omits_empty_country() {
        let nowhere = Location::new("Nowhere", "", None, 0.0, 0.0);
        assert_eq!(nowhere.to_string(), "Nowhere");

        let station = Location::new("Vostok", "", Some("Antarctica".into()), -78.46, 106.84);
        assert_eq!(station.to_string(), "Vostok, Antarctica");
    }

    #[test]
    fn equality_uses_rounded_coordinates_only() {
        let other = Location::new("Paris (FR)", "FR", None, 48.853412, 2.348801);
        assert_eq!(paris(), other);

        let lyon = Location::new("Lyon", "France", None, 45.74846, 4.84671);
        assert_ne!(paris(), lyon);
    }

    #[test]
    fn weather_code_mapping() {
        assert_eq!(WeatherCategory::from_code(0), WeatherCategory::Clear);
        assert_eq!(WeatherCategory::from_code(2), WeatherCategory::PartlyCloudy);
        assert_eq!(WeatherCategory::from_code(3), WeatherCategory::Overcast);
        assert_eq!(WeatherCategory::from_code(48), WeatherCategory::Fog);
        assert_eq!(WeatherCategory::from_code(55), WeatherCategory::Drizzle);
        assert_eq!(WeatherCategory::from_code(61), WeatherCategory::Rain);
        assert_eq!(WeatherCategory::from_code(82), WeatherCategory::Rain);
        assert_eq!(WeatherCategory::from_code(73), WeatherCategory::Snow);
        assert_eq!(WeatherCategory::from_code(96), WeatherCategory::Storm);
        assert_eq!(WeatherCategory::from_code(999), WeatherCategory::Unknown);
        assert_eq!(WeatherCategory::from_code(-1), WeatherCategory::Unknown);
    }

    #[test]
    fn unknown_category_has_no_icon() {
        assert_eq!(WeatherCategory::Unknown.icon_name(), None);
        assert_eq!(WeatherCategory::Rain.icon_name(), Some("icon-rain.webp"));
    }

    #[test]
    fn weekday_short_formats_date() {
        let entry = DailyForecastEntry {
            date: NaiveDate::from_ymd_opt(2025, 8, 5).unwrap(),
            temp_max: 20.0,
            temp_min: 10.0,
            weather_code: 0,
        };
        assert_eq!(entry.weekday_short(), "Tue");
        assert_eq!(entry.category(), WeatherCategory::Clear);
    }
}
