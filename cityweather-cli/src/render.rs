//! Plain-text rendering of a forecast snapshot.

use std::fmt;

use chrono::NaiveDate;
use cityweather_core::{ForecastSnapshot, Location};

/// "Tuesday, Aug 5, 2025"
pub fn format_today(date: NaiveDate) -> String {
    date.format("%A, %b %-d, %Y").to_string()
}

/// Forecast screen for one location: header, today's date, current
/// conditions and one row per day.
#[derive(Debug, Clone, Copy)]
pub struct ForecastReport<'a> {
    location: &'a Location,
    today: NaiveDate,
    snapshot: &'a ForecastSnapshot,
}

impl<'a> ForecastReport<'a> {
    pub fn new(location: &'a Location, today: NaiveDate, snapshot: &'a ForecastSnapshot) -> Self {
        Self {
            location,
            today,
            snapshot,
        }
    }
}

impl fmt::Display for ForecastReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = &self.snapshot.current;

        f.write_str(self.location.name())?;
        if !self.location.country().is_empty() {
            write!(f, ", {}", self.location.country())?;
        }
        writeln!(f)?;
        writeln!(f, "{}", format_today(self.today))?;
        writeln!(f)?;
        writeln!(f, "  {}°  {}", current.temperature, current.category())?;
        writeln!(
            f,
            "  Feels like {}°   Humidity {}%   Wind {} km/h   Precipitation {} mm",
            current.temperature,
            self.snapshot.humidity_now,
            current.windspeed,
            self.snapshot.precipitation_now,
        )?;
        writeln!(f)?;
        writeln!(f, "Daily forecast")?;
        for day in &self.snapshot.daily {
            writeln!(
                f,
                "  {:<4} {:<14} {:>6}° {:>6}°",
                day.weekday_short(),
                day.category().label(),
                day.temp_max,
                day.temp_min,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityweather_core::{CurrentConditions, DailyForecastEntry};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot() -> ForecastSnapshot {
        ForecastSnapshot {
            current: CurrentConditions {
                temperature: 24.1,
                windspeed: 9.4,
                weather_code: Some(3),
            },
            humidity_now: 78.0,
            precipitation_now: 0.3,
            daily: vec![
                DailyForecastEntry {
                    date: date(2025, 8, 5),
                    temp_max: 20.0,
                    temp_min: 10.0,
                    weather_code: 0,
                },
                DailyForecastEntry {
                    date: date(2025, 8, 6),
                    temp_max: 18.0,
                    temp_min: 9.0,
                    weather_code: 61,
                },
            ],
        }
    }

    #[test]
    fn today_uses_long_weekday_and_short_month() {
        assert_eq!(format_today(date(2025, 8, 5)), "Tuesday, Aug 5, 2025");
    }

    #[test]
    fn report_lists_current_and_daily_rows() {
        let location = Location::new("Paris", "France", Some("Île-de-France".into()), 48.85, 2.35);
        let snapshot = snapshot();

        let text = ForecastReport::new(&location, date(2025, 8, 5), &snapshot).to_string();

        assert!(text.starts_with("Paris, France\nTuesday, Aug 5, 2025\n"));
        assert!(text.contains("24.1°  Overcast"));
        assert!(text.contains("Humidity 78%"));
        assert!(text.contains("Wind 9.4 km/h"));
        assert!(text.contains("Precipitation 0.3 mm"));
        assert!(text.contains("Tue  Clear"));
        assert!(text.contains("Wed  Rain"));
        assert!(text.ends_with("°\n"));
    }

    #[test]
    fn report_header_omits_empty_country() {
        let location = Location::new("Nowhere", "", None, 1.5, 2.5);
        let snapshot = snapshot();

        let text = format!("{}", ForecastReport::new(&location, date(2025, 8, 5), &snapshot));

        assert!(text.starts_with("Nowhere\nTuesday, Aug 5, 2025\n"));
    }
}
