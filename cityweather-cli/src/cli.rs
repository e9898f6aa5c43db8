use anyhow::{Context, anyhow};
use chrono::Local;
use clap::{Parser, Subcommand};
use cityweather_core::{Config, ForecastView, Location, SearchController, clients_from_config};
use inquire::{CustomType, InquireError, Select, Text};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::{logging::LogLevel, render::ForecastReport};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "City weather lookup")]
pub struct Cli {
    /// Log verbosity (logs go to stderr).
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search interactively with suggestions, then show the forecast.
    Search,

    /// Show the forecast for the best match of a city name.
    Show {
        /// City name, e.g. "Paris" or "Springfield, Illinois".
        city: String,
    },

    /// Edit API endpoints and timeouts.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Search => search(&config).await,
            Command::Show { city } => show(&config, city).await,
            Command::Configure => configure(config).await,
        }
    }
}

struct App {
    search: SearchController,
    selected: UnboundedReceiver<Location>,
    forecast: ForecastView,
}

impl App {
    fn new(config: &Config) -> anyhow::Result<Self> {
        let (geocoder, source) =
            clients_from_config(config).context("Failed to set up HTTP clients")?;
        let (search, selected) = SearchController::new(geocoder, config.search_options());

        Ok(Self {
            search,
            selected,
            forecast: ForecastView::new(source),
        })
    }

    async fn show_forecast(&mut self) -> anyhow::Result<()> {
        let location = self
            .selected
            .recv()
            .await
            .ok_or_else(|| anyhow!("Search closed without a selection"))?;

        println!("Loading weather for {location}...");
        match self.forecast.load(location.clone()).await {
            Ok(snapshot) => {
                println!();
                let report = ForecastReport::new(&location, Local::now().date_naive(), &snapshot);
                print!("{report}");
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "Forecast failed");
                let message = self.forecast.state().error.unwrap_or_else(|| err.to_string());
                Err(anyhow!(message))
            }
        }
    }

    fn search_error(&self) -> String {
        self.search
            .state()
            .error_message
            .unwrap_or_else(|| "Search failed.".to_string())
    }
}

async fn show(config: &Config, city: String) -> anyhow::Result<()> {
    let mut app = App::new(config)?;
    app.search.set_query(city);

    if app.search.confirm_selection().await.is_none() {
        return Err(anyhow!(app.search_error()));
    }

    app.show_forecast().await
}

async fn search(config: &Config) -> anyhow::Result<()> {
    let mut app = App::new(config)?;

    loop {
        let Some(text) = prompt(|| Text::new("Search for a place").prompt()).await? else {
            return Ok(());
        };

        app.search.set_query(text);
        app.search.wait_for_suggestions().await;

        let state = app.search.state();
        let picked = if state.suggestions_visible() {
            let options: Vec<String> = state.suggestions.iter().map(ToString::to_string).collect();
            let choice = prompt(move || {
                Select::new("Did you mean", options)
                    .with_help_message("↑↓ to move, enter to select, esc to search the text as typed")
                    .raw_prompt()
            })
            .await?;

            match choice {
                Some(option) => app.search.select_by_index(option.index),
                None => {
                    app.search.dismiss_suggestions();
                    app.search.confirm_selection().await
                }
            }
        } else {
            app.search.confirm_selection().await
        };

        if picked.is_none() {
            eprintln!("{}", app.search_error());
            continue;
        }

        if let Err(err) = app.show_forecast().await {
            eprintln!("{err}");
        }
        println!();
    }
}

async fn configure(mut config: Config) -> anyhow::Result<()> {
    let current = config.clone();
    let answers = tokio::task::spawn_blocking(move || -> Result<_, InquireError> {
        let geocoding_url = Text::new("Geocoding API base URL")
            .with_default(&current.geocoding_url)
            .prompt()?;
        let forecast_url = Text::new("Forecast API base URL")
            .with_default(&current.forecast_url)
            .prompt()?;
        let timeout_secs = CustomType::<u64>::new("HTTP timeout (seconds)")
            .with_default(current.timeout_secs)
            .prompt()?;
        Ok((geocoding_url, forecast_url, timeout_secs))
    })
    .await
    .context("Prompt task failed")?;

    let (geocoding_url, forecast_url, timeout_secs) = match answers {
        Ok(answers) => answers,
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            println!("Configuration unchanged.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    config.geocoding_url = geocoding_url;
    config.forecast_url = forecast_url;
    config.timeout_secs = timeout_secs;
    config.validate()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Run a blocking inquire prompt off the async runtime.
///
/// Esc and Ctrl-C map to `Ok(None)`.
async fn prompt<T, F>(f: F) -> anyhow::Result<Option<T>>
where
    F: FnOnce() -> Result<T, InquireError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await.context("Prompt task failed")? {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_city() {
        let cli = Cli::try_parse_from(["cityweather", "show", "Paris"]).expect("valid args");
        assert!(matches!(cli.command, Command::Show { ref city } if city == "Paris"));
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn parses_global_log_level_after_subcommand() {
        let cli = Cli::try_parse_from(["cityweather", "search", "--log-level", "debug"])
            .expect("valid args");
        assert!(matches!(cli.command, Command::Search));
        assert_eq!(cli.log_level, LogLevel::Debug);
    }

    #[test]
    fn show_requires_city() {
        assert!(Cli::try_parse_from(["cityweather", "show"]).is_err());
    }
}
