use anyhow::Context;
use clap::{Parser, Subcommand};
use cityweather_core::{
    Config, InMemoryUserStore, User, WeatherProvider, WeatherSnapshot,
    provider::provider_from_config,
};
use cityweather_server::{AppState, create_router};
use std::{path::PathBuf, sync::Arc};
use tracing::info;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Saved cities and weather lookups over HTTP")]
pub struct Cli {
    /// Config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Listen address, overrides the config file.
        #[arg(long)]
        bind: Option<String>,

        /// Seed the in-memory store with a development user owning this session token.
        #[arg(long)]
        dev_session: Option<String>,
    },

    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name.
        city: String,

        /// Optional ISO country code, e.g. "FR".
        #[arg(long)]
        country: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = self.config.as_deref();

        match self.command {
            Command::Serve { bind, dev_session } => {
                let mut config = Config::load(config_path)?;
                if let Some(bind) = bind {
                    config.server.bind_addr = bind;
                }
                serve(config, dev_session).await
            }
            Command::Configure => {
                let mut config = Config::load_file(config_path)?;
                let api_key = inquire::Password::new("OpenWeather API key:")
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;
                let api_key = api_key.trim();
                if api_key.is_empty() {
                    anyhow::bail!("API key must not be empty");
                }
                config.set_api_key(api_key.to_string());
                let path = config.save(config_path)?;
                println!("Saved configuration to {}", path.display());
                Ok(())
            }
            Command::Show { city, country } => {
                let config = Config::load(config_path)?;
                let provider = provider_from_config(&config);
                let weather = provider
                    .fetch(&city, country.as_deref())
                    .await
                    .with_context(|| format!("Could not get weather for '{city}'"))?;
                print_weather(&weather);
                Ok(())
            }
        }
    }
}

async fn serve(config: Config, dev_session: Option<String>) -> anyhow::Result<()> {
    let state = match dev_session {
        Some(token) if config.store.data_file.is_none() => {
            info!("Seeding development user dev@localhost");
            let store = InMemoryUserStore::with_users(vec![
                User::new("dev", "dev@localhost").with_session(token),
            ]);
            AppState::new(Arc::new(store), Arc::new(provider_from_config(&config)))
        }
        Some(_) => anyhow::bail!("--dev-session only applies to the in-memory store"),
        None => AppState::from_config(&config).await?,
    };

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    info!("API server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")
}

fn print_weather(w: &WeatherSnapshot) {
    let condition = w
        .conditions
        .first()
        .map(|c| c.description.as_str())
        .unwrap_or("Unknown");
    let local = |ts: i64| {
        chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.with_timezone(&chrono::Local).format("%H:%M").to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    println!("{}, {}: {}", w.city_name, w.country, condition);
    println!(
        "  Temperature: {:.1}°C (feels like {:.1}°C, min {:.1}°C, max {:.1}°C)",
        w.temperature.current, w.temperature.feels_like, w.temperature.min, w.temperature.max
    );
    println!("  Humidity: {}%  Pressure: {} hPa  Clouds: {}%", w.humidity, w.pressure, w.cloud_coverage);
    println!("  Wind: {:.1} m/s at {}°", w.wind.speed, w.wind.direction);
    println!("  Sunrise: {}  Sunset: {}", local(w.sunrise), local(w.sunset));
}
