use std::{path::PathBuf, sync::Arc};

use analyzer_core::{Config, OpenWeatherClient, WeatherService};
use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, Text};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-analyzer", version, about = "7-day weather summary service")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true, env = "WEATHER_ANALYZER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve `GET /weather?city=<name>` over HTTP.
    Serve {
        /// Listen address, e.g. "127.0.0.1:8080". Overrides the config file.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Interactively store the forecast provider API key and URL.
    Configure,

    /// Print the summary for one city and exit.
    Summary {
        /// City name as understood by the forecast provider.
        city: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(self.config),
            Command::Serve { bind } => {
                let config = load_config(self.config.as_ref())?;
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                serve(&config, &bind).await
            }
            Command::Summary { city } => {
                let config = load_config(self.config.as_ref())?;
                let service = build_service(&config)?;
                let summary = service.summarize(&city).await?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
                Ok(())
            }
        }
    }
}

fn config_path(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Config::config_file_path(),
    }
}

/// File config with environment overrides applied on top.
fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<Config> {
    let path = config_path(explicit.cloned())?;
    let mut config = Config::load_from(&path)?;
    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}

fn build_service(config: &Config) -> anyhow::Result<Arc<WeatherService>> {
    let client = OpenWeatherClient::new(&config.api, config.api_key()?)?;
    Ok(Arc::new(WeatherService::new(Arc::new(client), &config.cache)))
}

async fn serve(config: &Config, bind: &str) -> anyhow::Result<()> {
    let service = build_service(config)?;
    let app = routes::router(service);

    let listener =
        TcpListener::bind(bind).await.with_context(|| format!("Failed to bind {bind}"))?;
    info!(
        addr = %listener.local_addr()?,
        ttl_secs = config.cache.ttl_secs,
        max_entries = config.cache.max_capacity,
        "Weather analyzer listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

fn configure(explicit: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path(explicit)?;
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("API key prompt aborted")?;
    let base_url = Text::new("Forecast endpoint:")
        .with_default(&config.api.base_url)
        .prompt()
        .context("Endpoint prompt aborted")?;

    config.set_api_key(api_key.trim().to_string());
    config.api.base_url = base_url.trim().to_string();
    config.save_to(&path)?;

    println!("Configuration saved to {}", path.display());
    Ok(())
}
