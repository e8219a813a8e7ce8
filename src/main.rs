//! chat-relay: streaming relay for chat completions
//!
//! A single-endpoint relay that forwards chat-completion requests to an
//! upstream provider with streaming forced on, injects the server-held
//! credential, and pipes the upstream SSE stream back to the caller.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use chat_relay::{
    config::{AppConfig, API_KEY_ENV},
    run_server,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(version = "0.1.0")]
#[command(about = "Streaming relay for OpenAI-style chat completions")]
#[command(long_about = "
chat-relay forwards POST /v1/chat/completions to an upstream provider with
stream:true forced on the payload and the server-held credential attached,
then relays the upstream event stream back to the caller verbatim.

The credential is read from the OPENAI_API_KEY environment variable.

Example usage:
  chat-relay run --config config.yaml
  chat-relay check-config
")]
struct Cli {
    /// Path to config file (defaults apply if the file does not exist)
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Run {
        /// Override listen port
        #[arg(short, long)]
        port: Option<u16>,
        /// Override upstream URL (e.g., "https://api.openai.com/v1/chat/completions")
        #[arg(long)]
        upstream_url: Option<String>,
    },

    /// Validate configuration file
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level_filter = if let Some(level) = cli.log_level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&level_filter))
        .init();

    match cli.command {
        Commands::Run { port, upstream_url } => {
            run_relay(cli.config, port, upstream_url).await?;
        }
        Commands::CheckConfig => {
            check_config(cli.config)?;
        }
    }

    Ok(())
}

/// Run the relay server
async fn run_relay(
    config_path: PathBuf,
    port_override: Option<u16>,
    upstream_url_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config_or_exit(&config_path);

    // Apply CLI overrides
    if let Some(port) = port_override {
        config.server.port = port;
    }
    if let Some(url) = upstream_url_override {
        config.upstream.url = url;
    }

    tracing::info!("Loaded configuration from {:?}", config_path);

    // Missing credential is surfaced per request as 500, not a startup crash
    let api_key = std::env::var(API_KEY_ENV).ok();
    if api_key.is_none() {
        tracing::warn!(
            "{} is not set; every relay request will be answered with 500",
            API_KEY_ENV
        );
    }

    run_server(config, api_key).await?;

    Ok(())
}

/// Validate configuration file
fn check_config(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    match AppConfig::load_or_default(&config_path) {
        Ok(config) => {
            if let Err(e) = config.upstream.validate() {
                eprintln!("✗ Configuration error: {}", e);
                std::process::exit(1);
            }
            println!("✓ Configuration is valid\n");
            println!("Server:");
            println!("  Listen: {}:{}", config.server.host, config.server.port);
            println!("\nUpstream:");
            println!("  URL: {}", config.upstream.endpoint());
            println!("  TLS: {}", if config.upstream.is_tls() { "enabled" } else { "disabled" });
            println!("  Timeout: {}s", config.upstream.timeout_seconds);
            println!("\nCredential:");
            println!(
                "  {}: {}",
                API_KEY_ENV,
                if std::env::var(API_KEY_ENV).is_ok() { "set" } else { "NOT SET" }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load configuration or exit with error
fn load_config_or_exit(config_path: &PathBuf) -> AppConfig {
    match AppConfig::load_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            eprintln!("\nCheck your config.yaml, or delete it to use the defaults.");
            std::process::exit(1);
        }
    }
}
