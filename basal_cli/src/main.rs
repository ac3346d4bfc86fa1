mod config;
mod error;
mod schedule;

use basal_core::{encode_program, EncodedBasalProgram, StatusSnapshot};
use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use config::{Config, Timezone};
use error::{CliError, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "podbasal")]
#[command(about = "Basal program encoder for pod insulin pumps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a schedule into slot tables and program elements
    Encode {
        /// Schedule file (TOML); falls back to the configured default
        schedule: Option<PathBuf>,
    },

    /// Compute the delivery status snapshot for a schedule
    Status {
        /// Schedule file (TOML); falls back to the configured default
        schedule: Option<PathBuf>,

        /// Time of day (HH:MM or HH:MM:SS) instead of the current time
        #[arg(long)]
        at: Option<String>,
    },

    /// Write a default config file
    InitConfig {
        /// Destination; defaults to the standard config location
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Serialize)]
struct StatusReport {
    time: NaiveTime,
    #[serde(flatten)]
    status: StatusSnapshot,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    basal_core::logging::init_with_level(&config.logging.level);

    match cli.command {
        Commands::Encode { schedule } => cmd_encode(schedule, &config),
        Commands::Status { schedule, at } => cmd_status(schedule, at, &config),
        Commands::InitConfig { path, force } => cmd_init_config(path, force),
    }
}

fn cmd_encode(schedule: Option<PathBuf>, config: &Config) -> Result<()> {
    let encoded = load_and_encode(schedule, config)?;
    print_json(&encoded, config)
}

fn cmd_status(schedule: Option<PathBuf>, at: Option<String>, config: &Config) -> Result<()> {
    let encoded = load_and_encode(schedule, config)?;

    let time = match at {
        Some(text) => parse_time_of_day(&text)?,
        None => now(config.clock.timezone),
    };
    tracing::debug!("Computing status at {}", time);

    let status = encoded.status_at(&time)?;
    print_json(&StatusReport { time, status }, config)
}

fn cmd_init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path
        .or_else(Config::default_config_path)
        .ok_or_else(|| CliError::Config("no config directory available".into()))?;

    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save_to(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn load_and_encode(schedule: Option<PathBuf>, config: &Config) -> Result<EncodedBasalProgram> {
    let path = schedule
        .or_else(|| config.schedule.path.clone())
        .ok_or_else(|| {
            CliError::Config("no schedule file given and no [schedule] path configured".into())
        })?;

    let program = schedule::load_schedule(&path)?;
    Ok(encode_program(&program)?)
}

fn now(timezone: Timezone) -> NaiveTime {
    match timezone {
        Timezone::Local => chrono::Local::now().time(),
        Timezone::Utc => chrono::Utc::now().time(),
    }
}

fn parse_time_of_day(text: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|_| CliError::Time(text.to_string()))
}

fn print_json<T: Serialize>(value: &T, config: &Config) -> Result<()> {
    let json = if config.output.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
