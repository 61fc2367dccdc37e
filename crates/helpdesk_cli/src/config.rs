//! Configuration for the `helpdesk` binary.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. **YAML config file** (default `helpdesk.yaml`, or `-f` / `HELPDESK_CONFIG`). A missing
//!    file is not an error; every field has a default.
//! 2. **Environment variables** prefixed with `HELPDESK_`, e.g. `HELPDESK_TIMEZONE=America/Chicago`.
//!
//! ```yaml
//! timezone: America/Chicago
//! schedule_path: /var/lib/helpdesk/schedule.json
//! horizon_days: 14
//! ```

use std::path::PathBuf;

use availability_engine::helpdesk_schedule::NEXT_WINDOW_HORIZON_DAYS;
use chrono_tz::Tz;
use clap::Parser;
use figment::Figment;
use figment::providers::Env;
use figment::providers::Format;
use figment::providers::Yaml;
use serde::Deserialize;
use serde::Serialize;

use crate::commands::Command;

#[derive(Parser, Debug)]
#[command(name = "helpdesk", author, version, about = "Manage and query helpdesk support hours", long_about = None)]
pub struct Args
{
    /// Path to configuration file
    #[arg(short = 'f', long, env = "HELPDESK_CONFIG", default_value = "helpdesk.yaml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config
{
    /// IANA timezone the support hours are expressed in
    pub timezone: Tz,
    /// JSON file holding the weekly hours and overrides
    pub schedule_path: PathBuf,
    /// How many days ahead to look for the next open window
    pub horizon_days: u32,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            timezone: Tz::UTC,
            schedule_path: PathBuf::from("helpdesk_schedule.json"),
            horizon_days: NEXT_WINDOW_HORIZON_DAYS,
        }
    }
}

impl Config
{
    pub fn figment(config_path: &str) -> Figment
    {
        Figment::new()
            .merge(Yaml::file(config_path))
            // HELPDESK_CONFIG selects the file and is not a config key.
            .merge(Env::prefixed("HELPDESK_").ignore(&["config"]))
    }

    #[allow(clippy::result_large_err)]
    pub fn load(config_path: &str) -> Result<Self, figment::Error>
    {
        let config: Self = Self::figment(config_path).extract()?;

        if config.horizon_days == 0 {
            return Err(figment::Error::from("horizon_days must be at least 1".to_string()));
        }

        Ok(config)
    }
}
