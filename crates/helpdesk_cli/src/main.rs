use anyhow::Context;
use availability_engine::service::ScheduleService;
use chrono::Utc;
use clap::Parser;
use helpdesk_cli::commands;
use helpdesk_cli::config::Args;
use helpdesk_cli::config::Config;
use helpdesk_cli::json_store::JsonFileStore;
use helpdesk_cli::telemetry;

fn main() -> anyhow::Result<()>
{
    let args = Args::parse();

    let config = Config::load(&args.config).with_context(|| format!("failed to load configuration from {}", args.config))?;

    telemetry::init_logging()?;
    tracing::debug!(?config, "configuration loaded");

    let store = JsonFileStore::new(&config.schedule_path);
    let mut service = ScheduleService::new(store, config.timezone).with_horizon_days(config.horizon_days);

    let mut stdout = std::io::stdout().lock();
    commands::run(&args.command, &mut service, Utc::now(), &mut stdout)
}
