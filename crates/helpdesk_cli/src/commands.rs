use std::io::Write;

use anyhow::bail;
use availability_engine::availability::AvailabilityStatus;
use availability_engine::helpdesk_schedule::HelpdeskSchedule;
use availability_engine::helpdesk_schedule::WindowSource;
use availability_engine::service::ScheduleService;
use availability_engine::store::ScheduleStore;
use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveTime;
use chrono::Utc;
use chrono::Weekday;
use clap::Args;
use clap::Subcommand;
use helpdesk_environment::WEEK;
use helpdesk_environment::presets::SchedulePreset;
use helpdesk_environment::schedule_override::ScheduleOverride;
use helpdesk_environment::weekday_from_index;
use helpdesk_environment::weekday_name;
use helpdesk_environment::weekly_hours::WeeklyHours;

#[derive(Subcommand, Debug)]
pub enum Command
{
    /// Seed the weekly schedule from a preset
    InitSchedule
    {
        #[arg(long, default_value_t = SchedulePreset::BusinessHours)]
        preset: SchedulePreset,
        /// Overwrite days that are already configured
        #[arg(long)]
        force: bool,
    },
    /// Show whether support is available
    Status
    {
        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<FixedOffset>>,
    },
    /// Print the weekly table and upcoming overrides
    Show,
    /// Set the hours for one day of the week (`mon`, `monday` or 0-6)
    SetDay
    {
        #[arg(value_parser = parse_weekday)]
        day: Weekday,
        #[command(flatten)]
        hours: HoursArgs,
    },
    /// Apply a preset to the given days, or to the whole week if none are given
    ApplyPreset
    {
        preset: SchedulePreset,
        #[arg(value_parser = parse_weekday)]
        days: Vec<Weekday>,
    },
    /// Replace the hours of a single date (YYYY-MM-DD)
    SetOverride
    {
        date: NaiveDate,
        #[command(flatten)]
        hours: HoursArgs,
        /// Shown next to the status, e.g. "Holiday"
        #[arg(long)]
        label: Option<String>,
    },
    /// Remove the override for a date, reverting it to the weekly hours
    DeleteOverride
    {
        date: NaiveDate
    },
}

#[derive(Args, Debug, Clone)]
pub struct HoursArgs
{
    /// Support is closed all day
    #[arg(long, conflicts_with_all = ["open", "close"])]
    closed: bool,
    /// Opening time, HH:MM
    #[arg(long, value_parser = parse_time, requires = "close")]
    open: Option<NaiveTime>,
    /// Closing time, HH:MM; the window ends just before it
    #[arg(long, value_parser = parse_time, requires = "open")]
    close: Option<NaiveTime>,
}

impl HoursArgs
{
    /// `(enabled, open_time, close_time)`
    fn resolve(&self) -> anyhow::Result<(bool, NaiveTime, NaiveTime)>
    {
        match (self.closed, self.open, self.close) {
            (true, _, _) => Ok((false, NaiveTime::MIN, NaiveTime::MIN)),
            (false, Some(open_time), Some(close_time)) => Ok((true, open_time, close_time)),
            _ => bail!("either --closed or both --open and --close are required"),
        }
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, chrono::ParseError>
{
    NaiveTime::parse_from_str(value, "%H:%M").or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
}

fn parse_weekday(value: &str) -> Result<Weekday, String>
{
    if let Ok(index) = value.parse::<u8>() {
        return weekday_from_index(index).map_err(|error| error.to_string());
    }
    value
        .parse::<Weekday>()
        .map_err(|_| format!("`{value}` is not a day of the week"))
}

fn parse_instant(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError>
{
    DateTime::parse_from_rfc3339(value)
}

pub fn run<S>(command: &Command, service: &mut ScheduleService<S>, now: DateTime<Utc>, out: &mut impl Write) -> anyhow::Result<()>
where
    S: ScheduleStore,
{
    match command {
        Command::InitSchedule { preset, force } => {
            let configured_days = service.schedule()?.configured_days();
            let outcome = service.initialize_defaults(*preset, *force)?;

            writeln!(out, "Preset: {}", preset.description())?;
            if outcome.created > 0 {
                writeln!(out, "Created schedule for {} day(s)", outcome.created)?;
            }
            if outcome.updated > 0 {
                writeln!(out, "Updated schedule for {} day(s)", outcome.updated)?;
            }
            if outcome.created == 0 && outcome.updated == 0 {
                writeln!(
                    out,
                    "Schedule already exists ({configured_days} days configured). Use --force to reinitialize."
                )?;
            }

            let schedule = service.schedule()?;
            writeln!(out)?;
            write_week(out, &schedule)?;
            writeln!(out)?;
            write_status(out, &schedule.status_at(&now))?;
        }
        Command::Status { at } => {
            let status = match at {
                Some(at) => service.status(at)?,
                None => service.status(&now)?,
            };
            write_status(out, &status)?;
        }
        Command::Show => {
            let schedule = service.schedule()?;
            let today = now.with_timezone(&schedule.timezone()).date_naive();

            write_week(out, &schedule)?;
            writeln!(out)?;
            writeln!(out, "Upcoming overrides:")?;
            let mut upcoming = schedule.upcoming_overrides(today).peekable();
            if upcoming.peek().is_none() {
                writeln!(out, "  none")?;
            }
            for schedule_override in upcoming {
                writeln!(out, "  {schedule_override}")?;
            }
        }
        Command::SetDay { day, hours } => {
            let (enabled, open_time, close_time) = hours.resolve()?;
            let weekly_hours = WeeklyHours::new(*day, enabled, open_time, close_time)?;
            service.upsert_weekly_hours(*day, enabled, open_time, close_time)?;
            writeln!(out, "Updated {weekly_hours}")?;
        }
        Command::ApplyPreset { preset, days } => {
            let updated = service.apply_preset(*preset, days)?;
            writeln!(out, "Applied {} to {updated} day(s)", preset.description())?;
        }
        Command::SetOverride { date, hours, label } => {
            let (enabled, open_time, close_time) = hours.resolve()?;
            let today = now.with_timezone(&service.timezone()).date_naive();
            let schedule_override = ScheduleOverride::new(*date, enabled, open_time, close_time, label.clone())?;
            schedule_override.ensure_not_before(today)?;

            service.upsert_override(*date, enabled, open_time, close_time, label.clone())?;
            writeln!(out, "Saved override {schedule_override}")?;
        }
        Command::DeleteOverride { date } => match service.delete_override(*date)? {
            Some(removed) => writeln!(out, "Removed override {removed}")?,
            None => writeln!(out, "No override for {date}")?,
        },
    }
    Ok(())
}

fn write_week(out: &mut impl Write, schedule: &HelpdeskSchedule) -> anyhow::Result<()>
{
    writeln!(out, "Weekly schedule ({}):", schedule.timezone())?;
    for day in WEEK {
        match schedule.weekly_hours(day) {
            Some(weekly_hours) => writeln!(out, "  {weekly_hours}")?,
            None => writeln!(out, "  {}: Not configured", weekday_name(day))?,
        }
    }
    Ok(())
}

fn write_status(out: &mut impl Write, status: &AvailabilityStatus) -> anyhow::Result<()>
{
    let marker = if status.is_open { "OPEN" } else { "CLOSED" };
    writeln!(out, "[{marker}] {status}")?;

    if let WindowSource::Override { label: Some(label) } = status.source() {
        writeln!(out, "  Special schedule: {label}")?;
    }
    match &status.current_window {
        Some(window) => writeln!(out, "  Open until {}", window.close_time().format("%H:%M"))?,
        None => writeln!(out, "  Next available: {}", status.next_open_description())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use availability_engine::service::ScheduleService;
    use availability_engine::store::InMemoryScheduleStore;
    use chrono::DateTime;
    use chrono::TimeZone;
    use chrono::Utc;
    use chrono::Weekday;
    use chrono_tz::Tz;
    use clap::CommandFactory;
    use clap::Parser;

    use super::run;
    use crate::config::Args;

    fn monday_morning() -> DateTime<Utc>
    {
        Utc.with_ymd_and_hms(2025, 1, 13, 10, 0, 0).unwrap()
    }

    fn execute(service: &mut ScheduleService<InMemoryScheduleStore>, argv: &[&str], now: DateTime<Utc>) -> anyhow::Result<String>
    {
        let args = Args::try_parse_from(std::iter::once("helpdesk").chain(argv.iter().copied()))?;
        let mut out = Vec::new();
        run(&args.command, service, now, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn service() -> ScheduleService<InMemoryScheduleStore>
    {
        ScheduleService::new(InMemoryScheduleStore::default(), Tz::UTC)
    }

    #[test]
    fn test_cli_definition_is_valid()
    {
        Args::command().debug_assert();
    }

    #[test]
    fn test_init_schedule_then_status()
    {
        let mut service = service();

        let output = execute(&mut service, &["init-schedule"], monday_morning()).unwrap();

        assert!(output.contains("Created schedule for 7 day(s)"));
        assert!(output.contains("Monday: 09:00 - 16:30"));
        assert!(output.contains("Sunday: Closed"));
        assert!(output.contains("[OPEN] Support is currently available"));
        assert!(output.contains("Open until 16:30"));

        let output = execute(&mut service, &["init-schedule", "--preset", "extended-hours"], monday_morning()).unwrap();
        assert!(output.contains("Schedule already exists (7 days configured). Use --force to reinitialize."));
        assert!(output.contains("Monday: 09:00 - 16:30"));

        let output = execute(&mut service, &["init-schedule", "--preset", "extended-hours", "--force"], monday_morning()).unwrap();
        assert!(output.contains("Updated schedule for 7 day(s)"));
        assert!(output.contains("Monday: 09:00 - 18:00"));
    }

    #[test]
    fn test_status_at_explicit_instant()
    {
        let mut service = service();
        execute(&mut service, &["init-schedule"], monday_morning()).unwrap();

        let output = execute(&mut service, &["status", "--at", "2025-01-17T18:00:00Z"], monday_morning()).unwrap();

        assert!(output.contains("[CLOSED] Support hours: 09:00 - 16:30"));
        assert!(output.contains("Next available: Monday 2025-01-20 at 09:00"));
    }

    #[test]
    fn test_set_day_and_show()
    {
        let mut service = service();

        let output = execute(&mut service, &["set-day", "sat", "--open", "10:00", "--close", "15:00"], monday_morning()).unwrap();
        assert_eq!(output, "Updated Saturday: 10:00 - 15:00\n");

        execute(&mut service, &["set-day", "6", "--closed"], monday_morning()).unwrap();

        let output = execute(&mut service, &["show"], monday_morning()).unwrap();
        assert!(output.contains("Weekly schedule (UTC):"));
        assert!(output.contains("Monday: Not configured"));
        assert!(output.contains("Saturday: 10:00 - 15:00"));
        assert!(output.contains("Sunday: Closed"));
        assert!(output.contains("Upcoming overrides:\n  none"));
    }

    #[test]
    fn test_set_day_rejects_inverted_hours()
    {
        let mut service = service();

        let error = execute(&mut service, &["set-day", "monday", "--open", "17:00", "--close", "09:00"], monday_morning()).unwrap_err();

        assert!(error.to_string().contains("must be before close time"));
        assert!(service.store().records().weekly_hours.is_empty());
    }

    #[test]
    fn test_hours_flags_are_validated_by_clap()
    {
        assert!(Args::try_parse_from(["helpdesk", "set-day", "mon", "--open", "09:00"]).is_err());
        assert!(Args::try_parse_from(["helpdesk", "set-day", "mon", "--closed", "--open", "09:00", "--close", "10:00"]).is_err());
        assert!(Args::try_parse_from(["helpdesk", "set-day", "someday", "--closed"]).is_err());
        assert!(Args::try_parse_from(["helpdesk", "set-day", "7", "--closed"]).is_err());

        let mut service = service();
        assert!(execute(&mut service, &["set-day", "mon"], monday_morning()).is_err());
    }

    #[test]
    fn test_override_lifecycle()
    {
        let mut service = service();
        execute(&mut service, &["init-schedule"], monday_morning()).unwrap();

        let output = execute(&mut service, &["set-override", "2025-01-14", "--closed", "--label", "Holiday"], monday_morning()).unwrap();
        assert_eq!(output, "Saved override 2025-01-14: Closed (Holiday)\n");

        let output = execute(&mut service, &["status", "--at", "2025-01-14T10:00:00Z"], monday_morning()).unwrap();
        assert!(output.contains("[CLOSED] Support is closed today (Holiday)"));
        assert!(output.contains("Special schedule: Holiday"));
        assert!(output.contains("Next available: Tomorrow (Wednesday) at 09:00"));

        let output = execute(&mut service, &["show"], monday_morning()).unwrap();
        assert!(output.contains("  2025-01-14: Closed (Holiday)"));

        let output = execute(&mut service, &["delete-override", "2025-01-14"], monday_morning()).unwrap();
        assert_eq!(output, "Removed override 2025-01-14: Closed (Holiday)\n");
        let output = execute(&mut service, &["delete-override", "2025-01-14"], monday_morning()).unwrap();
        assert_eq!(output, "No override for 2025-01-14\n");
    }

    #[test]
    fn test_override_in_past_is_rejected()
    {
        let mut service = service();

        let error = execute(&mut service, &["set-override", "2025-01-10", "--closed"], monday_morning()).unwrap_err();

        assert!(error.to_string().contains("before 2025-01-13"));
        assert!(service.store().records().overrides.is_empty());
    }

    #[test]
    fn test_apply_preset_to_selected_days()
    {
        let mut service = service();
        execute(&mut service, &["init-schedule"], monday_morning()).unwrap();

        let output = execute(&mut service, &["apply-preset", "weekend-support", "sat", "sun"], monday_morning()).unwrap();
        assert_eq!(output, "Applied Weekend Support (10 AM - 3 PM, Sat-Sun) to 2 day(s)\n");

        let schedule = service.schedule().unwrap();
        assert!(schedule.weekly_hours(Weekday::Sat).unwrap().enabled());
        assert!(schedule.weekly_hours(Weekday::Mon).unwrap().enabled());
    }

    #[test]
    fn test_apply_preset_opens_a_weekend_day()
    {
        let mut service = service();
        execute(&mut service, &["init-schedule"], monday_morning()).unwrap();

        execute(&mut service, &["apply-preset", "business-hours", "sat"], monday_morning()).unwrap();

        let output = execute(&mut service, &["show"], monday_morning()).unwrap();
        assert!(output.contains("Saturday: 09:00 - 16:30"));
        assert!(output.contains("Sunday: Closed"));
    }
}
