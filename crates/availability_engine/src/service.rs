use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveTime;
use chrono::TimeZone;
use chrono::Weekday;
use chrono_tz::Tz;
use helpdesk_environment::ScheduleError;
use helpdesk_environment::presets::SchedulePreset;
use helpdesk_environment::schedule_override::ScheduleOverride;
use helpdesk_environment::weekly_hours::WeeklyHours;
use tracing::info;
use tracing::warn;

use crate::availability::AvailabilityStatus;
use crate::availability::OpenWindow;
use crate::helpdesk_schedule::HelpdeskSchedule;
use crate::helpdesk_schedule::InitializeOutcome;
use crate::helpdesk_schedule::NEXT_WINDOW_HORIZON_DAYS;
use crate::store::ScheduleStore;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError<E>
{
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("schedule store failed")]
    Store(#[source] E),
}

/// Query and mutation interface over a [`ScheduleStore`].
///
/// Each mutation loads the records, applies the change to a fresh
/// [`HelpdeskSchedule`] and saves once. A change rejected by validation is
/// never saved. Store failures are returned as they are.
#[derive(Debug)]
pub struct ScheduleService<S>
{
    store: S,
    timezone: Tz,
    horizon_days: u32,
}

impl<S> ScheduleService<S>
where
    S: ScheduleStore,
{
    pub fn new(store: S, timezone: Tz) -> Self
    {
        Self {
            store,
            timezone,
            horizon_days: NEXT_WINDOW_HORIZON_DAYS,
        }
    }

    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self
    {
        self.horizon_days = horizon_days;
        self
    }

    pub fn store(&self) -> &S
    {
        &self.store
    }

    pub fn timezone(&self) -> Tz
    {
        self.timezone
    }

    pub fn schedule(&self) -> Result<HelpdeskSchedule, ServiceError<S::Error>>
    {
        let records = self.store.load().map_err(ServiceError::Store)?;
        Ok(HelpdeskSchedule::from_records(self.timezone, records).with_horizon_days(self.horizon_days))
    }

    pub fn status<T: TimeZone>(&self, now: &DateTime<T>) -> Result<AvailabilityStatus, ServiceError<S::Error>>
    {
        Ok(self.schedule()?.status_at(now))
    }

    pub fn is_open_at<T: TimeZone>(&self, now: &DateTime<T>) -> Result<bool, ServiceError<S::Error>>
    {
        Ok(self.schedule()?.is_open_at(now))
    }

    pub fn next_open_window<T: TimeZone>(&self, now: &DateTime<T>) -> Result<Option<OpenWindow>, ServiceError<S::Error>>
    {
        Ok(self.schedule()?.next_open_window(now))
    }

    pub fn upsert_weekly_hours(
        &mut self,
        day: Weekday,
        enabled: bool,
        open_time: NaiveTime,
        close_time: NaiveTime,
    ) -> Result<Option<WeeklyHours>, ServiceError<S::Error>>
    {
        self.mutate("upsert_weekly_hours", |schedule| schedule.upsert_weekly_hours(day, enabled, open_time, close_time))
    }

    pub fn upsert_override(
        &mut self,
        date: NaiveDate,
        enabled: bool,
        open_time: NaiveTime,
        close_time: NaiveTime,
        label: Option<String>,
    ) -> Result<Option<ScheduleOverride>, ServiceError<S::Error>>
    {
        self.mutate("upsert_override", |schedule| schedule.upsert_override(date, enabled, open_time, close_time, label))
    }

    pub fn delete_override(&mut self, date: NaiveDate) -> Result<Option<ScheduleOverride>, ServiceError<S::Error>>
    {
        self.mutate("delete_override", |schedule| Ok(schedule.delete_override(date)))
    }

    pub fn apply_preset(&mut self, preset: SchedulePreset, days: &[Weekday]) -> Result<usize, ServiceError<S::Error>>
    {
        self.mutate("apply_preset", |schedule| Ok(schedule.apply_preset(preset, days)))
    }

    pub fn initialize_defaults(&mut self, preset: SchedulePreset, force: bool) -> Result<InitializeOutcome, ServiceError<S::Error>>
    {
        self.mutate("initialize_defaults", |schedule| Ok(schedule.initialize_defaults(preset, force)))
    }

    fn mutate<R>(
        &mut self,
        operation: &'static str,
        change: impl FnOnce(&mut HelpdeskSchedule) -> Result<R, ScheduleError>,
    ) -> Result<R, ServiceError<S::Error>>
    {
        let mut schedule = self.schedule()?;

        let result = change(&mut schedule).inspect_err(|error| {
            warn!(operation, %error, "rejected schedule change");
        })?;

        self.store.save(&schedule.records()).map_err(ServiceError::Store)?;
        info!(operation, "schedule saved");
        Ok(result)
    }
}
