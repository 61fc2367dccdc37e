use std::collections::BTreeMap;

use chrono::Datelike;
use chrono::NaiveDate;
use chrono::NaiveTime;
use chrono::Weekday;
use chrono_tz::Tz;
use helpdesk_environment::OpeningWindow;
use helpdesk_environment::ScheduleError;
use helpdesk_environment::presets::SchedulePreset;
use helpdesk_environment::schedule_override::ScheduleOverride;
use helpdesk_environment::weekly_hours::WeeklyHours;
use serde::Serialize;
use tracing::debug;

use crate::store::ScheduleRecords;

/// How far `next_open_window` looks ahead, in calendar days.
pub const NEXT_WINDOW_HORIZON_DAYS: u32 = 14;

/// Snapshot of the support-hours configuration for one timezone.
///
/// Every availability query is a pure function of this value and the query
/// instant. Mutations only touch the in-memory snapshot; persisting it is the
/// job of [`crate::service::ScheduleService`].
#[derive(Clone, Debug, PartialEq)]
pub struct HelpdeskSchedule
{
    timezone: Tz,
    horizon_days: u32,
    /// Indexed by `Weekday::num_days_from_monday`.
    weekly_hours: [Option<WeeklyHours>; 7],
    overrides: BTreeMap<NaiveDate, ScheduleOverride>,
}

/// Where the hours for a date came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowSource
{
    Weekly
    {
        day_of_week: Weekday
    },
    Override
    {
        label: Option<String>
    },
    NotConfigured,
}

/// Effective hours of a single calendar date after override resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayResolution
{
    date: NaiveDate,
    source: WindowSource,
    window: Option<OpeningWindow>,
}

impl DayResolution
{
    pub fn date(&self) -> NaiveDate
    {
        self.date
    }

    pub fn source(&self) -> &WindowSource
    {
        &self.source
    }

    /// `None` means closed for the whole date.
    pub fn window(&self) -> Option<OpeningWindow>
    {
        self.window
    }

    pub fn is_open_at(&self, time: NaiveTime) -> bool
    {
        self.window.is_some_and(|window| window.contains(time))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InitializeOutcome
{
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Public methods
impl HelpdeskSchedule
{
    pub fn new(timezone: Tz) -> Self
    {
        Self {
            timezone,
            horizon_days: NEXT_WINDOW_HORIZON_DAYS,
            weekly_hours: [None; 7],
            overrides: BTreeMap::new(),
        }
    }

    /// Later records win when the same day or date appears more than once.
    pub fn from_records(timezone: Tz, records: ScheduleRecords) -> Self
    {
        let mut schedule = Self::new(timezone);
        for weekly_hours in records.weekly_hours {
            schedule.put_weekly_hours(weekly_hours);
        }
        for schedule_override in records.overrides {
            schedule.put_override(schedule_override);
        }
        schedule
    }

    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self
    {
        self.horizon_days = horizon_days;
        self
    }

    pub fn records(&self) -> ScheduleRecords
    {
        ScheduleRecords {
            weekly_hours: self.weekly_hours.iter().flatten().copied().collect(),
            overrides: self.overrides.values().cloned().collect(),
        }
    }

    pub fn timezone(&self) -> Tz
    {
        self.timezone
    }

    pub fn horizon_days(&self) -> u32
    {
        self.horizon_days
    }

    pub fn weekly_hours(&self, day: Weekday) -> Option<&WeeklyHours>
    {
        self.weekly_hours[day.num_days_from_monday() as usize].as_ref()
    }

    /// Monday to Sunday, skipping days without an entry.
    pub fn weekly_table(&self) -> impl Iterator<Item = &WeeklyHours>
    {
        self.weekly_hours.iter().flatten()
    }

    pub fn configured_days(&self) -> usize
    {
        self.weekly_table().count()
    }

    pub fn override_for(&self, date: NaiveDate) -> Option<&ScheduleOverride>
    {
        self.overrides.get(&date)
    }

    /// Overrides dated `from` or later, in date order.
    pub fn upcoming_overrides(&self, from: NaiveDate) -> impl Iterator<Item = &ScheduleOverride>
    {
        self.overrides.range(from..).map(|(_, schedule_override)| schedule_override)
    }

    pub fn overrides(&self) -> impl Iterator<Item = &ScheduleOverride>
    {
        self.overrides.values()
    }

    /// An override for `date` decides alone; otherwise the weekly entry for
    /// its weekday applies. No data at all resolves to closed.
    pub fn resolve(&self, date: NaiveDate) -> DayResolution
    {
        if let Some(schedule_override) = self.overrides.get(&date) {
            return DayResolution {
                date,
                source: WindowSource::Override {
                    label: schedule_override.label().map(str::to_string),
                },
                window: schedule_override.window(),
            };
        }

        match self.weekly_hours(date.weekday()) {
            Some(weekly_hours) => DayResolution {
                date,
                source: WindowSource::Weekly {
                    day_of_week: weekly_hours.day_of_week(),
                },
                window: weekly_hours.window(),
            },
            None => DayResolution {
                date,
                source: WindowSource::NotConfigured,
                window: None,
            },
        }
    }
}

/// Mutations. Validation happens before anything is written, so a rejected
/// call leaves the snapshot untouched.
impl HelpdeskSchedule
{
    /// Returns the entry that was replaced, if any.
    pub fn upsert_weekly_hours(
        &mut self,
        day: Weekday,
        enabled: bool,
        open_time: NaiveTime,
        close_time: NaiveTime,
    ) -> Result<Option<WeeklyHours>, ScheduleError>
    {
        let weekly_hours = WeeklyHours::new(day, enabled, open_time, close_time)?;
        Ok(self.put_weekly_hours(weekly_hours))
    }

    /// Returns the override that was replaced, if any. Nothing of the
    /// replaced override is merged into the new one.
    pub fn upsert_override(
        &mut self,
        date: NaiveDate,
        enabled: bool,
        open_time: NaiveTime,
        close_time: NaiveTime,
        label: Option<String>,
    ) -> Result<Option<ScheduleOverride>, ScheduleError>
    {
        let schedule_override = ScheduleOverride::new(date, enabled, open_time, close_time, label)?;
        Ok(self.put_override(schedule_override))
    }

    /// Absent dates are not an error.
    pub fn delete_override(&mut self, date: NaiveDate) -> Option<ScheduleOverride>
    {
        self.overrides.remove(&date)
    }

    pub fn put_weekly_hours(&mut self, weekly_hours: WeeklyHours) -> Option<WeeklyHours>
    {
        let index = weekly_hours.day_of_week().num_days_from_monday() as usize;
        self.weekly_hours[index].replace(weekly_hours)
    }

    pub fn put_override(&mut self, schedule_override: ScheduleOverride) -> Option<ScheduleOverride>
    {
        self.overrides.insert(schedule_override.date(), schedule_override)
    }

    /// Overwrites the selected days with the preset's window, even days the
    /// preset does not usually open. An empty selection applies the preset's
    /// whole week, closing the days outside its usual set.
    pub fn apply_preset(&mut self, preset: SchedulePreset, days: &[Weekday]) -> usize
    {
        let applied = if days.is_empty() {
            preset.week().into_iter().map(|weekly_hours| self.put_weekly_hours(weekly_hours)).count()
        } else {
            days.iter().map(|&day| self.put_weekly_hours(preset.hours_for_selected(day))).count()
        };
        debug!(target: "developer", %preset, days = applied, "applied schedule preset");
        applied
    }

    /// Seeds the week from `preset`. Missing days are created; existing days
    /// are only overwritten when `force` is set.
    pub fn initialize_defaults(&mut self, preset: SchedulePreset, force: bool) -> InitializeOutcome
    {
        let mut outcome = InitializeOutcome::default();
        for weekly_hours in preset.week() {
            let index = weekly_hours.day_of_week().num_days_from_monday() as usize;
            match self.weekly_hours[index] {
                None => {
                    self.weekly_hours[index] = Some(weekly_hours);
                    outcome.created += 1;
                }
                Some(_) if force => {
                    self.weekly_hours[index] = Some(weekly_hours);
                    outcome.updated += 1;
                }
                Some(_) => outcome.unchanged += 1,
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests
{
    use chrono::NaiveDate;
    use chrono::NaiveTime;
    use chrono::Weekday;
    use chrono_tz::Tz;
    use helpdesk_environment::ScheduleError;
    use helpdesk_environment::presets::SchedulePreset;

    use super::HelpdeskSchedule;
    use super::InitializeOutcome;
    use super::WindowSource;

    fn time(hour: u32, minute: u32) -> NaiveTime
    {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    // 2025-01-13 is a Monday.
    fn monday() -> NaiveDate
    {
        NaiveDate::from_ymd_opt(2025, 1, 13).unwrap()
    }

    #[test]
    fn test_resolve_without_configuration_is_closed()
    {
        let schedule = HelpdeskSchedule::new(Tz::UTC);
        let resolution = schedule.resolve(monday());

        assert_eq!(resolution.source(), &WindowSource::NotConfigured);
        assert_eq!(resolution.window(), None);
    }

    #[test]
    fn test_override_shadows_weekly_hours()
    {
        let mut schedule = HelpdeskSchedule::new(Tz::UTC);
        schedule.upsert_weekly_hours(Weekday::Mon, true, time(9, 0), time(16, 30)).unwrap();
        schedule
            .upsert_override(monday(), true, time(12, 0), time(14, 0), Some("Staff training".to_string()))
            .unwrap();

        let resolution = schedule.resolve(monday());

        assert_eq!(
            resolution.source(),
            &WindowSource::Override {
                label: Some("Staff training".to_string())
            }
        );
        assert!(!resolution.is_open_at(time(10, 0)));
        assert!(resolution.is_open_at(time(12, 0)));

        // The following Monday has no override and falls back to the weekly entry.
        let next_monday = schedule.resolve(monday() + chrono::Days::new(7));
        assert!(next_monday.is_open_at(time(10, 0)));
    }

    #[test]
    fn test_rejected_upsert_does_not_mutate()
    {
        let mut schedule = HelpdeskSchedule::new(Tz::UTC);
        schedule.upsert_weekly_hours(Weekday::Wed, true, time(9, 0), time(17, 0)).unwrap();
        let before = schedule.clone();

        let result = schedule.upsert_weekly_hours(Weekday::Wed, true, time(17, 0), time(17, 0));

        assert_eq!(
            result,
            Err(ScheduleError::InvalidTimeOrder {
                open_time: time(17, 0),
                close_time: time(17, 0),
            })
        );
        assert_eq!(schedule, before);
    }

    #[test]
    fn test_upsert_override_replaces_without_merge()
    {
        let mut schedule = HelpdeskSchedule::new(Tz::UTC);
        schedule
            .upsert_override(monday(), true, time(8, 0), time(22, 0), Some("Finals Week".to_string()))
            .unwrap();
        let replaced = schedule.upsert_override(monday(), false, time(0, 0), time(0, 0), None).unwrap();

        assert_eq!(replaced.unwrap().label(), Some("Finals Week"));
        let stored = schedule.override_for(monday()).unwrap();
        assert!(!stored.enabled());
        assert_eq!(stored.label(), None);
    }

    #[test]
    fn test_delete_missing_override_is_a_no_op()
    {
        let mut schedule = HelpdeskSchedule::new(Tz::UTC);
        let before = schedule.clone();

        assert_eq!(schedule.delete_override(monday()), None);
        assert_eq!(schedule, before);
    }

    #[test]
    fn test_upsert_weekly_hours_is_idempotent()
    {
        let mut schedule = HelpdeskSchedule::new(Tz::UTC);
        schedule.upsert_weekly_hours(Weekday::Fri, true, time(9, 0), time(12, 0)).unwrap();
        let first = schedule.clone();
        schedule.upsert_weekly_hours(Weekday::Fri, true, time(9, 0), time(12, 0)).unwrap();

        assert_eq!(schedule, first);
        assert_eq!(schedule.configured_days(), 1);
    }

    #[test]
    fn test_initialize_defaults_respects_force()
    {
        let mut schedule = HelpdeskSchedule::new(Tz::UTC);
        schedule.upsert_weekly_hours(Weekday::Mon, true, time(7, 0), time(8, 0)).unwrap();

        let outcome = schedule.initialize_defaults(SchedulePreset::BusinessHours, false);
        assert_eq!(
            outcome,
            InitializeOutcome {
                created: 6,
                updated: 0,
                unchanged: 1
            }
        );
        assert_eq!(schedule.weekly_hours(Weekday::Mon).unwrap().close_time(), time(8, 0));

        let outcome = schedule.initialize_defaults(SchedulePreset::ExtendedHours, true);
        assert_eq!(outcome.updated, 7);
        assert_eq!(schedule.weekly_hours(Weekday::Mon).unwrap().close_time(), time(18, 0));
        assert!(!schedule.weekly_hours(Weekday::Sun).unwrap().enabled());
    }

    #[test]
    fn test_apply_preset_to_selected_days()
    {
        let mut schedule = HelpdeskSchedule::new(Tz::UTC);
        schedule.initialize_defaults(SchedulePreset::BusinessHours, false);

        let applied = schedule.apply_preset(SchedulePreset::WeekendSupport, &[Weekday::Sat]);

        assert_eq!(applied, 1);
        assert!(schedule.weekly_hours(Weekday::Sat).unwrap().enabled());
        assert!(!schedule.weekly_hours(Weekday::Sun).unwrap().enabled());
        assert!(schedule.weekly_hours(Weekday::Mon).unwrap().enabled());

        assert_eq!(schedule.apply_preset(SchedulePreset::AllClosed, &[]), 7);
        assert!(schedule.weekly_table().all(|weekly_hours| !weekly_hours.enabled()));
    }

    #[test]
    fn test_apply_preset_opens_selected_days_outside_its_usual_set()
    {
        let mut schedule = HelpdeskSchedule::new(Tz::UTC);
        schedule.initialize_defaults(SchedulePreset::BusinessHours, false);

        schedule.apply_preset(SchedulePreset::BusinessHours, &[Weekday::Sat]);
        schedule.apply_preset(SchedulePreset::WeekendSupport, &[Weekday::Mon]);

        let saturday = schedule.weekly_hours(Weekday::Sat).unwrap();
        assert!(saturday.enabled());
        assert_eq!(saturday.to_string(), "Saturday: 09:00 - 16:30");
        assert_eq!(schedule.weekly_hours(Weekday::Mon).unwrap().to_string(), "Monday: 10:00 - 15:00");
        assert!(!schedule.weekly_hours(Weekday::Sun).unwrap().enabled());

        schedule.apply_preset(SchedulePreset::AllClosed, &[Weekday::Sat]);
        assert!(!schedule.weekly_hours(Weekday::Sat).unwrap().enabled());
        assert!(schedule.weekly_hours(Weekday::Tue).unwrap().enabled());
    }

    #[test]
    fn test_records_round_trip()
    {
        let mut schedule = HelpdeskSchedule::new(Tz::Europe__Oslo);
        schedule.initialize_defaults(SchedulePreset::FinalsWeek, false);
        schedule.upsert_override(monday(), false, time(0, 0), time(0, 0), Some("Holiday".to_string())).unwrap();

        let restored = HelpdeskSchedule::from_records(Tz::Europe__Oslo, schedule.records());

        assert_eq!(restored, schedule);
        assert_eq!(restored.upcoming_overrides(monday()).count(), 1);
        assert_eq!(restored.upcoming_overrides(monday() + chrono::Days::new(1)).count(), 0);
    }
}
