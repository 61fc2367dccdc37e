use std::fmt;

use chrono::DateTime;
use chrono::Datelike;
use chrono::Days;
use chrono::NaiveDate;
use chrono::NaiveTime;
use chrono::TimeDelta;
use chrono::TimeZone;
use chrono_tz::Tz;
use helpdesk_environment::OpeningWindow;
use helpdesk_environment::weekday_name;
use serde::Serialize;

use crate::helpdesk_schedule::DayResolution;
use crate::helpdesk_schedule::HelpdeskSchedule;
use crate::helpdesk_schedule::WindowSource;

// No timezone skips more than two hours of wall-clock time.
const MAX_DST_GAP_MINUTES: i64 = 120;

/// A concrete staffed interval on a specific date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OpenWindow
{
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    source: WindowSource,
}

impl OpenWindow
{
    pub fn start(&self) -> DateTime<Tz>
    {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz>
    {
        self.end
    }

    pub fn source(&self) -> &WindowSource
    {
        &self.source
    }
}

/// Live status shown on the landing page and the technician dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AvailabilityStatus
{
    pub queried_at: DateTime<Tz>,
    pub is_open: bool,
    pub current_window: Option<OpeningWindow>,
    /// Only set while closed.
    pub next_open_at: Option<DateTime<Tz>>,
    pub today: DayResolution,
}

impl AvailabilityStatus
{
    pub fn source(&self) -> &WindowSource
    {
        self.today.source()
    }

    pub fn next_open_description(&self) -> String
    {
        let Some(next_open_at) = self.next_open_at else {
            return if self.is_open { "Now".to_string() } else { "Schedule not available".to_string() };
        };

        let at = next_open_at.format("%H:%M");
        let day_name = weekday_name(next_open_at.weekday());
        match (next_open_at.date_naive() - self.queried_at.date_naive()).num_days() {
            0 => format!("Today at {at}"),
            1 => format!("Tomorrow ({day_name}) at {at}"),
            _ => format!("{day_name} {} at {at}", next_open_at.date_naive()),
        }
    }
}

impl fmt::Display for AvailabilityStatus
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.is_open {
            return f.write_str("Support is currently available");
        }

        match (self.today.source(), self.today.window()) {
            (WindowSource::Override { label: Some(label) }, Some(window)) => write!(f, "Special hours today: {window} ({label})"),
            (WindowSource::Override { label: None }, Some(window)) => write!(f, "Special hours today: {window}"),
            (_, Some(window)) => write!(f, "Support hours: {window}"),
            (WindowSource::Weekly { day_of_week }, None) => write!(f, "Support is closed on {}s", weekday_name(*day_of_week)),
            (WindowSource::Override { label: Some(label) }, None) => write!(f, "Support is closed today ({label})"),
            (WindowSource::Override { label: None }, None) => f.write_str("Support is closed today"),
            (WindowSource::NotConfigured, None) => f.write_str("Schedule not configured for this day"),
        }
    }
}

/// Availability queries. The instant may be in any timezone; dates and
/// times of day are always evaluated in the schedule's timezone.
impl HelpdeskSchedule
{
    pub fn is_open_at<T: TimeZone>(&self, instant: &DateTime<T>) -> bool
    {
        let local = instant.with_timezone(&self.timezone());
        self.resolve(local.date_naive()).is_open_at(local.time())
    }

    pub fn next_open_window<T: TimeZone>(&self, instant: &DateTime<T>) -> Option<OpenWindow>
    {
        self.next_open_window_within(instant, self.horizon_days())
    }

    /// First window, scanning `horizon_days` dates starting with the
    /// instant's own date, that has not fully elapsed. A window that is
    /// open at `instant` counts, so its start may lie in the past.
    pub fn next_open_window_within<T: TimeZone>(&self, instant: &DateTime<T>, horizon_days: u32) -> Option<OpenWindow>
    {
        let local = instant.with_timezone(&self.timezone());
        let today = local.date_naive();

        for offset in 0..horizon_days {
            let date = today.checked_add_days(Days::new(u64::from(offset)))?;
            let resolution = self.resolve(date);
            let Some(window) = resolution.window() else {
                continue;
            };
            let Some(end) = self.localize(date, window.close_time()) else {
                continue;
            };
            if end <= local {
                continue;
            }
            let Some(start) = self.localize(date, window.open_time()) else {
                continue;
            };
            // Both ends inside one DST gap collapse to the same instant.
            if start >= end {
                continue;
            }

            return Some(OpenWindow {
                start,
                end,
                source: resolution.source().clone(),
            });
        }
        None
    }

    pub fn status_at<T: TimeZone>(&self, instant: &DateTime<T>) -> AvailabilityStatus
    {
        let local = instant.with_timezone(&self.timezone());
        let today = self.resolve(local.date_naive());
        let is_open = today.is_open_at(local.time());

        let next_open_at = if is_open {
            None
        } else {
            self.next_open_window(&local).map(|window| window.start())
        };

        AvailabilityStatus {
            queried_at: local,
            is_open,
            current_window: if is_open { today.window() } else { None },
            next_open_at,
            today,
        }
    }

    /// Ambiguous local times take the earlier instant; times skipped by a
    /// DST gap move forward to the first minute that exists.
    fn localize(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>>
    {
        let timezone = self.timezone();
        let local = date.and_time(time);

        timezone.from_local_datetime(&local).earliest().or_else(|| {
            (1..=MAX_DST_GAP_MINUTES)
                .find_map(|minutes| timezone.from_local_datetime(&(local + TimeDelta::minutes(minutes))).earliest())
        })
    }
}
