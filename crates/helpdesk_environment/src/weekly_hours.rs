use std::fmt;

use chrono::NaiveTime;
use chrono::Weekday;
use serde::Deserialize;
use serde::Serialize;

use crate::DayOfWeekIndex;
use crate::OpeningWindow;
use crate::ScheduleError;
use crate::day_of_week_index;
use crate::weekday_from_index;
use crate::weekday_name;

/// Recurring support hours for one day of the week.
///
/// The times of a disabled entry are kept so that re-enabling a day restores
/// its previous hours, but they never take part in availability decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WeeklyHoursRecord", into = "WeeklyHoursRecord")]
pub struct WeeklyHours
{
    day_of_week: Weekday,
    enabled: bool,
    open_time: NaiveTime,
    close_time: NaiveTime,
}

/// Persisted row shape of [`WeeklyHours`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyHoursRecord
{
    pub day_of_week: DayOfWeekIndex,
    pub enabled: bool,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
}

impl WeeklyHours
{
    pub fn new(day_of_week: Weekday, enabled: bool, open_time: NaiveTime, close_time: NaiveTime) -> Result<Self, ScheduleError>
    {
        if enabled {
            OpeningWindow::new(open_time, close_time)?;
        }

        Ok(Self {
            day_of_week,
            enabled,
            open_time,
            close_time,
        })
    }

    pub fn open(day_of_week: Weekday, window: OpeningWindow) -> Self
    {
        Self {
            day_of_week,
            enabled: true,
            open_time: window.open_time(),
            close_time: window.close_time(),
        }
    }

    pub fn closed(day_of_week: Weekday) -> Self
    {
        Self {
            day_of_week,
            enabled: false,
            open_time: NaiveTime::MIN,
            close_time: NaiveTime::MIN,
        }
    }

    pub fn day_of_week(&self) -> Weekday
    {
        self.day_of_week
    }

    pub fn enabled(&self) -> bool
    {
        self.enabled
    }

    pub fn open_time(&self) -> NaiveTime
    {
        self.open_time
    }

    pub fn close_time(&self) -> NaiveTime
    {
        self.close_time
    }

    /// `None` when the day is closed.
    pub fn window(&self) -> Option<OpeningWindow>
    {
        self.enabled.then(|| OpeningWindow::from_ordered(self.open_time, self.close_time))
    }
}

impl TryFrom<WeeklyHoursRecord> for WeeklyHours
{
    type Error = ScheduleError;

    fn try_from(record: WeeklyHoursRecord) -> Result<Self, Self::Error>
    {
        let day_of_week = weekday_from_index(record.day_of_week)?;
        Self::new(day_of_week, record.enabled, record.open_time, record.close_time)
    }
}

impl From<WeeklyHours> for WeeklyHoursRecord
{
    fn from(weekly_hours: WeeklyHours) -> Self
    {
        Self {
            day_of_week: day_of_week_index(weekly_hours.day_of_week),
            enabled: weekly_hours.enabled,
            open_time: weekly_hours.open_time,
            close_time: weekly_hours.close_time,
        }
    }
}

impl fmt::Display for WeeklyHours
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.window() {
            Some(window) => write!(f, "{}: {}", weekday_name(self.day_of_week), window),
            None => write!(f, "{}: Closed", weekday_name(self.day_of_week)),
        }
    }
}
