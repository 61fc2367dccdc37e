use std::fmt;

use chrono::NaiveDate;
use chrono::NaiveTime;
use chrono::TimeDelta;
use chrono::Weekday;
use serde::Serialize;

pub mod presets;
pub mod schedule_override;
pub mod weekly_hours;

pub type DayOfWeekIndex = u8;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError
{
    #[error("open time {open_time} must be before close time {close_time}")]
    InvalidTimeOrder
    {
        open_time: NaiveTime,
        close_time: NaiveTime,
    },
    #[error("day of week must be between 0 (Monday) and 6 (Sunday), got {0}")]
    InvalidDayOfWeek(DayOfWeekIndex),
    #[error("cannot create an override for {date}, it is before {today}")]
    OverrideInPast
    {
        date: NaiveDate,
        today: NaiveDate,
    },
    #[error("unknown schedule preset `{0}`")]
    UnknownPreset(String),
}

/// The `[open_time, close_time)` span during which support is staffed on a
/// single day. The close boundary itself is outside the window.
#[derive(Hash, Copy, Clone, Debug, PartialEq, PartialOrd, Ord, Eq, Serialize)]
pub struct OpeningWindow
{
    open_time: NaiveTime,
    close_time: NaiveTime,
}

impl OpeningWindow
{
    pub fn new(open_time: NaiveTime, close_time: NaiveTime) -> Result<Self, ScheduleError>
    {
        if open_time >= close_time {
            return Err(ScheduleError::InvalidTimeOrder { open_time, close_time });
        }
        Ok(Self { open_time, close_time })
    }

    /// Caller guarantees `open_time < close_time`.
    pub(crate) const fn from_ordered(open_time: NaiveTime, close_time: NaiveTime) -> Self
    {
        Self { open_time, close_time }
    }

    pub fn open_time(&self) -> NaiveTime
    {
        self.open_time
    }

    pub fn close_time(&self) -> NaiveTime
    {
        self.close_time
    }

    pub fn contains(&self, time: NaiveTime) -> bool
    {
        self.open_time <= time && time < self.close_time
    }

    /// True once `time` has reached the close boundary.
    pub fn has_elapsed_at(&self, time: NaiveTime) -> bool
    {
        self.close_time <= time
    }

    pub fn duration(&self) -> TimeDelta
    {
        self.close_time - self.open_time
    }
}

impl fmt::Display for OpeningWindow
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} - {}", self.open_time.format("%H:%M"), self.close_time.format("%H:%M"))
    }
}

pub fn day_of_week_index(day: Weekday) -> DayOfWeekIndex
{
    day.num_days_from_monday() as DayOfWeekIndex
}

pub fn weekday_from_index(index: DayOfWeekIndex) -> Result<Weekday, ScheduleError>
{
    Weekday::try_from(index).map_err(|_| ScheduleError::InvalidDayOfWeek(index))
}

pub fn weekday_name(day: Weekday) -> &'static str
{
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Monday first, matching the 0..=6 day index.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];
