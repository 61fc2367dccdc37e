use std::fmt;

use chrono::NaiveDate;
use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;

use crate::OpeningWindow;
use crate::ScheduleError;

/// Replaces the weekly hours for one calendar date, e.g. a holiday closure or
/// extended hours during finals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleOverrideRecord", into = "ScheduleOverrideRecord")]
pub struct ScheduleOverride
{
    date: NaiveDate,
    enabled: bool,
    open_time: NaiveTime,
    close_time: NaiveTime,
    label: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOverrideRecord
{
    pub date: NaiveDate,
    pub enabled: bool,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ScheduleOverride
{
    pub fn new(date: NaiveDate, enabled: bool, open_time: NaiveTime, close_time: NaiveTime, label: Option<String>) -> Result<Self, ScheduleError>
    {
        if enabled {
            OpeningWindow::new(open_time, close_time)?;
        }

        Ok(Self {
            date,
            enabled,
            open_time,
            close_time,
            label: label.filter(|label| !label.trim().is_empty()),
        })
    }

    pub fn closed(date: NaiveDate, label: Option<String>) -> Self
    {
        Self {
            date,
            enabled: false,
            open_time: NaiveTime::MIN,
            close_time: NaiveTime::MIN,
            label: label.filter(|label| !label.trim().is_empty()),
        }
    }

    pub fn date(&self) -> NaiveDate
    {
        self.date
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

    pub fn label(&self) -> Option<&str>
    {
        self.label.as_deref()
    }

    pub fn window(&self) -> Option<OpeningWindow>
    {
        self.enabled.then(|| OpeningWindow::from_ordered(self.open_time, self.close_time))
    }

    /// Managers may only schedule overrides for today or later.
    pub fn ensure_not_before(&self, today: NaiveDate) -> Result<(), ScheduleError>
    {
        if self.date < today {
            return Err(ScheduleError::OverrideInPast { date: self.date, today });
        }
        Ok(())
    }
}

impl TryFrom<ScheduleOverrideRecord> for ScheduleOverride
{
    type Error = ScheduleError;

    fn try_from(record: ScheduleOverrideRecord) -> Result<Self, Self::Error>
    {
        Self::new(record.date, record.enabled, record.open_time, record.close_time, record.label)
    }
}

impl From<ScheduleOverride> for ScheduleOverrideRecord
{
    fn from(schedule_override: ScheduleOverride) -> Self
    {
        Self {
            date: schedule_override.date,
            enabled: schedule_override.enabled,
            open_time: schedule_override.open_time,
            close_time: schedule_override.close_time,
            label: schedule_override.label,
        }
    }
}

impl fmt::Display for ScheduleOverride
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.window() {
            Some(window) => write!(f, "{}: {}", self.date, window)?,
            None => write!(f, "{}: Closed", self.date)?,
        }
        if let Some(label) = &self.label {
            write!(f, " ({label})")?;
        }
        Ok(())
    }
}
