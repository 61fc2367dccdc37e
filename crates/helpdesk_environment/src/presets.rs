use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use chrono::Weekday;
use serde::Deserialize;
use serde::Serialize;

use crate::OpeningWindow;
use crate::ScheduleError;
use crate::WEEK;
use crate::weekly_hours::WeeklyHours;

const WEEKDAYS: &[Weekday] = &[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];
const WEEKEND: &[Weekday] = &[Weekday::Sat, Weekday::Sun];

/// `(hour, minute)` pairs for opening and closing.
type PresetHours = ((u32, u32), (u32, u32));

fn preset_window(((open_hour, open_minute), (close_hour, close_minute)): PresetHours) -> Option<OpeningWindow>
{
    let open_time = NaiveTime::from_hms_opt(open_hour, open_minute, 0)?;
    let close_time = NaiveTime::from_hms_opt(close_hour, close_minute, 0)?;
    OpeningWindow::new(open_time, close_time).ok()
}

/// Fixed weekly tables a manager can apply in one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulePreset
{
    #[default]
    BusinessHours,
    ExtendedHours,
    FinalsWeek,
    WeekendSupport,
    AllClosed,
}

impl SchedulePreset
{
    pub const ALL: [SchedulePreset; 5] = [
        SchedulePreset::BusinessHours,
        SchedulePreset::ExtendedHours,
        SchedulePreset::FinalsWeek,
        SchedulePreset::WeekendSupport,
        SchedulePreset::AllClosed,
    ];

    pub fn name(&self) -> &'static str
    {
        match self {
            SchedulePreset::BusinessHours => "business-hours",
            SchedulePreset::ExtendedHours => "extended-hours",
            SchedulePreset::FinalsWeek => "finals-week",
            SchedulePreset::WeekendSupport => "weekend-support",
            SchedulePreset::AllClosed => "all-closed",
        }
    }

    pub fn description(&self) -> &'static str
    {
        match self {
            SchedulePreset::BusinessHours => "Business Hours (9 AM - 4:30 PM, Mon-Fri)",
            SchedulePreset::ExtendedHours => "Extended Hours (9 AM - 6 PM, Mon-Fri)",
            SchedulePreset::FinalsWeek => "Finals Week (9 AM - 7 PM, Mon-Fri)",
            SchedulePreset::WeekendSupport => "Weekend Support (10 AM - 3 PM, Sat-Sun)",
            SchedulePreset::AllClosed => "All Days Closed",
        }
    }

    pub fn active_days(&self) -> &'static [Weekday]
    {
        match self {
            SchedulePreset::BusinessHours | SchedulePreset::ExtendedHours | SchedulePreset::FinalsWeek => WEEKDAYS,
            SchedulePreset::WeekendSupport => WEEKEND,
            SchedulePreset::AllClosed => &[],
        }
    }

    fn hours(&self) -> Option<PresetHours>
    {
        match self {
            SchedulePreset::BusinessHours => Some(((9, 0), (16, 30))),
            SchedulePreset::ExtendedHours => Some(((9, 0), (18, 0))),
            SchedulePreset::FinalsWeek => Some(((9, 0), (19, 0))),
            SchedulePreset::WeekendSupport => Some(((10, 0), (15, 0))),
            SchedulePreset::AllClosed => None,
        }
    }

    pub fn window(&self) -> Option<OpeningWindow>
    {
        self.hours().and_then(preset_window)
    }

    /// Hours this preset assigns to `day`; days outside the active set are closed.
    pub fn hours_for(&self, day: Weekday) -> WeeklyHours
    {
        match self.window() {
            Some(window) if self.active_days().contains(&day) => WeeklyHours::open(day, window),
            _ => WeeklyHours::closed(day),
        }
    }

    /// Hours for a day the manager picked explicitly: the preset's window
    /// regardless of its usual days, or closed for [`SchedulePreset::AllClosed`].
    pub fn hours_for_selected(&self, day: Weekday) -> WeeklyHours
    {
        match self.window() {
            Some(window) => WeeklyHours::open(day, window),
            None => WeeklyHours::closed(day),
        }
    }

    pub fn week(&self) -> [WeeklyHours; 7]
    {
        WEEK.map(|day| self.hours_for(day))
    }
}

impl fmt::Display for SchedulePreset
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

impl FromStr for SchedulePreset
{
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err>
    {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        SchedulePreset::ALL
            .into_iter()
            .find(|preset| preset.name() == normalized)
            .ok_or_else(|| ScheduleError::UnknownPreset(value.to_string()))
    }
}
