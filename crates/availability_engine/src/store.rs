use std::convert::Infallible;

use helpdesk_environment::schedule_override::ScheduleOverride;
use helpdesk_environment::weekly_hours::WeeklyHours;
use serde::Deserialize;
use serde::Serialize;

/// Persisted form of the schedule configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecords
{
    #[serde(default)]
    pub weekly_hours: Vec<WeeklyHours>,
    #[serde(default)]
    pub overrides: Vec<ScheduleOverride>,
}

impl ScheduleRecords
{
    pub fn is_empty(&self) -> bool
    {
        self.weekly_hours.is_empty() && self.overrides.is_empty()
    }
}

/// Durable storage for [`ScheduleRecords`].
///
/// A `save` replaces the whole record set and is expected to be atomic:
/// readers see either the previous or the new records, never a mix.
pub trait ScheduleStore
{
    type Error: std::error::Error + Send + Sync + 'static;

    /// An unconfigured store returns empty records rather than an error.
    fn load(&self) -> Result<ScheduleRecords, Self::Error>;

    fn save(&mut self, records: &ScheduleRecords) -> Result<(), Self::Error>;
}

#[derive(Debug, Default)]
pub struct InMemoryScheduleStore
{
    records: ScheduleRecords,
    saves: usize,
}

impl InMemoryScheduleStore
{
    pub fn new(records: ScheduleRecords) -> Self
    {
        Self { records, saves: 0 }
    }

    pub fn records(&self) -> &ScheduleRecords
    {
        &self.records
    }

    /// Number of successful `save` calls.
    pub fn saves(&self) -> usize
    {
        self.saves
    }
}

impl ScheduleStore for InMemoryScheduleStore
{
    type Error = Infallible;

    fn load(&self) -> Result<ScheduleRecords, Self::Error>
    {
        Ok(self.records.clone())
    }

    fn save(&mut self, records: &ScheduleRecords) -> Result<(), Self::Error>
    {
        self.records = records.clone();
        self.saves += 1;
        Ok(())
    }
}
