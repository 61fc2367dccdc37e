use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use availability_engine::store::ScheduleRecords;
use availability_engine::store::ScheduleStore;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum JsonStoreError
{
    #[error("failed to read schedule file {}", .path.display())]
    Read
    {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("schedule file {} is not valid", .path.display())]
    Parse
    {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write schedule file {}", .path.display())]
    Write
    {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode schedule records")]
    Encode(#[source] serde_json::Error),
}

/// Keeps the schedule in a single pretty-printed JSON file.
///
/// Saves write a sibling `.tmp` file and rename it over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore
{
    path: PathBuf,
}

impl JsonFileStore
{
    pub fn new(path: impl Into<PathBuf>) -> Self
    {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    fn staging_path(&self) -> PathBuf
    {
        let mut file_name = self.path.file_name().map(OsString::from).unwrap_or_default();
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }

    fn write_error(&self, source: io::Error) -> JsonStoreError
    {
        JsonStoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl ScheduleStore for JsonFileStore
{
    type Error = JsonStoreError;

    fn load(&self) -> Result<ScheduleRecords, Self::Error>
    {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no schedule file yet, schedule is unconfigured");
                return Ok(ScheduleRecords::default());
            }
            Err(source) => {
                return Err(JsonStoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&contents).map_err(|source| JsonStoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&mut self, records: &ScheduleRecords) -> Result<(), Self::Error>
    {
        let encoded = serde_json::to_string_pretty(records).map_err(JsonStoreError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
        }

        let staging_path = self.staging_path();
        fs::write(&staging_path, encoded).map_err(|source| self.write_error(source))?;
        fs::rename(&staging_path, &self.path).map_err(|source| self.write_error(source))?;

        debug!(
            path = %self.path.display(),
            weekly_hours = records.weekly_hours.len(),
            overrides = records.overrides.len(),
            "schedule file written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use availability_engine::helpdesk_schedule::HelpdeskSchedule;
    use availability_engine::store::ScheduleRecords;
    use availability_engine::store::ScheduleStore;
    use chrono::NaiveDate;
    use chrono::NaiveTime;
    use chrono_tz::Tz;
    use helpdesk_environment::presets::SchedulePreset;

    use super::JsonFileStore;
    use super::JsonStoreError;

    #[test]
    fn test_missing_file_is_unconfigured()
    {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("schedule.json"));

        assert_eq!(store.load().unwrap(), ScheduleRecords::default());
    }

    #[test]
    fn test_save_then_load()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("schedule.json");
        let mut store = JsonFileStore::new(&path);

        let mut schedule = HelpdeskSchedule::new(Tz::UTC);
        schedule.initialize_defaults(SchedulePreset::BusinessHours, false);
        schedule
            .upsert_override(
                NaiveDate::from_ymd_opt(2025, 12, 25).unwrap(),
                false,
                NaiveTime::MIN,
                NaiveTime::MIN,
                Some("Holiday".to_string()),
            )
            .unwrap();

        store.save(&schedule.records()).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("nested").join("schedule.json.tmp").exists());
        assert_eq!(store.load().unwrap(), schedule.records());
    }

    #[test]
    fn test_corrupt_file_is_reported()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        fs::write(&path, r#"{"weekly_hours": [{"day_of_week": 0, "enabled": true, "open_time": "18:00:00", "close_time": "08:00:00"}]}"#).unwrap();

        let store = JsonFileStore::new(&path);

        assert!(matches!(store.load(), Err(JsonStoreError::Parse { .. })));
    }
}
