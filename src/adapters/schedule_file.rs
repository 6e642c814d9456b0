use crate::domain::model::Schedule;
use crate::domain::ports::ScheduleStore;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// On-disk form: three string values, like a mobile key-value store keeps them.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSchedule {
    #[serde(rename = "scheduleHour", default)]
    hour: Option<String>,
    #[serde(rename = "scheduleMinute", default)]
    minute: Option<String>,
    #[serde(rename = "scheduleAction", default)]
    action: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JsonScheduleStore {
    path: PathBuf,
}

impl JsonScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScheduleStore for JsonScheduleStore {
    async fn load(&self) -> Result<Schedule> {
        let stored = match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<StoredSchedule>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No saved schedule at {}", self.path.display());
                StoredSchedule::default()
            }
            Err(e) => return Err(e.into()),
        };

        Schedule::from_stored(
            stored.hour.as_deref(),
            stored.minute.as_deref(),
            stored.action.as_deref(),
        )
    }

    async fn save(&self, schedule: &Schedule) -> Result<()> {
        let stored = StoredSchedule {
            hour: Some(schedule.hour_key()),
            minute: Some(schedule.minute_key()),
            action: Some(schedule.action_key()),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&stored)?).await?;
        tracing::info!("💾 Schedule saved: {}", schedule);
        Ok(())
    }
}
