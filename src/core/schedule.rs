use crate::core::panel::{Panel, WriteHandle};
use crate::domain::model::Schedule;
use crate::domain::ports::{RemoteStore, ScheduleStore};
use crate::utils::error::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

/// What happens on further ticks inside the scheduled minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatPolicy {
    /// Every matching tick fires, so a 1 s tick fires up to 60 times.
    #[default]
    EveryTick,
    /// Only the first matching tick of a given minute fires.
    OncePerMinute,
}

/// Compares the wall clock against the single stored schedule slot.
pub struct ScheduleTimer<S: RemoteStore, P: ScheduleStore> {
    panel: Panel<S>,
    store: P,
    slot: RwLock<Schedule>,
    policy: RepeatPolicy,
    last_fired: Mutex<Option<String>>,
}

impl<S: RemoteStore, P: ScheduleStore> ScheduleTimer<S, P> {
    pub fn new(panel: Panel<S>, store: P, schedule: Schedule, policy: RepeatPolicy) -> Self {
        Self {
            panel,
            store,
            slot: RwLock::new(schedule),
            policy,
            last_fired: Mutex::new(None),
        }
    }

    /// Restores the persisted slot, falling back to defaults per missing key.
    pub async fn load(panel: Panel<S>, store: P, policy: RepeatPolicy) -> Result<Self> {
        let schedule = store.load().await?;
        tracing::info!("⏰ Schedule loaded: {}", schedule);
        Ok(Self::new(panel, store, schedule, policy))
    }

    pub async fn schedule(&self) -> Schedule {
        *self.slot.read().await
    }

    /// Overwrites the slot, then persists it. The new value is live for the
    /// next tick even when persisting fails.
    pub async fn set_schedule(&self, schedule: Schedule) -> Result<()> {
        *self.slot.write().await = schedule;
        *self.last_fired.lock().await = None;
        self.store.save(&schedule).await
    }

    pub async fn tick(&self, now: NaiveDateTime) -> Option<WriteHandle> {
        let schedule = self.schedule().await;
        let clock = now.format("%H:%M:%S").to_string();
        if !clock.starts_with(&schedule.prefix()) {
            return None;
        }

        if self.policy == RepeatPolicy::OncePerMinute {
            let minute = now.format("%Y-%m-%d %H:%M").to_string();
            let mut last = self.last_fired.lock().await;
            if last.as_deref() == Some(minute.as_str()) {
                return None;
            }
            *last = Some(minute);
        }

        let command = self.panel.variant().command_for_switch(schedule.action);
        tracing::info!("⏰ Schedule {} reached at {}, firing {}", schedule, clock, command);
        Some(self.panel.dispatch(command).await)
    }
}
