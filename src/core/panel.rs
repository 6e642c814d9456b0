use crate::domain::model::{
    ActuatorLevel, Command, Language, RemotePath, RemoteSnapshot, Variant, LIGHT_MAX, TEMPERATURE_MAX,
};
use crate::domain::ports::RemoteStore;
use crate::utils::error::Result;
use crate::utils::validation::validate_range;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(4);

/// Handle of a fire-and-forget remote write. Nothing in the panel awaits it.
pub type WriteHandle = JoinHandle<Result<()>>;

/// A message shown for a fixed time, then cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notice {
    text: String,
    generation: u64,
}

impl Notice {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeSlot {
    Recognized,
    Command,
}

/// Everything the panel displays. Database-owned fields are a mirror of the
/// last pushed snapshot plus any optimistic local writes since.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub light: u16,
    pub temperature: u16,
    pub active_light: bool,
    pub active_temperature: bool,
    pub active_distance: bool,
    pub led: bool,
    pub level: ActuatorLevel,
    pub language: Language,
    pub recording: bool,
    pub recognized_text: Notice,
    pub command_message: Notice,
}

impl PanelState {
    /// Replaces the whole database mirror. Local-only fields are untouched.
    pub fn apply_snapshot(&mut self, snapshot: &RemoteSnapshot) {
        self.light = clamp_threshold(snapshot.light, LIGHT_MAX);
        self.temperature = clamp_threshold(snapshot.temperature, TEMPERATURE_MAX);
        self.active_light = snapshot.active_light == Some(1);
        self.active_temperature = snapshot.active_temperature == Some(1);
        self.active_distance = snapshot.active_distance == Some(1);
        self.led = snapshot.led.as_deref() == Some("ON");
        self.level = match ActuatorLevel::try_from(snapshot.muc.unwrap_or(0)) {
            Ok(level) => level,
            Err(e) => {
                tracing::warn!("Ignoring remote level: {}", e);
                ActuatorLevel::Closed
            }
        };
    }

    fn notice_mut(&mut self, slot: NoticeSlot) -> &mut Notice {
        match slot {
            NoticeSlot::Recognized => &mut self.recognized_text,
            NoticeSlot::Command => &mut self.command_message,
        }
    }
}

fn clamp_threshold(value: Option<i64>, max: u16) -> u16 {
    value.unwrap_or(0).clamp(0, i64::from(max)) as u16
}

/// Owner of [`PanelState`] and the only path through which it changes.
pub struct Panel<S: RemoteStore> {
    state: Arc<Mutex<PanelState>>,
    store: Arc<S>,
    variant: Variant,
    notice_ttl: Duration,
}

impl<S: RemoteStore> Clone for Panel<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            store: Arc::clone(&self.store),
            variant: self.variant,
            notice_ttl: self.notice_ttl,
        }
    }
}

impl<S: RemoteStore> Panel<S> {
    pub fn new(store: Arc<S>, variant: Variant) -> Self {
        Self {
            state: Arc::new(Mutex::new(PanelState::default())),
            store,
            variant,
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn state(&self) -> PanelState {
        self.state.lock().await.clone()
    }

    pub async fn apply_snapshot(&self, snapshot: &RemoteSnapshot) {
        self.state.lock().await.apply_snapshot(snapshot);
        tracing::debug!(?snapshot, "applied remote snapshot");
    }

    pub async fn set_light_threshold(&self, value: u16) -> Result<WriteHandle> {
        validate_range(RemotePath::Light.key(), value, 0, LIGHT_MAX)?;
        self.state.lock().await.light = value;
        Ok(self.write(RemotePath::Light, serde_json::Value::from(value)))
    }

    pub async fn set_temperature_threshold(&self, value: u16) -> Result<WriteHandle> {
        validate_range(RemotePath::Temperature.key(), value, 0, TEMPERATURE_MAX)?;
        self.state.lock().await.temperature = value;
        Ok(self.write(RemotePath::Temperature, serde_json::Value::from(value)))
    }

    // Feature flags only write; the mirror follows the next pushed snapshot.

    pub fn set_active_light(&self, on: bool) -> WriteHandle {
        self.write_flag(RemotePath::ActiveLight, on)
    }

    pub fn set_active_temperature(&self, on: bool) -> WriteHandle {
        self.write_flag(RemotePath::ActiveTemperature, on)
    }

    pub fn set_active_distance(&self, on: bool) -> WriteHandle {
        self.write_flag(RemotePath::ActiveDistance, on)
    }

    pub async fn set_level(&self, level: ActuatorLevel) -> WriteHandle {
        self.dispatch(level.command()).await
    }

    pub async fn set_led(&self, on: bool) -> WriteHandle {
        let command = if on { Command::Open } else { Command::Close };
        self.dispatch(command).await
    }

    /// Optimistically applies `command` to the mirror and sends its write.
    /// A failed write is logged and never rolled back.
    pub async fn dispatch(&self, command: Command) -> WriteHandle {
        {
            let mut state = self.state.lock().await;
            if let Some(level) = command.level() {
                state.level = level;
            }
            if let Some(on) = command.led() {
                state.led = on;
            }
        }
        let (path, value) = command.remote_write();
        tracing::info!("🎛️ Dispatching {} → {} = {}", command, path, value);
        self.write(path, value)
    }

    pub async fn language(&self) -> Language {
        self.state.lock().await.language
    }

    /// Seen by every clone of this panel.
    pub async fn set_language(&self, language: Language) {
        self.state.lock().await.language = language;
        tracing::info!("🌐 Recognition language set to {}", language);
    }

    pub async fn toggle_language(&self) -> Language {
        let mut state = self.state.lock().await;
        state.language = state.language.toggled();
        tracing::info!("🌐 Recognition language set to {}", state.language);
        state.language
    }

    pub async fn set_recording(&self, recording: bool) {
        self.state.lock().await.recording = recording;
    }

    pub async fn post_recognized(&self, text: impl Into<String>) {
        self.post(NoticeSlot::Recognized, text.into()).await;
    }

    pub async fn post_command_message(&self, text: impl Into<String>) {
        self.post(NoticeSlot::Command, text.into()).await;
    }

    pub async fn clear_notices(&self) {
        let mut state = self.state.lock().await;
        state.recognized_text.text.clear();
        state.command_message.text.clear();
    }

    async fn post(&self, slot: NoticeSlot, text: String) {
        let generation = {
            let mut state = self.state.lock().await;
            let notice = state.notice_mut(slot);
            notice.generation += 1;
            notice.text = text;
            notice.generation
        };

        let state = Arc::clone(&self.state);
        let ttl = self.notice_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut state = state.lock().await;
            let notice = state.notice_mut(slot);
            // a newer notice owns the slot and its own timer
            if notice.generation == generation {
                notice.text.clear();
            }
        });
    }

    fn write_flag(&self, path: RemotePath, on: bool) -> WriteHandle {
        self.write(path, serde_json::Value::from(u8::from(on)))
    }

    fn write(&self, path: RemotePath, value: serde_json::Value) -> WriteHandle {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            tracing::debug!(%path, %value, "writing remote value");
            let result = store.set(path, value).await;
            if let Err(e) = &result {
                tracing::warn!("⚠️ Write to {} failed, local state kept: {}", path, e);
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;

    #[test]
    fn test_apply_snapshot_replaces_mirror() {
        let mut state = PanelState {
            light: 500,
            active_light: true,
            led: true,
            level: ActuatorLevel::Full,
            language: Language::English,
            ..PanelState::default()
        };

        let snapshot = RemoteSnapshot {
            temperature: Some(30),
            active_distance: Some(1),
            led: Some("OFF".to_string()),
            ..RemoteSnapshot::default()
        };
        state.apply_snapshot(&snapshot);

        assert_eq!(state.light, 0);
        assert_eq!(state.temperature, 30);
        assert!(!state.active_light);
        assert!(state.active_distance);
        assert!(!state.led);
        // missing MUC reads as closed
        assert_eq!(state.level, ActuatorLevel::Closed);
        // local-only field survives
        assert_eq!(state.language, Language::English);
    }

    #[test]
    fn test_apply_snapshot_clamps_out_of_range_values() {
        let mut state = PanelState::default();
        state.apply_snapshot(&RemoteSnapshot {
            light: Some(5000),
            temperature: Some(-3),
            muc: Some(7),
            ..RemoteSnapshot::default()
        });
        assert_eq!(state.light, LIGHT_MAX);
        assert_eq!(state.temperature, 0);
        assert_eq!(state.level, ActuatorLevel::Closed);
    }

    #[tokio::test]
    async fn test_threshold_validation() {
        let panel = Panel::new(Arc::new(MemoryStore::new()), Variant::ThreeLevel);
        assert!(panel.set_light_threshold(1201).await.is_err());
        assert!(panel.set_temperature_threshold(101).await.is_err());

        let write = panel.set_light_threshold(900).await.unwrap();
        write.await.unwrap().unwrap();
        assert_eq!(panel.state().await.light, 900);
        assert_eq!(
            panel.store().value(RemotePath::Light).await,
            Some(serde_json::json!(900))
        );
    }

    #[tokio::test]
    async fn test_flags_write_without_touching_mirror() {
        let store = Arc::new(MemoryStore::new());
        let panel = Panel::new(Arc::clone(&store), Variant::ThreeLevel);

        panel.set_active_distance(true).await.unwrap().unwrap();
        assert_eq!(
            store.value(RemotePath::ActiveDistance).await,
            Some(serde_json::json!(1))
        );
        assert!(!panel.state().await.active_distance);
    }

    #[tokio::test]
    async fn test_language_change_reaches_every_clone() {
        let panel = Panel::new(Arc::new(MemoryStore::new()), Variant::ThreeLevel);
        let engine_side = panel.clone();

        panel.set_language(Language::English).await;
        assert_eq!(engine_side.language().await, Language::English);

        engine_side.toggle_language().await;
        assert_eq!(panel.language().await, Language::Vietnamese);
    }

    #[tokio::test]
    async fn test_set_led_writes_on_off_strings() {
        let store = Arc::new(MemoryStore::new());
        let panel = Panel::new(Arc::clone(&store), Variant::Binary);

        panel.set_led(true).await.await.unwrap().unwrap();
        assert!(panel.state().await.led);
        assert_eq!(
            store.value(RemotePath::Led).await,
            Some(serde_json::json!("ON"))
        );
    }
}
