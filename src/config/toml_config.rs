use crate::adapters::firebase::DEFAULT_POLL_INTERVAL;
use crate::core::engine::DEFAULT_TICK;
use crate::core::panel::DEFAULT_NOTICE_TTL;
use crate::core::schedule::RepeatPolicy;
use crate::domain::model::{Language, Variant};
use crate::utils::error::{PanelError, Result};
use crate::utils::validation::{
    validate_one_of, validate_path, validate_positive_number, validate_required_field,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const BACKEND_MEMORY: &str = "memory";
pub const BACKEND_FIREBASE: &str = "firebase";
pub const DEFAULT_SCHEDULE_PATH: &str = "./schedule.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub panel: PanelSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub schedule: Option<ScheduleSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelSection {
    #[serde(default)]
    pub variant: Variant,
    #[serde(default)]
    pub language: Language,
    pub notice_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: String,
    pub url: Option<String>,
    pub auth: Option<String>,
    pub poll_interval_seconds: Option<u64>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: BACKEND_MEMORY.to_string(),
            url: None,
            auth: None,
            poll_interval_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_schedule_path")]
    pub path: String,
    pub tick_millis: Option<u64>,
    pub fire_once_per_minute: Option<bool>,
}

fn default_schedule_path() -> String {
    DEFAULT_SCHEDULE_PATH.to_string()
}

impl PanelConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PanelError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PanelError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the value of the environment variable; unknown
    /// variables are left untouched and rejected by validation where it matters.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| PanelError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(seconds) = self.panel.notice_seconds {
            validate_positive_number("panel.notice_seconds", seconds, 1)?;
        }

        validate_one_of(
            "store.backend",
            &self.store.backend,
            &[BACKEND_MEMORY, BACKEND_FIREBASE],
        )?;
        if self.store.backend == BACKEND_FIREBASE {
            let url = validate_required_field("store.url", &self.store.url)?;
            validate_url("store.url", url)?;
        }
        if let Some(auth) = &self.store.auth {
            if auth.starts_with("${") {
                return Err(PanelError::ConfigValidationError {
                    field: "store.auth".to_string(),
                    message: format!("environment variable {} is not set", auth),
                });
            }
        }
        if let Some(seconds) = self.store.poll_interval_seconds {
            validate_positive_number("store.poll_interval_seconds", seconds, 1)?;
        }

        if let Some(schedule) = &self.schedule {
            validate_path("schedule.path", &schedule.path)?;
            if let Some(millis) = schedule.tick_millis {
                validate_positive_number("schedule.tick_millis", millis, 1)?;
            }
        }

        Ok(())
    }

    pub fn variant(&self) -> Variant {
        self.panel.variant
    }

    pub fn language(&self) -> Language {
        self.panel.language
    }

    pub fn notice_ttl(&self) -> Duration {
        self.panel
            .notice_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_NOTICE_TTL)
    }

    pub fn uses_firebase(&self) -> bool {
        self.store.backend == BACKEND_FIREBASE
    }

    pub fn poll_interval(&self) -> Duration {
        self.store
            .poll_interval_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    pub fn schedule_enabled(&self) -> bool {
        self.schedule.as_ref().map(|s| s.enabled).unwrap_or(false)
    }

    pub fn schedule_path(&self) -> &str {
        self.schedule
            .as_ref()
            .map(|s| s.path.as_str())
            .unwrap_or(DEFAULT_SCHEDULE_PATH)
    }

    pub fn tick_every(&self) -> Duration {
        self.schedule
            .as_ref()
            .and_then(|s| s.tick_millis)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TICK)
    }

    pub fn repeat_policy(&self) -> RepeatPolicy {
        match self.schedule.as_ref().and_then(|s| s.fire_once_per_minute) {
            Some(true) => RepeatPolicy::OncePerMinute,
            _ => RepeatPolicy::EveryTick,
        }
    }
}

impl Validate for PanelConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
