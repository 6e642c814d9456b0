pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{FirebaseStore, JsonScheduleStore, LineRecognizer, MemoryStore};
pub use config::toml_config::PanelConfig;
pub use crate::core::{
    classifier::Classifier, engine::PanelEngine, interpreter::VoiceInterpreter, panel::Panel,
    schedule::ScheduleTimer, session::RecordingSession,
};
pub use utils::error::{PanelError, Result};
