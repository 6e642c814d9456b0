pub mod classifier;
pub mod engine;
pub mod interpreter;
pub mod panel;
pub mod schedule;
pub mod session;

pub use crate::domain::model::{Command, RecognitionEvent, RemoteSnapshot, Schedule, Transcript};
pub use crate::domain::ports::{RemoteStore, ScheduleStore, SpeechRecognizer};
pub use crate::utils::error::Result;
