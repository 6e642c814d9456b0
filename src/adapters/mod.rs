// Adapters layer: concrete implementations of the domain ports (realtime database,
// speech recognizer, schedule persistence).

pub mod firebase;
pub mod line_recognizer;
pub mod memory_store;
pub mod schedule_file;

pub use firebase::FirebaseStore;
pub use line_recognizer::LineRecognizer;
pub use memory_store::MemoryStore;
pub use schedule_file::JsonScheduleStore;
