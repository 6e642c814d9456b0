use crate::domain::model::{Language, RemotePath, RemoteSnapshot, Schedule};
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// The realtime database, reachable by path.
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    /// Overwrites the value stored under `path`.
    async fn set(&self, path: RemotePath, value: serde_json::Value) -> Result<()>;

    /// Reads the whole root object; `None` when the database is empty.
    async fn snapshot(&self) -> Result<Option<RemoteSnapshot>>;

    /// Starts delivering root snapshots, one per change notification.
    async fn subscribe(&self) -> Result<mpsc::Receiver<RemoteSnapshot>>;
}

/// A speech-to-text engine. Results and errors are delivered out of band as
/// [`RecognitionEvent`](crate::domain::model::RecognitionEvent)s on the
/// channel the adapter was built with.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync + 'static {
    async fn start(&self, language: Language) -> Result<()>;
    async fn stop(&self) -> Result<()>;
}

/// Local persistence of the single schedule slot.
pub trait ScheduleStore: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<Schedule>> + Send;
    fn save(&self, schedule: &Schedule) -> impl std::future::Future<Output = Result<()>> + Send;
}
