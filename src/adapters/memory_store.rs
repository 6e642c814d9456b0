use crate::domain::model::{RemotePath, RemoteSnapshot};
use crate::domain::ports::RemoteStore;
use crate::utils::error::{PanelError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch, Mutex};

const SUBSCRIBER_BUFFER: usize = 16;

#[derive(Default)]
struct Inner {
    values: Map<String, Value>,
    writes: Vec<(RemotePath, Value)>,
}

impl Inner {
    fn snapshot(&self) -> Result<Option<RemoteSnapshot>> {
        if self.values.is_empty() {
            return Ok(None);
        }
        let snapshot = serde_json::from_value(Value::Object(self.values.clone()))?;
        Ok(Some(snapshot))
    }
}

/// In-process realtime store. Used by the CLI when no database is configured
/// and by tests as the remote side of the panel.
///
/// Subscribers read from a latest-value slot: a slow subscriber may skip
/// intermediate snapshots but always ends on the current root.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    latest: watch::Sender<Option<RemoteSnapshot>>,
    reject_writes: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            latest: watch::Sender::new(None),
            reject_writes: false,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: &RemoteSnapshot) -> Result<Self> {
        let values = match serde_json::to_value(snapshot)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(Self {
            inner: Mutex::new(Inner {
                values,
                ..Inner::default()
            }),
            latest: watch::Sender::new(Some(snapshot.clone())),
            reject_writes: false,
        })
    }

    /// A store whose every write fails, for exercising the unacknowledged
    /// write path.
    pub fn rejecting_writes() -> Self {
        Self {
            reject_writes: true,
            ..Self::default()
        }
    }

    pub async fn value(&self, path: RemotePath) -> Option<Value> {
        self.inner.lock().await.values.get(path.key()).cloned()
    }

    /// Every write accepted so far, in arrival order.
    pub async fn writes(&self) -> Vec<(RemotePath, Value)> {
        self.inner.lock().await.writes.clone()
    }

    /// Replaces the whole root, as another client of the database would.
    pub async fn replace(&self, snapshot: &RemoteSnapshot) -> Result<()> {
        let values = match serde_json::to_value(snapshot)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut inner = self.inner.lock().await;
        inner.values = values;
        self.publish(&inner);
        Ok(())
    }

    fn publish(&self, inner: &Inner) {
        match inner.snapshot() {
            Ok(snapshot) => {
                self.latest.send_replace(snapshot);
            }
            Err(e) => tracing::warn!("Skipping notification for malformed root: {}", e),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn set(&self, path: RemotePath, value: Value) -> Result<()> {
        if self.reject_writes {
            return Err(PanelError::RemoteWriteError {
                path: path.key().to_string(),
                message: "write rejected by store".to_string(),
            });
        }
        let mut inner = self.inner.lock().await;
        inner.values.insert(path.key().to_string(), value.clone());
        inner.writes.push((path, value));
        self.publish(&inner);
        Ok(())
    }

    async fn snapshot(&self) -> Result<Option<RemoteSnapshot>> {
        self.inner.lock().await.snapshot()
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<RemoteSnapshot>> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut latest = self.latest.subscribe();

        tokio::spawn(async move {
            loop {
                // like a realtime listener, the current value arrives first
                let snapshot = latest.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    if tx.send(snapshot).await.is_err() {
                        break;
                    }
                }
                tokio::select! {
                    changed = latest.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tx.closed() => break,
                }
            }
        });

        Ok(rx)
    }
}
