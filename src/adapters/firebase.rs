use crate::domain::model::{RemotePath, RemoteSnapshot};
use crate::domain::ports::RemoteStore;
use crate::utils::error::{PanelError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use url::Url;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Realtime database reached through its REST endpoint
/// (`PUT {base}/{KEY}.json`, `GET {base}/.json`). Change notifications are
/// emulated by polling the root.
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    client: Client,
    base_url: String,
    auth: Option<String>,
    poll_interval: Duration,
}

impl FirebaseStore {
    pub fn new(base_url: impl Into<String>, auth: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            auth,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn url_for(&self, key: &str) -> Result<Url> {
        build_url(&self.base_url, key, self.auth.as_deref())
    }
}

fn build_url(base: &str, key: &str, auth: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/{}.json", base.trim_end_matches('/'), key))?;
    if let Some(token) = auth {
        url.query_pairs_mut().append_pair("auth", token);
    }
    Ok(url)
}

async fn fetch_root(client: &Client, url: Url) -> Result<Option<RemoteSnapshot>> {
    let response = client.get(url).send().await?.error_for_status()?;
    let body: serde_json::Value = response.json().await?;
    if body.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(body)?))
}

#[async_trait]
impl RemoteStore for FirebaseStore {
    async fn set(&self, path: RemotePath, value: serde_json::Value) -> Result<()> {
        let url = self.url_for(path.key())?;
        tracing::debug!("PUT {} <- {}", path, value);

        let response = self.client.put(url).json(&value).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PanelError::RemoteWriteError {
                path: path.key().to_string(),
                message: format!("HTTP {}", status),
            });
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<Option<RemoteSnapshot>> {
        fetch_root(&self.client, self.url_for("")?).await
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<RemoteSnapshot>> {
        let (tx, rx) = mpsc::channel(16);
        let client = self.client.clone();
        let url = self.url_for("")?;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::spawn(async move {
            let mut last: Option<RemoteSnapshot> = None;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => {
                        tracing::debug!("Snapshot subscriber dropped, stop polling");
                        break;
                    }
                }
                match fetch_root(&client, url.clone()).await {
                    Ok(Some(snapshot)) if last.as_ref() != Some(&snapshot) => {
                        last = Some(snapshot.clone());
                        if tx.send(snapshot).await.is_err() {
                            tracing::debug!("Snapshot subscriber dropped, stop polling");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("⚠️ Polling realtime database failed: {}", e),
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let url = build_url("https://demo.firebaseio.com/", "MUC", None).unwrap();
        assert_eq!(url.as_str(), "https://demo.firebaseio.com/MUC.json");

        let root = build_url("https://demo.firebaseio.com", "", Some("t0k3n")).unwrap();
        assert_eq!(root.as_str(), "https://demo.firebaseio.com/.json?auth=t0k3n");
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        assert!(matches!(
            build_url("not a url", "LED", None),
            Err(PanelError::UrlError(_))
        ));
    }
}
