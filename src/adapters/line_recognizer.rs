use crate::domain::model::{Language, RecognitionEvent, Transcript};
use crate::domain::ports::SpeechRecognizer;
use crate::utils::error::{PanelError, Result};
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

pub const NO_SPEECH: &str = "no speech detected";

#[derive(Debug, Default)]
struct Listening {
    language: Option<Language>,
    heard: Vec<String>,
}

/// Recognizer fed with already-transcribed text, one piece per [`feed`] call.
/// Stopping a session delivers everything heard since `start` as one
/// transcript, or an error when nothing was heard.
///
/// [`feed`]: LineRecognizer::feed
pub struct LineRecognizer {
    events: mpsc::Sender<RecognitionEvent>,
    session: Mutex<Listening>,
}

impl LineRecognizer {
    pub fn new(events: mpsc::Sender<RecognitionEvent>) -> Self {
        Self {
            events,
            session: Mutex::new(Listening::default()),
        }
    }

    pub async fn feed(&self, text: &str) -> Result<()> {
        let mut session = self.session.lock().await;
        if session.language.is_none() {
            return Err(PanelError::RecognizerError {
                message: "not listening".to_string(),
            });
        }
        let text = text.trim();
        if !text.is_empty() {
            session.heard.push(text.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechRecognizer for LineRecognizer {
    async fn start(&self, language: Language) -> Result<()> {
        let mut session = self.session.lock().await;
        if session.language.is_some() {
            return Err(PanelError::RecognizerError {
                message: "already listening".to_string(),
            });
        }
        tracing::debug!("Listening in {}", language);
        session.language = Some(language);
        session.heard.clear();
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let heard = {
            let mut session = self.session.lock().await;
            if session.language.take().is_none() {
                return Err(PanelError::RecognizerError {
                    message: "not listening".to_string(),
                });
            }
            std::mem::take(&mut session.heard)
        };

        let event = if heard.is_empty() {
            RecognitionEvent::Error(NO_SPEECH.to_string())
        } else {
            RecognitionEvent::Result(Transcript::new(heard.join(" ")))
        };
        self.events
            .send(event)
            .await
            .map_err(|_| PanelError::RecognizerError {
                message: "event channel closed".to_string(),
            })
    }
}
