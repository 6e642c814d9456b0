use crate::core::panel::Panel;
use crate::domain::model::SessionState;
use crate::domain::ports::{RemoteStore, SpeechRecognizer};
use std::sync::Arc;

/// Hold-to-talk controller: press starts listening, release stops it.
pub struct RecordingSession<R: SpeechRecognizer, S: RemoteStore> {
    recognizer: Arc<R>,
    panel: Panel<S>,
    state: SessionState,
}

impl<R: SpeechRecognizer, S: RemoteStore> RecordingSession<R, S> {
    pub fn new(recognizer: Arc<R>, panel: Panel<S>) -> Self {
        Self {
            recognizer,
            panel,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub async fn press(&mut self) -> SessionState {
        if self.state == SessionState::Recording {
            tracing::debug!("Already recording, press ignored");
            return self.state;
        }

        self.panel.clear_notices().await;
        let language = self.panel.language().await;
        match self.recognizer.start(language).await {
            Ok(()) => {
                tracing::debug!("Recording started ({})", language);
                self.state = SessionState::Recording;
            }
            Err(e) => {
                tracing::error!("Error starting recognizer: {}", e);
                self.state = SessionState::Idle;
            }
        }
        self.panel
            .set_recording(self.state == SessionState::Recording)
            .await;
        self.state
    }

    pub async fn release(&mut self) -> SessionState {
        if self.state == SessionState::Idle {
            tracing::debug!("Not recording, release ignored");
            return self.state;
        }

        if let Err(e) = self.recognizer.stop().await {
            tracing::error!("Error stopping recognizer: {}", e);
        }
        self.state = SessionState::Idle;
        self.panel.set_recording(false).await;
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::domain::model::{Language, Variant};
    use crate::utils::error::{PanelError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct FlakyRecognizer {
        fail_start: bool,
        fail_stop: bool,
        starts: AtomicUsize,
        languages: Mutex<Vec<Language>>,
    }

    #[async_trait]
    impl SpeechRecognizer for FlakyRecognizer {
        async fn start(&self, language: Language) -> Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.languages.lock().await.push(language);
            if self.fail_start {
                return Err(PanelError::RecognizerError {
                    message: "microphone busy".to_string(),
                });
            }
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            if self.fail_stop {
                return Err(PanelError::RecognizerError {
                    message: "not started".to_string(),
                });
            }
            Ok(())
        }
    }

    fn panel() -> Panel<MemoryStore> {
        Panel::new(Arc::new(MemoryStore::new()), Variant::ThreeLevel)
    }

    #[tokio::test]
    async fn test_press_and_release() {
        let recognizer = Arc::new(FlakyRecognizer::default());
        let panel = panel();
        panel.toggle_language().await;
        let mut session = RecordingSession::new(Arc::clone(&recognizer), panel.clone());

        assert_eq!(session.press().await, SessionState::Recording);
        assert!(panel.state().await.recording);
        assert_eq!(*recognizer.languages.lock().await, vec![Language::English]);

        assert_eq!(session.release().await, SessionState::Idle);
        assert!(!panel.state().await.recording);
    }

    #[tokio::test]
    async fn test_second_press_does_not_start_another_session() {
        let recognizer = Arc::new(FlakyRecognizer::default());
        let mut session = RecordingSession::new(Arc::clone(&recognizer), panel());

        session.press().await;
        session.press().await;
        assert_eq!(recognizer.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_start_stays_idle() {
        let recognizer = Arc::new(FlakyRecognizer {
            fail_start: true,
            ..FlakyRecognizer::default()
        });
        let panel = panel();
        let mut session = RecordingSession::new(recognizer, panel.clone());

        assert_eq!(session.press().await, SessionState::Idle);
        assert!(!panel.state().await.recording);
    }

    #[tokio::test]
    async fn test_failed_stop_resets_to_idle() {
        let recognizer = Arc::new(FlakyRecognizer {
            fail_stop: true,
            ..FlakyRecognizer::default()
        });
        let mut session = RecordingSession::new(recognizer, panel());

        session.press().await;
        assert_eq!(session.release().await, SessionState::Idle);
    }

    #[tokio::test]
    async fn test_press_clears_previous_notices() {
        let panel = panel();
        panel.post_command_message("old").await;
        panel.post_recognized("old transcript").await;

        let mut session = RecordingSession::new(Arc::new(FlakyRecognizer::default()), panel.clone());
        session.press().await;

        let state = panel.state().await;
        assert!(state.command_message.is_empty());
        assert!(state.recognized_text.is_empty());
    }
}
