use crate::core::classifier::{Classification, Classifier};
use crate::core::panel::{Panel, WriteHandle};
use crate::domain::model::{RecognitionEvent, Transcript};
use crate::domain::ports::RemoteStore;

pub const RECOGNITION_ERROR_MESSAGE: &str = "Đã xảy ra lỗi trong quá trình nhận diện giọng nói.";

/// A classified utterance and the write it triggered.
#[derive(Debug)]
pub struct Dispatched {
    pub classification: Classification,
    pub write: WriteHandle,
}

/// Turns recognizer output into panel updates and actuator writes.
pub struct VoiceInterpreter<S: RemoteStore> {
    panel: Panel<S>,
    classifier: Classifier,
}

impl<S: RemoteStore> VoiceInterpreter<S> {
    pub fn new(panel: Panel<S>, classifier: Classifier) -> Self {
        Self { panel, classifier }
    }

    /// Uses the built-in rule set of the panel's variant.
    pub fn for_panel(panel: Panel<S>) -> Self {
        let classifier = Classifier::for_variant(panel.variant());
        Self::new(panel, classifier)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub async fn handle(&self, event: RecognitionEvent) -> Option<Dispatched> {
        match event {
            RecognitionEvent::Result(transcript) => self.on_result(&transcript).await,
            RecognitionEvent::Error(reason) => {
                self.on_error(&reason).await;
                None
            }
        }
    }

    pub async fn on_result(&self, transcript: &Transcript) -> Option<Dispatched> {
        tracing::info!("🎙️ Heard: {}", transcript.as_str());
        self.panel.post_recognized(transcript.as_str()).await;

        let Some(classification) = self.classifier.classify(transcript) else {
            tracing::debug!("No command in transcript");
            return None;
        };

        self.panel.post_command_message(classification.ack).await;
        let write = self.panel.dispatch(classification.command).await;
        Some(Dispatched {
            classification,
            write,
        })
    }

    pub async fn on_error(&self, reason: &str) {
        tracing::warn!("❌ Speech recognition failed: {}", reason);
        self.panel.post_command_message(RECOGNITION_ERROR_MESSAGE).await;
    }
}
