use crate::core::interpreter::VoiceInterpreter;
use crate::core::panel::Panel;
use crate::core::schedule::ScheduleTimer;
use crate::domain::model::RecognitionEvent;
use crate::domain::ports::{RemoteStore, ScheduleStore};
use crate::utils::error::Result;
use chrono::NaiveDateTime;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Counters reported when the engine stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineReport {
    pub snapshots_applied: usize,
    pub utterances: usize,
    pub commands_dispatched: usize,
    pub scheduled_fires: usize,
}

/// Event loop of a running panel: store notifications, recognizer events and
/// schedule ticks, one at a time.
pub struct PanelEngine<S: RemoteStore, P: ScheduleStore> {
    panel: Panel<S>,
    interpreter: VoiceInterpreter<S>,
    timer: Option<Arc<ScheduleTimer<S, P>>>,
    tick_every: Duration,
    clock: Clock,
}

impl<S: RemoteStore, P: ScheduleStore> PanelEngine<S, P> {
    pub fn new(panel: Panel<S>) -> Self {
        let interpreter = VoiceInterpreter::for_panel(panel.clone());
        Self {
            panel,
            interpreter,
            timer: None,
            tick_every: DEFAULT_TICK,
            clock: Arc::new(|| chrono::Local::now().naive_local()),
        }
    }

    pub fn with_timer(mut self, timer: Arc<ScheduleTimer<S, P>>, tick_every: Duration) -> Self {
        self.timer = Some(timer);
        self.tick_every = tick_every;
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn panel(&self) -> &Panel<S> {
        &self.panel
    }

    /// Runs until `shutdown` resolves or the recognizer channel closes.
    pub async fn run<F>(
        &self,
        mut events: mpsc::Receiver<RecognitionEvent>,
        shutdown: F,
    ) -> Result<EngineReport>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Starting panel engine ({:?})", self.panel.variant());
        let mut report = EngineReport::default();
        let mut snapshots = self.panel.store().subscribe().await?;
        let mut store_open = true;

        let mut ticker = tokio::time::interval(self.tick_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                snapshot = snapshots.recv(), if store_open => match snapshot {
                    Some(snapshot) => {
                        self.panel.apply_snapshot(&snapshot).await;
                        report.snapshots_applied += 1;
                    }
                    None => {
                        tracing::warn!("⚠️ Realtime database subscription ended");
                        store_open = false;
                    }
                },
                event = events.recv() => match event {
                    Some(event) => {
                        report.utterances += 1;
                        // the write handle is dropped: fire-and-forget
                        if self.interpreter.handle(event).await.is_some() {
                            report.commands_dispatched += 1;
                        }
                    }
                    None => {
                        tracing::info!("Recognizer closed");
                        break;
                    }
                },
                _ = ticker.tick(), if self.timer.is_some() => {
                    if let Some(timer) = &self.timer {
                        if timer.tick((self.clock)()).await.is_some() {
                            report.scheduled_fires += 1;
                        }
                    }
                }
            }
        }

        tracing::info!(
            "✅ Panel engine stopped: {} snapshots, {} utterances, {} commands, {} scheduled fires",
            report.snapshots_applied,
            report.utterances,
            report.commands_dispatched,
            report.scheduled_fires
        );
        Ok(report)
    }
}
