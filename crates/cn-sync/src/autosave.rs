//! Background autosave.
//!
//! One task per open canvas. The host hands it [`SaveRequest`]s taken from
//! the controller; the task coalesces them over a short debounce window,
//! retries a pending save on a periodic tick, and reports each outcome as an
//! [`AutosaveEvent`]. Closing performs a final save of whatever is pending.

use crate::error::StoreError;
use crate::store::DocumentStore;
use chrono::{DateTime, Utc};
use cn_editor::{CanvasController, SaveRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Quiet period after the last edit before it is written.
    pub debounce: Duration,
    /// A pending save is attempted at least this often, even while edits
    /// keep arriving.
    pub interval: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(400),
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
enum Command {
    Edited(SaveRequest),
    Flush,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveEvent {
    Saved { revision: u64 },
    SaveFailed { revision: u64, reason: String },
}

impl AutosaveEvent {
    /// Feed a save outcome back into the controller.
    pub fn apply_to(&self, controller: &mut CanvasController) {
        match self {
            AutosaveEvent::Saved { revision } => controller.mark_saved(*revision),
            AutosaveEvent::SaveFailed { reason, .. } => controller.save_failed(reason),
        }
    }
}

/// Handle to a running autosave task.
pub struct Autosave {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<AutosaveEvent>,
    task: JoinHandle<()>,
}

impl Autosave {
    /// Start the task. Must be called inside a tokio runtime.
    pub fn spawn<S>(store: Arc<S>, config: AutosaveConfig) -> Self
    where
        S: DocumentStore + 'static,
    {
        let (commands, rx) = mpsc::unbounded_channel();
        let (tx, events) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(store, config, rx, tx));
        Self {
            commands,
            events,
            task,
        }
    }

    pub fn submit(&self, request: SaveRequest) -> Result<(), StoreError> {
        self.send(Command::Edited(request))
    }

    /// Save whatever is pending right away.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.send(Command::Flush)
    }

    fn send(&self, command: Command) -> Result<(), StoreError> {
        self.commands.send(command).map_err(|_| StoreError::Stopped)
    }

    pub fn try_event(&mut self) -> Option<AutosaveEvent> {
        self.events.try_recv().ok()
    }

    pub async fn next_event(&mut self) -> Option<AutosaveEvent> {
        self.events.recv().await
    }

    /// Apply finished saves to `controller`, then hand it any newer state.
    pub fn sync(
        &mut self,
        controller: &mut CanvasController,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        while let Some(event) = self.try_event() {
            event.apply_to(controller);
        }
        match controller.take_save_request(now) {
            Some(request) => self.submit(request),
            None => Ok(()),
        }
    }

    /// Close `controller`, write its final state and stop the task.
    /// Returns the outcomes that had not been observed yet.
    pub async fn close(
        mut self,
        controller: &mut CanvasController,
        now: DateTime<Utc>,
    ) -> Vec<AutosaveEvent> {
        if let Some(record) = controller.close(now) {
            let revision = controller.revision();
            if self.submit(SaveRequest { revision, record }).is_err() {
                log::warn!("autosave task stopped before the final save");
            }
        }
        if self.send(Command::Close).is_ok() && self.task.await.is_err() {
            log::warn!("autosave task panicked");
        }
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            event.apply_to(controller);
            events.push(event);
        }
        events
    }
}

async fn run<S: DocumentStore>(
    store: Arc<S>,
    config: AutosaveConfig,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<AutosaveEvent>,
) {
    let mut pending: Option<SaveRequest> = None;
    let mut deadline: Option<Instant> = None;
    let mut ticker = tokio::time::interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let debounce = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Edited(request)) => {
                    log::trace!("autosave: revision {} queued", request.revision);
                    pending = Some(request);
                    deadline = Some(Instant::now() + config.debounce);
                }
                Some(Command::Flush) => {
                    deadline = None;
                    save_pending(store.as_ref(), &mut pending, &events).await;
                }
                Some(Command::Close) | None => {
                    save_pending(store.as_ref(), &mut pending, &events).await;
                    break;
                }
            },
            _ = debounce => {
                deadline = None;
                save_pending(store.as_ref(), &mut pending, &events).await;
            }
            _ = ticker.tick() => {
                if pending.is_some() {
                    deadline = None;
                    save_pending(store.as_ref(), &mut pending, &events).await;
                }
            }
        }
    }
    log::debug!("autosave task stopped");
}

/// A failed save stays pending; the next tick tries again.
async fn save_pending<S: DocumentStore>(
    store: &S,
    pending: &mut Option<SaveRequest>,
    events: &mpsc::UnboundedSender<AutosaveEvent>,
) {
    let Some(request) = pending.take() else {
        return;
    };
    let revision = request.revision;
    let event = match store.save(&request.record).await {
        Ok(()) => {
            log::debug!("saved {} at revision {revision}", request.record.id);
            AutosaveEvent::Saved { revision }
        }
        Err(err) => {
            log::warn!("saving {} failed: {err}", request.record.id);
            *pending = Some(request);
            AutosaveEvent::SaveFailed {
                revision,
                reason: err.to_string(),
            }
        }
    };
    // The handle may already be gone during shutdown.
    let _ = events.send(event);
}
