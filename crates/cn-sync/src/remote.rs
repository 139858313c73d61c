//! Remote-change feed: records saved elsewhere, applied to a local canvas.

use cn_core::record::CanvasRecord;
use cn_editor::CanvasController;
use tokio::sync::broadcast::{self, error::TryRecvError};

pub struct RemoteFeed {
    changes: broadcast::Receiver<CanvasRecord>,
}

impl RemoteFeed {
    pub fn new(changes: broadcast::Receiver<CanvasRecord>) -> Self {
        Self { changes }
    }

    /// Drain queued changes and apply the newest one for `controller`'s
    /// canvas. While the controller has unsaved edits the change is dropped
    /// and the local save wins. Returns whether the document was replaced.
    pub fn pump(&mut self, controller: &mut CanvasController) -> bool {
        let mut latest = None;
        loop {
            match self.changes.try_recv() {
                Ok(record) if record.id == controller.meta().id => latest = Some(record),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("remote feed lagged, {skipped} change(s) skipped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        latest.is_some_and(|record| controller.apply_remote(record))
    }
}
