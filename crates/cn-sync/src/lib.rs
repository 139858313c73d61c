//! Asynchronous boundary of a CanvasNote canvas.
//!
//! The editor core never awaits anything. This crate owns the parts that do:
//! the document store, the autosave background task, the remote-change feed
//! and calls to the AI assistant. Results flow back into a
//! [`CanvasController`](cn_editor::CanvasController) through its session-checked
//! entry points.

pub mod assist;
pub mod autosave;
pub mod error;
pub mod remote;
pub mod store;

pub use assist::{
    DiagramAssistant, deliver_generated, deliver_suggestions, generate_diagram, parse_suggestions,
    suggest_connections,
};
pub use autosave::{Autosave, AutosaveConfig, AutosaveEvent};
pub use error::{AssistError, StoreError};
pub use remote::RemoteFeed;
pub use store::{CanvasSummary, DocumentStore, MemoryStore};
