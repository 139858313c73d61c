//! Interaction layer for a CanvasNote canvas.
//!
//! [`CanvasController`] owns a document and turns normalized input events
//! into mutations, selection changes and undo steps. It never touches the
//! DOM or the network; hosts feed it events and drain its outputs.

pub mod canvas;
pub mod history;
pub mod input;
pub mod interaction;
pub mod notice;
pub mod persist;
pub mod selection;
pub mod shortcuts;
pub mod tools;

pub use canvas::{AssistRequest, CanvasController, SaveRequest, SessionToken};
pub use history::History;
pub use input::{InputEvent, Modifiers, PointerButton, PointerInput, WheelInput};
pub use interaction::{Interaction, resize_rect};
pub use notice::{Notice, NoticeLevel};
pub use persist::SaveGate;
pub use selection::Selection;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::ToolKind;
