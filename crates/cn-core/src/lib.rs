pub mod assist;
pub mod config;
pub mod geometry;
pub mod id;
pub mod model;
pub mod record;
pub mod viewport;

pub use assist::{SuggestedConnection, notes_to_plain_text, parse_layout, resolve_suggestions};
pub use config::{CanvasConfig, ConfigError};
pub use geometry::{Point, Rect, bounds_of_points};
pub use id::{ConnectionId, ElementId};
pub use model::*;
pub use record::{CanvasRecord, ElementRecord, RecordError, RecordMeta};
pub use viewport::{MAX_SCALE, MIN_SCALE, ViewTransform, ViewportSize, clamp_into_viewport};
