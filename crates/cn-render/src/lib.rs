pub mod hit;
pub mod svg;

pub use hit::{
    AnchorSide, ResizeHandle, anchor_hit, anchor_point, connection_anchor_at, elements_intersecting,
    hit_test, resize_handle_at,
};
pub use svg::{ExportFile, export_diagram, export_notes, render_svg};
