//! Toolbar tools.
//!
//! The active tool decides how a pointer-down on the canvas is read:
//!
//! | Tool | Pointer-down | After commit |
//! |------|--------------|--------------|
//! | Select | anchor → handle → body → marquee | stays |
//! | Pan | start panning | stays |
//! | Shape | start a ghost element | cleared (one-shot) |
//! | Pen | start a freehand stroke | stays |

use cn_core::model::ElementKind;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    /// Create an element of a box kind.
    Shape(ElementKind),
    Pen,
}

impl ToolKind {
    /// Shape tools fall back to `Select` once they have created something.
    pub fn is_one_shot(self) -> bool {
        matches!(self, ToolKind::Shape(_))
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::Pen => "pen",
            ToolKind::Shape(kind) => kind.name(),
        }
    }

    /// Parse a tool name as sent by the host toolbar.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "select" => Some(ToolKind::Select),
            "pan" => Some(ToolKind::Pan),
            "pen" | "freehand-drawing" => Some(ToolKind::Pen),
            other => ElementKind::from_name(other)
                .filter(|k| k.is_box())
                .map(ToolKind::Shape),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for tool in [
            ToolKind::Select,
            ToolKind::Pan,
            ToolKind::Pen,
            ToolKind::Shape(ElementKind::StickyNote),
            ToolKind::Shape(ElementKind::Cylinder),
        ] {
            assert_eq!(ToolKind::from_name(tool.name()), Some(tool));
        }
        assert_eq!(ToolKind::from_name("freehand-drawing"), Some(ToolKind::Pen));
        assert_eq!(ToolKind::from_name("lasso"), None);
    }

    #[test]
    fn only_shapes_are_one_shot() {
        assert!(ToolKind::Shape(ElementKind::Circle).is_one_shot());
        assert!(!ToolKind::Pen.is_one_shot());
        assert!(!ToolKind::Pan.is_one_shot());
    }
}
