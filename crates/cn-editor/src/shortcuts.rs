//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Text-editing
//! keys (Enter, Escape while editing) are handled by the controller before
//! shortcuts are consulted.

use crate::tools::ToolKind;
use cn_core::model::ElementKind;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Tool(ToolKind),
    Undo,
    Redo,
    Delete,
    /// Clear tool, ghost, marquee, and selection.
    Cancel,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => return Some(ShortcutAction::Delete),
            "Escape" => return Some(ShortcutAction::Cancel),
            _ => {}
        }

        if shift || alt {
            return None;
        }

        let tool = match key {
            "v" | "V" => ToolKind::Select,
            "h" | "H" => ToolKind::Pan,
            "r" | "R" => ToolKind::Shape(ElementKind::Rectangle),
            "o" | "O" => ToolKind::Shape(ElementKind::Circle),
            "d" | "D" => ToolKind::Shape(ElementKind::Diamond),
            "t" | "T" => ToolKind::Shape(ElementKind::Text),
            "s" | "S" => ToolKind::Shape(ElementKind::StickyNote),
            "p" | "P" => ToolKind::Pen,
            _ => return None,
        };
        Some(ShortcutAction::Tool(tool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_tool_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("v", false, false, false, false),
            Some(ShortcutAction::Tool(ToolKind::Select))
        );
        assert_eq!(
            ShortcutMap::resolve("o", false, false, false, false),
            Some(ShortcutAction::Tool(ToolKind::Shape(ElementKind::Circle)))
        );
        assert_eq!(
            ShortcutMap::resolve("s", false, false, false, false),
            Some(ShortcutAction::Tool(ToolKind::Shape(ElementKind::StickyNote)))
        );
        assert_eq!(
            ShortcutMap::resolve("p", false, false, false, false),
            Some(ShortcutAction::Tool(ToolKind::Pen))
        );
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
    }

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", false, false, false, true),
            Some(ShortcutAction::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        // Ctrl+Shift+Z → Redo (browsers report the key as "Z")
        assert_eq!(
            ShortcutMap::resolve("Z", true, true, false, false),
            Some(ShortcutAction::Redo)
        );
        // Ctrl+Y → Redo
        assert_eq!(
            ShortcutMap::resolve("y", true, false, false, false),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_delete_and_escape() {
        assert_eq!(
            ShortcutMap::resolve("Backspace", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Delete", false, true, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Cancel)
        );
    }

    #[test]
    fn modified_letters_are_not_tools() {
        assert_eq!(ShortcutMap::resolve("r", false, true, false, false), None);
        assert_eq!(ShortcutMap::resolve("r", true, false, false, false), None);
    }
}
