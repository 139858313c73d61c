//! Tunable constants for the canvas.
//!
//! Hosts may hand in a partial JSON object; every missing field falls back
//! to its default.

use crate::geometry::Point;
use crate::model::ElementKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

// ─── Canvas ───────────────────────────────────────────────────────────────

/// Configuration for the interactive canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Floor for an element's width and height after any resize. Default: **20**.
    pub min_element_size: f32,

    /// Resize handle side length in screen pixels (constant under zoom). Default: **8**.
    pub handle_size: f32,

    /// Connection anchor side length in screen pixels. Default: **10**.
    pub anchor_size: f32,

    /// Distance in screen pixels between an edge midpoint and its connection
    /// anchor, so anchors never overlap the edge resize handles. Default: **16**.
    pub anchor_offset: f32,

    /// A dragged shape smaller than this (in document units, either axis) is
    /// treated as a click and gets the default size. Default: **5**.
    pub click_threshold: f32,

    /// Default box size for every kind except sticky notes and text.
    pub default_width: f32,
    pub default_height: f32,
    pub sticky_note_size: f32,
    pub text_height: f32,

    /// Background given to new sticky notes.
    pub sticky_note_color: String,

    /// Toolbar footprint in screen pixels, used to keep it inside the viewport.
    pub toolbar_width: f32,
    pub toolbar_height: f32,

    /// Height of the drag grip strip at the top of the toolbar.
    pub toolbar_grip_height: f32,

    pub default_toolbar_position: Point,

    pub min_scale: f32,
    pub max_scale: f32,

    /// Scale change per unit of wheel delta when zooming. Default: **0.0005**.
    pub wheel_zoom_factor: f32,

    /// Maximum number of undo steps kept. Default: **200**.
    pub history_depth: usize,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_element_size: 20.0,
            handle_size: 8.0,
            anchor_size: 10.0,
            anchor_offset: 16.0,
            click_threshold: 5.0,
            default_width: 150.0,
            default_height: 80.0,
            sticky_note_size: 150.0,
            text_height: 40.0,
            sticky_note_color: "#FFF9C4".to_string(),
            toolbar_width: 52.0,
            toolbar_height: 316.0,
            toolbar_grip_height: 24.0,
            default_toolbar_position: Point::new(16.0, 16.0),
            min_scale: 0.1,
            max_scale: 5.0,
            wheel_zoom_factor: 0.0005,
            history_depth: 200,
        }
    }
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Scale bounds must be finite, positive and ordered; sizes used as
    /// divisors or floors must be finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("minScale", self.min_scale),
            ("maxScale", self.max_scale),
            ("minElementSize", self.min_element_size),
            ("handleSize", self.handle_size),
            ("anchorSize", self.anchor_size),
        ];
        let bad = positive
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v > 0.0));
        if let Some((name, value)) = bad {
            return Err(ConfigError::Invalid(format!(
                "{name} must be positive, got {value}"
            )));
        }
        if self.min_scale > self.max_scale {
            return Err(ConfigError::Invalid(format!(
                "minScale {} exceeds maxScale {}",
                self.min_scale, self.max_scale
            )));
        }
        if !self.wheel_zoom_factor.is_finite() {
            return Err(ConfigError::Invalid("wheelZoomFactor must be finite".into()));
        }
        Ok(())
    }

    /// `self` if valid, else the defaults.
    pub fn or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(err) => {
                log::warn!("{err}; using the default canvas config");
                Self::default()
            }
        }
    }

    /// Default `(width, height)` for a freshly created element of `kind`.
    pub fn default_size(&self, kind: ElementKind) -> (f32, f32) {
        match kind {
            ElementKind::StickyNote => (self.sticky_note_size, self.sticky_note_size),
            ElementKind::Text => (self.default_width, self.text_height),
            _ => (self.default_width, self.default_height),
        }
    }

    /// Default background for a freshly created element of `kind`.
    pub fn default_background(&self, kind: ElementKind) -> Option<String> {
        (kind == ElementKind::StickyNote).then(|| self.sticky_note_color.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = CanvasConfig::from_json(r#"{"minElementSize": 32, "historyDepth": 5}"#).unwrap();
        assert_eq!(cfg.min_element_size, 32.0);
        assert_eq!(cfg.history_depth, 5);
        assert_eq!(cfg.handle_size, 8.0);
        assert_eq!(cfg.sticky_note_color, "#FFF9C4");
    }

    #[test]
    fn inverted_scale_bounds_are_rejected() {
        let err = CanvasConfig::from_json(r#"{"minScale": 10}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(CanvasConfig::from_json(r#"{"maxScale": -1}"#).is_err());
        assert!(CanvasConfig::from_json(r#"{"minElementSize": 0}"#).is_err());
        assert!(matches!(
            CanvasConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let bad = CanvasConfig {
            min_scale: f32::NAN,
            ..CanvasConfig::default()
        };
        assert_eq!(bad.or_default(), CanvasConfig::default());
        let good = CanvasConfig {
            history_depth: 3,
            ..CanvasConfig::default()
        };
        assert_eq!(good.clone().or_default(), good);
    }

    #[test]
    fn default_sizes_per_kind() {
        let cfg = CanvasConfig::default();
        assert_eq!(cfg.default_size(ElementKind::Circle), (150.0, 80.0));
        assert_eq!(cfg.default_size(ElementKind::StickyNote), (150.0, 150.0));
        assert_eq!(cfg.default_size(ElementKind::Text), (150.0, 40.0));
        assert_eq!(cfg.default_background(ElementKind::Rectangle), None);
    }
}
