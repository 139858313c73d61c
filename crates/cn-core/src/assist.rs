//! Parsing for the AI assistant boundary.
//!
//! The generator answers with one element per line, e.g.
//! `rectangle with text "User Authentication"`. Lines are matched by keyword
//! and laid out on a fixed 4-column grid. Connection suggestions come back as
//! label pairs and are resolved against element content.

use crate::config::CanvasConfig;
use crate::geometry::Rect;
use crate::id::ElementId;
use crate::model::{DiagramConnection, DiagramElement, ElementKind};
use serde::{Deserialize, Serialize};
use winnow::combinator::{delimited, opt, preceded};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{one_of, take_till};

/// Keywords checked in order; the first one found in a line decides the kind.
const KIND_KEYWORDS: [(&str, ElementKind); 7] = [
    ("rectangle", ElementKind::Rectangle),
    ("circle", ElementKind::Circle),
    ("diamond", ElementKind::Diamond),
    ("triangle", ElementKind::Triangle),
    ("cylinder", ElementKind::Cylinder),
    ("sticky note", ElementKind::StickyNote),
    ("text label", ElementKind::Text),
];

const GRID_COLUMNS: usize = 4;
const GRID_ORIGIN: f32 = 100.0;
const GRID_STEP_X: f32 = 200.0;
const GRID_STEP_Y: f32 = 150.0;

/// A connection proposed by the assistant, by element label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedConnection {
    pub source: String,
    pub target: String,
}

/// Turn a generated layout description into elements with fresh ids.
///
/// The grid slot is the index among all non-empty lines, so a line that
/// names no known kind still takes up its cell.
pub fn parse_layout(layout: &str, config: &CanvasConfig) -> Vec<DiagramElement> {
    layout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .filter_map(|(index, line)| {
            let kind = detect_kind(line)?;
            let (width, height) = config.default_size(kind);
            let rect = Rect::new(
                GRID_ORIGIN + (index % GRID_COLUMNS) as f32 * GRID_STEP_X,
                GRID_ORIGIN + (index / GRID_COLUMNS) as f32 * GRID_STEP_Y,
                width,
                height,
            );
            let element =
                DiagramElement::boxed(ElementId::generate(), kind, rect, extract_label(line));
            Some(element.with_background(config.default_background(kind)))
        })
        .collect()
}

fn detect_kind(line: &str) -> Option<ElementKind> {
    let lower = line.to_lowercase();
    KIND_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|&(_, kind)| kind)
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// Text between the first quote character and the next one; the whole line
/// when there is no closed pair.
fn extract_label(line: &str) -> String {
    let mut input = line;
    let quoted: ModalResult<&str> = preceded(
        take_till(0.., is_quote),
        delimited(one_of(is_quote), take_till(0.., is_quote), one_of(is_quote)),
    )
    .parse_next(&mut input);
    quoted.unwrap_or(line).to_string()
}

/// Flatten stored rich-text notes for the assistant: every markup tag
/// becomes a single space. An unterminated `<` swallows the rest.
pub fn notes_to_plain_text(html: &str) -> String {
    let mut input = html;
    let mut out = String::with_capacity(html.len());
    loop {
        let text: Result<&str, winnow::error::ErrMode<ContextError>> =
            take_till(0.., '<').parse_next(&mut input);
        out.push_str(text.unwrap_or_default());
        if input.is_empty() {
            break;
        }
        let tag: Result<_, winnow::error::ErrMode<ContextError>> =
            ('<', take_till(0.., '>'), opt('>')).parse_next(&mut input);
        if tag.is_err() {
            break;
        }
        out.push(' ');
    }
    out
}

/// Resolve suggested label pairs against `elements`. The first element with
/// exactly matching content wins; pairs naming an unknown label are dropped.
pub fn resolve_suggestions(
    elements: &[DiagramElement],
    suggestions: &[SuggestedConnection],
) -> Vec<DiagramConnection> {
    let find = |label: &str| elements.iter().find(|el| el.content == label).map(DiagramElement::id);
    suggestions
        .iter()
        .filter_map(|s| match (find(&s.source), find(&s.target)) {
            (Some(source), Some(target)) => Some(DiagramConnection::new(source, target)),
            _ => {
                log::debug!("dropping suggestion {:?} -> {:?}", s.source, s.target);
                None
            }
        })
        .collect()
}
