//! AI assistant boundary: diagram generation and connection suggestions.

use crate::error::AssistError;
use cn_core::assist::{SuggestedConnection, parse_layout};
use cn_core::config::CanvasConfig;
use cn_core::model::DiagramElement;
use cn_editor::{AssistRequest, CanvasController, SessionToken};
use serde::Deserialize;
use std::future::Future;

/// An external assistant. Inputs are plain text.
pub trait DiagramAssistant: Send + Sync {
    /// Notes in, newline-delimited layout description out, one element per
    /// line (e.g. `rectangle with text "User Authentication"`).
    fn generate_layout(
        &self,
        notes: &str,
    ) -> impl Future<Output = Result<String, AssistError>> + Send;

    fn suggest_connections(
        &self,
        notes: &str,
        labels: &[String],
    ) -> impl Future<Output = Result<Vec<SuggestedConnection>, AssistError>> + Send;
}

/// The first attempt plus one retry.
const GENERATE_ATTEMPTS: usize = 2;

/// Ask for a layout and parse it into elements. A failed call or a layout
/// with no recognizable element is retried once. An empty result after the
/// retry is `Ok(vec![])`; an error on the last attempt is returned.
pub async fn generate_diagram<A: DiagramAssistant>(
    assistant: &A,
    request: &AssistRequest,
    config: &CanvasConfig,
) -> Result<Vec<DiagramElement>, AssistError> {
    let mut last_error = None;
    for attempt in 1..=GENERATE_ATTEMPTS {
        match assistant.generate_layout(&request.notes).await {
            Ok(layout) => {
                let elements = parse_layout(&layout, config);
                if !elements.is_empty() {
                    log::info!("generated {} element(s) on attempt {attempt}", elements.len());
                    return Ok(elements);
                }
                log::warn!("attempt {attempt}: layout had no recognizable elements");
                last_error = None;
            }
            Err(err) => {
                log::warn!("attempt {attempt}: {err}");
                last_error = Some(err);
            }
        }
    }
    match last_error {
        Some(err) => Err(err),
        None => Ok(Vec::new()),
    }
}

/// Ask for label pairs to connect. Not retried.
pub async fn suggest_connections<A: DiagramAssistant>(
    assistant: &A,
    request: &AssistRequest,
) -> Result<Vec<SuggestedConnection>, AssistError> {
    assistant
        .suggest_connections(&request.notes, &request.labels)
        .await
}

#[derive(Deserialize)]
struct SuggestionsResponse {
    connections: Vec<SuggestedConnection>,
}

/// Parse a suggestion response of the form
/// `{"connections": [{"source": "...", "target": "..."}]}`.
pub fn parse_suggestions(json: &str) -> Result<Vec<SuggestedConnection>, AssistError> {
    let response: SuggestionsResponse = serde_json::from_str(json)?;
    Ok(response.connections)
}

/// Hand a generation outcome to the controller that asked for it.
pub fn deliver_generated(
    controller: &mut CanvasController,
    session: SessionToken,
    result: Result<Vec<DiagramElement>, AssistError>,
) -> bool {
    match result {
        Ok(elements) => controller.apply_generated(session, elements),
        Err(err) => {
            controller.assist_failed(session, &err.to_string());
            false
        }
    }
}

/// Hand a suggestion outcome to the controller that asked for it.
pub fn deliver_suggestions(
    controller: &mut CanvasController,
    session: SessionToken,
    result: Result<Vec<SuggestedConnection>, AssistError>,
) -> usize {
    match result {
        Ok(suggestions) => controller.apply_suggestions(session, &suggestions),
        Err(err) => {
            controller.assist_failed(session, &err.to_string());
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suggestion_payload() {
        let parsed = parse_suggestions(
            r#"{"connections":[{"source":"Login","target":"Database"}]}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            vec![SuggestedConnection {
                source: "Login".into(),
                target: "Database".into(),
            }]
        );
    }

    #[test]
    fn rejects_bare_array() {
        assert!(matches!(
            parse_suggestions(r#"[{"source":"a","target":"b"}]"#),
            Err(AssistError::Malformed(_))
        ));
    }
}
