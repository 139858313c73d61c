//! Integration tests: assistant retry policy and delivery to the controller.

use chrono::Utc;
use cn_core::*;
use cn_editor::{CanvasController, NoticeLevel};
use cn_sync::*;
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Replays scripted layouts; suggests connecting consecutive labels.
#[derive(Default)]
struct ScriptedAssistant {
    layouts: Mutex<VecDeque<Result<String, AssistError>>>,
    calls: AtomicUsize,
    last_notes: Mutex<String>,
}

impl ScriptedAssistant {
    fn with(layouts: Vec<Result<String, AssistError>>) -> Self {
        Self {
            layouts: Mutex::new(layouts.into()),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DiagramAssistant for ScriptedAssistant {
    async fn generate_layout(&self, notes: &str) -> Result<String, AssistError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_notes.lock().unwrap() = notes.to_string();
        self.layouts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn suggest_connections(
        &self,
        _notes: &str,
        labels: &[String],
    ) -> Result<Vec<SuggestedConnection>, AssistError> {
        Ok(labels
            .windows(2)
            .map(|pair| SuggestedConnection {
                source: pair[0].clone(),
                target: pair[1].clone(),
            })
            .collect())
    }
}

fn service_error() -> AssistError {
    AssistError::Service("timeout".into())
}

fn canvas_with_notes(notes: &str) -> CanvasController {
    let mut c = CanvasController::create("canvas-ai", "AI", Utc::now(), CanvasConfig::default());
    c.set_notes(notes);
    c
}

// ─── Retry policy ───────────────────────────────────────────────────────

#[tokio::test]
async fn success_is_not_retried() {
    let assistant = ScriptedAssistant::with(vec![Ok(r#"rectangle with text "Login""#.into())]);
    let c = canvas_with_notes("<p>Login</p>");
    let req = c.generate_request().unwrap();

    let elements = generate_diagram(&assistant, &req, c.config()).await.unwrap();
    assert_eq!(elements.len(), 1);
    assert_eq!(assistant.calls(), 1);
}

#[tokio::test]
async fn error_is_retried_once() {
    let assistant = ScriptedAssistant::with(vec![
        Err(service_error()),
        Ok(r#"rectangle with text "Login""#.into()),
    ]);
    let c = canvas_with_notes("Login");
    let req = c.generate_request().unwrap();

    let elements = generate_diagram(&assistant, &req, c.config()).await.unwrap();
    assert_eq!(elements[0].content, "Login");
    assert_eq!(assistant.calls(), 2);
}

#[tokio::test]
async fn empty_layout_is_retried_once() {
    let assistant = ScriptedAssistant::with(vec![
        Ok("nothing useful here".into()),
        Ok(r#"circle "Hub""#.into()),
    ]);
    let c = canvas_with_notes("Hub");
    let req = c.generate_request().unwrap();

    let elements = generate_diagram(&assistant, &req, c.config()).await.unwrap();
    assert_eq!(elements[0].kind(), ElementKind::Circle);
    assert_eq!(elements[0].content, "Hub");
}

#[tokio::test]
async fn gives_up_after_retry() {
    let assistant = ScriptedAssistant::with(vec![Ok(String::new()), Ok(String::new())]);
    let c = canvas_with_notes("anything");
    let req = c.generate_request().unwrap();
    assert!(generate_diagram(&assistant, &req, c.config()).await.unwrap().is_empty());
    assert_eq!(assistant.calls(), 2);

    let assistant = ScriptedAssistant::with(vec![Err(service_error()), Err(service_error())]);
    assert!(matches!(
        generate_diagram(&assistant, &req, c.config()).await,
        Err(AssistError::Service(_))
    ));
}

#[tokio::test]
async fn assistant_receives_plain_text() {
    let assistant = ScriptedAssistant::with(vec![Ok(r#"text label "Title""#.into())]);
    let c = canvas_with_notes("<h1>Title</h1><p>body</p>");
    let req = c.generate_request().unwrap();
    generate_diagram(&assistant, &req, c.config()).await.unwrap();

    let sent = assistant.last_notes.lock().unwrap().clone();
    assert!(!sent.contains('<'));
    assert!(sent.contains("Title"));
    assert!(sent.contains("body"));
}

// ─── Delivery ───────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_then_suggest_end_to_end() {
    let assistant = ScriptedAssistant::with(vec![Ok(
        "rectangle with text \"Login\"\ncylinder with text \"Users DB\"".into(),
    )]);
    let mut c = canvas_with_notes("<p>Login reads the users DB</p>");

    let req = c.generate_request().unwrap();
    let result = generate_diagram(&assistant, &req, c.config()).await;
    assert!(deliver_generated(&mut c, req.session, result));
    assert_eq!(c.document().elements().len(), 2);

    let req = c.suggest_request().unwrap();
    let result = suggest_connections(&assistant, &req).await;
    assert_eq!(deliver_suggestions(&mut c, req.session, result), 1);

    let conn = &c.document().connections()[0];
    let source = c.document().element(conn.source.element_id).unwrap();
    assert_eq!(source.content, "Login");
}

#[tokio::test]
async fn result_for_closed_canvas_is_discarded() {
    let assistant = ScriptedAssistant::with(vec![Ok(r#"diamond "Decide""#.into())]);
    let mut c = canvas_with_notes("Decide");
    let req = c.generate_request().unwrap();
    let result = generate_diagram(&assistant, &req, c.config()).await;

    c.close(Utc::now());
    assert!(!deliver_generated(&mut c, req.session, result));
    assert!(c.document().elements().is_empty());
}

#[tokio::test]
async fn failure_becomes_error_notice() {
    let mut c = canvas_with_notes("Decide");
    let session = c.session();
    assert!(!deliver_generated(&mut c, session, Err(service_error())));

    let notices = c.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}
