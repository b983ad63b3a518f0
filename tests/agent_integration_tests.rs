use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use paramon::agent::GestureDispatcher;
use paramon::clipboard::{ClipboardError, ClipboardSource};
use paramon::core::AgentContext;
use paramon::core::validator::{self, Verdict};
use paramon::input::Gesture;
use paramon::protocol::endpoint::{self, Direction};
use paramon::protocol::inbound::read_commands;
use paramon::protocol::{
    EndpointPaths, LineReader, Outbound, OutboundKind, OutboundMessage, PipeWriter, PollSettings,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Collects outbound messages in memory
#[derive(Default)]
struct Recorder {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<OutboundKind> {
        self.messages.lock().unwrap().iter().map(|m| m.kind).collect()
    }
}

impl Outbound for Recorder {
    fn send(&self, message: OutboundMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

/// Clipboard holding fixed text
struct FixedClipboard(Option<String>);

impl ClipboardSource for FixedClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        self.0.clone().ok_or(ClipboardError::Unavailable)
    }
}

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("paramon-{label}-{}", uuid::Uuid::new_v4()))
}

fn fast_poll() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(5),
        max_backoff: Duration::from_millis(20),
    }
}

fn append(path: &PathBuf, text: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

/// Polls `check` until it holds or two seconds pass
async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

// ============================================================================
// Inbound: controller writes commands, agent state follows
// ============================================================================

#[tokio::test]
async fn test_commands_appended_to_inbound_file_update_state() {
    let path = temp_path("inbound");
    fs::write(&path, "").unwrap();

    let recorder = Arc::new(Recorder::default());
    let context = AgentContext::new(recorder.clone());
    let file = tokio::fs::File::open(&path).await.unwrap();
    let reader = tokio::spawn(read_commands(LineReader::new(file, fast_poll()), context.clone()));

    // Written in two pieces: the reader must hold the partial line
    append(&path, "SET_PARAGRAPHS:alpha|beta|gam");
    append(&path, "ma\nSET_INDEX:2\n");

    let state = context.state.clone();
    assert!(eventually(|| state.snapshot().current() == Some("gamma")).await);

    // Unknown and malformed lines are ignored, later commands still apply
    append(&path, "FOO:bar\nno colon here\nSET_INDEX:0\n");
    assert!(eventually(|| state.snapshot().index() == 0).await);
    assert_eq!(state.snapshot().current(), Some("alpha"));

    // The inbound side never writes to the controller
    assert!(recorder.kinds().is_empty());

    reader.abort();
    let _ = fs::remove_file(&path);
}

// ============================================================================
// End-to-end validation scenarios
// ============================================================================

#[test]
fn test_copy_of_current_paragraph_reports_success() {
    let recorder = Arc::new(Recorder::default());
    let context = AgentContext::new(recorder.clone());
    context
        .state
        .replace_paragraphs(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    context.state.set_index(1);

    let mut clipboard = FixedClipboard(Some("b".to_string()));
    assert_eq!(validator::validate(&mut clipboard, &context), Some(Verdict::Match));

    let mut clipboard = FixedClipboard(Some("a".to_string()));
    assert_eq!(validator::validate(&mut clipboard, &context), Some(Verdict::Mismatch));

    assert_eq!(recorder.kinds(), vec![OutboundKind::Success, OutboundKind::Fail]);
}

#[test]
fn test_copy_before_any_paragraphs_reports_fail() {
    let recorder = Arc::new(Recorder::default());
    let context = AgentContext::new(recorder.clone());

    let mut clipboard = FixedClipboard(Some("anything".to_string()));
    assert_eq!(validator::validate(&mut clipboard, &context), Some(Verdict::Mismatch));
    assert_eq!(recorder.kinds(), vec![OutboundKind::Fail]);
}

#[test]
fn test_copy_with_empty_clipboard_sends_nothing() {
    let recorder = Arc::new(Recorder::default());
    let context = AgentContext::new(recorder.clone());
    context.state.replace_paragraphs(vec!["a".to_string()]);

    let mut dispatcher = GestureDispatcher::new(FixedClipboard(None), context, Duration::ZERO);
    assert_eq!(dispatcher.handle(Gesture::Copy), None);
    assert!(recorder.kinds().is_empty());
}

// ============================================================================
// Outbound: lines as the controller reads them
// ============================================================================

#[test]
fn test_pipe_writer_appends_one_line_per_message() {
    let path = temp_path("outbound");
    fs::write(&path, "").unwrap();

    let file = OpenOptions::new().append(true).open(&path).unwrap();
    let writer = PipeWriter::new(file);
    writer.send(OutboundMessage::started());
    writer.send(OutboundMessage::success());
    writer.send(OutboundMessage::error("two\nlines"));
    writer.send(OutboundMessage::info("done"));
    drop(writer);

    // The message with a line break is dropped, not split
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "INFO:Swift monitor started successfully\nSUCCESS:Clipboard match\nINFO:done\n"
    );

    let _ = fs::remove_file(&path);
}

// ============================================================================
// Endpoints
// ============================================================================

#[tokio::test]
async fn test_wait_then_open_once_both_endpoints_exist() {
    let paths = EndpointPaths {
        inbound: temp_path("in"),
        outbound: temp_path("out"),
    };

    let waiter = {
        let paths = paths.clone();
        tokio::spawn(async move { endpoint::wait_for_endpoints(&paths, fast_poll()).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!waiter.is_finished());

    fs::write(&paths.inbound, "").unwrap();
    fs::write(&paths.outbound, "").unwrap();
    tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .unwrap()
        .unwrap();

    let endpoints = endpoint::open_endpoints(&paths).await.unwrap();
    PipeWriter::new(endpoints.outbound).send(OutboundMessage::info("hello"));
    assert_eq!(fs::read_to_string(&paths.outbound).unwrap(), "INFO:hello\n");

    let _ = fs::remove_file(&paths.inbound);
    let _ = fs::remove_file(&paths.outbound);
}

#[tokio::test]
async fn test_open_reports_missing_endpoint() {
    let paths = EndpointPaths {
        inbound: temp_path("missing-in"),
        outbound: temp_path("missing-out"),
    };
    let err = endpoint::open_endpoints(&paths).await.unwrap_err();
    assert_eq!(err.direction, Direction::Inbound);
    assert_eq!(err.path, paths.inbound);
}
