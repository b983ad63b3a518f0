//! # Validator
//!
//! Compares the clipboard against the paragraph the controller expects to be
//! current, and tells the controller the verdict.
//!
//! ```text
//! clipboard text ──┐
//!                  ├── equal? ──▶ SUCCESS:Clipboard match
//! paragraphs[idx] ─┘         └──▶ FAIL:Clipboard mismatch
//! ```
//!
//! One call, at most one message. An empty clipboard sends nothing; a clipboard
//! that can't be read at all sends `ERROR` instead of a verdict.

use log::{debug, error, info};

use crate::clipboard::{ClipboardError, ClipboardSource};
use crate::core::AgentContext;
use crate::protocol::OutboundMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Mismatch,
}

impl Verdict {
    pub fn message(self) -> OutboundMessage {
        match self {
            Verdict::Match => OutboundMessage::success(),
            Verdict::Mismatch => OutboundMessage::fail(),
        }
    }
}

/// Reads the clipboard and emits the verdict. Returns `None` when no verdict
/// was reached (no text on the clipboard, or the clipboard failed).
pub fn validate(clipboard: &mut dyn ClipboardSource, context: &AgentContext) -> Option<Verdict> {
    let text = match clipboard.read_text() {
        Ok(text) => text,
        Err(ClipboardError::Unavailable) => {
            debug!("Clipboard holds no text, skipping validation");
            return None;
        }
        Err(e) => {
            error!("Validation aborted: {}", e);
            context.report_error(&e);
            return None;
        }
    };

    let verdict = if context.state.matches_current(&text) {
        Verdict::Match
    } else {
        Verdict::Mismatch
    };
    info!("Clipboard verdict: {:?}", verdict);
    context.outbound.send(verdict.message());
    Some(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OutboundKind;
    use crate::test_support::{RecordingOutbound, ScriptedClipboard, test_context};
    use std::sync::Arc;

    fn context_with(paragraphs: &[&str], index: i64) -> (AgentContext, Arc<RecordingOutbound>) {
        let outbound = Arc::new(RecordingOutbound::default());
        let context = test_context(outbound.clone());
        context
            .state
            .replace_paragraphs(paragraphs.iter().map(|p| p.to_string()).collect());
        context.state.set_index(index);
        (context, outbound)
    }

    #[test]
    fn test_every_in_range_index_matches_its_paragraph() {
        let paragraphs = ["first", "second: with colon", "", "last paragraph"];
        for (i, paragraph) in paragraphs.iter().enumerate() {
            let (context, outbound) = context_with(&paragraphs, i as i64);
            let mut clipboard = ScriptedClipboard::with_text(paragraph);
            assert_eq!(validate(&mut clipboard, &context), Some(Verdict::Match));
            assert_eq!(outbound.kinds(), vec![OutboundKind::Success]);
        }
    }

    #[test]
    fn test_other_text_is_a_mismatch() {
        let (context, outbound) = context_with(&["a", "b", "c"], 1);
        for text in ["a", "c", "B", "b ", ""] {
            let mut clipboard = ScriptedClipboard::with_text(text);
            assert_eq!(validate(&mut clipboard, &context), Some(Verdict::Mismatch));
        }
        assert_eq!(outbound.kinds(), vec![OutboundKind::Fail; 5]);
    }

    #[test]
    fn test_out_of_range_index_is_always_a_mismatch() {
        let (context, outbound) = context_with(&["a", "b"], 2);
        let mut clipboard = ScriptedClipboard::with_text("b");
        assert_eq!(validate(&mut clipboard, &context), Some(Verdict::Mismatch));

        let (empty, empty_outbound) = context_with(&[], 0);
        let mut clipboard = ScriptedClipboard::with_text("");
        assert_eq!(validate(&mut clipboard, &empty), Some(Verdict::Mismatch));

        assert_eq!(outbound.kinds(), vec![OutboundKind::Fail]);
        assert_eq!(empty_outbound.kinds(), vec![OutboundKind::Fail]);
    }

    #[test]
    fn test_empty_clipboard_sends_nothing() {
        let (context, outbound) = context_with(&["a"], 0);
        let mut clipboard = ScriptedClipboard::empty();
        assert_eq!(validate(&mut clipboard, &context), None);
        assert!(outbound.messages().is_empty());
    }

    #[test]
    fn test_clipboard_failure_is_reported_as_error() {
        let (context, outbound) = context_with(&["a"], 0);
        let mut clipboard = ScriptedClipboard::failing("no display");
        assert_eq!(validate(&mut clipboard, &context), None);
        let messages = outbound.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, OutboundKind::Error);
        assert_eq!(messages[0].payload, "clipboard access failed: no display");
    }
}
