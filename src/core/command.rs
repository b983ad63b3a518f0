//! # Command Processor
//!
//! Applies controller commands to the navigation state. Runs on the inbound
//! reader task.
//!
//! ```text
//! SET_PARAGRAPHS:a|b|c  →  paragraphs = ["a", "b", "c"]
//! SET_INDEX:1           →  index = 1
//! anything else         →  logged, ignored
//! ```
//!
//! Nothing here reports back to the controller. Unknown kinds and garbled
//! lines are logged locally and skipped.

use log::{debug, info, warn};

use crate::core::state::NavigationState;
use crate::protocol::InboundCommand;

pub struct CommandProcessor {
    state: NavigationState,
}

impl CommandProcessor {
    pub fn new(state: NavigationState) -> Self {
        Self { state }
    }

    pub fn apply(&self, line: &[u8]) {
        if line.iter().all(u8::is_ascii_whitespace) {
            return;
        }

        match InboundCommand::parse(line) {
            Ok(InboundCommand::SetParagraphs(paragraphs)) => {
                info!("Paragraphs replaced ({} total)", paragraphs.len());
                self.state.replace_paragraphs(paragraphs);
            }
            Ok(InboundCommand::SetIndex(index)) => {
                info!("Current index set to {}", index);
                self.state.set_index(index);
            }
            Ok(InboundCommand::Unknown { kind, .. }) => {
                debug!("Ignoring unknown command kind {:?}", kind);
            }
            Err(e) => {
                warn!("Ignoring inbound line: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::ParagraphSet;
    use crate::core::validator::{self, Verdict};
    use crate::protocol::OutboundKind;
    use crate::test_support::{RecordingOutbound, ScriptedClipboard, test_context};
    use std::sync::Arc;

    fn processor() -> (CommandProcessor, NavigationState) {
        let state = NavigationState::new();
        (CommandProcessor::new(state.clone()), state)
    }

    #[test]
    fn test_set_paragraphs_then_index() {
        let (processor, state) = processor();
        processor.apply(b"SET_PARAGRAPHS:a|b|c");
        processor.apply(b"SET_INDEX:1");
        assert_eq!(
            state.snapshot(),
            ParagraphSet::new(vec!["a".into(), "b".into(), "c".into()], 1)
        );
        assert!(state.matches_current("b"));
    }

    #[test]
    fn test_set_paragraphs_replaces_previous_list() {
        let (processor, state) = processor();
        processor.apply(b"SET_PARAGRAPHS:old|list|here");
        processor.apply(b"SET_PARAGRAPHS:new");
        assert_eq!(state.snapshot().paragraphs(), &["new".to_string()]);
    }

    #[test]
    fn test_unknown_kind_leaves_state_unchanged() {
        let (processor, state) = processor();
        processor.apply(b"SET_PARAGRAPHS:a|b");
        processor.apply(b"SET_INDEX:1");
        let before = state.snapshot();
        processor.apply(b"FOO:bar");
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_malformed_lines_are_ignored() {
        let (processor, state) = processor();
        processor.apply(b"SET_INDEX:1");
        processor.apply(b"garbage without separator");
        processor.apply(b"\xff\xfe:\x00");
        processor.apply(b"");
        processor.apply(b"  ");
        assert_eq!(state.snapshot().index(), 1);
    }

    #[test]
    fn test_negative_index_never_validates_as_a_match() {
        let outbound = Arc::new(RecordingOutbound::default());
        let context = test_context(outbound.clone());
        let processor = CommandProcessor::new(context.state.clone());
        processor.apply(b"SET_PARAGRAPHS:a|b");
        processor.apply(b"SET_INDEX:-1");
        assert_eq!(context.state.snapshot().index(), -1);

        let mut clipboard = ScriptedClipboard::with_text("a");
        assert_eq!(validator::validate(&mut clipboard, &context), Some(Verdict::Mismatch));
        assert_eq!(outbound.kinds(), vec![OutboundKind::Fail]);
    }

    #[test]
    fn test_non_numeric_index_resets_to_zero() {
        let (processor, state) = processor();
        processor.apply(b"SET_INDEX:4");
        processor.apply(b"SET_INDEX:notanumber");
        assert_eq!(state.snapshot().index(), 0);
    }
}
