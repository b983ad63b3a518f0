//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::{Arc, Mutex};

use crate::clipboard::{ClipboardError, ClipboardSource};
use crate::core::AgentContext;
use crate::protocol::{Outbound, OutboundKind, OutboundMessage};

/// Outbound sink that keeps every message in memory.
#[derive(Default)]
pub struct RecordingOutbound {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl RecordingOutbound {
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<OutboundKind> {
        self.messages().into_iter().map(|m| m.kind).collect()
    }
}

impl Outbound for RecordingOutbound {
    fn send(&self, message: OutboundMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

/// Clipboard that answers every read with the same result.
pub struct ScriptedClipboard {
    result: Result<String, ClipboardError>,
    pub reads: usize,
}

impl ScriptedClipboard {
    pub fn with_text(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            reads: 0,
        }
    }

    pub fn empty() -> Self {
        Self {
            result: Err(ClipboardError::Unavailable),
            reads: 0,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(ClipboardError::Access(reason.to_string())),
            reads: 0,
        }
    }
}

impl ClipboardSource for ScriptedClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        self.reads += 1;
        self.result.clone()
    }
}

/// Creates an `AgentContext` whose outbound messages land in `outbound`.
pub fn test_context(outbound: Arc<RecordingOutbound>) -> AgentContext {
    AgentContext::new(outbound)
}
