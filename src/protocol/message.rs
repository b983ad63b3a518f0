//! Message vocabulary for both directions of the channel.

use log::warn;

use super::ProtocolError;

/// Separates paragraphs inside a `SET_PARAGRAPHS` payload.
pub const PARAGRAPH_SEPARATOR: char = '|';

/// Startup announcement. The controller matches on this exact text.
pub const STARTED_TEXT: &str = "Swift monitor started successfully";
pub const MATCH_TEXT: &str = "Clipboard match";
pub const MISMATCH_TEXT: &str = "Clipboard mismatch";

// ============================================================================
// Outbound (agent → controller)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundKind {
    Error,
    Success,
    Fail,
    Info,
    /// Navigation requests forwarded from the Alt/Option + arrow hotkeys.
    CopyNextParagraph,
    CopyPrevParagraph,
    CopyStopParagraph,
    CopyResumeParagraph,
}

impl OutboundKind {
    pub const ALL: [OutboundKind; 8] = [
        OutboundKind::Error,
        OutboundKind::Success,
        OutboundKind::Fail,
        OutboundKind::Info,
        OutboundKind::CopyNextParagraph,
        OutboundKind::CopyPrevParagraph,
        OutboundKind::CopyStopParagraph,
        OutboundKind::CopyResumeParagraph,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutboundKind::Error => "ERROR",
            OutboundKind::Success => "SUCCESS",
            OutboundKind::Fail => "FAIL",
            OutboundKind::Info => "INFO",
            OutboundKind::CopyNextParagraph => "COPY_NEXT_PARAGRAPH",
            OutboundKind::CopyPrevParagraph => "COPY_PREV_PARAGRAPH",
            OutboundKind::CopyStopParagraph => "COPY_STOP_PARAGRAPH",
            OutboundKind::CopyResumeParagraph => "COPY_RESUME_PARAGRAPH",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for OutboundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub kind: OutboundKind,
    pub payload: String,
}

impl OutboundMessage {
    pub fn new(kind: OutboundKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::new(OutboundKind::Error, description)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(OutboundKind::Info, text)
    }

    pub fn started() -> Self {
        Self::info(STARTED_TEXT)
    }

    pub fn success() -> Self {
        Self::new(OutboundKind::Success, MATCH_TEXT)
    }

    pub fn fail() -> Self {
        Self::new(OutboundKind::Fail, MISMATCH_TEXT)
    }

    /// Serializes to `KIND:PAYLOAD\n`.
    ///
    /// A payload containing a line break would split the message across two
    /// frames, so it is rejected rather than written.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        if self.payload.contains(['\n', '\r']) {
            return Err(ProtocolError::Encoding(format!(
                "{} payload contains a line break: {:?}",
                self.kind, self.payload
            )));
        }
        Ok(format!("{}:{}\n", self.kind, self.payload))
    }

    /// Parses one outbound line, as the controller would read it.
    #[cfg(test)]
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (kind, payload) = line
            .split_once(':')
            .ok_or_else(|| ProtocolError::Malformed(format!("missing ':' in {line:?}")))?;
        let kind = OutboundKind::from_name(kind)
            .ok_or_else(|| ProtocolError::Malformed(format!("unknown message kind {kind:?}")))?;
        Ok(Self::new(kind, payload))
    }
}

// ============================================================================
// Inbound (controller → agent)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCommand {
    /// Replaces the whole paragraph list.
    SetParagraphs(Vec<String>),
    /// Replaces the current index. May be negative, which selects nothing.
    SetIndex(i64),
    /// A kind this agent doesn't know. Kept so callers can log it, then ignored.
    Unknown { kind: String, payload: String },
}

impl InboundCommand {
    /// Parses a single line (without its trailing newline).
    ///
    /// The first `:` splits kind from payload; later colons belong to the payload.
    /// A `SET_INDEX` payload that isn't an integer falls back to 0. Negative
    /// integers are kept as-is; surrounding whitespace makes a payload non-numeric.
    pub fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
        let line = std::str::from_utf8(line)
            .map_err(|e| ProtocolError::Malformed(format!("line is not valid UTF-8: {e}")))?;
        let line = line.trim_end_matches(['\r', '\n']);
        let (kind, payload) = line
            .split_once(':')
            .ok_or_else(|| ProtocolError::Malformed(format!("missing ':' in {line:?}")))?;

        let command = match kind {
            "SET_PARAGRAPHS" => InboundCommand::SetParagraphs(
                payload
                    .split(PARAGRAPH_SEPARATOR)
                    .map(str::to_string)
                    .collect(),
            ),
            "SET_INDEX" => {
                let index = payload.parse::<i64>().unwrap_or_else(|_| {
                    warn!("SET_INDEX payload {payload:?} is not an index, using 0");
                    0
                });
                InboundCommand::SetIndex(index)
            }
            _ => InboundCommand::Unknown {
                kind: kind.to_string(),
                payload: payload.to_string(),
            },
        };
        Ok(command)
    }

    /// Serializes to `KIND:PAYLOAD\n`, as the controller writes it.
    #[cfg(test)]
    pub fn encode(&self) -> String {
        match self {
            InboundCommand::SetParagraphs(paragraphs) => {
                let separator = PARAGRAPH_SEPARATOR.to_string();
                format!("SET_PARAGRAPHS:{}\n", paragraphs.join(&separator))
            }
            InboundCommand::SetIndex(index) => format!("SET_INDEX:{index}\n"),
            InboundCommand::Unknown { kind, payload } => format!("{kind}:{payload}\n"),
        }
    }
}
