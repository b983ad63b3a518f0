//! # Pipe Protocol
//!
//! Two one-way byte streams shared with the controller:
//!
//! ```text
//!   controller ──(inbound)──▶  agent      KIND:PAYLOAD\n
//!   controller ◀─(outbound)──  agent      KIND:MESSAGE\n
//! ```
//!
//! Framing is one UTF-8 line per message. There is no handshake, no version
//! negotiation and no acknowledgement.

pub mod backoff;
pub mod endpoint;
pub mod inbound;
pub mod message;
pub mod outbound;

use std::fmt;

pub use backoff::{Backoff, PollSettings};
pub use endpoint::{EndpointError, EndpointPaths, Endpoints};
pub use inbound::LineReader;
pub use message::{InboundCommand, OutboundKind, OutboundMessage};
pub use outbound::{Outbound, PipeWriter};

/// Errors raised while turning lines into messages and back.
/// Neither variant is fatal: malformed input is skipped, unencodable output dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// An inbound line that doesn't follow `KIND:PAYLOAD`.
    Malformed(String),
    /// An outbound message that can't be written as a single line.
    Encoding(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Malformed(msg) => write!(f, "malformed command: {msg}"),
            ProtocolError::Encoding(msg) => write!(f, "encoding failure: {msg}"),
        }
    }
}

impl std::error::Error for ProtocolError {}
