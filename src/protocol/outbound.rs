//! Outbound writer. Callable from any thread; one line is written at a time.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use log::{debug, error, warn};

use super::message::OutboundMessage;

/// Fire-and-forget sink for status messages to the controller.
pub trait Outbound: Send + Sync {
    /// Sends one message. Failures are logged locally; nothing is returned
    /// because there is nobody further up to tell.
    fn send(&self, message: OutboundMessage);
}

/// Writes encoded messages to the outbound endpoint.
///
/// The mutex is held across `write_all` + `flush` of a whole line, so lines
/// from concurrent senders never interleave.
pub struct PipeWriter<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> PipeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Outbound for PipeWriter<W> {
    fn send(&self, message: OutboundMessage) {
        let line = match message.encode() {
            Ok(line) => line,
            Err(e) => {
                warn!("Dropping outbound message: {}", e);
                return;
            }
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let written = writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush());
        match written {
            Ok(()) => debug!("Sent: {}", line.trim_end()),
            Err(e) => error!("Failed to write {:?} to outbound endpoint: {}", line.trim_end(), e),
        }
    }
}
