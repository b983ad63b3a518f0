//! Inbound reader: turns the controller's byte stream into lines and feeds them
//! to the command processor.
//!
//! A read that returns zero bytes means "nothing yet", not "closed". The pipe
//! writer may come and go; the reader keeps polling for as long as the agent runs.

use std::io;
use std::time::Duration;

use log::{debug, error, info};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::backoff::{Backoff, PollSettings};
use crate::core::AgentContext;
use crate::core::command::CommandProcessor;

const READ_CHUNK: usize = 4096;

pub struct LineReader<R> {
    reader: R,
    pending: Vec<u8>,
    backoff: Backoff,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, poll: PollSettings) -> Self {
        Self {
            reader,
            pending: Vec::new(),
            backoff: Backoff::new(poll),
        }
    }

    /// Waits for the next complete line and returns it without the `\n`
    /// (and without a preceding `\r`). Partial lines stay buffered across reads.
    pub async fn next_line(&mut self) -> io::Result<Vec<u8>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }
            let n = self.reader.read(&mut chunk).await?;
            if n == 0 {
                tokio::time::sleep(self.backoff.next_delay()).await;
                continue;
            }
            self.backoff.reset();
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }

    /// Sleep to take after a failed read, following the same schedule as empty reads.
    pub fn retry_delay(&mut self) -> Duration {
        self.backoff.next_delay()
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }
}

/// Runs the inbound side forever: read a line, apply it, repeat.
///
/// Read failures are retried after a pause. The first failure of a streak is
/// reported to the controller; the rest are only logged until a read succeeds.
pub async fn read_commands<R: AsyncRead + Unpin>(mut lines: LineReader<R>, context: AgentContext) {
    let processor = CommandProcessor::new(context.state.clone());
    let mut failing = false;
    info!("Waiting for commands from the controller");
    loop {
        match lines.next_line().await {
            Ok(line) => {
                failing = false;
                debug!("Received line: {}", String::from_utf8_lossy(&line));
                processor.apply(&line);
            }
            Err(e) => {
                if failing {
                    debug!("Inbound read still failing: {}", e);
                } else {
                    error!("Inbound read failed: {}", e);
                    context.report_error(&format!("inbound read failed: {e}"));
                    failing = true;
                }
                tokio::time::sleep(lines.retry_delay()).await;
            }
        }
    }
}
