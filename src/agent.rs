//! # Agent Lifecycle
//!
//! Wires the pieces together and owns the three execution contexts.
//!
//! ```text
//! WAITING_FOR_ENDPOINTS ──▶ ENDPOINTS_OPEN ──▶ OBSERVING ──▶ (signal) exit
//!
//! main thread      : host event loop (CFRunLoop / message pump), intercept guard
//! "clipboard" thread: GestureDispatcher, owns the clipboard handle
//! tokio runtime    : inbound reader task, signal watcher
//! ```
//!
//! The intercept callback only queues gestures; all clipboard and state work
//! happens on the dispatcher thread.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::clipboard::{ClipboardSource, SystemClipboard};
use crate::core::AgentContext;
use crate::core::config::ResolvedConfig;
use crate::core::validator::{self, Verdict};
use crate::input::{self, Gesture, GestureObserver, InterceptError};
use crate::protocol::endpoint::{self, EndpointError};
use crate::protocol::inbound::{self, LineReader};
use crate::protocol::{OutboundKind, OutboundMessage, PipeWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForEndpoints,
    EndpointsOpen,
    Observing,
}

#[derive(Debug)]
pub enum AgentError {
    /// The tokio runtime or the dispatcher thread couldn't be started.
    Startup(io::Error),
    Endpoint(EndpointError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Startup(e) => write!(f, "agent startup failed: {e}"),
            AgentError::Endpoint(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<EndpointError> for AgentError {
    fn from(e: EndpointError) -> Self {
        AgentError::Endpoint(e)
    }
}

// ============================================================================
// Gesture Dispatcher (the clipboard-safe context)
// ============================================================================

/// Outbound request forwarded for a navigation gesture. `None` for `Copy`,
/// which is answered by validation instead.
pub fn navigation_request(gesture: Gesture) -> Option<OutboundMessage> {
    let (kind, text) = match gesture {
        Gesture::Copy => return None,
        Gesture::NextParagraph => (OutboundKind::CopyNextParagraph, "Next paragraph requested"),
        Gesture::PreviousParagraph => {
            (OutboundKind::CopyPrevParagraph, "Previous paragraph requested")
        }
        Gesture::PauseCopy => (OutboundKind::CopyStopParagraph, "Copy paused"),
        Gesture::ResumeCopy => (OutboundKind::CopyResumeParagraph, "Copy resumed"),
    };
    Some(OutboundMessage::new(kind, text))
}

pub struct GestureDispatcher<C> {
    clipboard: C,
    context: AgentContext,
    settle: Duration,
}

impl<C: ClipboardSource> GestureDispatcher<C> {
    pub fn new(clipboard: C, context: AgentContext, settle: Duration) -> Self {
        Self {
            clipboard,
            context,
            settle,
        }
    }

    /// Handles one gesture. Returns the verdict for copy gestures that reached one.
    pub fn handle(&mut self, gesture: Gesture) -> Option<Verdict> {
        debug!("Gesture: {:?}", gesture);
        match navigation_request(gesture) {
            Some(request) => {
                self.context.outbound.send(request);
                None
            }
            None => {
                // The key-down is seen before the focused app performs the copy.
                if !self.settle.is_zero() {
                    thread::sleep(self.settle);
                }
                validator::validate(&mut self.clipboard, &self.context)
            }
        }
    }

    /// Processes gestures until every sender is gone.
    pub fn run(mut self, gestures: Receiver<Gesture>) {
        for gesture in gestures {
            self.handle(gesture);
        }
        debug!("Gesture channel closed, dispatcher exiting");
    }
}

/// Starts the dispatcher thread with the system clipboard.
pub fn spawn_dispatcher(
    context: AgentContext,
    settle: Duration,
) -> io::Result<(Sender<Gesture>, JoinHandle<()>)> {
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("clipboard".to_string())
        .spawn(move || GestureDispatcher::new(SystemClipboard::new(), context, settle).run(rx))?;
    Ok((tx, handle))
}

// ============================================================================
// Bootstrap
// ============================================================================

/// Runs the agent on the calling thread until SIGINT/SIGTERM.
///
/// Must be called from the main thread on macOS: the event tap is attached to
/// the caller's run loop.
pub fn run(config: ResolvedConfig) -> Result<(), AgentError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("paramon-io")
        .build()
        .map_err(AgentError::Startup)?;

    enter(Phase::WaitingForEndpoints);
    let opened = runtime.block_on(async {
        tokio::select! {
            endpoints = async {
                endpoint::wait_for_endpoints(&config.endpoints, config.poll).await;
                endpoint::open_endpoints(&config.endpoints).await
            } => Some(endpoints),
            _ = shutdown_signal() => None,
        }
    });
    let endpoints = match opened {
        Some(endpoints) => endpoints?,
        None => {
            info!("Shutdown requested before endpoints opened");
            runtime.shutdown_background();
            return Ok(());
        }
    };
    enter(Phase::EndpointsOpen);

    let context = AgentContext::new(Arc::new(PipeWriter::new(endpoints.outbound)));
    let (gestures, _dispatcher) =
        spawn_dispatcher(context.clone(), config.clipboard_settle).map_err(AgentError::Startup)?;

    let observer = Arc::new(GestureObserver::new(gestures, config.navigation_hotkeys));
    let intercept = start_observing(&context, || input::install(observer));

    runtime.spawn(inbound::read_commands(
        LineReader::new(endpoints.inbound, config.poll),
        context.clone(),
    ));

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        runtime.spawn(async move {
            shutdown_signal().await;
            shutdown.store(true, Ordering::Release);
        });
    }

    enter(Phase::Observing);
    input::run_event_loop(&shutdown);

    info!("Shutdown requested");
    drop(intercept);
    // The inbound read may be parked in a blocking pipe read; don't wait for it.
    runtime.shutdown_background();
    Ok(())
}

/// Installs the intercept and tells the controller how it went: the startup
/// `INFO` on success, `ERROR` otherwise. A failed install leaves the agent
/// running without observation.
pub fn start_observing<G>(
    context: &AgentContext,
    install: impl FnOnce() -> Result<G, InterceptError>,
) -> Option<G> {
    match install() {
        Ok(guard) => {
            context.outbound.send(OutboundMessage::started());
            Some(guard)
        }
        Err(e) => {
            error!("Input observer unavailable, continuing without monitoring: {}", e);
            context.report_error(&e);
            None
        }
    }
}

fn enter(phase: Phase) {
    info!("Agent phase: {:?}", phase);
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Cannot listen for SIGTERM: {}", e),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
