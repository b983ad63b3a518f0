//! Host binding for platforms without a global key intercept.
//!
//! Installing always fails with `Unsupported`, which the agent reports and then
//! carries on without live monitoring. The event loop just waits for shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use super::{EVENT_LOOP_TICK, InterceptError, KeyEventHandler};

/// Never constructed on this platform; exists so callers compile unchanged.
pub struct InterceptGuard {
    _private: (),
}

pub fn install(_handler: Arc<dyn KeyEventHandler>) -> Result<InterceptGuard, InterceptError> {
    Err(InterceptError::Unsupported(format!(
        "no global key intercept on {}",
        std::env::consts::OS
    )))
}

pub fn run_event_loop(shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Acquire) {
        thread::sleep(EVENT_LOOP_TICK);
    }
}
