//! # Input Adapter
//!
//! Global key interception. The host binding for the current platform turns
//! native key-down callbacks into `(Modifiers, Key)` pairs and hands them to a
//! [`KeyEventHandler`]; the [`observer::GestureObserver`] decides whether the
//! pair is a gesture and queues it for the dispatcher.
//!
//! ```text
//!  OS callback ──▶ host binding ──▶ KeyEventHandler ──▶ mpsc ──▶ dispatcher
//!  (must not block)                 (classify only)            (clipboard work)
//! ```
//!
//! | Platform | Intercept point                | Primary modifier |
//! |----------|--------------------------------|------------------|
//! | macOS    | `CGEventTap` (session, keyDown) | Command          |
//! | Windows  | `WH_KEYBOARD_LL` hook           | Control          |
//! | other    | none: reported as unsupported   | n/a              |

pub mod observer;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use macos as host;

#[cfg(windows)]
mod win32;
#[cfg(windows)]
use win32 as host;

#[cfg(not(any(target_os = "macos", windows)))]
mod fallback;
#[cfg(not(any(target_os = "macos", windows)))]
use fallback as host;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

pub use host::InterceptGuard;
pub use observer::GestureObserver;

/// How often the host event loop checks for a shutdown request.
pub(crate) const EVENT_LOOP_TICK: Duration = Duration::from_millis(250);

/// Modifier state at the time of a key-down, normalized across platforms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Command on macOS, Control elsewhere.
    pub primary: bool,
    /// Option on macOS, Alt elsewhere.
    pub alt: bool,
    pub shift: bool,
}

/// Keys the agent reacts to. Everything else arrives as `Other(native code)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    C,
    Left,
    Right,
    Up,
    Down,
    Other(u32),
}

/// Receives every intercepted key-down. Called on the OS intercept context,
/// so implementations must return promptly and never block.
pub trait KeyEventHandler: Send + Sync {
    /// Returns `true` to swallow the event. The gesture observer never does.
    fn on_key_event(&self, modifiers: Modifiers, key: Key) -> bool;
}

/// A recognized key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Primary modifier + C.
    Copy,
    /// Alt + Right.
    NextParagraph,
    /// Alt + Left.
    PreviousParagraph,
    /// Alt + Down.
    PauseCopy,
    /// Alt + Up.
    ResumeCopy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptError {
    /// The OS refused the intercept point (usually a missing accessibility
    /// or input-monitoring permission).
    PermissionDenied(String),
    /// This platform has no global key intercept.
    Unsupported(String),
    /// The intercept point was created but couldn't be attached to the event loop.
    Os(String),
}

impl fmt::Display for InterceptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptError::PermissionDenied(msg) => {
                write!(f, "key intercept permission denied: {msg}")
            }
            InterceptError::Unsupported(msg) => write!(f, "key intercept unsupported: {msg}"),
            InterceptError::Os(msg) => write!(f, "key intercept failed: {msg}"),
        }
    }
}

impl std::error::Error for InterceptError {}

/// Installs the single global intercept point on the calling thread.
///
/// The returned guard removes it when dropped; drop it on the same thread that
/// runs [`run_event_loop`].
pub fn install(handler: Arc<dyn KeyEventHandler>) -> Result<InterceptGuard, InterceptError> {
    host::install(handler)
}

/// Runs the host event loop on the calling thread until `shutdown` is set.
/// The intercept point only receives events while this is running.
pub fn run_event_loop(shutdown: &AtomicBool) {
    host::run_event_loop(shutdown)
}
