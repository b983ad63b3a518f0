//! # Core Agent Logic
//!
//! This module contains Paramon's business logic.
//! It knows nothing about pipes, clipboards or keyboard hooks.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • state (paragraphs)   │
//!                    │  • command (inbound)    │
//!                    │  • validator (verdict)  │
//!                    │  • config (settings)    │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │  Protocol  │      │   Input    │      │ Clipboard  │
//!     │  (pipes)   │      │  (hooks)   │      │ (arboard)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: `ParagraphSet` and the lock-guarded `NavigationState`
//! - [`command`]: parses inbound lines and applies them to the state
//! - [`validator`]: compares clipboard text against the current paragraph
//! - [`config`]: layered settings (defaults → file → env → CLI)

pub mod command;
pub mod config;
pub mod state;
pub mod validator;

use std::fmt;
use std::sync::Arc;

use crate::core::state::NavigationState;
use crate::protocol::{Outbound, OutboundMessage};

/// Everything the processing paths share: navigation state plus the outbound
/// channel. Built once at startup and cloned into each execution context.
#[derive(Clone)]
pub struct AgentContext {
    pub state: NavigationState,
    pub outbound: Arc<dyn Outbound>,
}

impl AgentContext {
    pub fn new(outbound: Arc<dyn Outbound>) -> Self {
        Self {
            state: NavigationState::new(),
            outbound,
        }
    }

    /// Surfaces an operational failure to the controller as `ERROR:<description>`.
    pub fn report_error(&self, error: &dyn fmt::Display) {
        self.outbound.send(OutboundMessage::error(error.to_string()));
    }
}
