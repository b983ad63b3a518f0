//! # Navigation State
//!
//! The paragraph list and current index pushed by the controller.
//!
//! ```text
//! NavigationState
//! └── Arc<RwLock<ParagraphSet>>
//!     ├── paragraphs: Vec<String>   // replaced wholesale by SET_PARAGRAPHS
//!     └── index: i64                // replaced wholesale by SET_INDEX
//! ```
//!
//! Every read and write goes through the one lock, so a reader never sees a new
//! index paired with an old list. The index is not clamped when the list shrinks;
//! an out-of-range index simply has no current paragraph.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphSet {
    paragraphs: Vec<String>,
    index: i64,
}

impl ParagraphSet {
    pub fn new(paragraphs: Vec<String>, index: i64) -> Self {
        Self { paragraphs, index }
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// The paragraph at the current index, or `None` when the index is out of
    /// range. Negative indices are always out of range.
    pub fn current(&self) -> Option<&str> {
        let index = usize::try_from(self.index).ok()?;
        self.paragraphs.get(index).map(String::as_str)
    }

    /// Byte-for-byte comparison against the current paragraph.
    pub fn matches_current(&self, text: &str) -> bool {
        self.current() == Some(text)
    }
}

/// Shared handle to the agent's `ParagraphSet`. Cloning shares the same set.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    inner: Arc<RwLock<ParagraphSet>>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a new paragraph list. The index is left as-is.
    pub fn replace_paragraphs(&self, paragraphs: Vec<String>) {
        self.write().paragraphs = paragraphs;
    }

    pub fn set_index(&self, index: i64) {
        self.write().index = index;
    }

    /// Consistent copy of list and index, taken under a single lock.
    pub fn snapshot(&self) -> ParagraphSet {
        self.read().clone()
    }

    pub fn matches_current(&self, text: &str) -> bool {
        self.read().matches_current(text)
    }

    // A panic elsewhere never leaves the set half-written (both mutations are
    // single assignments), so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, ParagraphSet> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ParagraphSet> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
