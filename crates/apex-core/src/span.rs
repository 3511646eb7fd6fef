//! Source location tracking for diagnostics.
//!
//! Provides [`Location`] to track which file, line and column a node or an
//! error originates from.

use std::fmt;
use std::sync::Arc;

/// A position in a source file.
///
/// Nodes produced by the grammar layer carry one of these, and every
/// resolution or check diagnostic points back at it.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    /// File the position belongs to (empty for synthesized nodes).
    pub file: Arc<str>,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// A location for nodes that have no source text (builtins, synthesized nodes).
    pub fn synthetic() -> Self {
        Self::default()
    }

    /// Whether this location points at real source text.
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}
