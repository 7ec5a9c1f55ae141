//! Position within the current study set.
//!
//! The cursor is a plain index that the interface layer externalizes as a
//! small query value (`q=<index>`), so a study position survives reloads and
//! can be shared. The core only provides get/set/clamp semantics; whoever
//! owns the list must re-clamp after every recomputation before
//! dereferencing.

/// Zero-based position in the filtered, ordered question list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionCursor {
    index: usize,
}

impl SessionCursor {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    /// Restore a cursor from its externalized value.
    ///
    /// Missing or non-numeric input defaults to position 0.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        let index = param
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(0);
        Self { index }
    }

    /// Externalized value, round-trippable through [`Self::from_param`].
    #[must_use]
    pub fn as_param(&self) -> String {
        self.index.to_string()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// True when the cursor can be dereferenced against a list of `len`.
    #[must_use]
    pub fn in_range(&self, len: usize) -> bool {
        self.index < len
    }

    /// Re-anchor after the underlying list changed.
    ///
    /// An out-of-range cursor resets to 0 (start over), it does not snap to
    /// the end; an in-range cursor is left where it was.
    pub fn clamp(&mut self, len: usize) {
        if self.index >= len {
            self.index = 0;
        }
    }

    /// Move forward one question; no-op at the last index.
    pub fn advance(&mut self, len: usize) {
        if len > 0 && self.index < len - 1 {
            self.index += 1;
        }
    }

    /// Move back one question; no-op at index 0.
    pub fn retreat(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Jump to a 1-based position, clamped into the valid range.
    pub fn jump_to(&mut self, position: usize, len: usize) {
        if len == 0 {
            self.index = 0;
            return;
        }
        self.index = position.saturating_sub(1).min(len - 1);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
