//! Caller-supplied include/exclude decisions keyed by record ordinal.

use std::collections::BTreeMap;

/// Maps [`SlideRecord::ordinal`](crate::SlideRecord::ordinal) to an
/// include/exclude decision.
///
/// Ordinals without an explicit decision fall back to the default, which is
/// "include" for [`SlideSelection::all`]. Selection never overrides
/// validity: invalid records are skipped at import time regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSelection {
    decisions: BTreeMap<usize, bool>,
    include_by_default: bool,
}

impl Default for SlideSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl SlideSelection {
    /// Include every ordinal unless excluded later.
    pub fn all() -> Self {
        Self {
            decisions: BTreeMap::new(),
            include_by_default: true,
        }
    }

    /// Exclude every ordinal unless included later.
    pub fn none() -> Self {
        Self {
            decisions: BTreeMap::new(),
            include_by_default: false,
        }
    }

    /// Include exactly the given ordinals.
    pub fn only(ordinals: impl IntoIterator<Item = usize>) -> Self {
        ordinals.into_iter().fold(Self::none(), Self::include)
    }

    /// Mark an ordinal as included.
    pub fn include(mut self, ordinal: usize) -> Self {
        self.decisions.insert(ordinal, true);
        self
    }

    /// Mark an ordinal as excluded.
    pub fn exclude(mut self, ordinal: usize) -> Self {
        self.decisions.insert(ordinal, false);
        self
    }

    /// Set the decision for an ordinal in place.
    pub fn set(&mut self, ordinal: usize, included: bool) {
        self.decisions.insert(ordinal, included);
    }

    pub fn is_selected(&self, ordinal: usize) -> bool {
        self.decisions
            .get(&ordinal)
            .copied()
            .unwrap_or(self.include_by_default)
    }
}
