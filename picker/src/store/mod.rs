//! Append-only item store with derived display strings.

use std::collections::VecDeque;

use sieve_core::types::item::Item;

/// Canonical items plus parallel derived strings.
///
/// The live arrays (`items`, `display`, `folded`) only ever grow; existing
/// slots are never rewritten. A match task that snapshotted the length may
/// therefore keep reading while ingest appends behind it. Wholesale
/// replacement goes through a staging buffer drained in chunks by the
/// cooperative task, so deriving display strings for large inputs stays
/// interruptible.
pub(crate) struct ItemStore {
    items: Vec<Item>,
    display: Vec<String>,
    /// Char-wise case-folded display strings, built on first use.
    folded: Vec<Option<String>>,
    staged: VecDeque<Item>,
}

impl ItemStore {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            display: Vec::new(),
            folded: Vec::new(),
            staged: VecDeque::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn item(&self, index: usize) -> &Item {
        &self.items[index]
    }

    pub(crate) fn display(&self, index: usize) -> &str {
        &self.display[index]
    }

    /// The case-folded display string, derived lazily and cached.
    ///
    /// Folding maps one char to one char, so offsets into the folded text
    /// line up with the original for ASCII and stay internally consistent
    /// otherwise. Match records refer to the text that was searched.
    pub(crate) fn folded(&mut self, index: usize) -> &str {
        let display = &self.display[index];
        self.folded[index].get_or_insert_with(|| fold(display))
    }

    /// Stages a wholesale replacement; the live arrays are cleared now and
    /// repopulated by `ingest_step`.
    pub(crate) fn stage_replace(&mut self, items: Vec<Item>) {
        self.items.clear();
        self.display.clear();
        self.folded.clear();
        self.staged = items.into();
    }

    pub(crate) fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Moves up to `chunk` staged items into the live arrays, deriving their
    /// display strings. Returns true once staging is fully drained.
    pub(crate) fn ingest_step(&mut self, chunk: usize) -> bool {
        for _ in 0..chunk {
            let Some(item) = self.staged.pop_front() else {
                break;
            };
            self.display.push(item.display().to_string());
            self.folded.push(None);
            self.items.push(item);
        }
        self.staged.is_empty()
    }

    /// Appends items without touching existing slots.
    pub(crate) fn append(&mut self, items: Vec<Item>) {
        self.items.reserve(items.len());
        for item in items {
            self.display.push(item.display().to_string());
            self.folded.push(None);
            self.items.push(item);
        }
    }
}

fn fold(text: &str) -> String {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}
