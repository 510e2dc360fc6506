//! Cooperative match/sort task.
//!
//! A task runs in bounded chunks driven by [`crate::Session::tick`]. The
//! session re-checks freshness (its tick against the task's starting tick)
//! between chunks; a task that has gone stale is simply dropped, so no
//! partial result ever escapes.

use crate::matcher::{MatchRecord, Pattern};
use crate::rank::SortState;
use crate::store::ItemStore;

/// Items processed per chunk. Wall-clock throttling happens at chunk
/// granularity: the caller checks its deadline once per chunk instead of
/// once per item.
pub(crate) const CHUNK: usize = 512;

pub(crate) enum Step {
    Pending,
    /// Finished: the ranked item indices plus the store length this task
    /// had covered when it started filtering. Items appended past `seen`
    /// need a follow-up pass.
    Commit { ranked: Vec<usize>, seen: usize },
}

enum Phase {
    /// Draining staged items into the store (interruptible `set_items`).
    Ingest,
    Filter {
        next: usize,
        len: usize,
        records: Vec<MatchRecord>,
    },
    Sort {
        state: SortState,
        seen: usize,
    },
    Done,
}

pub(crate) struct MatchTask {
    /// Session tick this task was started under; the commit gate.
    pub(crate) tick: u64,
    pattern: Pattern,
    phase: Phase,
}

impl MatchTask {
    pub(crate) fn new(tick: u64, pattern: Pattern, store: &ItemStore) -> Self {
        let phase = if store.has_staged() {
            Phase::Ingest
        } else {
            Phase::Filter {
                next: 0,
                len: store.len(),
                records: Vec::new(),
            }
        };
        Self {
            tick,
            pattern,
            phase,
        }
    }

    /// Runs one bounded chunk of work.
    pub(crate) fn step(&mut self, store: &mut ItemStore) -> Step {
        match &mut self.phase {
            Phase::Ingest => {
                if store.ingest_step(CHUNK) {
                    self.phase = Phase::Filter {
                        next: 0,
                        len: store.len(),
                        records: Vec::new(),
                    };
                }
                Step::Pending
            }
            Phase::Filter { next, len, records } => {
                // Empty-query fast path: every item matches in original
                // order and the sort engine is never invoked.
                if self.pattern.is_empty() {
                    let seen = *len;
                    self.phase = Phase::Done;
                    return Step::Commit {
                        ranked: (0..seen).collect(),
                        seen,
                    };
                }

                let end = (*next + CHUNK).min(*len);
                let sensitive = self.pattern.sensitive;
                for index in *next..end {
                    let matched = if sensitive {
                        self.pattern.match_item(store.display(index), index)
                    } else {
                        self.pattern.match_item(store.folded(index), index)
                    };
                    if let Some(record) = matched {
                        records.push(record);
                    }
                }
                *next = end;
                if end == *len {
                    self.phase = Phase::Sort {
                        state: SortState::new(std::mem::take(records)),
                        seen: end,
                    };
                }
                Step::Pending
            }
            Phase::Sort { state, seen } => match state.step(CHUNK) {
                Some(ranked) => {
                    let seen = *seen;
                    self.phase = Phase::Done;
                    Step::Commit { ranked, seen }
                }
                None => Step::Pending,
            },
            Phase::Done => Step::Pending,
        }
    }
}
