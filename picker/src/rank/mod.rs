//! Deterministic bucket ranking of match records.

use std::collections::BTreeMap;

use crate::matcher::MatchRecord;

/// Chunked bucket sort over match records.
///
/// Buckets by `(group_count, width)` ascending, orders each bucket by
/// `start` ascending, and falls back to original item index for full ties.
/// Records arrive in item-index order and the per-bucket sort is stable, so
/// the index tiebreak needs no explicit key. Both the bucketing pass and the
/// emission pass are chunked so the scheduler can interleave staleness
/// checks between slices.
pub(crate) struct SortState {
    records: Vec<MatchRecord>,
    pos: usize,
    buckets: BTreeMap<(usize, usize), Vec<MatchRecord>>,
    ranked: Vec<usize>,
    bucketing: bool,
}

impl SortState {
    pub(crate) fn new(records: Vec<MatchRecord>) -> Self {
        let capacity = records.len();
        Self {
            records,
            pos: 0,
            buckets: BTreeMap::new(),
            ranked: Vec::with_capacity(capacity),
            bucketing: true,
        }
    }

    /// Processes roughly `chunk` records; returns the ranked item indices
    /// once every record has been bucketed and emitted.
    pub(crate) fn step(&mut self, chunk: usize) -> Option<Vec<usize>> {
        if self.bucketing {
            let end = (self.pos + chunk).min(self.records.len());
            for record in &self.records[self.pos..end] {
                self.buckets
                    .entry((record.group_count, record.width))
                    .or_default()
                    .push(*record);
            }
            self.pos = end;
            if self.pos == self.records.len() {
                self.records.clear();
                self.bucketing = false;
            }
            return None;
        }

        let mut emitted = 0;
        while emitted < chunk {
            let Some((_, mut bucket)) = self.buckets.pop_first() else {
                return Some(std::mem::take(&mut self.ranked));
            };
            bucket.sort_by_key(|record| record.start);
            emitted += bucket.len();
            self.ranked.extend(bucket.iter().map(|record| record.item));
        }
        None
    }
}
