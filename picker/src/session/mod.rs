//! Session state machine: orchestrates query, store, match task, ingest.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sieve_core::error::Result;
use sieve_core::types::config::{Direction, PickerConfig};
use sieve_core::types::item::Item;
use sieve_core::types::source::ItemSource;
use tracing::{debug, trace, warn};

use crate::ingest::Ingestor;
use crate::matcher::Pattern;
use crate::query::Query;
use crate::store::ItemStore;
use crate::task::{MatchTask, Step};

/// Invoked on every commit; typically triggers a repaint in the rendering
/// collaborator.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Committed results reflect the current query and items.
    Ready,
    /// A match/sort task or an ingest run has not yet committed.
    Busy,
    /// Terminal; the session is retained read-only as "latest".
    Stopped,
}

/// The visible slice of the ranked result, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Item indices, already ordered for display.
    pub items: Vec<usize>,
    /// The selection's position within `items`, if any items are visible.
    pub cursor: Option<usize>,
    /// Match-set positions covered: `[from, to)`.
    pub from: usize,
    pub to: usize,
}

/// One interactive picking session.
///
/// Mutations set work up; [`Session::tick`] performs it in bounded slices.
/// Every query mutation bumps the tick, which is the sole cancellation
/// signal: a task started under an older tick can never commit.
pub struct Session {
    config: PickerConfig,
    query: Query,
    store: ItemStore,
    ingest: Option<Ingestor>,
    tick: u64,
    task: Option<MatchTask>,
    matches: Vec<usize>,
    /// Bounded per-query match-set cache, newest first.
    cache: VecDeque<(String, Vec<usize>)>,
    selection: usize,
    window: (usize, usize),
    busy_since: Option<Instant>,
    stopped: bool,
    /// Query string the live ingest command was last spawned with.
    live_query: String,
    last_ingest_error: Option<String>,
    notify: Notify,
}

/// Lifecycle.
impl Session {
    /// Starts a session over `source`.
    ///
    /// Configuration errors (an unresolvable executable, an invalid source)
    /// surface synchronously here; nothing later in the session's life is
    /// allowed to fail fast.
    pub fn start(source: ItemSource, config: PickerConfig, notify: Notify) -> Result<Self> {
        let mut session = Self {
            config,
            query: Query::new(),
            store: ItemStore::new(),
            ingest: None,
            tick: 0,
            task: None,
            matches: Vec::new(),
            cache: VecDeque::new(),
            selection: 0,
            window: (0, 0),
            busy_since: None,
            stopped: false,
            live_query: String::new(),
            last_ingest_error: None,
            notify,
        };

        match source {
            ItemSource::List(items) => session.store.stage_replace(items),
            ItemSource::Command(spec) => {
                let mut ingestor = Ingestor::new(spec)?;
                ingestor.spawn("");
                session.ingest = Some(ingestor);
            }
        }
        session.schedule();
        Ok(session)
    }

    /// Stops the session: kills any ingest child, drops in-flight work,
    /// keeps query/items/matches readable for the "latest" snapshot.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        debug!("stopping session");
        self.stopped = true;
        self.task = None;
        // Dropping the ingestor kills any running child.
        self.ingest = None;
        self.cache.clear();
        self.busy_since = None;
    }

    pub(crate) fn reactivate(&mut self) {
        self.stopped = false;
        self.tick += 1;
        self.schedule();
    }

    pub fn state(&self) -> SessionState {
        if self.stopped {
            SessionState::Stopped
        } else if self.busy() {
            SessionState::Busy
        } else {
            SessionState::Ready
        }
    }

    /// True once the session has been busy longer than the configured
    /// delay. Suppressed below the threshold to avoid flicker on fast
    /// operations.
    pub fn busy_indicator_visible(&self) -> bool {
        self.busy()
            && self
                .busy_since
                .is_some_and(|since| since.elapsed() >= Duration::from_millis(self.config.busy_delay_ms))
    }

    fn busy(&self) -> bool {
        !self.stopped
            && (self.task.is_some()
                || self.store.has_staged()
                || self.ingest.as_ref().is_some_and(Ingestor::is_pending))
    }
}

/// Driving.
impl Session {
    /// Drives ingest and the match/sort task forward within the configured
    /// wall-clock budget. Returns true while more work is pending.
    ///
    /// Call from the collaborator's event loop, after a notify callback or
    /// on each frame while busy.
    pub fn tick(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.poll_ingest();

        let budget = Duration::from_millis(self.config.tick_budget_ms.max(1));
        let deadline = Instant::now() + budget;
        while Instant::now() < deadline {
            let Some(task) = self.task.as_mut() else {
                break;
            };
            // The commit gate: work performed under an older tick is
            // abandoned silently, never published.
            if task.tick != self.tick {
                self.task = None;
                self.schedule();
                continue;
            }
            match task.step(&mut self.store) {
                Step::Pending => {}
                Step::Commit { ranked, seen } => self.commit(ranked, seen),
            }
        }
        self.busy()
    }

    fn poll_ingest(&mut self) {
        let Some(completion) = self.ingest.as_mut().and_then(Ingestor::poll) else {
            return;
        };
        let generation = self.ingest.as_ref().map_or(0, Ingestor::generation);
        if completion.generation != generation {
            trace!(
                generation = completion.generation,
                "discarding stale ingest completion"
            );
            return;
        }
        let items = match completion.result {
            Ok(items) => {
                self.last_ingest_error = None;
                items
            }
            Err(err) => {
                warn!(error = %err, "item source failed; using empty item list");
                self.last_ingest_error = Some(err);
                Vec::new()
            }
        };
        self.store.stage_replace(items);
        self.cache.clear();
        self.schedule();
    }

    fn schedule(&mut self) {
        if self.stopped {
            return;
        }
        let key = self.query.as_string();
        if !self.store.has_staged() && !self.ingest.as_ref().is_some_and(Ingestor::is_pending) {
            if let Some(ranked) = self.cache_lookup(&key) {
                trace!(query = %key, "match-set cache hit");
                self.task = None;
                self.matches = ranked;
                self.after_commit();
                return;
            }
        }

        debug!(query = %key, tick = self.tick, "scheduling match task");
        let pattern = Pattern::parse(self.query.tokens(), self.config.case_matching);
        self.task = Some(MatchTask::new(self.tick, pattern, &self.store));
        if self.busy_since.is_none() {
            self.busy_since = Some(Instant::now());
        }
    }

    fn commit(&mut self, ranked: Vec<usize>, seen: usize) {
        trace!(results = ranked.len(), tick = self.tick, "committing match set");
        self.matches = ranked;
        self.task = None;

        let complete = seen == self.store.len() && !self.store.has_staged();
        if complete {
            self.cache_insert(self.query.as_string(), self.matches.clone());
        }
        self.after_commit();
        if !complete {
            // Items arrived behind the task's length snapshot; rescan
            // under the same tick.
            self.schedule();
        }
    }

    fn after_commit(&mut self) {
        self.selection = if self.matches.is_empty() {
            0
        } else {
            self.selection.min(self.matches.len() - 1)
        };
        if !self.busy() {
            self.busy_since = None;
        }
        self.update_window(true);
        (self.notify)();
    }

    fn cache_lookup(&mut self, key: &str) -> Option<Vec<usize>> {
        let pos = self.cache.iter().position(|(cached, _)| cached == key)?;
        // Keep hot entries at the front.
        let entry = self.cache.remove(pos)?;
        let ranked = entry.1.clone();
        self.cache.push_front(entry);
        Some(ranked)
    }

    fn cache_insert(&mut self, key: String, ranked: Vec<usize>) {
        if self.config.cache_size == 0 {
            return;
        }
        self.cache.retain(|(cached, _)| *cached != key);
        self.cache.push_front((key, ranked));
        self.cache.truncate(self.config.cache_size);
    }
}

/// Query mutations. Each content change bumps the cancellation tick and
/// schedules a fresh match task.
impl Session {
    pub fn insert_char(&mut self, token: char) {
        if self.stopped {
            return;
        }
        self.query.insert(token);
        self.bump();
    }

    pub fn delete_query_left(&mut self, n: usize) {
        if self.stopped {
            return;
        }
        if self.query.delete_left(n) > 0 {
            self.bump();
        }
    }

    pub fn delete_query_right(&mut self, n: usize) {
        if self.stopped {
            return;
        }
        if self.query.delete_right(n) > 0 {
            self.bump();
        }
    }

    pub fn delete_query_word(&mut self) {
        if self.stopped {
            return;
        }
        if self.query.delete_word() > 0 {
            self.bump();
        }
    }

    pub fn move_caret(&mut self, delta: isize) {
        if self.stopped {
            return;
        }
        self.query.move_caret(delta);
        self.bump();
    }

    pub fn move_caret_to(&mut self, pos: usize) {
        if self.stopped {
            return;
        }
        self.query.move_caret_to(pos);
        self.bump();
    }

    /// Replaces the whole query.
    pub fn set_query(&mut self, text: &str) {
        if self.stopped {
            return;
        }
        self.query.set(text.chars().collect());
        self.bump();
    }

    pub fn query_string(&self) -> String {
        self.query.as_string()
    }

    pub fn caret(&self) -> usize {
        self.query.caret()
    }

    fn bump(&mut self) {
        self.tick += 1;
        let text = self.query.as_string();
        if let Some(ingestor) = self.ingest.as_mut() {
            // Live sources re-run the command per query change; the
            // superseded child is killed inside spawn.
            if ingestor.is_live() && text != self.live_query {
                ingestor.spawn(&text);
            }
        }
        self.live_query = text;
        self.schedule();
    }
}

/// Item supply.
impl Session {
    /// Wholesale item replacement, e.g. from a producer source. Display
    /// derivation happens inside the cooperative task, so large inputs
    /// stay interruptible.
    pub fn set_items(&mut self, items: Vec<Item>) {
        if self.stopped {
            return;
        }
        self.store.stage_replace(items);
        self.cache.clear();
        self.schedule();
    }

    /// Appends items behind any in-flight task; its length snapshot stays
    /// valid and a follow-up pass picks the new tail up after commit.
    pub fn push_items(&mut self, items: Vec<Item>) {
        if self.stopped || items.is_empty() {
            return;
        }
        self.store.append(items);
        self.cache.clear();
        if self.task.is_none() {
            self.schedule();
        }
    }

    pub fn item(&self, index: usize) -> &Item {
        self.store.item(index)
    }

    pub fn display(&self, index: usize) -> &str {
        self.store.display(index)
    }

    pub fn item_count(&self) -> usize {
        self.store.len()
    }

    /// The most recent ingest failure, for a non-blocking notification.
    pub fn last_ingest_error(&self) -> Option<&str> {
        self.last_ingest_error.as_deref()
    }
}

/// Selection, window, and choose actions.
impl Session {
    /// Ranked item indices of the current committed match set.
    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Position of the selection within the match set.
    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.stopped || self.matches.is_empty() {
            return;
        }
        let max = self.matches.len() as isize - 1;
        self.selection = (self.selection as isize + delta).clamp(0, max) as usize;
        self.update_window(false);
        (self.notify)();
    }

    /// The currently selected item, if any.
    pub fn choose_current(&self) -> Option<&Item> {
        self.matches
            .get(self.selection)
            .map(|&index| self.store.item(index))
    }

    /// Every matched item, in ranked order.
    pub fn choose_all(&self) -> Vec<&Item> {
        self.matches
            .iter()
            .map(|&index| self.store.item(index))
            .collect()
    }

    /// Replaces the item list with the current matches and clears the
    /// query, narrowing the search space. Detaches any command source: the
    /// refined list is the source from here on.
    pub fn refine_to_current_matches(&mut self) {
        if self.stopped {
            return;
        }
        let refined: Vec<Item> = self
            .matches
            .iter()
            .map(|&index| self.store.item(index).clone())
            .collect();
        debug!(items = refined.len(), "refining to current matches");
        self.ingest = None;
        self.query.set(Vec::new());
        self.tick += 1;
        self.live_query.clear();
        self.store.stage_replace(refined);
        self.cache.clear();
        self.selection = 0;
        self.schedule();
    }

    /// The visible window over the match set, in presentation order.
    pub fn window(&self) -> Window {
        let (from, to) = self.window;
        let mut items: Vec<usize> = self.matches[from..to].to_vec();
        let mut cursor = if self.matches.is_empty() {
            None
        } else {
            Some(self.selection - from)
        };
        if self.config.direction == Direction::BottomUp {
            items.reverse();
            cursor = cursor.map(|c| items.len() - 1 - c);
        }
        Window {
            items,
            cursor,
            from,
            to,
        }
    }

    /// Forces the window to be recomputed on the next read.
    pub fn refresh_window(&mut self) {
        if self.stopped {
            return;
        }
        self.update_window(true);
    }

    /// Recomputed only when the selection leaves the window or a refresh
    /// is forced; keystrokes on huge result sets stay O(window).
    fn update_window(&mut self, force: bool) {
        let size = self.config.window_size.max(1);
        let len = self.matches.len();
        let (from, to) = self.window;

        let selection_visible = self.selection >= from && self.selection < to;
        if !force && selection_visible && to <= len {
            return;
        }

        let mut from = from.min(len.saturating_sub(1));
        if self.selection < from {
            from = self.selection;
        } else if self.selection + 1 > from + size {
            from = self.selection + 1 - size;
        }
        if from + size > len {
            from = len.saturating_sub(size);
        }
        self.window = (from, (from + size).min(len));
    }
}
