//! Sieve interactive fuzzy-selection engine.
//!
//! Given a (possibly still-arriving) list of items and a live-typed query,
//! the picker incrementally computes which items match, ranks them, and
//! exposes a cursor over the ranked result while staying responsive to
//! cancellation from new keystrokes.
//!
//! # Design
//!
//! - Matching and ranking run as a single cooperative task driven by
//!   [`Session::tick`]; each call does a bounded, wall-clock-budgeted slice
//!   of work and returns.
//! - Every query mutation bumps a monotonically increasing tick. A task
//!   started under an older tick abandons its result silently; only a task
//!   whose starting tick still matches may commit.
//! - The item store is append-only, so an in-flight task's length snapshot
//!   stays valid while ingest appends behind it.
//! - External-command sources stream stdout on a reader thread and hand the
//!   session a completion tagged with its spawn generation; stale
//!   completions are discarded, superseded children are killed.
//!
//! # Non-blocking API
//!
//! - query mutations ([`Session::insert_char`] and friends) set the work up
//! - [`Session::tick`] drives match/sort/ingest forward without blocking
//! - [`Session::matches`] / [`Session::window`] expose the committed result
//!
//! The notify callback passed at session start fires on every commit and is
//! typically used to trigger a repaint in the rendering collaborator.

mod ingest;
mod matcher;
mod query;
mod rank;
mod session;
mod slot;
mod store;
mod task;

pub use session::{Notify, Session, SessionState, Window};
pub use slot::PickerSlot;

pub use sieve_core::error::{ConfigError, Error, Result};
pub use sieve_core::types::command::{CommandSpec, Program};
pub use sieve_core::types::config::{CaseMatching, Direction, PickerConfig};
pub use sieve_core::types::item::Item;
pub use sieve_core::types::source::ItemSource;
