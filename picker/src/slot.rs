//! Single-slot session holder: one active session, one retained "latest".

use sieve_core::error::Result;
use sieve_core::types::config::PickerConfig;
use sieve_core::types::source::ItemSource;
use tracing::debug;

use crate::session::{Notify, Session};

/// Holds at most one active [`Session`] and the most recently stopped one.
///
/// Starting a new session supersedes the current active one: it is stopped
/// (killing any ingest child) and retired to the latest slot, whose reads
/// (query, matches, chosen items) stay available. `resume` brings the
/// latest session back as active.
#[derive(Default)]
pub struct PickerSlot {
    active: Option<Session>,
    latest: Option<Session>,
}

impl PickerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh session, retiring the previous active one.
    pub fn start(
        &mut self,
        source: ItemSource,
        config: PickerConfig,
        notify: Notify,
    ) -> Result<&mut Session> {
        self.stop();
        let session = Session::start(source, config, notify)?;
        Ok(self.active.insert(session))
    }

    /// Stops the active session and retires it as latest.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.active.take() {
            debug!("retiring active session");
            session.stop();
            self.latest = Some(session);
        }
    }

    /// Stops and discards the active session without retaining it.
    pub fn abort(&mut self) {
        if let Some(mut session) = self.active.take() {
            debug!("aborting active session");
            session.stop();
        }
    }

    /// Reactivates the latest session if no session is active.
    ///
    /// The resumed session keeps its query and item list and recomputes
    /// its matches; a command source is not re-run.
    pub fn resume(&mut self) -> Option<&mut Session> {
        if self.active.is_none() {
            let mut session = self.latest.take()?;
            session.reactivate();
            self.active = Some(session);
        }
        self.active.as_mut()
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Session> {
        self.active.as_mut()
    }

    /// The most recently stopped session, for reading its final state.
    pub fn latest(&self) -> Option<&Session> {
        self.latest.as_ref()
    }
}
