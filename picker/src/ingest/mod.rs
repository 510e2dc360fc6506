//! External-command item sources: spawn, stream stdout, supersede.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use sieve_core::error::ConfigError;
use sieve_core::types::command::CommandSpec;
use sieve_core::types::item::Item;
use tracing::{debug, warn};

/// A finished (or failed) command run, tagged with the spawn generation
/// that produced it. The session discards completions whose generation no
/// longer matches.
pub(crate) struct Completion {
    pub(crate) generation: u64,
    pub(crate) result: Result<Vec<Item>, String>,
}

struct Handle {
    child: Child,
    generation: u64,
}

/// Spawns the configured command and streams its stdout on a reader
/// thread. For live sources (query placeholder in the args) the session
/// respawns per query change; the superseded child is killed first.
pub(crate) struct Ingestor {
    spec: CommandSpec,
    program: PathBuf,
    generation: u64,
    current: Option<Handle>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl Ingestor {
    /// Resolves the executable up front; an unresolvable program is a
    /// configuration error surfaced synchronously at construction.
    pub(crate) fn new(spec: CommandSpec) -> Result<Self, ConfigError> {
        let program = resolve_program(spec.program.as_str())?;
        let (tx, rx) = channel();
        Ok(Self {
            spec,
            program,
            generation: 0,
            current: None,
            tx,
            rx,
        })
    }

    pub(crate) fn is_live(&self) -> bool {
        self.spec.is_live()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// True while a spawned child has not yet produced its completion.
    pub(crate) fn is_pending(&self) -> bool {
        self.current.is_some()
    }

    /// Kills any superseded child, then spawns for `query` under a fresh
    /// generation. Spawn failures degrade to an empty item list.
    pub(crate) fn spawn(&mut self, query: &str) {
        self.kill_current();
        self.generation += 1;
        let generation = self.generation;
        let args = self.spec.args_for(query);

        debug!(program = %self.program.display(), generation, "spawning item source");
        let spawned = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                let Some(mut stdout) = child.stdout.take() else {
                    // Piped stdout is always present on a successful spawn;
                    // treat the impossible case like a failed run.
                    let _ = self.tx.send(Completion {
                        generation,
                        result: Err("missing child stdout".to_string()),
                    });
                    return;
                };
                let tx = self.tx.clone();
                thread::spawn(move || {
                    let mut buffer = String::new();
                    let result = match stdout.read_to_string(&mut buffer) {
                        Ok(_) => Ok(split_lines(&buffer)),
                        Err(err) => Err(err.to_string()),
                    };
                    let _ = tx.send(Completion { generation, result });
                });
                self.current = Some(Handle { child, generation });
            }
            Err(err) => {
                warn!(program = %self.program.display(), error = %err, "spawn failed; item source yields nothing");
                let _ = self.tx.send(Completion {
                    generation,
                    result: Err(err.to_string()),
                });
            }
        }
    }

    /// Non-blocking poll; drains the queue and returns the completion with
    /// the highest generation. A killed child's reader thread may deliver
    /// late (a grandchild can hold the stdout pipe open), so a stale
    /// completion dequeued after a fresh one must neither mask it nor keep
    /// the fresh run pending.
    pub(crate) fn poll(&mut self) -> Option<Completion> {
        let mut newest: Option<Completion> = None;
        while let Ok(mut completion) = self.rx.try_recv() {
            // The reader thread only completes once the child closed its
            // stdout; reap the process whose run this completion is. A
            // non-zero exit degrades the run to an empty item list.
            if let Some(handle) = &mut self.current {
                if handle.generation == completion.generation {
                    if let Ok(status) = handle.child.wait() {
                        if !status.success() && completion.result.is_ok() {
                            completion.result = Err(format!("command failed: {status}"));
                        }
                    }
                    self.current = None;
                }
            }
            if newest
                .as_ref()
                .is_none_or(|kept| completion.generation > kept.generation)
            {
                newest = Some(completion);
            }
        }
        newest
    }

    pub(crate) fn kill_current(&mut self) {
        if let Some(mut handle) = self.current.take() {
            debug!(generation = handle.generation, "killing superseded item source");
            let _ = handle.child.kill();
            let _ = handle.child.wait();
        }
    }
}

impl Drop for Ingestor {
    fn drop(&mut self) {
        self.kill_current();
    }
}

/// Splits newline-delimited stdout into items, trimming trailing empty
/// entries (the final newline and any blank tail).
pub(crate) fn split_lines(buffer: &str) -> Vec<Item> {
    let mut lines: Vec<&str> = buffer.split('\n').collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
        .into_iter()
        .map(|line| Item::from(line.strip_suffix('\r').unwrap_or(line)))
        .collect()
}

fn resolve_program(name: &str) -> Result<PathBuf, ConfigError> {
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }
        return Err(ConfigError::ExecutableNotFound(name.to_string()));
    }

    let path = std::env::var_os("PATH").unwrap_or_default();
    for dir in std::env::split_paths(&path) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(ConfigError::ExecutableNotFound(name.to_string()))
}

#[cfg(test)]
mod tests;
