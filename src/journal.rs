//! Snapshot-based undo/redo history.
//!
//! The journal keeps a linear list of named snapshots and a cursor into it.
//! Enabling it records the current state as the first snapshot. Each
//! `start_op`/`end_op` bracket appends one snapshot taken at `end_op`; undo
//! and redo move the cursor and hand back the snapshot to restore.
//!
//! Snapshots are full clones of the document state, so every bracket costs
//! O(document size) in time and memory.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name given to the snapshot taken when the journal is first enabled.
pub const INITIAL_SNAPSHOT: &str = "initial";

/// One point in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// Operation that produced this state
    pub name: String,
    /// Full state after the operation
    pub state: T,
}

#[derive(Serialize, Deserialize)]
struct JournalFile<T> {
    cursor: usize,
    snapshots: Vec<Snapshot<T>>,
}

/// Linear undo/redo history over states of type `T`.
#[derive(Debug, Clone)]
pub struct Journal<T> {
    enabled: bool,
    snapshots: Vec<Snapshot<T>>,
    cursor: usize,
    pending: Option<String>,
}

impl<T> Default for Journal<T> {
    fn default() -> Self {
        Self {
            enabled: false,
            snapshots: Vec::new(),
            cursor: 0,
            pending: None,
        }
    }
}

impl<T: Clone + Serialize + DeserializeOwned> Journal<T> {
    /// Disabled journal with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether operations are being recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start recording. The first enable snapshots `state`.
    pub fn enable(&mut self, state: &T) {
        if self.snapshots.is_empty() {
            self.snapshots.push(Snapshot {
                name: INITIAL_SNAPSHOT.to_string(),
                state: state.clone(),
            });
            self.cursor = 0;
        }
        self.enabled = true;
    }

    /// Stop recording. History is kept.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.pending = None;
    }

    fn require_enabled(&self) -> Result<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(Error::JournalDisabled)
        }
    }

    /// Whether a `start_op` bracket is open.
    pub fn in_operation(&self) -> bool {
        self.pending.is_some()
    }

    /// Open a bracket for operation `name`.
    pub fn start_op(&mut self, name: impl Into<String>) -> Result<()> {
        self.require_enabled()?;
        self.pending = Some(name.into());
        Ok(())
    }

    /// Close the open bracket, recording `state`. Redo history is dropped.
    pub fn end_op(&mut self, state: &T) -> Result<()> {
        self.require_enabled()?;
        let name = self.pending.take().ok_or(Error::NoPendingOperation)?;
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(Snapshot {
            name,
            state: state.clone(),
        });
        self.cursor = self.snapshots.len() - 1;
        log::debug!("journal: recorded snapshot {}", self.cursor);
        Ok(())
    }

    /// Step back one operation. Returns its name and the state to restore.
    pub fn undo(&mut self) -> Result<(String, T)> {
        self.require_enabled()?;
        if self.cursor == 0 || self.snapshots.is_empty() {
            return Err(Error::NothingToUndo);
        }
        let name = self.snapshots[self.cursor].name.clone();
        self.cursor -= 1;
        Ok((name, self.snapshots[self.cursor].state.clone()))
    }

    /// Step forward one operation. Returns its name and the state to restore.
    pub fn redo(&mut self) -> Result<(String, T)> {
        self.require_enabled()?;
        if self.cursor + 1 >= self.snapshots.len() {
            return Err(Error::NothingToRedo);
        }
        self.cursor += 1;
        let snapshot = &self.snapshots[self.cursor];
        Ok((snapshot.name.clone(), snapshot.state.clone()))
    }

    /// Names of all recorded operations, oldest first.
    pub fn history(&self) -> Vec<&str> {
        self.snapshots.iter().map(|s| s.name.as_str()).collect()
    }

    /// Position of the current snapshot.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Write the history as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = JournalFile {
            cursor: self.cursor,
            snapshots: self.snapshots.clone(),
        };
        let json = serde_json::to_vec(&file)?;
        std::fs::write(path.as_ref(), json)?;
        log::debug!("journal: saved {} snapshots to {}", self.snapshots.len(), path.as_ref().display());
        Ok(())
    }

    /// Replace the history with one read from `path`. Returns the state at
    /// the loaded cursor.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<T> {
        self.require_enabled()?;
        let bytes = std::fs::read(path.as_ref())?;
        let file: JournalFile<T> = serde_json::from_slice(&bytes)?;
        if file.cursor >= file.snapshots.len() {
            return Err(Error::Journal(format!(
                "cursor {} outside {} snapshots",
                file.cursor,
                file.snapshots.len()
            )));
        }
        let state = file.snapshots[file.cursor].state.clone();
        self.snapshots = file.snapshots;
        self.cursor = file.cursor;
        self.pending = None;
        Ok(state)
    }
}
