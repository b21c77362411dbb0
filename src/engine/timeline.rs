//! Checkpoints, rollback and atomic blocks.
//!
//! Rolling back replays the log tail in reverse: change events are inverted
//! (without firing triggers) and task events are reversed. Afterwards the
//! store, the queue and the log are exactly as they were at the checkpoint.

use tracing::debug;

use crate::core::{EngineError, Result};
use crate::history::{Checkpoint, GameEvent, TaskResult};

use super::committer::undo_change;
use super::game::Game;

impl Game {
    /// The current position in the event log.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        self.log.checkpoint()
    }

    /// Undo everything after `checkpoint`.
    pub fn roll_back(&mut self, checkpoint: Checkpoint) -> Result<()> {
        if checkpoint.ordinal() > self.log.len() {
            return Err(EngineError::Task(format!(
                "checkpoint {} is ahead of the log ({} events)",
                checkpoint.ordinal(),
                self.log.len()
            )));
        }
        self.rewind(checkpoint);
        Ok(())
    }

    pub(crate) fn rewind(&mut self, checkpoint: Checkpoint) {
        let undone = self.log.truncate(checkpoint);
        if !undone.is_empty() {
            debug!(checkpoint = checkpoint.ordinal(), events = undone.len(), "rolling back");
        }
        for event in undone.iter().rev() {
            match event {
                GameEvent::Change(change) => undo_change(&mut self.store, &change.change),
                task_event => self.tasks.reverse(task_event),
            }
        }
    }

    /// Run `body` all-or-nothing.
    ///
    /// On success, returns what the block did. On error, everything it did is
    /// rolled back and the error is returned, except [`EngineError::Abort`],
    /// which rolls back and returns an empty result.
    pub fn atomic(&mut self, body: impl FnOnce(&mut Game) -> Result<()>) -> Result<TaskResult> {
        let checkpoint = self.checkpoint();
        match body(self) {
            Ok(()) => Ok(self.log.activity_since(checkpoint)),
            Err(EngineError::Abort) => {
                self.rewind(checkpoint);
                Ok(TaskResult::default())
            }
            Err(e) => {
                debug!(error = %e, "atomic block failed");
                self.rewind(checkpoint);
                Err(e)
            }
        }
    }

    /// Run `body` and undo whatever it did, returning its result.
    pub fn dry_run<T>(&mut self, body: impl FnOnce(&mut Game) -> Result<T>) -> Result<T> {
        let checkpoint = self.checkpoint();
        let result = body(self);
        self.rewind(checkpoint);
        result
    }
}
