//! Tasks: pending instructions waiting for a player or the engine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Actor, EngineError};
use crate::history::Cause;
use crate::instruction::Instruction;

/// Task identifier, displayed as letters: `A`..`Z`, then `AA`, `AB`, ...
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u32);

impl TaskId {
    /// Create a new task ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The id after this one, or `None` past the last id.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut n = u64::from(self.0) + 1;
        let mut letters = Vec::new();
        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }
        letters.reverse();
        f.write_str(&String::from_utf8_lossy(&letters))
    }
}

impl FromStr for TaskId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(EngineError::Task(format!("bad task id `{s}`")));
        }
        let value = s.bytes().try_fold(0u64, |acc, b| {
            acc.checked_mul(26)?.checked_add(u64::from(b - b'A') + 1)
        });
        value
            .and_then(|v| u32::try_from(v - 1).ok())
            .map(TaskId)
            .ok_or_else(|| EngineError::Task(format!("task id `{s}` out of range")))
    }
}

/// A pending instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    /// Who must act on this task.
    pub owner: Actor,

    /// What to do. Never a `Multi`, and a `Then` only when its head is one.
    pub instruction: Instruction,

    /// What to enqueue once this task is done.
    pub then: Option<Instruction>,

    pub cause: Option<Cause>,

    /// Whether the instruction has been prepared against the current state.
    pub prepared: bool,

    /// Why the last attempt to execute this task didn't go through.
    pub why_pending: Option<String>,
}

impl Task {
    /// Create a new unprepared task.
    #[must_use]
    pub fn new(id: TaskId, owner: Actor, instruction: Instruction) -> Self {
        Self {
            id,
            owner,
            instruction,
            then: None,
            cause: None,
            prepared: false,
            why_pending: None,
        }
    }

    /// Set the cause (builder pattern).
    #[must_use]
    pub fn with_cause(mut self, cause: Option<Cause>) -> Self {
        self.cause = cause;
        self
    }

    /// Set the continuation (builder pattern).
    #[must_use]
    pub fn with_then(mut self, then: Option<Instruction>) -> Self {
        self.then = then.filter(|t| *t != Instruction::NoOp);
        self
    }

    /// Move the tail of a `Then` instruction into the continuation.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if let Instruction::Then(links) = &self.instruction {
            if !self.instruction.has_parallel_head() {
                let mut links = links.clone();
                let head = links.remove(0);
                links.extend(self.then.take());
                self.instruction = head;
                self.then = Some(Instruction::then(links)).filter(|t| *t != Instruction::NoOp);
            }
        }
        self
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.id, self.owner, self.instruction)?;
        if let Some(then) = &self.then {
            write!(f, " (THEN {then})")?;
        }
        if self.prepared {
            f.write_str(" *")?;
        }
        if let Some(why) = &self.why_pending {
            write!(f, " ({why})")?;
        }
        Ok(())
    }
}
