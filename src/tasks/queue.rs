//! The task queue.
//!
//! Tasks are kept sorted by id in an `im::OrdMap`, so snapshots are O(1) and
//! comparing a queue before and after rollback is cheap. Every mutation is
//! logged as a task event so rollback can reverse it.

use im::OrdMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Actor, EngineError, Result};
use crate::history::{Cause, EventLog, GameEvent};
use crate::instruction::Instruction;

use super::task::{Task, TaskId};

/// Pending tasks, ordered by id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskQueue {
    tasks: OrdMap<TaskId, Task>,
}

impl TaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a task by id.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Get a task by id, or a task error naming it.
    pub fn require(&self, id: TaskId) -> Result<&Task> {
        self.get(id)
            .ok_or_else(|| EngineError::Task(format!("no task {id}")))
    }

    /// Check if a task exists.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Task ids in order.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    /// Tasks in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Tasks owned by `owner`.
    pub fn owned_by(&self, owner: Actor) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(move |t| t.owner == owner)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if no tasks are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The lowest pending id.
    #[must_use]
    pub fn first_id(&self) -> Option<TaskId> {
        self.tasks.get_min().map(|(id, _)| *id)
    }

    /// The task currently prepared, if any. At most one is.
    #[must_use]
    pub fn prepared_task(&self) -> Option<TaskId> {
        self.tasks.values().find(|t| t.prepared).map(|t| t.id)
    }

    /// The id the next added task will get.
    pub fn next_id(&self) -> Result<TaskId> {
        match self.tasks.get_max() {
            None => Ok(TaskId(0)),
            Some((id, _)) => id
                .next()
                .ok_or_else(|| EngineError::Task(format!("no task id left after {id}"))),
        }
    }

    /// Add one task per unit of `instruction`. Returns the new ids.
    pub(crate) fn add_tasks(
        &mut self,
        instruction: Instruction,
        owner: Actor,
        cause: Option<Cause>,
        log: &mut EventLog,
    ) -> Result<Vec<TaskId>> {
        let mut ids = Vec::new();
        for unit in instruction.split() {
            let task = Task::new(self.next_id()?, owner, unit)
                .with_cause(cause.clone())
                .normalized();
            debug!(task = %task, "task added");
            ids.push(task.id);
            self.tasks.insert(task.id, task.clone());
            log.task_added(task);
        }
        Ok(ids)
    }

    /// Replace a task with a revised version of itself. No event if nothing changed.
    pub(crate) fn edit_task(&mut self, revised: Task, log: &mut EventLog) -> Result<()> {
        let old = self.require(revised.id)?.clone();
        let revised = revised.normalized();
        if old == revised {
            return Ok(());
        }
        debug!(old = %old, task = %revised, "task edited");
        self.tasks.insert(revised.id, revised.clone());
        log.task_edited(old, revised);
        Ok(())
    }

    /// Remove a task without running its continuation.
    pub(crate) fn remove_task(&mut self, id: TaskId, log: &mut EventLog) -> Result<Task> {
        let task = self
            .tasks
            .remove(&id)
            .ok_or_else(|| EngineError::Task(format!("no task {id}")))?;
        debug!(task = %task, "task removed");
        log.task_removed(task.clone());
        Ok(task)
    }

    /// Finish a task: enqueue its continuation, then remove it.
    pub(crate) fn complete_task(&mut self, id: TaskId, log: &mut EventLog) -> Result<()> {
        let task = self.require(id)?.clone();
        if let Some(then) = task.then {
            self.add_tasks(then, task.owner, task.cause, log)?;
        }
        self.remove_task(id, log)?;
        Ok(())
    }

    /// Replace one task with whatever `replacement` splits into.
    ///
    /// Nothing: the task completes. One unit: the task is edited in place,
    /// keeping its continuation. Several: each becomes a new task and the
    /// original completes.
    pub(crate) fn replace_task(
        &mut self,
        id: TaskId,
        replacement: Instruction,
        prepared: bool,
        log: &mut EventLog,
    ) -> Result<()> {
        let task = self.require(id)?.clone();
        let mut units = replacement.split();
        match units.len() {
            0 => self.complete_task(id, log),
            1 => {
                let revised = Task {
                    instruction: units.swap_remove(0),
                    prepared,
                    why_pending: None,
                    ..task
                };
                self.edit_task(revised, log)
            }
            _ => {
                self.add_tasks(Instruction::Multi(units), task.owner, task.cause, log)?;
                self.complete_task(id, log)
            }
        }
    }

    /// Undo one logged task event.
    pub(crate) fn reverse(&mut self, event: &GameEvent) {
        match event {
            GameEvent::TaskAdded { task, .. } => {
                self.tasks.remove(&task.id);
            }
            GameEvent::TaskRemoved { task, .. } => {
                self.tasks.insert(task.id, task.clone());
            }
            GameEvent::TaskEdited { old, .. } => {
                self.tasks.insert(old.id, old.clone());
            }
            GameEvent::Change(_) => {}
        }
    }
}
