//! Task lifecycle: narrowing, preparing and executing queued tasks.
//!
//! These run inside an atomic block opened by the session; on error the
//! caller rolls back whatever was done.

use tracing::debug;

use crate::core::{Actor, AutoExecMode, EngineError, Result};
use crate::instruction::{check_narrows, Instruction};
use crate::tasks::{Task, TaskId};

use super::committer::{Committer, Dependents};
use super::game::Game;
use super::preparer::Preparer;

impl Game {
    /// Prepare a task in place. Returns `None` when nothing of it remains.
    pub(crate) fn prepare_task_inner(&mut self, id: TaskId) -> Result<Option<TaskId>> {
        if let Some(other) = self.tasks.prepared_task() {
            if other != id {
                return Err(EngineError::Task(format!("task {other} is already prepared")));
            }
        }
        let task = self.tasks.require(id)?.clone();
        if task.instruction.has_parallel_head() {
            return Err(EngineError::Abstract(format!(
                "task {id} must be split before it can be prepared: {}",
                task.instruction
            )));
        }
        let prepared = Preparer::new(self.reader()).prepare_instruction(&task.instruction)?;
        self.tasks.replace_task(id, prepared, true, &mut self.log)?;
        Ok(self.tasks.contains(id).then_some(id))
    }

    /// Replace a task's instruction with a narrower one.
    pub(crate) fn narrow_task_inner(&mut self, id: TaskId, proposed: Instruction) -> Result<()> {
        let task = self.tasks.require(id)?.clone();
        if task.instruction == proposed {
            return Ok(());
        }
        check_narrows(&proposed, &task.instruction, self.types())?;
        let replacement = if task.prepared && !proposed.has_parallel_head() {
            Preparer::new(self.reader()).prepare_instruction(&proposed)?
        } else {
            proposed
        };
        self.tasks.replace_task(id, replacement, task.prepared, &mut self.log)
    }

    /// Prepare, execute and complete a task.
    pub(crate) fn execute_task_inner(&mut self, id: TaskId) -> Result<()> {
        let Some(id) = self.prepare_task_inner(id)? else {
            return Ok(());
        };
        let task = self.tasks.require(id)?.clone();
        if task.instruction.is_abstract(self.types()) {
            return Err(EngineError::Abstract(format!(
                "task {id} needs a choice first: {}",
                task.instruction
            )));
        }

        let deferred = self.execute(task.owner, &task.instruction, task.cause.as_ref(), 0)?;
        for effect in deferred {
            let ids = self
                .tasks
                .add_tasks(effect.instruction, effect.owner, effect.cause, &mut self.log)?;
            if let Some(why) = effect.why_pending {
                for new_id in ids {
                    let task = self.tasks.require(new_id)?.clone();
                    let pending = Task {
                        why_pending: Some(why.clone()),
                        ..task
                    };
                    self.tasks.edit_task(pending, &mut self.log)?;
                }
            }
        }
        self.tasks.complete_task(id, &mut self.log)
    }

    /// Execute a task if possible. A failure that only means "not now", or
    /// a choice still to be made, is rolled back and noted on the task.
    pub(crate) fn try_execute(&mut self, id: TaskId) -> Result<bool> {
        let checkpoint = self.checkpoint();
        match self.execute_task_inner(id) {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_now() || matches!(e, EngineError::Abstract(_)) => {
                self.rewind(checkpoint);
                debug!(task = %id, reason = %e, "task pending");
                let task = self.tasks.require(id)?.clone();
                self.tasks.edit_task(
                    Task {
                        why_pending: Some(e.to_string()),
                        ..task
                    },
                    &mut self.log,
                )?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a task would prepare to something that can run as is.
    pub(crate) fn is_ready(&mut self, id: TaskId) -> bool {
        self.dry_run(|game| match game.prepare_task_inner(id)? {
            None => Ok(true),
            Some(id) => Ok(!game.tasks.require(id)?.instruction.is_abstract(game.types())),
        })
        .unwrap_or(false)
    }

    /// Keep executing tasks that need no decision.
    pub(crate) fn auto_exec_inner(&mut self, mode: AutoExecMode) -> Result<()> {
        if mode == AutoExecMode::None {
            return Ok(());
        }
        loop {
            let candidates: Vec<TaskId> = match self.tasks.prepared_task() {
                Some(id) => vec![id],
                None => {
                    let ids: Vec<TaskId> = self.tasks.ids().collect();
                    ids.into_iter().filter(|&id| self.is_ready(id)).collect()
                }
            };
            let progressed = match candidates.as_slice() {
                [] => false,
                [only] => self.try_execute(*only)?,
                many if mode == AutoExecMode::FirstAvailable => {
                    let mut progressed = false;
                    for &id in many {
                        if self.try_execute(id)? {
                            progressed = true;
                            break;
                        }
                    }
                    progressed
                }
                _ => false,
            };
            if !progressed {
                return Ok(());
            }
        }
    }

    /// Commit concrete changes without tasks or triggers.
    pub(crate) fn commit_direct_inner(&mut self, instruction: &Instruction, actor: Actor) -> Result<()> {
        match instruction {
            Instruction::NoOp => Ok(()),
            Instruction::Change(change) => {
                Committer::new(&mut self.store, &mut self.log, self.types.as_ref()).commit(
                    change,
                    actor,
                    None,
                    Dependents::Refuse,
                )?;
                Ok(())
            }
            Instruction::Multi(items) | Instruction::Then(items) => {
                for item in items {
                    self.commit_direct_inner(item, actor)?;
                }
                Ok(())
            }
            other => Err(EngineError::Abstract(format!("can't commit {other} directly"))),
        }
    }
}
