//! The event log.
//!
//! Append-only within a timeline; rollback truncates it. Ordinals equal the
//! position in the log, so a `Checkpoint` is just a log length.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::Actor;
use crate::tasks::{Task, TaskId};

use super::event::{Cause, ChangeEvent, GameEvent, StateChange};

/// A position in the event log that the game can be rolled back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Checkpoint(pub(crate) usize);

impl Checkpoint {
    /// Ordinal of the first event after this checkpoint.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self.0
    }
}

/// What an operation did: its store changes and the tasks it left behind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub changes: Vec<ChangeEvent>,
    pub new_tasks: SmallVec<[TaskId; 4]>,
}

impl TaskResult {
    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.new_tasks.is_empty()
    }
}

/// Ordered record of everything that happened.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<GameEvent>,
    start: usize,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The current position.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.events.len())
    }

    /// All events in order.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// The event with this ordinal.
    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<&GameEvent> {
        self.events.get(ordinal)
    }

    /// Events recorded since `checkpoint`.
    #[must_use]
    pub fn events_since(&self, checkpoint: Checkpoint) -> &[GameEvent] {
        self.events.get(checkpoint.0..).unwrap_or(&[])
    }

    /// Store changes recorded since `checkpoint`.
    #[must_use]
    pub fn changes_since(&self, checkpoint: Checkpoint) -> Vec<ChangeEvent> {
        self.events_since(checkpoint)
            .iter()
            .filter_map(GameEvent::as_change)
            .cloned()
            .collect()
    }

    /// Tasks added since `checkpoint` and still present.
    ///
    /// A task edited in place is not new.
    #[must_use]
    pub fn new_tasks_since(&self, checkpoint: Checkpoint) -> SmallVec<[TaskId; 4]> {
        let mut ids: SmallVec<[TaskId; 4]> = SmallVec::new();
        for event in self.events_since(checkpoint) {
            match event {
                GameEvent::TaskAdded { task, .. } => ids.push(task.id),
                GameEvent::TaskRemoved { task, .. } => ids.retain(|id| *id != task.id),
                _ => {}
            }
        }
        ids
    }

    /// Everything done since `checkpoint`.
    #[must_use]
    pub fn activity_since(&self, checkpoint: Checkpoint) -> TaskResult {
        TaskResult {
            changes: self.changes_since(checkpoint),
            new_tasks: self.new_tasks_since(checkpoint),
        }
    }

    /// Mark the end of setup; later queries can ask for changes since then.
    pub fn set_start_point(&mut self) {
        self.start = self.events.len();
    }

    /// Store changes since setup finished.
    #[must_use]
    pub fn changes_since_setup(&self) -> Vec<ChangeEvent> {
        self.changes_since(Checkpoint(self.start))
    }

    pub(crate) fn add_change(&mut self, actor: Actor, change: StateChange, cause: Option<Cause>) -> ChangeEvent {
        let event = ChangeEvent {
            ordinal: self.events.len(),
            actor,
            change,
            cause,
        };
        self.events.push(GameEvent::Change(event.clone()));
        event
    }

    pub(crate) fn task_added(&mut self, task: Task) {
        let ordinal = self.events.len();
        self.events.push(GameEvent::TaskAdded { ordinal, task });
    }

    pub(crate) fn task_edited(&mut self, old: Task, task: Task) {
        let ordinal = self.events.len();
        self.events.push(GameEvent::TaskEdited { ordinal, old, task });
    }

    pub(crate) fn task_removed(&mut self, task: Task) {
        let ordinal = self.events.len();
        self.events.push(GameEvent::TaskRemoved { ordinal, task });
    }

    /// Remove and return every event after `checkpoint`, oldest first.
    pub(crate) fn truncate(&mut self, checkpoint: Checkpoint) -> Vec<GameEvent> {
        if checkpoint.0 >= self.events.len() {
            return Vec::new();
        }
        self.start = self.start.min(checkpoint.0);
        self.events.split_off(checkpoint.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;
    use crate::instruction::Instruction;

    fn change(n: u32) -> StateChange {
        StateChange {
            count: n,
            gaining: Some("Plant".parse().unwrap()),
            removing: None,
        }
    }

    fn task(id: u32) -> Task {
        Task::new(TaskId(id), Actor::Player(PlayerId(0)), Instruction::NoOp)
    }

    #[test]
    fn test_ordinals_are_positions() {
        let mut log = EventLog::new();
        let first = log.add_change(Actor::Engine, change(1), None);
        log.task_added(task(0));
        let third = log.add_change(Actor::Engine, change(2), None);

        assert_eq!(first.ordinal, 0);
        assert_eq!(third.ordinal, 2);
        for (i, event) in log.events().iter().enumerate() {
            assert_eq!(event.ordinal(), i);
        }
    }

    #[test]
    fn test_activity_since_checkpoint() {
        let mut log = EventLog::new();
        log.add_change(Actor::Engine, change(1), None);
        let checkpoint = log.checkpoint();

        log.add_change(Actor::Engine, change(2), None);
        log.task_added(task(0));
        log.task_added(task(1));
        log.task_removed(task(0));
        log.task_edited(task(1), task(1));

        let result = log.activity_since(checkpoint);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].change.count, 2);
        assert_eq!(result.new_tasks.as_slice(), &[TaskId(1)]);
    }

    #[test]
    fn test_truncate_returns_tail() {
        let mut log = EventLog::new();
        log.add_change(Actor::Engine, change(1), None);
        let checkpoint = log.checkpoint();
        log.add_change(Actor::Engine, change(2), None);
        log.task_added(task(0));

        let tail = log.truncate(checkpoint);
        assert_eq!(tail.len(), 2);
        assert_eq!(log.len(), 1);
        assert!(log.truncate(checkpoint).is_empty());
    }

    #[test]
    fn test_changes_since_setup() {
        let mut log = EventLog::new();
        log.add_change(Actor::Engine, change(1), None);
        log.set_start_point();
        log.add_change(Actor::Player(PlayerId(0)), change(2), None);

        let changes = log.changes_since_setup();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].ordinal, 1);
    }
}
