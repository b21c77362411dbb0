//! Sessions: the caller-facing API.
//!
//! A session acts on a game as one actor with one access tier. Every
//! mutating operation runs as an atomic block and reports what it did.

use tracing::debug;

use crate::core::{AccessTier, Actor, EngineError, Result};
use crate::history::{Cause, Checkpoint, EventLog, TaskResult};
use crate::instruction::{Instruction, Requirement};
use crate::store::ComponentStore;
use crate::tasks::{TaskId, TaskQueue};
use crate::types::TypeExpr;

use super::game::Game;

/// One actor's handle on a game.
#[derive(Debug)]
pub struct Session<'g> {
    game: &'g mut Game,
    actor: Actor,
    tier: AccessTier,
}

impl<'g> Session<'g> {
    pub(crate) fn new(game: &'g mut Game, actor: Actor, tier: AccessTier) -> Self {
        Self { game, actor, tier }
    }

    #[must_use]
    pub fn actor(&self) -> Actor {
        self.actor
    }

    #[must_use]
    pub fn tier(&self) -> AccessTier {
        self.tier
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Queue `instruction` as tasks owned by this session's actor.
    pub fn add_task(&mut self, instruction: Instruction) -> Result<TaskResult> {
        self.add_task_for(self.actor, instruction)
    }

    /// Queue `instruction` as tasks owned by `owner`.
    pub fn add_task_for(&mut self, owner: Actor, instruction: Instruction) -> Result<TaskResult> {
        self.enqueue(owner, instruction, None)
    }

    /// Queue `instruction` as tasks done on behalf of the component `context`.
    ///
    /// Changes made by these tasks are logged with that component as their
    /// cause, but no triggering event.
    pub fn add_task_by(&mut self, context: TypeExpr, instruction: Instruction) -> Result<TaskResult> {
        let cause = Cause {
            context: Some(context),
            trigger_event: None,
        };
        self.enqueue(self.actor, instruction, Some(cause))
    }

    fn enqueue(&mut self, owner: Actor, instruction: Instruction, cause: Option<Cause>) -> Result<TaskResult> {
        self.require_tier(AccessTier::Operator, "add tasks")?;
        debug!(owner = %owner, instruction = %instruction, "adding task");
        self.game.atomic(|game| {
            game.tasks.add_tasks(instruction, owner, cause, &mut game.log).map(|_| ())
        })
    }

    /// Replace a task's instruction with a narrower one.
    pub fn narrow_task(&mut self, id: TaskId, proposed: Instruction) -> Result<TaskResult> {
        self.require_owner(id)?;
        self.game.atomic(|game| game.narrow_task_inner(id, proposed))
    }

    /// Prepare a task against the current state.
    ///
    /// If preparing leaves nothing to do, the task completes. If it leaves
    /// parallel parts, each becomes a new task.
    pub fn prepare_task(&mut self, id: TaskId) -> Result<TaskResult> {
        self.require_owner(id)?;
        self.game.atomic(|game| game.prepare_task_inner(id).map(|_| ()))
    }

    /// Whether preparing a task would succeed. Changes nothing.
    pub fn can_prepare_task(&mut self, id: TaskId) -> bool {
        self.require_owner(id).is_ok() && self.game.dry_run(|game| game.prepare_task_inner(id)).is_ok()
    }

    /// Prepare and execute a task, enqueueing its continuation and any
    /// non-automatic effects it fires.
    pub fn execute_task(&mut self, id: TaskId) -> Result<TaskResult> {
        self.require_owner(id)?;
        self.game.atomic(|game| game.execute_task_inner(id))
    }

    /// Execute a task, or leave it pending with a note on why it can't run.
    pub fn try_task(&mut self, id: TaskId) -> Result<TaskResult> {
        self.require_owner(id)?;
        self.game.atomic(|game| game.try_execute(id).map(|_| ()))
    }

    /// Execute the first task this session may act on.
    pub fn do_first_task(&mut self) -> Result<TaskResult> {
        let id = self
            .visible_tasks()
            .next()
            .ok_or_else(|| EngineError::Task(format!("no tasks for {}", self.actor)))?;
        self.execute_task(id)
    }

    /// Execute tasks that need no decision until none is left, using the
    /// game's configured mode.
    pub fn auto_exec(&mut self) -> Result<TaskResult> {
        self.require_tier(AccessTier::Operator, "auto-execute")?;
        let mode = self.game.config().auto_exec;
        self.game.atomic(|game| game.auto_exec_inner(mode))
    }

    /// Remove a task without running its continuation.
    pub fn drop_task(&mut self, id: TaskId) -> Result<TaskResult> {
        self.require_tier(AccessTier::Admin, "drop tasks")?;
        self.game.atomic(|game| game.tasks.remove_task(id, &mut game.log).map(|_| ()))
    }

    /// Commit concrete changes directly, bypassing tasks and triggers.
    ///
    /// Removing the last copy of something another component depends on is
    /// refused rather than cascaded.
    pub fn commit_direct(&mut self, instruction: Instruction) -> Result<TaskResult> {
        self.require_tier(AccessTier::Admin, "commit directly")?;
        let actor = self.actor;
        self.game.atomic(|game| game.commit_direct_inner(&instruction, actor))
    }

    // ========================================================================
    // Timeline
    // ========================================================================

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        self.game.checkpoint()
    }

    pub fn roll_back(&mut self, checkpoint: Checkpoint) -> Result<()> {
        self.require_tier(AccessTier::Operator, "roll back")?;
        self.game.roll_back(checkpoint)
    }

    /// Run several operations all-or-nothing as this session.
    ///
    /// Returning [`EngineError::Abort`] from `body` rolls back quietly.
    pub fn atomic(&mut self, body: impl FnOnce(&mut Session<'_>) -> Result<()>) -> Result<TaskResult> {
        let (actor, tier) = (self.actor, self.tier);
        self.game.atomic(|game| body(&mut Session::new(game, actor, tier)))
    }

    // ========================================================================
    // Reading
    // ========================================================================

    #[must_use]
    pub fn count(&self, ty: &TypeExpr) -> u32 {
        self.game.count(ty)
    }

    #[must_use]
    pub fn has(&self, requirement: &Requirement) -> bool {
        self.game.has(requirement)
    }

    #[must_use]
    pub fn tasks(&self) -> &TaskQueue {
        self.game.tasks()
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        self.game.events()
    }

    #[must_use]
    pub fn store(&self) -> &ComponentStore {
        self.game.store()
    }

    // ========================================================================
    // Access
    // ========================================================================

    fn require_tier(&self, tier: AccessTier, what: &str) -> Result<()> {
        if self.tier < tier {
            return Err(EngineError::Access(format!("{:?} access can't {what}", self.tier)));
        }
        Ok(())
    }

    fn require_owner(&self, id: TaskId) -> Result<()> {
        let task = self.game.tasks().require(id)?;
        if self.tier == AccessTier::Player && task.owner != self.actor {
            return Err(EngineError::Access(format!(
                "task {id} belongs to {}, not {}",
                task.owner, self.actor
            )));
        }
        Ok(())
    }

    fn visible_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.game
            .tasks()
            .iter()
            .filter(move |t| self.tier > AccessTier::Player || t.owner == self.actor)
            .map(|t| t.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameConfig, PlayerId};
    use crate::types::{ClassDefinition, ClassTable};

    fn ty(s: &str) -> TypeExpr {
        s.parse().unwrap()
    }

    fn game() -> Game {
        let mut types = ClassTable::with_players(2);
        types.register(ClassDefinition::new("Plant").with_owner());
        types.register(ClassDefinition::new("City").with_owner());
        types.register(
            ClassDefinition::new("Road")
                .with_owner()
                .with_dependency("City"),
        );
        Game::new(GameConfig::new(2), types)
    }

    const P1: Actor = Actor::Player(PlayerId(0));
    const P2: Actor = Actor::Player(PlayerId(1));

    #[test]
    fn test_player_cannot_add_tasks() {
        let mut game = game();
        let err = game
            .session(P1, AccessTier::Player)
            .add_task(Instruction::gain(1, ty("Plant<Player1>")))
            .unwrap_err();
        assert!(matches!(err, EngineError::Access(_)));
        assert!(game.tasks().is_empty());
    }

    #[test]
    fn test_player_acts_only_on_own_tasks() {
        let mut game = game();
        let result = game
            .session(Actor::Engine, AccessTier::Operator)
            .add_task_for(P2, Instruction::gain(1, ty("Plant<Player2>")))
            .unwrap();
        let id = result.new_tasks[0];

        let err = game.session(P1, AccessTier::Player).execute_task(id).unwrap_err();
        assert!(matches!(err, EngineError::Access(_)));

        game.session(P2, AccessTier::Player).execute_task(id).unwrap();
        assert_eq!(game.count(&ty("Plant<Player2>")), 1);
        assert!(game.tasks().is_empty());
    }

    #[test]
    fn test_drop_task_needs_admin() {
        let mut game = game();
        let id = game
            .session(P1, AccessTier::Operator)
            .add_task(Instruction::then([
                Instruction::gain(1, ty("Plant<Player1>")),
                Instruction::gain(1, ty("City<Player1>")),
            ]))
            .unwrap()
            .new_tasks[0];

        let err = game.session(P1, AccessTier::Operator).drop_task(id).unwrap_err();
        assert!(matches!(err, EngineError::Access(_)));

        game.session(P1, AccessTier::Admin).drop_task(id).unwrap();
        assert!(game.tasks().is_empty(), "dropping skips the continuation");
    }

    #[test]
    fn test_commit_direct_refuses_dependents() {
        let mut game = game();
        let mut admin = game.session(Actor::Engine, AccessTier::Admin);
        admin
            .commit_direct(Instruction::multi([
                Instruction::gain(1, ty("City<Player1>")),
                Instruction::gain(1, ty("Road<Player1, City<Player1>>")),
            ]))
            .unwrap();
        let before = admin.events().len();

        let err = admin.commit_direct(Instruction::remove(1, ty("City<Player1>"))).unwrap_err();
        assert!(matches!(err, EngineError::Dependency(_)));
        assert_eq!(admin.events().len(), before);
        assert_eq!(admin.count(&ty("City")), 1);
    }

    #[test]
    fn test_prepare_failure_leaves_task() {
        let mut game = game();
        let mut op = game.session(P1, AccessTier::Operator);
        let id = op.add_task(Instruction::remove(1, ty("Plant<Player1>"))).unwrap().new_tasks[0];
        let before = op.tasks().clone();

        assert!(!op.can_prepare_task(id));
        assert!(matches!(op.prepare_task(id), Err(EngineError::Limits(_))));
        assert_eq!(op.tasks(), &before);
    }

    #[test]
    fn test_try_task_records_why_pending() {
        let mut game = game();
        let mut op = game.session(P1, AccessTier::Operator);
        let id = op.add_task(Instruction::remove(1, ty("Plant<Player1>"))).unwrap().new_tasks[0];

        op.try_task(id).unwrap();
        let task = op.tasks().require(id).unwrap();
        assert!(task.why_pending.as_deref().is_some_and(|why| why.contains("Plant")));
        assert!(!task.prepared);
    }

    #[test]
    fn test_session_atomic_abort() {
        let mut game = game();
        let result = game
            .session(P1, AccessTier::Operator)
            .atomic(|s| {
                let id = s.add_task(Instruction::gain(1, ty("Plant<Player1>")))?.new_tasks[0];
                s.execute_task(id)?;
                Err(EngineError::Abort)
            })
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(game.count(&ty("Plant")), 0);
        assert!(game.events().is_empty());
    }

    #[test]
    fn test_do_first_task_skips_others_tasks() {
        let mut game = game();
        let mut engine = game.session(Actor::Engine, AccessTier::Operator);
        engine.add_task_for(P2, Instruction::gain(1, ty("Plant<Player2>"))).unwrap();
        engine.add_task_for(P1, Instruction::gain(1, ty("Plant<Player1>"))).unwrap();

        game.session(P1, AccessTier::Player).do_first_task().unwrap();
        assert_eq!(game.count(&ty("Plant<Player1>")), 1);
        assert_eq!(game.count(&ty("Plant<Player2>")), 0);
        assert!(game.session(P1, AccessTier::Player).do_first_task().is_err());
    }
}
