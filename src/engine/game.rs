//! The game: all mutable state plus the collaborators that interpret it.
//!
//! A `Game` owns the component store, the event log and the task queue.
//! Callers work with it through [`Session`]s, which carry an actor and an
//! access tier.

use crate::core::{AccessTier, Actor, GameConfig};
use crate::history::EventLog;
use crate::instruction::Requirement;
use crate::store::{ComponentStore, Reader};
use crate::tasks::TaskQueue;
use crate::types::{TypeExpr, TypeSystem};

use super::custom::{CustomFunction, CustomRegistry};
use super::session::Session;

/// A game in progress.
///
/// ## Example
///
/// ```
/// use rust_rules::core::{AccessTier, Actor, GameConfig, PlayerId};
/// use rust_rules::engine::Game;
/// use rust_rules::instruction::Instruction;
/// use rust_rules::types::{ClassDefinition, ClassTable};
///
/// let mut types = ClassTable::with_players(2);
/// types.register(ClassDefinition::new("Plant").with_owner());
///
/// let mut game = Game::new(GameConfig::new(2), types);
/// let plant = "Plant<Player1>".parse().unwrap();
///
/// let mut engine = game.session(Actor::Engine, AccessTier::Operator);
/// let result = engine.add_task(Instruction::gain(2, plant)).unwrap();
/// let task = result.new_tasks[0];
///
/// let mut player = game.session(Actor::Player(PlayerId(0)), AccessTier::Operator);
/// player.execute_task(task).unwrap();
/// assert_eq!(game.count(&"Plant".parse().unwrap()), 2);
/// ```
pub struct Game {
    config: GameConfig,
    pub(crate) types: Box<dyn TypeSystem>,
    pub(crate) customs: CustomRegistry,
    pub(crate) store: ComponentStore,
    pub(crate) log: EventLog,
    pub(crate) tasks: TaskQueue,
}

impl Game {
    /// Create a new game with an empty store.
    pub fn new(config: GameConfig, types: impl TypeSystem + 'static) -> Self {
        Self {
            config,
            types: Box::new(types),
            customs: CustomRegistry::new(),
            store: ComponentStore::new(),
            log: EventLog::new(),
            tasks: TaskQueue::new(),
        }
    }

    /// Register a custom function (builder pattern).
    #[must_use]
    pub fn with_custom(mut self, function: impl CustomFunction + 'static) -> Self {
        self.register_custom(function);
        self
    }

    /// Register a custom function.
    pub fn register_custom(&mut self, function: impl CustomFunction + 'static) {
        self.customs.register(Box::new(function));
    }

    /// Open a session acting as `actor` with `tier` access.
    ///
    /// Panics if `actor` is a player not in this game.
    pub fn session(&mut self, actor: Actor, tier: AccessTier) -> Session<'_> {
        if let Actor::Player(player) = actor {
            assert!(
                self.config.has_player(player),
                "{player} is not in a {}-player game",
                self.config.player_count
            );
        }
        Session::new(self, actor, tier)
    }

    /// Mark the end of setup for `EventLog::changes_since_setup`.
    pub fn finish_setup(&mut self) {
        self.log.set_start_point();
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Get the type system.
    #[must_use]
    pub fn types(&self) -> &dyn TypeSystem {
        self.types.as_ref()
    }

    /// Get the component store.
    #[must_use]
    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    /// Get the event log.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.log
    }

    /// Get the task queue.
    #[must_use]
    pub fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    /// Read-only view for evaluating counts and requirements.
    #[must_use]
    pub fn reader(&self) -> Reader<'_> {
        Reader::new(&self.store, self.types.as_ref())
    }

    /// Count of held components of type `ty`.
    #[must_use]
    pub fn count(&self, ty: &TypeExpr) -> u32 {
        self.reader().count(ty)
    }

    /// Whether `requirement` holds.
    #[must_use]
    pub fn has(&self, requirement: &Requirement) -> bool {
        self.reader().has(requirement)
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("tasks", &self.tasks)
            .field("events", &self.log.len())
            .field("customs", &self.customs)
            .finish_non_exhaustive()
    }
}
