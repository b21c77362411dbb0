//! # rust-rules
//!
//! A task-driven rules engine for card and board games.
//!
//! Games describe their components as classes (with owners, count limits,
//! dependencies and triggered effects) and drive play with small
//! instructions: gain, remove, transmute, choices, conditions, sequences.
//! The engine narrows and prepares instructions against the current state,
//! commits them as logged changes, fires the effects they trigger and keeps
//! the resulting work in a task queue.
//!
//! ## Design Principles
//!
//! 1. **Declarative Classes**: Limits, dependencies and effects belong to the
//!    class table, not to the engine.
//!
//! 2. **Atomic Operations**: Every caller-facing operation either completes
//!    or leaves the store, the log and the task queue exactly as they were.
//!
//! 3. **Deterministic State**: Persistent ordered maps via `im-rs`, so
//!    snapshots are cheap and iteration order never depends on hashing.
//!
//! ## Modules
//!
//! - `core`: players, actors, configuration, errors
//! - `types`: type expressions and the class table
//! - `instruction`: the instruction tree, requirements, narrowing
//! - `store`: held components and count-limit arithmetic
//! - `history`: change events, the event log, checkpoints
//! - `tasks`: tasks and the task queue
//! - `triggers`: class-declared effects and their dispatch
//! - `engine`: preparation, commits, the game and sessions

pub mod core;
pub mod types;
pub mod instruction;
pub mod store;
pub mod history;
pub mod tasks;
pub mod triggers;
pub mod engine;

// Re-export commonly used types
pub use crate::core::{AccessTier, Actor, AutoExecMode, EngineError, GameConfig, PlayerId, Result};

pub use crate::types::{ClassDefinition, ClassTable, TypeExpr, TypeSystem};

pub use crate::instruction::{Change, Count, Instruction, Intensity, Metric, Requirement};

pub use crate::store::{Component, ComponentStore};

pub use crate::history::{Cause, ChangeEvent, Checkpoint, EventLog, GameEvent, StateChange, TaskResult};

pub use crate::tasks::{Task, TaskId, TaskQueue};

pub use crate::triggers::{Effect, Trigger};

pub use crate::engine::{CustomFunction, Game, Session};
