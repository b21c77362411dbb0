//! Trigger system: effects declared on component classes, and dispatch.
//!
//! ## Key Components
//!
//! - [`Trigger`]: which change an effect reacts to
//! - [`Effect`]: trigger plus response instruction
//! - [`TriggerDispatcher`]: finds the effects fired by a change event
//!
//! ## Example Usage
//!
//! ```
//! use rust_rules::core::{Actor, PlayerId};
//! use rust_rules::history::{ChangeEvent, StateChange};
//! use rust_rules::instruction::Instruction;
//! use rust_rules::store::{ComponentStore, Reader};
//! use rust_rules::triggers::{Effect, Trigger, TriggerDispatcher};
//! use rust_rules::types::{ClassDefinition, ClassTable};
//!
//! let mut types = ClassTable::with_players(1);
//! types.register(ClassDefinition::new("Heat").with_owner());
//! types.register(ClassDefinition::new("Seed").with_owner().with_effect(
//!     Effect::new(Trigger::WhenGain, Instruction::gain(1, "Heat<Owner>".parse().unwrap())),
//! ));
//!
//! let store = ComponentStore::new();
//! let event = ChangeEvent {
//!     ordinal: 0,
//!     actor: Actor::Player(PlayerId(0)),
//!     change: StateChange { count: 2, gaining: Some("Seed<Player1>".parse().unwrap()), removing: None },
//!     cause: None,
//! };
//!
//! let fired = TriggerDispatcher::new(Reader::new(&store, &types)).fire(&event);
//! assert_eq!(fired[0].instruction.to_string(), "2 Heat<Player1>!");
//! ```

mod effect;
mod dispatcher;

pub use effect::{ByActor, Effect, Trigger};
pub use dispatcher::{FiredEffect, TriggerDispatcher};
