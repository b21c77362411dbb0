//! Core engine types: players, actors, configuration, errors.
//!
//! Nothing here knows about classes or instructions. Every other module
//! builds on these.

pub mod player;
pub mod config;
pub mod error;

pub use player::{Actor, PlayerId, PLAYER_CLASS_PREFIX};
pub use config::{AccessTier, AutoExecMode, GameConfig, DEFAULT_MAX_CASCADE_DEPTH};
pub use error::{EngineError, Result};
