//! Game configuration types.
//!
//! Games configure the engine at startup by providing a `GameConfig`:
//! - player count
//! - how deep automatic trigger cascades may recurse
//! - how eagerly `auto_exec` resolves pending tasks
//!
//! Access tiers gate which caller-facing operations a session may use.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// Default bound on automatic trigger recursion.
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 256;

/// How far `auto_exec` goes on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AutoExecMode {
    /// Never execute tasks automatically.
    None,
    /// Execute a task only when it is the single one that can proceed.
    #[default]
    Safe,
    /// When several tasks could proceed, take the first that succeeds.
    FirstAvailable,
}

/// Which caller-facing operations a session may perform.
///
/// Tiers are ordered: every tier can do everything the tiers below it can.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessTier {
    /// Narrow, prepare and execute tasks it owns.
    Player,
    /// Also add tasks, roll back, and act on any owner's tasks.
    Operator,
    /// Also drop tasks and commit changes directly, bypassing tasks and triggers.
    Admin,
}

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of players (1-255).
    pub player_count: usize,

    /// Maximum nesting of automatic triggers before a commit is a dead end.
    pub max_cascade_depth: usize,

    /// Behavior of `Session::auto_exec`.
    pub auto_exec: AutoExecMode,
}

impl GameConfig {
    /// Create a new game config for the given number of players.
    pub fn new(player_count: usize) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            player_count,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
            auto_exec: AutoExecMode::default(),
        }
    }

    /// Set the cascade depth bound (builder pattern).
    #[must_use]
    pub fn with_max_cascade_depth(mut self, depth: usize) -> Self {
        assert!(depth > 0, "Cascade depth must allow at least one level");
        self.max_cascade_depth = depth;
        self
    }

    /// Set the auto-exec mode (builder pattern).
    #[must_use]
    pub fn with_auto_exec(mut self, mode: AutoExecMode) -> Self {
        self.auto_exec = mode;
        self
    }

    /// Iterate over the players of this game.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::all(self.player_count)
    }

    /// Whether `player` takes part in this game.
    #[must_use]
    pub fn has_player(&self, player: PlayerId) -> bool {
        player.index() < self.player_count
    }
}
