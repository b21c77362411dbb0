//! Player identification and acting parties.
//!
//! ## PlayerId
//!
//! Type-safe player identifier supporting 1-255 players. Each player is also a
//! concrete class in the type system, named `Player1`, `Player2`, ...
//!
//! ## Actor
//!
//! Whoever causes a change: a player or the engine itself.

use serde::{Deserialize, Serialize};

/// Class-name prefix shared by all player classes.
pub const PLAYER_CLASS_PREFIX: &str = "Player";

/// Player identifier supporting 1-255 players.
///
/// Player indices are 0-based: the first player is `PlayerId(0)`, whose
/// class name is `Player1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw player index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all player IDs for a game with `player_count` players.
    ///
    /// ```
    /// use rust_rules::core::PlayerId;
    ///
    /// let players: Vec<_> = PlayerId::all(4).collect();
    /// assert_eq!(players.len(), 4);
    /// assert_eq!(players[3], PlayerId::new(3));
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }

    /// The class name this player has in the type system.
    #[must_use]
    pub fn class_name(self) -> String {
        format!("{PLAYER_CLASS_PREFIX}{}", self.index() + 1)
    }

    /// Parse a player class name (`Player1` -> `PlayerId(0)`).
    #[must_use]
    pub fn from_class_name(name: &str) -> Option<Self> {
        let number: u16 = name.strip_prefix(PLAYER_CLASS_PREFIX)?.parse().ok()?;
        if (1..=255).contains(&number) {
            Some(Self((number - 1) as u8))
        } else {
            None
        }
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.class_name())
    }
}

/// The party responsible for a change or a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Actor {
    /// The engine (setup, global game structure).
    Engine,
    /// A player.
    Player(PlayerId),
}

impl Actor {
    /// The player behind this actor, if any.
    #[must_use]
    pub const fn player(self) -> Option<PlayerId> {
        match self {
            Actor::Engine => None,
            Actor::Player(p) => Some(p),
        }
    }
}

impl From<PlayerId> for Actor {
    fn from(player: PlayerId) -> Self {
        Actor::Player(player)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Engine => f.write_str("Engine"),
            Actor::Player(p) => write!(f, "{p}"),
        }
    }
}
