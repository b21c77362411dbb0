//! Sample game shared by the integration tests.
//!
//! A small terraforming-flavoured class table: owned resources, a capped
//! global parameter, tiles with automatic effects, a card reacting to its
//! owner's plants, and a road network whose pieces depend on each other.

#![allow(dead_code)]

use rust_rules::core::{AccessTier, Actor, GameConfig, PlayerId};
use rust_rules::engine::Game;
use rust_rules::instruction::Instruction;
use rust_rules::triggers::{Effect, Trigger};
use rust_rules::types::{ClassDefinition, ClassTable, TypeExpr};

pub const P1: Actor = Actor::Player(PlayerId(0));
pub const P2: Actor = Actor::Player(PlayerId(1));

pub fn ty(s: &str) -> TypeExpr {
    s.parse().unwrap()
}

pub fn sample_types() -> ClassTable {
    let mut types = ClassTable::with_players(2);

    types.register(ClassDefinition::new("Resource").abstract_class().with_owner());
    for name in ["Plant", "Heat", "Steel", "Energy"] {
        types.register(ClassDefinition::new(name).with_supertype("Resource").with_owner());
    }

    types.register(ClassDefinition::new("OxygenStep").with_max(14));
    types.register(ClassDefinition::new("TerraformRating").with_owner());

    // Placing greenery raises oxygen and rating on the spot.
    types.register(
        ClassDefinition::new("Greenery").with_owner().with_effect(
            Effect::new(
                Trigger::WhenGain,
                Instruction::multi([
                    Instruction::gain(1, ty("OxygenStep")),
                    Instruction::gain(1, ty("TerraformRating<Owner>")),
                ]),
            )
            .automatic(),
        ),
    );

    // Each plant its owner gains earns a heat, as a separate task.
    types.register(ClassDefinition::new("Greenhouse").with_owner().with_effect(Effect::new(
        Trigger::OnGainOf(ty("Plant<Owner>")),
        Instruction::gain(1, ty("Heat<Owner>")),
    )));

    types.register(ClassDefinition::new("City").with_owner());
    types.register(ClassDefinition::new("Road").with_owner().with_dependency("City"));

    // Feeds itself forever.
    types.register(
        ClassDefinition::new("Echo").with_owner().with_effect(
            Effect::new(Trigger::WhenGain, Instruction::gain(1, ty("Echo<Owner>"))).automatic(),
        ),
    );

    types
}

pub fn sample_game() -> Game {
    Game::new(GameConfig::new(2), sample_types())
}

/// Set up holdings directly, bypassing tasks and triggers.
pub fn give(game: &mut Game, count: u32, of: &str) {
    game.session(Actor::Engine, AccessTier::Admin)
        .commit_direct(Instruction::gain(count, ty(of)))
        .unwrap();
}

/// Install a test subscriber so `RUST_LOG=debug` shows engine logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
