//! Narrowing integration tests.
//!
//! These verify `narrow_task` accepts exactly the revisions that reify the
//! current instruction, and how narrowed tasks are split and chained.

mod common;

use common::{sample_game, ty, P1};
use proptest::prelude::*;
use rust_rules::core::{AccessTier, EngineError};
use rust_rules::instruction::Instruction;
use rust_rules::tasks::TaskId;

// ============================================================================
// Idempotence and the reification law
// ============================================================================

/// Test that narrowing a task to its own instruction does nothing.
#[test]
fn test_narrowing_to_same_is_noop() {
    let mut game = sample_game();
    let mut session = game.session(P1, AccessTier::Operator);
    let current = Instruction::gain(2, ty("Resource<Player1>"));
    let id = session.add_task(current.clone()).unwrap().new_tasks[0];

    let tasks_before = session.tasks().clone();
    let events_before = session.events().len();

    let result = session.narrow_task(id, current).unwrap();
    assert!(result.is_empty());
    assert_eq!(session.tasks(), &tasks_before);
    assert_eq!(session.events().len(), events_before);
}

/// Test narrowing an abstract type to a subtype.
#[test]
fn test_narrow_type_to_subtype() {
    let mut game = sample_game();
    let mut session = game.session(P1, AccessTier::Operator);
    let id = session
        .add_task(Instruction::gain(2, ty("Resource<Player1>")))
        .unwrap()
        .new_tasks[0];

    session.narrow_task(id, Instruction::gain(2, ty("Plant<Player1>"))).unwrap();
    assert_eq!(
        session.tasks().require(id).unwrap().instruction,
        Instruction::gain(2, ty("Plant<Player1>"))
    );
}

/// Test that revisions outside the current instruction are rejected without trace.
#[test]
fn test_invalid_narrowings_rejected() {
    let mut game = sample_game();
    let mut session = game.session(P1, AccessTier::Operator);
    let id = session
        .add_task(Instruction::gain(2, ty("Resource<Player1>")))
        .unwrap()
        .new_tasks[0];
    let tasks_before = session.tasks().clone();
    let events_before = session.events().len();

    let invalid = [
        Instruction::gain(3, ty("Plant<Player1>")),
        Instruction::gain(2, ty("Plant<Player2>")),
        Instruction::remove(2, ty("Plant<Player1>")),
        Instruction::gain(2, ty("Plant<Player1>")).optional(),
        Instruction::NoOp,
    ];
    for proposed in invalid {
        let err = session.narrow_task(id, proposed.clone()).unwrap_err();
        assert!(matches!(err, EngineError::Narrowing(_)), "{proposed} should be rejected, got {err}");
        assert_eq!(session.tasks(), &tasks_before);
        assert_eq!(session.events().len(), events_before);
    }
}

/// Test that a concrete task can't be narrowed.
#[test]
fn test_concrete_task_cannot_change() {
    let mut game = sample_game();
    let mut session = game.session(P1, AccessTier::Operator);
    let id = session.add_task(Instruction::gain(1, ty("Plant<Player1>"))).unwrap().new_tasks[0];

    let err = session.narrow_task(id, Instruction::gain(1, ty("Heat<Player1>"))).unwrap_err();
    assert!(matches!(err, EngineError::Narrowing(_)));
}

/// Test narrowing an optional change to a smaller amount.
#[test]
fn test_optional_allows_lower_count() {
    let mut game = sample_game();
    common::give(&mut game, 5, "Plant<Player1>");
    let mut session = game.session(P1, AccessTier::Operator);
    let id = session
        .add_task(Instruction::remove(3, ty("Plant<Player1>")).optional())
        .unwrap()
        .new_tasks[0];

    session.narrow_task(id, Instruction::remove(1, ty("Plant<Player1>"))).unwrap();
    session.execute_task(id).unwrap();
    assert_eq!(session.count(&ty("Plant<Player1>")), 4);
}

fn optional_count_task(max: u32) -> (rust_rules::engine::Game, TaskId) {
    let mut game = sample_game();
    let id = game
        .session(P1, AccessTier::Operator)
        .add_task(Instruction::gain(max, ty("Heat<Player1>")).optional())
        .unwrap()
        .new_tasks[0];
    (game, id)
}

proptest! {
    /// An optional gain of `max` accepts any mandatory count up to `max`, and nothing above.
    #[test]
    fn prop_optional_count_narrowing(max in 1u32..20, proposed in 1u32..40) {
        let (mut game, id) = optional_count_task(max);
        let mut session = game.session(P1, AccessTier::Operator);
        let events_before = session.events().len();

        let result = session.narrow_task(id, Instruction::gain(proposed, ty("Heat<Player1>")));
        if proposed <= max {
            prop_assert!(result.is_ok());
            prop_assert_eq!(
                &session.tasks().require(id).unwrap().instruction,
                &Instruction::gain(proposed, ty("Heat<Player1>"))
            );
        } else {
            prop_assert!(matches!(result, Err(EngineError::Narrowing(_))));
            prop_assert_eq!(session.events().len(), events_before);
        }
    }
}

// ============================================================================
// THEN chains and splitting
// ============================================================================

/// Test that skipping the links of a THEN chain walks it one link at a time.
#[test]
fn test_then_chain_slicing() {
    let mut game = sample_game();
    let mut session = game.session(P1, AccessTier::Operator);

    let links = [
        Instruction::gain(1, ty("Plant<Player1>")).optional(),
        Instruction::gain(1, ty("Heat<Player1>")).optional(),
        Instruction::gain(1, ty("Steel<Player1>")).optional(),
        Instruction::gain(1, ty("Energy<Player1>")),
    ];
    session.add_task(Instruction::then(links.clone())).unwrap();

    for step in 0..links.len() {
        assert_eq!(session.tasks().len(), 1, "step {step}");
        let task = session.tasks().iter().next().unwrap().clone();
        assert_eq!(task.instruction, links[step]);
        let tail = &links[step + 1..];
        let expected_then = match tail.len() {
            0 => None,
            _ => Some(Instruction::then(tail.iter().cloned())),
        };
        assert_eq!(task.then, expected_then);

        if step + 1 < links.len() {
            session.narrow_task(task.id, Instruction::NoOp).unwrap();
        }
    }
    assert_eq!(session.count(&ty("Resource")), 0);
}

/// Test that choosing a parallel branch of an Or splits the task.
#[test]
fn test_or_narrowed_to_multi_splits() {
    let mut game = sample_game();
    let mut session = game.session(P1, AccessTier::Operator);

    let both = Instruction::multi([
        Instruction::gain(1, ty("Plant<Player1>")),
        Instruction::gain(1, ty("Heat<Player1>")),
    ]);
    let id = session
        .add_task(Instruction::or([both.clone(), Instruction::gain(2, ty("Steel<Player1>"))]))
        .unwrap()
        .new_tasks[0];

    let result = session.narrow_task(id, both).unwrap();
    assert_eq!(result.new_tasks.len(), 2);
    assert!(!session.tasks().contains(id));

    let instructions: Vec<String> = session.tasks().iter().map(|t| t.instruction.to_string()).collect();
    assert_eq!(instructions, ["Plant<Player1>!", "Heat<Player1>!"]);
}

/// Test that a player can't narrow someone else's task.
#[test]
fn test_narrowing_others_task_denied() {
    let mut game = sample_game();
    let id = game
        .session(common::P2, AccessTier::Operator)
        .add_task(Instruction::gain(1, ty("Resource<Player2>")))
        .unwrap()
        .new_tasks[0];

    let err = game
        .session(P1, AccessTier::Player)
        .narrow_task(id, Instruction::gain(1, ty("Plant<Player2>")))
        .unwrap_err();
    assert!(matches!(err, EngineError::Access(_)));
}
