//! Narrowing: replacing an abstract instruction with a more specific one.
//!
//! `proposed` narrows `current` when every outcome `proposed` allows is also
//! allowed by `current`. Concrete instructions can't be narrowed except to
//! themselves.

use crate::core::{EngineError, Result};
use crate::types::{TypeExpr, TypeSystem};

use super::ast::{Change, Count, Instruction, Intensity};

/// Check that `proposed` is a valid narrowing of `current`.
///
/// ## Example
///
/// ```
/// use rust_rules::instruction::{check_narrows, Instruction};
/// use rust_rules::types::ClassTable;
///
/// let types = ClassTable::with_players(1);
/// let up_to_three = Instruction::gain(3, "Player1".parse().unwrap()).optional();
/// let two = Instruction::gain(2, "Player1".parse().unwrap());
///
/// assert!(check_narrows(&two, &up_to_three, &types).is_ok());
/// assert!(check_narrows(&up_to_three, &two, &types).is_err());
/// ```
pub fn check_narrows(proposed: &Instruction, current: &Instruction, types: &dyn TypeSystem) -> Result<()> {
    if proposed == current {
        return Ok(());
    }
    if !current.is_abstract(types) {
        return Err(invalid(proposed, current, "the current instruction is already concrete"));
    }

    match (proposed, current) {
        (Instruction::Or(options), Instruction::Or(branches)) => {
            for option in options {
                if !branches.iter().any(|b| check_narrows(option, b, types).is_ok()) {
                    return Err(invalid(option, current, "not a narrowing of any option"));
                }
            }
            Ok(())
        }
        (_, Instruction::Or(branches)) => {
            if branches.iter().any(|b| check_narrows(proposed, b, types).is_ok()) {
                Ok(())
            } else {
                Err(invalid(proposed, current, "not a narrowing of any option"))
            }
        }
        (Instruction::NoOp, Instruction::Change(change)) => {
            if change.intensity == Intensity::Optional {
                Ok(())
            } else {
                Err(invalid(proposed, current, "only an optional change can be skipped"))
            }
        }
        (Instruction::Change(p), Instruction::Change(c)) => check_change(p, c, types)
            .map_err(|why| invalid(proposed, current, &why)),
        (
            Instruction::Per { inner: p, metric: pm },
            Instruction::Per { inner: c, metric: cm },
        ) if pm == cm => check_narrows(p, c, types),
        (
            Instruction::Gated { requirement: pr, mandatory: pm, inner: p },
            Instruction::Gated { requirement: cr, mandatory: cm, inner: c },
        ) if pr == cr && pm == cm => check_narrows(p, c, types),
        (Instruction::Then(p), Instruction::Then(c)) | (Instruction::Multi(p), Instruction::Multi(c)) => {
            if p.len() != c.len() {
                return Err(invalid(proposed, current, "different number of parts"));
            }
            p.iter().zip(c).try_for_each(|(p, c)| check_narrows(p, c, types))
        }
        (
            Instruction::Custom { name: pn, args: pa },
            Instruction::Custom { name: cn, args: ca },
        ) if pn == cn && pa.len() == ca.len() => {
            if pa.iter().zip(ca).all(|(p, c)| types.is_subtype_of(p, c)) {
                Ok(())
            } else {
                Err(invalid(proposed, current, "arguments don't narrow"))
            }
        }
        _ => Err(invalid(proposed, current, "incompatible instructions")),
    }
}

fn check_change(proposed: &Change, current: &Change, types: &dyn TypeSystem) -> std::result::Result<(), String> {
    if proposed.kind() != current.kind() {
        return Err("change kinds differ".into());
    }
    check_side(proposed.gaining.as_ref(), current.gaining.as_ref(), types)?;
    check_side(proposed.removing.as_ref(), current.removing.as_ref(), types)?;

    match (proposed.count, current.count) {
        (Count::Fixed(n), Count::MultipleOf(x)) if n.checked_rem(x) == Some(0) => {}
        (Count::MultipleOf(y), Count::MultipleOf(x)) if y.checked_rem(x) == Some(0) => {}
        (Count::Fixed(n), Count::Fixed(m)) if n == m => {}
        (Count::Fixed(n), Count::Fixed(m)) if n < m && current.intensity == Intensity::Optional => {}
        (p, c) => return Err(format!("count {p} doesn't narrow {c}")),
    }

    if current.intensity != Intensity::Optional && proposed.intensity != current.intensity {
        return Err(format!(
            "intensity {} doesn't narrow {}",
            proposed.intensity.symbol(),
            current.intensity.symbol()
        ));
    }
    Ok(())
}

fn check_side(proposed: Option<&TypeExpr>, current: Option<&TypeExpr>, types: &dyn TypeSystem) -> std::result::Result<(), String> {
    match (proposed, current) {
        (Some(p), Some(c)) if !types.is_subtype_of(p, c) => Err(format!("{p} is not a {c}")),
        _ => Ok(()),
    }
}

fn invalid(proposed: &Instruction, current: &Instruction, why: &str) -> EngineError {
    EngineError::Narrowing(format!("{proposed} doesn't narrow {current}: {why}"))
}
