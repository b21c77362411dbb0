//! Preparation: resolving an instruction against the current state.
//!
//! Preparing never changes anything. It clamps counts to what the limits
//! allow, applies metrics, evaluates gates, drops impossible `Or` branches
//! and auto-narrows types with a single possible component. Preparing a
//! prepared instruction gives the same instruction back.

use crate::core::{EngineError, Result};
use crate::instruction::{Change, ChangeKind, Count, Instruction, Intensity};
use crate::store::{Limiter, Reader};
use crate::types::TypeExpr;

/// Outcome of preparing an instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prepared {
    /// Nothing to do.
    NoOp,
    /// Exactly one possible outcome.
    Concrete(Instruction),
    /// A choice remains.
    Abstract(Instruction),
}

impl Prepared {
    /// The prepared instruction.
    #[must_use]
    pub fn into_instruction(self) -> Instruction {
        match self {
            Prepared::NoOp => Instruction::NoOp,
            Prepared::Concrete(i) | Prepared::Abstract(i) => i,
        }
    }
}

/// Prepares instructions against a read-only view of the state.
#[derive(Clone, Copy, Debug)]
pub struct Preparer<'a> {
    reader: Reader<'a>,
}

impl<'a> Preparer<'a> {
    /// Create a preparer over the current state.
    #[must_use]
    pub fn new(reader: Reader<'a>) -> Self {
        Self { reader }
    }

    /// Prepare and classify.
    pub fn prepare(&self, instruction: &Instruction) -> Result<Prepared> {
        let prepared = self.prepare_instruction(instruction)?;
        Ok(if prepared == Instruction::NoOp {
            Prepared::NoOp
        } else if prepared.is_abstract(self.reader.types()) {
            Prepared::Abstract(prepared)
        } else {
            Prepared::Concrete(prepared)
        })
    }

    /// Prepare without classifying.
    ///
    /// Panics on a `Multi`: parallel instructions are split into tasks first.
    pub fn prepare_instruction(&self, instruction: &Instruction) -> Result<Instruction> {
        match instruction {
            Instruction::NoOp => Ok(Instruction::NoOp),
            Instruction::Change(change) => self.prepare_change(change),
            Instruction::Per { inner, metric } => {
                let scaled = inner.times(self.reader.evaluate(metric));
                match scaled {
                    Instruction::Multi(_) => Ok(scaled),
                    _ => self.prepare_instruction(&scaled),
                }
            }
            Instruction::Gated {
                requirement,
                mandatory,
                inner,
            } => {
                if self.reader.has(requirement) {
                    self.prepare_instruction(inner)
                } else if *mandatory {
                    Err(EngineError::Requirement(format!("{requirement}")))
                } else {
                    Ok(Instruction::NoOp)
                }
            }
            Instruction::Or(branches) => self.prepare_or(branches),
            Instruction::Then(links) => {
                let Some((head, rest)) = links.split_first() else {
                    return Ok(Instruction::NoOp);
                };
                let head = self.prepare_instruction(head)?;
                Ok(Instruction::then(std::iter::once(head).chain(rest.iter().cloned())))
            }
            Instruction::Multi(_) => panic!("Parallel instructions must be split before preparing: {instruction}"),
            Instruction::Custom { .. } => Ok(instruction.clone()),
        }
    }

    fn prepare_or(&self, branches: &[Instruction]) -> Result<Instruction> {
        let mut survivors = Vec::new();
        let mut first_failure = None;

        for branch in branches {
            if matches!(branch, Instruction::Multi(_)) {
                survivors.push(branch.clone());
                continue;
            }
            match self.prepare_instruction(branch) {
                Ok(prepared) => survivors.push(prepared),
                Err(e) if e.is_not_now() => {
                    first_failure.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }

        if survivors.is_empty() {
            return Err(first_failure
                .unwrap_or_else(|| EngineError::Limits("no branches".into()))
                .context("no option is possible"));
        }
        Ok(Instruction::or(survivors))
    }

    fn prepare_change(&self, change: &Change) -> Result<Instruction> {
        let Count::Fixed(count) = change.count else {
            return Ok(Instruction::Change(change.clone()));
        };

        let types = self.reader.types();
        let narrowed = Change {
            gaining: change.gaining.as_ref().map(|g| self.narrow_gaining(g)),
            removing: change.removing.as_ref().map(|r| self.narrow_removing(r)),
            ..change.clone()
        };
        if narrowed.gaining.iter().chain(&narrowed.removing).any(|t| types.is_abstract(t)) {
            return Ok(Instruction::Change(narrowed));
        }
        if narrowed.gaining.is_some() && narrowed.gaining == narrowed.removing {
            return Err(EngineError::Type(format!("{narrowed} gains and removes the same type")));
        }

        let gaining = narrowed.gaining.as_ref().map(|g| self.reader.component(g)).transpose()?;
        let removing = narrowed.removing.as_ref().map(|r| self.reader.component(r)).transpose()?;
        let limit = Limiter::new(self.reader).find_limit(gaining.as_ref(), removing.as_ref())?;
        let adjusted = count.min(limit);

        if change.intensity == Intensity::Mandatory && adjusted != count {
            return Err(EngineError::Limits(format!(
                "can't {}: max possible is {limit}",
                describe(&narrowed, count)
            )));
        }
        if adjusted == 0 {
            return Ok(Instruction::NoOp);
        }
        let intensity = match change.intensity {
            Intensity::AsManyAsPossible => Intensity::Mandatory,
            other => other,
        };
        Ok(Instruction::Change(Change {
            count: Count::Fixed(adjusted),
            intensity,
            ..narrowed
        }))
    }

    fn narrow_gaining(&self, ty: &TypeExpr) -> TypeExpr {
        self.reader
            .types()
            .single_concrete_subtype(ty)
            .unwrap_or_else(|| ty.clone())
    }

    fn narrow_removing(&self, ty: &TypeExpr) -> TypeExpr {
        if !self.reader.types().is_abstract(ty) {
            return ty.clone();
        }
        match self.reader.store().components_of(ty, self.reader.types()).as_slice() {
            [(only, _)] => only.expr().clone(),
            _ => ty.clone(),
        }
    }
}

fn describe(change: &Change, count: u32) -> String {
    let side = |t: &Option<TypeExpr>| t.as_ref().map(ToString::to_string).unwrap_or_default();
    match change.kind() {
        ChangeKind::Gain => format!("gain {count} {}", side(&change.gaining)),
        ChangeKind::Remove => format!("remove {count} {}", side(&change.removing)),
        ChangeKind::Transmute => format!(
            "transmute {count} {} into {}",
            side(&change.removing),
            side(&change.gaining)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{Metric, Requirement};
    use crate::store::{Component, ComponentStore};
    use crate::types::{ClassDefinition, ClassTable};

    fn ty(s: &str) -> TypeExpr {
        s.parse().unwrap()
    }

    fn table() -> ClassTable {
        let mut table = ClassTable::with_players(2);
        table.register(ClassDefinition::new("Resource").abstract_class().with_owner());
        table.register(ClassDefinition::new("Plant").with_supertype("Resource").with_owner());
        table.register(ClassDefinition::new("Heat").with_supertype("Resource").with_owner());
        table.register(ClassDefinition::new("Step").abstract_class());
        table.register(ClassDefinition::new("OxygenStep").with_supertype("Step").with_max(14));
        table.register(ClassDefinition::new("Tag").with_owner());
        table
    }

    fn hold(store: &mut ComponentStore, n: u32, s: &str) {
        store.apply(n, Some(&Component::trusted(ty(s))), None).unwrap();
    }

    fn prepare(store: &ComponentStore, types: &ClassTable, instruction: &Instruction) -> Result<Instruction> {
        Preparer::new(Reader::new(store, types)).prepare_instruction(instruction)
    }

    #[test]
    fn test_amap_clamps_and_becomes_mandatory() {
        let types = table();
        let mut store = ComponentStore::new();
        hold(&mut store, 13, "OxygenStep");

        let prepared = prepare(&store, &types, &Instruction::gain(5, ty("OxygenStep")).amap()).unwrap();
        assert_eq!(prepared, Instruction::gain(1, ty("OxygenStep")));
    }

    #[test]
    fn test_mandatory_over_limit_fails() {
        let types = table();
        let mut store = ComponentStore::new();
        hold(&mut store, 13, "OxygenStep");

        let err = prepare(&store, &types, &Instruction::gain(5, ty("OxygenStep"))).unwrap_err();
        assert_eq!(err, EngineError::Limits("can't gain 5 OxygenStep: max possible is 1".into()));
    }

    #[test]
    fn test_remove_amap_clamps_to_holdings() {
        let types = table();
        let mut store = ComponentStore::new();
        hold(&mut store, 1, "Plant<Player1>");

        let prepared = prepare(&store, &types, &Instruction::remove(9, ty("Plant<Player1>")).amap()).unwrap();
        assert_eq!(prepared.to_string(), "-Plant<Player1>!");

        let empty = ComponentStore::new();
        let prepared = prepare(&empty, &types, &Instruction::remove(9, ty("Plant<Player1>")).amap()).unwrap();
        assert_eq!(prepared, Instruction::NoOp);
    }

    #[test]
    fn test_optional_keeps_intensity() {
        let types = table();
        let mut store = ComponentStore::new();
        hold(&mut store, 1, "Plant<Player1>");

        let convert = Instruction::transmute(9, ty("Heat<Player1>"), ty("Plant<Player1>")).optional();
        let prepared = prepare(&store, &types, &convert).unwrap();
        assert_eq!(prepared.to_string(), "Heat<Player1> FROM Plant<Player1>?");
    }

    #[test]
    fn test_auto_narrowing() {
        let types = table();
        let mut store = ComponentStore::new();
        hold(&mut store, 2, "Plant<Player1>");

        let prepared = prepare(&store, &types, &Instruction::gain(1, ty("Step"))).unwrap();
        assert_eq!(prepared, Instruction::gain(1, ty("OxygenStep")));

        let prepared = prepare(&store, &types, &Instruction::remove(1, ty("Resource<Player1>"))).unwrap();
        assert_eq!(prepared, Instruction::remove(1, ty("Plant<Player1>")));

        hold(&mut store, 1, "Heat<Player1>");
        let still_abstract = Instruction::remove(1, ty("Resource<Player1>"));
        assert_eq!(prepare(&store, &types, &still_abstract).unwrap(), still_abstract);
    }

    #[test]
    fn test_per_multiplies_by_metric() {
        let types = table();
        let mut store = ComponentStore::new();
        hold(&mut store, 5, "Tag<Player1>");

        let per = Instruction::per(Instruction::gain(1, ty("Plant<Player1>")), Metric::per(2, ty("Tag")));
        assert_eq!(prepare(&store, &types, &per).unwrap(), Instruction::gain(2, ty("Plant<Player1>")));

        let none = Instruction::per(Instruction::gain(1, ty("Plant<Player1>")), Metric::count(ty("Heat")));
        assert_eq!(prepare(&store, &types, &none).unwrap(), Instruction::NoOp);
    }

    #[test]
    fn test_gates() {
        let types = table();
        let store = ComponentStore::new();
        let req = Requirement::min(1, ty("Tag"));
        let inner = Instruction::gain(1, ty("Plant<Player1>"));

        let err = prepare(&store, &types, &Instruction::gated(req.clone(), inner.clone())).unwrap_err();
        assert!(matches!(err, EngineError::Requirement(_)));
        assert_eq!(
            prepare(&store, &types, &Instruction::gated_optional(req, inner)).unwrap(),
            Instruction::NoOp
        );
    }

    #[test]
    fn test_or_drops_impossible_branches() {
        let types = table();
        let mut store = ComponentStore::new();
        hold(&mut store, 14, "OxygenStep");

        let choice = Instruction::or([
            Instruction::gain(1, ty("OxygenStep")),
            Instruction::gain(1, ty("Heat<Player1>")),
        ]);
        assert_eq!(prepare(&store, &types, &choice).unwrap(), Instruction::gain(1, ty("Heat<Player1>")));

        let hopeless = Instruction::or([
            Instruction::gain(1, ty("OxygenStep")),
            Instruction::remove(1, ty("Heat<Player1>")),
        ]);
        assert!(matches!(prepare(&store, &types, &hopeless), Err(EngineError::Limits(_))));
    }

    #[test]
    fn test_then_prepares_only_head() {
        let types = table();
        let store = ComponentStore::new();
        let chain = Instruction::then([
            Instruction::remove(3, ty("Heat<Player1>")).amap(),
            Instruction::remove(1, ty("Plant<Player1>")),
        ]);
        assert_eq!(
            prepare(&store, &types, &chain).unwrap(),
            Instruction::remove(1, ty("Plant<Player1>"))
        );
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let types = table();
        let mut store = ComponentStore::new();
        hold(&mut store, 3, "Plant<Player1>");
        hold(&mut store, 12, "OxygenStep");

        let samples = [
            Instruction::gain(5, ty("OxygenStep")).amap(),
            Instruction::remove(9, ty("Plant<Player1>")).optional(),
            Instruction::or([Instruction::remove(2, ty("Plant<Player1>")), Instruction::gain(1, ty("Step"))]),
        ];
        for sample in &samples {
            let once = prepare(&store, &types, sample).unwrap();
            let twice = prepare(&store, &types, &once).unwrap();
            assert_eq!(once, twice, "preparing {sample} twice");
        }
    }

    #[test]
    fn test_classification() {
        let types = table();
        let store = ComponentStore::new();
        let preparer = Preparer::new(Reader::new(&store, &types));

        assert_eq!(preparer.prepare(&Instruction::NoOp).unwrap(), Prepared::NoOp);
        assert!(matches!(
            preparer.prepare(&Instruction::gain(1, ty("Plant<Player1>"))).unwrap(),
            Prepared::Concrete(_)
        ));
        assert!(matches!(
            preparer.prepare(&Instruction::gain(1, ty("Resource<Player1>"))).unwrap(),
            Prepared::Abstract(_)
        ));
    }

    #[test]
    #[should_panic(expected = "must be split")]
    fn test_multi_panics() {
        let types = table();
        let store = ComponentStore::new();
        let _ = prepare(
            &store,
            &types,
            &Instruction::multi([Instruction::gain(1, ty("Tag<Player1>")), Instruction::gain(1, ty("Heat<Player1>"))]),
        );
    }
}
