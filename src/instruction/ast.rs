//! The instruction tree.
//!
//! An `Instruction` says what should happen to the component store. It can be
//! concrete (exactly one possible outcome) or abstract (a choice remains).
//! Constructors normalize: zero counts become `NoOp`, nested `Or`/`Then`/`Multi`
//! are flattened, and single-element composites collapse to their element.
//!
//! ## Example
//!
//! ```
//! use rust_rules::instruction::{Instruction, Intensity};
//! use rust_rules::types::TypeExpr;
//!
//! let plant: TypeExpr = "Plant<Player1>".parse().unwrap();
//! let heat: TypeExpr = "Heat<Player1>".parse().unwrap();
//!
//! let convert = Instruction::transmute(8, heat, plant).with_intensity(Intensity::Optional);
//! assert_eq!(convert.to_string(), "8 Heat<Player1> FROM Plant<Player1>?");
//! assert_eq!(Instruction::or(vec![Instruction::NoOp]), Instruction::NoOp);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::types::{TypeExpr, TypeSystem};

use super::requirement::{Metric, Requirement};

/// How strictly a change's count must be met.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intensity {
    /// Exactly the full count, or fail.
    Mandatory,
    /// As many as possible up to the count.
    AsManyAsPossible,
    /// Up to the count, at the actor's choice, including none.
    Optional,
}

impl Intensity {
    /// Suffix used when displaying a change.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Intensity::Mandatory => "!",
            Intensity::AsManyAsPossible => ".",
            Intensity::Optional => "?",
        }
    }
}

/// How many units a change moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Count {
    /// Exactly this many.
    Fixed(u32),
    /// Any positive multiple of this, chosen later.
    MultipleOf(u32),
}

impl Count {
    /// The fixed amount, if there is one.
    #[must_use]
    pub const fn fixed(self) -> Option<u32> {
        match self {
            Count::Fixed(n) => Some(n),
            Count::MultipleOf(_) => None,
        }
    }

    /// Scale by `factor`.
    #[must_use]
    pub fn times(self, factor: u32) -> Self {
        match self {
            Count::Fixed(n) => Count::Fixed(n.saturating_mul(factor)),
            Count::MultipleOf(x) => Count::MultipleOf(x.saturating_mul(factor)),
        }
    }
}

impl std::fmt::Display for Count {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Count::Fixed(n) => write!(f, "{n}"),
            Count::MultipleOf(1) => f.write_str("X"),
            Count::MultipleOf(x) => write!(f, "{x}X"),
        }
    }
}

/// Which sides of a change are present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Gain,
    Remove,
    Transmute,
}

/// Gain, remove, or transmute `count` components.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Change {
    pub count: Count,
    pub gaining: Option<TypeExpr>,
    pub removing: Option<TypeExpr>,
    pub intensity: Intensity,
}

impl Change {
    /// Which sides are present.
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        match (&self.gaining, &self.removing) {
            (Some(_), None) => ChangeKind::Gain,
            (None, Some(_)) => ChangeKind::Remove,
            _ => ChangeKind::Transmute,
        }
    }

    /// Whether a choice remains in amount, intensity, or types.
    #[must_use]
    pub fn is_abstract(&self, types: &dyn TypeSystem) -> bool {
        self.intensity != Intensity::Mandatory
            || self.count.fixed().is_none()
            || self.gaining.iter().chain(&self.removing).any(|t| types.is_abstract(t))
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.removing.is_some() && self.gaining.is_none() {
            f.write_str("-")?;
        }
        if self.count != Count::Fixed(1) {
            write!(f, "{} ", self.count)?;
        }
        match (&self.gaining, &self.removing) {
            (Some(g), Some(r)) => write!(f, "{g} FROM {r}")?,
            (Some(g), None) => write!(f, "{g}")?,
            (None, Some(r)) => write!(f, "{r}")?,
            (None, None) => f.write_str("?")?,
        }
        f.write_str(self.intensity.symbol())
    }
}

/// A rules instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// Do nothing.
    NoOp,
    /// Gain, remove or transmute components.
    Change(Change),
    /// Repeat `inner` once per unit of `metric`.
    Per { inner: Box<Instruction>, metric: Metric },
    /// Run `inner` only if `requirement` holds. If it doesn't, a mandatory gate
    /// fails and an optional one does nothing.
    Gated {
        requirement: Requirement,
        mandatory: bool,
        inner: Box<Instruction>,
    },
    /// Exactly one of the branches, chosen later.
    Or(Vec<Instruction>),
    /// Each link in order.
    Then(Vec<Instruction>),
    /// Independent parts, in any order.
    Multi(Vec<Instruction>),
    /// Named game-specific function, translated at execution time.
    Custom { name: String, args: Vec<TypeExpr> },
}

impl Instruction {
    /// General change constructor. Zero fixed counts become `NoOp`.
    #[must_use]
    pub fn change(
        count: Count,
        gaining: Option<TypeExpr>,
        removing: Option<TypeExpr>,
        intensity: Intensity,
    ) -> Self {
        assert!(
            gaining.is_some() || removing.is_some(),
            "A change needs something to gain or remove"
        );
        assert!(gaining != removing, "Can't gain and remove the same type");
        if matches!(count, Count::Fixed(0) | Count::MultipleOf(0)) {
            return Instruction::NoOp;
        }
        Instruction::Change(Change {
            count,
            gaining,
            removing,
            intensity,
        })
    }

    /// Mandatorily gain `count` of `ty`.
    #[must_use]
    pub fn gain(count: u32, ty: TypeExpr) -> Self {
        Self::change(Count::Fixed(count), Some(ty), None, Intensity::Mandatory)
    }

    /// Mandatorily remove `count` of `ty`.
    #[must_use]
    pub fn remove(count: u32, ty: TypeExpr) -> Self {
        Self::change(Count::Fixed(count), None, Some(ty), Intensity::Mandatory)
    }

    /// Mandatorily turn `count` of `removing` into `gaining`.
    #[must_use]
    pub fn transmute(count: u32, gaining: TypeExpr, removing: TypeExpr) -> Self {
        Self::change(Count::Fixed(count), Some(gaining), Some(removing), Intensity::Mandatory)
    }

    /// Set the intensity of a change; other instructions are returned unchanged.
    #[must_use]
    pub fn with_intensity(self, intensity: Intensity) -> Self {
        match self {
            Instruction::Change(change) => Instruction::Change(Change { intensity, ..change }),
            other => other,
        }
    }

    /// Shorthand for `with_intensity(Intensity::Optional)`.
    #[must_use]
    pub fn optional(self) -> Self {
        self.with_intensity(Intensity::Optional)
    }

    /// Shorthand for `with_intensity(Intensity::AsManyAsPossible)`.
    #[must_use]
    pub fn amap(self) -> Self {
        self.with_intensity(Intensity::AsManyAsPossible)
    }

    /// `inner` once per unit of `metric`.
    #[must_use]
    pub fn per(inner: Instruction, metric: Metric) -> Self {
        Instruction::Per {
            inner: Box::new(inner),
            metric,
        }
    }

    /// `inner`, failing unless `requirement` holds.
    #[must_use]
    pub fn gated(requirement: Requirement, inner: Instruction) -> Self {
        Instruction::Gated {
            requirement,
            mandatory: true,
            inner: Box::new(inner),
        }
    }

    /// `inner` if `requirement` holds, otherwise nothing.
    #[must_use]
    pub fn gated_optional(requirement: Requirement, inner: Instruction) -> Self {
        Instruction::Gated {
            requirement,
            mandatory: false,
            inner: Box::new(inner),
        }
    }

    /// A choice between branches. Duplicates are dropped keeping first
    /// occurrence, and a single remaining branch stands alone.
    #[must_use]
    pub fn or(branches: impl IntoIterator<Item = Instruction>) -> Self {
        let mut flat: Vec<Instruction> = Vec::new();
        for branch in branches {
            let parts = match branch {
                Instruction::Or(inner) => inner,
                single => vec![single],
            };
            for part in parts {
                if !flat.contains(&part) {
                    flat.push(part);
                }
            }
        }
        assert!(!flat.is_empty(), "An Or needs at least one branch");
        if flat.len() == 1 {
            flat.swap_remove(0)
        } else {
            Instruction::Or(flat)
        }
    }

    /// A sequence. `NoOp` links are dropped.
    #[must_use]
    pub fn then(links: impl IntoIterator<Item = Instruction>) -> Self {
        Self::flatten(links, Instruction::Then, |i| match i {
            Instruction::Then(inner) => Ok(inner),
            other => Err(other),
        })
    }

    /// A set of independent parts. `NoOp` parts are dropped.
    #[must_use]
    pub fn multi(parts: impl IntoIterator<Item = Instruction>) -> Self {
        Self::flatten(parts, Instruction::Multi, |i| match i {
            Instruction::Multi(inner) => Ok(inner),
            other => Err(other),
        })
    }

    fn flatten(
        items: impl IntoIterator<Item = Instruction>,
        wrap: fn(Vec<Instruction>) -> Instruction,
        unwrap: fn(Instruction) -> Result<Vec<Instruction>, Instruction>,
    ) -> Self {
        let mut flat = Vec::new();
        for item in items {
            match unwrap(item) {
                Ok(inner) => flat.extend(inner),
                Err(Instruction::NoOp) => {}
                Err(single) => flat.push(single),
            }
        }
        match flat.len() {
            0 => Instruction::NoOp,
            1 => flat.swap_remove(0),
            _ => wrap(flat),
        }
    }

    /// A named game-specific instruction.
    #[must_use]
    pub fn custom(name: impl Into<String>, args: impl IntoIterator<Item = TypeExpr>) -> Self {
        Instruction::Custom {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// This instruction `factor` times over.
    #[must_use]
    pub fn times(&self, factor: u32) -> Self {
        if factor == 0 {
            return Instruction::NoOp;
        }
        if factor == 1 {
            return self.clone();
        }
        match self {
            Instruction::NoOp => Instruction::NoOp,
            Instruction::Change(change) => Instruction::Change(Change {
                count: change.count.times(factor),
                ..change.clone()
            }),
            Instruction::Per { inner, metric } => Instruction::Per {
                inner: Box::new(inner.times(factor)),
                metric: metric.clone(),
            },
            Instruction::Gated {
                requirement,
                mandatory,
                inner,
            } => Instruction::Gated {
                requirement: requirement.clone(),
                mandatory: *mandatory,
                inner: Box::new(inner.times(factor)),
            },
            Instruction::Or(branches) => Self::or(branches.iter().map(|b| b.times(factor))),
            Instruction::Then(links) => Self::then(links.iter().map(|l| l.times(factor))),
            Instruction::Multi(parts) => Self::multi(parts.iter().map(|p| p.times(factor))),
            Instruction::Custom { .. } => Self::multi(std::iter::repeat(self.clone()).take(factor as usize)),
        }
    }

    /// The independent units this instruction consists of.
    ///
    /// `Multi` yields its parts, `NoOp` yields nothing, anything else yields itself.
    #[must_use]
    pub fn split(self) -> Vec<Instruction> {
        match self {
            Instruction::Multi(parts) => parts,
            Instruction::NoOp => Vec::new(),
            single => vec![single],
        }
    }

    /// Whether a parallel set must be split off before this can be prepared.
    #[must_use]
    pub fn has_parallel_head(&self) -> bool {
        match self {
            Instruction::Multi(_) => true,
            Instruction::Then(links) => links.first().is_some_and(Instruction::has_parallel_head),
            _ => false,
        }
    }

    /// Whether a choice remains anywhere in this instruction.
    #[must_use]
    pub fn is_abstract(&self, types: &dyn TypeSystem) -> bool {
        match self {
            Instruction::NoOp => false,
            Instruction::Change(change) => change.is_abstract(types),
            Instruction::Per { inner, .. } | Instruction::Gated { inner, .. } => inner.is_abstract(types),
            Instruction::Or(_) => true,
            Instruction::Then(items) | Instruction::Multi(items) => items.iter().any(|i| i.is_abstract(types)),
            Instruction::Custom { args, .. } => args.iter().any(|a| types.is_abstract(a)),
        }
    }

    /// Apply `f` to every type mentioned, including requirements and metrics.
    #[must_use]
    pub fn map_types(&self, f: &impl Fn(&TypeExpr) -> TypeExpr) -> Self {
        match self {
            Instruction::NoOp => Instruction::NoOp,
            Instruction::Change(change) => Instruction::Change(Change {
                count: change.count,
                gaining: change.gaining.as_ref().map(f),
                removing: change.removing.as_ref().map(f),
                intensity: change.intensity,
            }),
            Instruction::Per { inner, metric } => Instruction::Per {
                inner: Box::new(inner.map_types(f)),
                metric: metric.map_types(f),
            },
            Instruction::Gated {
                requirement,
                mandatory,
                inner,
            } => Instruction::Gated {
                requirement: requirement.map_types(f),
                mandatory: *mandatory,
                inner: Box::new(inner.map_types(f)),
            },
            Instruction::Or(items) => Instruction::Or(items.iter().map(|i| i.map_types(f)).collect()),
            Instruction::Then(items) => Instruction::Then(items.iter().map(|i| i.map_types(f)).collect()),
            Instruction::Multi(items) => Instruction::Multi(items.iter().map(|i| i.map_types(f)).collect()),
            Instruction::Custom { name, args } => Instruction::Custom {
                name: name.clone(),
                args: args.iter().map(f).collect(),
            },
        }
    }

    /// Bind the `This` placeholder.
    #[must_use]
    pub fn replace_this(&self, this: &TypeExpr) -> Self {
        self.map_types(&|t| t.replace_this(this))
    }

    /// Bind the `Owner` placeholder.
    #[must_use]
    pub fn replace_owner(&self, owner: PlayerId) -> Self {
        self.map_types(&|t| t.replace_owner(owner))
    }

    fn precedence(&self) -> u8 {
        match self {
            Instruction::NoOp | Instruction::Change(_) | Instruction::Custom { .. } => 10,
            Instruction::Per { .. } => 8,
            Instruction::Gated { .. } => 6,
            Instruction::Or(_) => 4,
            Instruction::Then(_) => 2,
            Instruction::Multi(_) => 0,
        }
    }

    fn fmt_child(&self, child: &Instruction, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if child.precedence() <= self.precedence() {
            write!(f, "({child})")
        } else {
            write!(f, "{child}")
        }
    }

    fn fmt_joined(&self, items: &[Instruction], sep: &str, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            self.fmt_child(item, f)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::NoOp => f.write_str("Ok"),
            Instruction::Change(change) => write!(f, "{change}"),
            Instruction::Per { inner, metric } => {
                self.fmt_child(inner, f)?;
                write!(f, " / {metric}")
            }
            Instruction::Gated {
                requirement,
                mandatory,
                inner,
            } => {
                write!(f, "{requirement}{} ", if *mandatory { ":" } else { " ?:" })?;
                self.fmt_child(inner, f)
            }
            Instruction::Or(items) => self.fmt_joined(items, " OR ", f),
            Instruction::Then(items) => self.fmt_joined(items, " THEN ", f),
            Instruction::Multi(items) => self.fmt_joined(items, ", ", f),
            Instruction::Custom { name, args } => {
                write!(f, "@{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(s: &str) -> TypeExpr {
        s.parse().unwrap()
    }

    fn plant() -> Instruction {
        Instruction::gain(1, ty("Plant"))
    }

    fn heat() -> Instruction {
        Instruction::gain(1, ty("Heat"))
    }

    #[test]
    fn test_zero_count_is_noop() {
        assert_eq!(Instruction::gain(0, ty("Plant")), Instruction::NoOp);
        assert_eq!(plant().times(0), Instruction::NoOp);
    }

    #[test]
    fn test_change_kinds() {
        let Instruction::Change(t) = Instruction::transmute(2, ty("Heat"), ty("Plant")) else {
            panic!("expected a change");
        };
        assert_eq!(t.kind(), ChangeKind::Transmute);
        let Instruction::Change(r) = Instruction::remove(1, ty("Plant")) else {
            panic!("expected a change");
        };
        assert_eq!(r.kind(), ChangeKind::Remove);
    }

    #[test]
    fn test_change_display() {
        assert_eq!(plant().to_string(), "Plant!");
        assert_eq!(Instruction::remove(3, ty("Plant")).amap().to_string(), "-3 Plant.");
        assert_eq!(
            Instruction::change(Count::MultipleOf(1), Some(ty("Heat")), None, Intensity::Mandatory).to_string(),
            "X Heat!"
        );
        assert_eq!(
            Instruction::change(Count::MultipleOf(3), None, Some(ty("Heat")), Intensity::Optional).to_string(),
            "-3X Heat?"
        );
    }

    #[test]
    fn test_composite_display_uses_parens() {
        let instr = Instruction::then([
            Instruction::or([plant(), heat()]),
            Instruction::multi([plant(), heat()]),
        ]);
        assert_eq!(instr.to_string(), "Plant! OR Heat! THEN (Plant!, Heat!)");

        let gated = Instruction::gated(Requirement::min(2, ty("Heat")), Instruction::or([plant(), heat()]));
        assert_eq!(gated.to_string(), "2 Heat: (Plant! OR Heat!)");
    }

    #[test]
    fn test_or_normalizes() {
        assert_eq!(Instruction::or([plant(), plant()]), plant());
        assert_eq!(
            Instruction::or([heat(), Instruction::or([plant(), heat()])]),
            Instruction::Or(vec![heat(), plant()])
        );
    }

    #[test]
    #[should_panic(expected = "at least one branch")]
    fn test_empty_or_panics() {
        let _ = Instruction::or(Vec::new());
    }

    #[test]
    fn test_then_and_multi_flatten() {
        let chain = Instruction::then([plant(), Instruction::NoOp, Instruction::then([heat(), plant()])]);
        assert_eq!(chain, Instruction::Then(vec![plant(), heat(), plant()]));
        assert_eq!(Instruction::then([Instruction::NoOp]), Instruction::NoOp);
        assert_eq!(Instruction::multi([Instruction::NoOp, heat()]), heat());
    }

    #[test]
    fn test_times_scales_counts() {
        let per = Instruction::per(plant(), Metric::count(ty("Tag")));
        assert_eq!(per.times(3).to_string(), "3 Plant! / Tag");

        let custom = Instruction::custom("draw", [ty("Player1")]);
        assert_eq!(custom.times(2), Instruction::Multi(vec![custom.clone(), custom]));
    }

    #[test]
    fn test_split() {
        assert!(Instruction::NoOp.split().is_empty());
        assert_eq!(Instruction::multi([plant(), heat()]).split(), vec![plant(), heat()]);
        assert_eq!(plant().split(), vec![plant()]);
    }

    #[test]
    fn test_parallel_head() {
        assert!(Instruction::multi([plant(), heat()]).has_parallel_head());
        assert!(Instruction::then([Instruction::multi([plant(), heat()]), plant()]).has_parallel_head());
        assert!(!Instruction::then([plant(), Instruction::multi([plant(), heat()])]).has_parallel_head());
    }

    #[test]
    fn test_replace_owner() {
        let instr = Instruction::gain(2, ty("Plant<Owner>")).optional();
        assert_eq!(instr.replace_owner(PlayerId(0)).to_string(), "2 Plant<Player1>?");
    }
}
