//! The type-system seam.
//!
//! The engine core never decides what a class means. Everything it needs to
//! know about types (subtyping, abstractness, count bounds, dependencies,
//! ownership, declared effects) comes through the [`TypeSystem`] trait.
//! [`ClassTable`](super::ClassTable) is the in-crate implementation.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{PlayerId, Result};
use crate::triggers::Effect;

use super::TypeExpr;

/// A count bound: the number of components of `ty` must stay in `min..=max`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountLimit {
    /// The type whose total count is bounded.
    pub ty: TypeExpr,
    pub min: u32,
    pub max: u32,
}

impl CountLimit {
    /// Bound with only a maximum.
    #[must_use]
    pub fn max(ty: TypeExpr, max: u32) -> Self {
        Self { ty, min: 0, max }
    }

    /// Bound with only a minimum.
    #[must_use]
    pub fn min(ty: TypeExpr, min: u32) -> Self {
        Self { ty, min, max: u32::MAX }
    }

    /// Whether `count` satisfies this bound.
    #[must_use]
    pub fn allows(&self, count: u32) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl std::fmt::Display for CountLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.min, self.max) {
            (min, max) if min == max => write!(f, "={min} {}", self.ty),
            (0, max) => write!(f, "MAX {max} {}", self.ty),
            (min, u32::MAX) => write!(f, "{min} {}", self.ty),
            (min, max) => write!(f, "{min}..{max} {}", self.ty),
        }
    }
}

/// Everything the engine asks about types.
///
/// Implementations must be deterministic: the same question always gets the
/// same answer for the lifetime of a game.
pub trait TypeSystem {
    /// Fill in default arguments and validate `expr` against class declarations.
    fn resolve(&self, expr: &TypeExpr) -> Result<TypeExpr>;

    /// Whether every instance of `sub` is also an instance of `sup`.
    fn is_subtype_of(&self, sub: &TypeExpr, sup: &TypeExpr) -> bool;

    /// Whether `ty` cannot exist as a component as written.
    fn is_abstract(&self, ty: &TypeExpr) -> bool;

    /// The only concrete type narrowing `ty`, if there is exactly one.
    fn single_concrete_subtype(&self, ty: &TypeExpr) -> Option<TypeExpr>;

    /// Count bounds that apply to the concrete type `ty`.
    fn limits_for(&self, ty: &TypeExpr) -> Vec<CountLimit>;

    /// Components that must exist for `ty` to be gained.
    fn dependencies_of(&self, ty: &TypeExpr) -> SmallVec<[TypeExpr; 2]>;

    /// The player owning components of `ty`, if any.
    fn owner_of(&self, ty: &TypeExpr) -> Option<PlayerId>;

    /// Effects declared for `ty`, with placeholders still unbound.
    fn effects_of(&self, ty: &TypeExpr) -> Vec<Effect>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_limit_allows() {
        let limit = CountLimit::max(TypeExpr::class("OxygenStep"), 14);
        assert!(limit.allows(0));
        assert!(limit.allows(14));
        assert!(!limit.allows(15));

        let floor = CountLimit::min(TypeExpr::class("Heat"), 1);
        assert!(!floor.allows(0));
        assert!(floor.allows(u32::MAX));
    }

    #[test]
    fn test_count_limit_display() {
        let ty = TypeExpr::class("X");
        assert_eq!(CountLimit::max(ty.clone(), 14).to_string(), "MAX 14 X");
        assert_eq!(CountLimit::min(ty.clone(), 2).to_string(), "2 X");
        assert_eq!(CountLimit { ty: ty.clone(), min: 1, max: 1 }.to_string(), "=1 X");
        assert_eq!(CountLimit { ty, min: 1, max: 3 }.to_string(), "1..3 X");
    }
}
