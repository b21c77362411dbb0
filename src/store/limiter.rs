//! Count-bound arithmetic.
//!
//! The limiter answers two questions about a change from `removing` to
//! `gaining`: how many units could move right now, and whether the store
//! still honors every bound afterwards.

use crate::core::{EngineError, Result};
use crate::types::CountLimit;

use super::{Component, Reader};

/// Computes headroom and footroom for changes.
#[derive(Clone, Copy, Debug)]
pub struct Limiter<'a> {
    reader: Reader<'a>,
}

impl<'a> Limiter<'a> {
    /// Create a limiter over the current state.
    #[must_use]
    pub fn new(reader: Reader<'a>) -> Self {
        Self { reader }
    }

    /// The largest count that could move from `removing` to `gaining`.
    ///
    /// Headroom comes from the gained type's maximums, footroom from the
    /// removed type's minimums and holdings. Bounds shared by both sides are
    /// unaffected by the change and ignored. `u32::MAX` means unbounded.
    pub fn find_limit(&self, gaining: Option<&Component>, removing: Option<&Component>) -> Result<u32> {
        if let Some(gaining) = gaining {
            self.check_dependencies(gaining)?;
        }

        let (gain_limits, remove_limits) = self.limits(gaining, removing);
        let mut limit = u32::MAX;

        for bound in gain_limits.iter().filter(|l| !remove_limits.contains(l)) {
            limit = limit.min(bound.max.saturating_sub(self.reader.count(&bound.ty)));
        }
        for bound in remove_limits.iter().filter(|l| !gain_limits.contains(l)) {
            limit = limit.min(self.reader.count(&bound.ty).saturating_sub(bound.min));
        }
        if let Some(removing) = removing {
            limit = limit.min(self.reader.store().count_component(removing));
        }
        Ok(limit)
    }

    /// Fail unless every component `gaining` depends on is present and
    /// belongs to the same owner.
    pub fn check_dependencies(&self, gaining: &Component) -> Result<()> {
        let types = self.reader.types();
        let owner = types.owner_of(gaining.expr());
        for dependency in types.dependencies_of(gaining.expr()) {
            if self.reader.count(&dependency) == 0 {
                return Err(EngineError::Dependency(format!(
                    "{gaining} needs {dependency}, which doesn't exist"
                )));
            }
            match (owner, types.owner_of(&dependency)) {
                (Some(a), Some(b)) if a != b => {
                    return Err(EngineError::Dependency(format!(
                        "{gaining} belongs to {a} but {dependency} belongs to {b}"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Fail if the store violates a bound the last change could have affected.
    pub fn verify(&self, gaining: Option<&Component>, removing: Option<&Component>) -> Result<()> {
        let (gain_limits, remove_limits) = self.limits(gaining, removing);
        for bound in gain_limits.iter().chain(&remove_limits) {
            let count = self.reader.count(&bound.ty);
            if !bound.allows(count) {
                return Err(EngineError::Limits(format!("{bound} violated: have {count}")));
            }
        }
        Ok(())
    }

    fn limits(&self, gaining: Option<&Component>, removing: Option<&Component>) -> (Vec<CountLimit>, Vec<CountLimit>) {
        let types = self.reader.types();
        let of = |c: Option<&Component>| c.map(|c| types.limits_for(c.expr())).unwrap_or_default();
        (of(gaining), of(removing))
    }
}
