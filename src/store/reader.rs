//! Read-only view of the game state.
//!
//! A `Reader` pairs the component store with the type system so that counts,
//! requirements and metrics can be evaluated without access to anything
//! mutable.

use crate::core::Result;
use crate::instruction::{Metric, Requirement};
use crate::types::{TypeExpr, TypeSystem};

use super::{Component, ComponentStore};

/// Read-only access to the store through the type system.
#[derive(Clone, Copy)]
pub struct Reader<'a> {
    store: &'a ComponentStore,
    types: &'a dyn TypeSystem,
}

impl<'a> Reader<'a> {
    /// Create a reader over `store`.
    #[must_use]
    pub fn new(store: &'a ComponentStore, types: &'a dyn TypeSystem) -> Self {
        Self { store, types }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &'a ComponentStore {
        self.store
    }

    /// The type system.
    #[must_use]
    pub fn types(&self) -> &'a dyn TypeSystem {
        self.types
    }

    /// Count of held components of type `ty`.
    #[must_use]
    pub fn count(&self, ty: &TypeExpr) -> u32 {
        self.store.count(ty, self.types)
    }

    /// Whether `requirement` holds right now.
    #[must_use]
    pub fn has(&self, requirement: &Requirement) -> bool {
        match requirement {
            Requirement::Min { of, count } => self.count(of) >= *count,
            Requirement::Max { of, count } => self.count(of) <= *count,
            Requirement::Exact { of, count } => self.count(of) == *count,
            Requirement::And(parts) => parts.iter().all(|r| self.has(r)),
            Requirement::Or(parts) => parts.iter().any(|r| self.has(r)),
            Requirement::Not(inner) => !self.has(inner),
        }
    }

    /// Current value of `metric`.
    #[must_use]
    pub fn evaluate(&self, metric: &Metric) -> u32 {
        match metric {
            Metric::Count { of, per } => self.count(of) / (*per).max(1),
            Metric::Max { inner, max } => self.evaluate(inner).min(*max),
            Metric::Plus(parts) => parts
                .iter()
                .fold(0u32, |acc, m| acc.saturating_add(self.evaluate(m))),
        }
    }

    /// Wrap a concrete type as a component.
    pub fn component(&self, ty: &TypeExpr) -> Result<Component> {
        Component::new(ty.clone(), self.types)
    }
}

impl std::fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader").field("store", self.store).finish_non_exhaustive()
    }
}
