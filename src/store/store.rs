//! The component store: a multiset of components.
//!
//! Backed by `im::OrdMap` so that cloning for snapshots is O(1) and
//! iteration order is deterministic.

use im::OrdMap;
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result};
use crate::types::{TypeExpr, TypeSystem};

use super::Component;

/// Multiset of components with their counts.
///
/// Components with a zero count are never stored. Serialized as a list of
/// (component, count) pairs since components aren't string keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<(Component, u32)>", from = "Vec<(Component, u32)>")]
pub struct ComponentStore {
    counts: OrdMap<Component, u32>,
}

impl From<ComponentStore> for Vec<(Component, u32)> {
    fn from(store: ComponentStore) -> Self {
        store.counts.into_iter().collect()
    }
}

impl From<Vec<(Component, u32)>> for ComponentStore {
    fn from(pairs: Vec<(Component, u32)>) -> Self {
        Self {
            counts: pairs.into_iter().filter(|(_, n)| *n > 0).collect(),
        }
    }
}

impl ComponentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many copies of exactly `component` are held.
    #[must_use]
    pub fn count_component(&self, component: &Component) -> u32 {
        self.counts.get(component).copied().unwrap_or(0)
    }

    /// How many held components are of type `ty` (subtypes included).
    #[must_use]
    pub fn count(&self, ty: &TypeExpr, types: &dyn TypeSystem) -> u32 {
        self.counts
            .iter()
            .filter(|(c, _)| types.is_subtype_of(c.expr(), ty))
            .fold(0u32, |acc, (_, n)| acc.saturating_add(*n))
    }

    /// Held components of type `ty` with their counts, in store order.
    #[must_use]
    pub fn components_of(&self, ty: &TypeExpr, types: &dyn TypeSystem) -> Vec<(Component, u32)> {
        self.counts
            .iter()
            .filter(|(c, _)| types.is_subtype_of(c.expr(), ty))
            .map(|(c, n)| (c.clone(), *n))
            .collect()
    }

    /// Whether at least one copy of `component` is held.
    #[must_use]
    pub fn contains(&self, component: &Component) -> bool {
        self.counts.contains_key(component)
    }

    /// Iterate over (component, count) pairs in store order.
    pub fn iter(&self) -> impl Iterator<Item = (&Component, u32)> {
        self.counts.iter().map(|(c, n)| (c, *n))
    }

    /// Number of distinct components held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of component copies held.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&n| u64::from(n)).sum()
    }

    /// Held components whose declared dependencies include `component`.
    #[must_use]
    pub fn dependents_of(&self, component: &Component, types: &dyn TypeSystem) -> Vec<Component> {
        self.counts
            .keys()
            .filter(|c| types.dependencies_of(c.expr()).contains(component.expr()))
            .cloned()
            .collect()
    }

    /// Move `count` units: remove from `removing`, add to `gaining`.
    ///
    /// Only checks that enough is held to remove. Count bounds and
    /// dependencies are the caller's concern.
    pub(crate) fn apply(
        &mut self,
        count: u32,
        gaining: Option<&Component>,
        removing: Option<&Component>,
    ) -> Result<()> {
        if let Some(removing) = removing {
            let held = self.count_component(removing);
            if held < count {
                return Err(EngineError::Limits(format!(
                    "can't remove {count} {removing}: only {held} held"
                )));
            }
            if held == count {
                self.counts.remove(removing);
            } else {
                self.counts.insert(removing.clone(), held - count);
            }
        }
        if let Some(gaining) = gaining {
            let held = self.count_component(gaining);
            let total = held.checked_add(count).ok_or_else(|| {
                EngineError::Limits(format!("can't gain {count} {gaining}: count overflow"))
            })?;
            self.counts.insert(gaining.clone(), total);
        }
        Ok(())
    }
}
