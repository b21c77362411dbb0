//! Components: concrete type expressions that can be held in the store.

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result};
use crate::types::{TypeExpr, TypeSystem};

/// A concrete type, as held by the component store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Component(TypeExpr);

impl Component {
    /// Wrap a type, rejecting abstract ones.
    pub fn new(ty: TypeExpr, types: &dyn TypeSystem) -> Result<Self> {
        if types.is_abstract(&ty) {
            return Err(EngineError::Abstract(format!("{ty} can't be a component")));
        }
        Ok(Self(ty))
    }

    /// Wrap a type already known to be concrete (replayed from the event log).
    pub(crate) fn trusted(ty: TypeExpr) -> Self {
        Self(ty)
    }

    /// The underlying type.
    #[must_use]
    pub fn expr(&self) -> &TypeExpr {
        &self.0
    }

    /// Unwrap into the underlying type.
    #[must_use]
    pub fn into_expr(self) -> TypeExpr {
        self.0
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassDefinition, ClassTable};

    #[test]
    fn test_component_requires_concrete_type() {
        let mut table = ClassTable::with_players(1);
        table.register(ClassDefinition::new("Plant").with_owner());

        let plant = Component::new("Plant<Player1>".parse().unwrap(), &table).unwrap();
        assert_eq!(plant.to_string(), "[Plant<Player1>]");

        let err = Component::new("Plant".parse().unwrap(), &table).unwrap_err();
        assert!(matches!(err, EngineError::Abstract(_)));
    }
}
