//! Effect declarations.
//!
//! An effect ties a trigger (which change to react to) to an instruction
//! (what happens in response). Automatic effects run immediately as part
//! of the commit; the rest become tasks.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::instruction::{Instruction, Requirement};
use crate::types::TypeExpr;

/// Whose actions a trigger responds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByActor {
    /// Only changes made by the owner of the declaring component.
    Owner,
    /// Changes made by anyone.
    Anyone,
    /// Only changes made by this player.
    Player(PlayerId),
}

/// Which change an effect reacts to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    // === Self triggers ===

    /// The declaring component itself was gained.
    WhenGain,

    /// The declaring component itself was removed.
    WhenRemove,

    // === Triggers on other components ===

    /// Something of this type was gained.
    OnGainOf(TypeExpr),

    /// Something of this type was removed.
    OnRemoveOf(TypeExpr),

    // === Filters ===

    /// Only when the change was made by `by`.
    By { inner: Box<Trigger>, by: ByActor },

    /// Only while `condition` holds.
    If { inner: Box<Trigger>, condition: Requirement },

    /// Fires once per matching change, whatever its count.
    Unscaled(Box<Trigger>),
}

impl Trigger {
    /// Restrict to changes made by `by` (builder pattern).
    #[must_use]
    pub fn by(self, by: ByActor) -> Self {
        Trigger::By {
            inner: Box::new(self),
            by,
        }
    }

    /// Restrict to while `condition` holds (builder pattern).
    #[must_use]
    pub fn when(self, condition: Requirement) -> Self {
        Trigger::If {
            inner: Box::new(self),
            condition,
        }
    }

    /// Fire once per matching change instead of once per unit (builder pattern).
    #[must_use]
    pub fn unscaled(self) -> Self {
        Trigger::Unscaled(Box::new(self))
    }

    /// Apply `f` to every type mentioned.
    #[must_use]
    pub fn map_types(&self, f: &impl Fn(&TypeExpr) -> TypeExpr) -> Self {
        match self {
            Trigger::WhenGain => Trigger::WhenGain,
            Trigger::WhenRemove => Trigger::WhenRemove,
            Trigger::OnGainOf(ty) => Trigger::OnGainOf(f(ty)),
            Trigger::OnRemoveOf(ty) => Trigger::OnRemoveOf(f(ty)),
            Trigger::By { inner, by } => Trigger::By {
                inner: Box::new(inner.map_types(f)),
                by: *by,
            },
            Trigger::If { inner, condition } => Trigger::If {
                inner: Box::new(inner.map_types(f)),
                condition: condition.map_types(f),
            },
            Trigger::Unscaled(inner) => Trigger::Unscaled(Box::new(inner.map_types(f))),
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::WhenGain => f.write_str("This"),
            Trigger::WhenRemove => f.write_str("-This"),
            Trigger::OnGainOf(ty) => write!(f, "{ty}"),
            Trigger::OnRemoveOf(ty) => write!(f, "-{ty}"),
            Trigger::By { inner, by } => match by {
                ByActor::Owner => write!(f, "{inner} BY Owner"),
                ByActor::Anyone => write!(f, "{inner} BY Anyone"),
                ByActor::Player(p) => write!(f, "{inner} BY {p}"),
            },
            Trigger::If { inner, condition } => write!(f, "{inner} IF {condition}"),
            Trigger::Unscaled(inner) => write!(f, "{inner} ONCE"),
        }
    }
}

/// A trigger paired with its response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub trigger: Trigger,
    pub instruction: Instruction,

    /// Run within the triggering commit instead of becoming a task.
    pub automatic: bool,
}

impl Effect {
    /// Create a non-automatic effect.
    #[must_use]
    pub fn new(trigger: Trigger, instruction: Instruction) -> Self {
        Self {
            trigger,
            instruction,
            automatic: false,
        }
    }

    /// Make the effect automatic (builder pattern).
    #[must_use]
    pub fn automatic(mut self) -> Self {
        self.automatic = true;
        self
    }

    /// Bind `This` to the declaring component and `Owner` to its owner.
    #[must_use]
    pub fn bind(&self, this: &TypeExpr, owner: Option<PlayerId>) -> Self {
        let bind = |ty: &TypeExpr| {
            let ty = ty.replace_this(this);
            match owner {
                Some(owner) => ty.replace_owner(owner),
                None => ty,
            }
        };
        Self {
            trigger: self.trigger.map_types(&bind),
            instruction: self.instruction.map_types(&bind),
            automatic: self.automatic,
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sep = if self.automatic { "::" } else { ":" };
        write!(f, "{}{sep} {}", self.trigger, self.instruction)
    }
}
