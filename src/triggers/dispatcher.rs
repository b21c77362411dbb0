//! Trigger dispatch.
//!
//! After every committed change the dispatcher looks for effects that react
//! to it: self effects on the changed component, and effects of every held
//! component whose trigger matches. Each hit is scaled by the change count
//! (and, for other components, by how many of that component are held).

use tracing::debug;

use crate::core::Actor;
use crate::history::{Cause, ChangeEvent};
use crate::instruction::Instruction;
use crate::store::Reader;
use crate::types::TypeExpr;

use super::effect::{ByActor, Effect, Trigger};

/// An effect that fired, ready to be executed or enqueued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FiredEffect {
    /// Who acts on the response.
    pub owner: Actor,
    pub instruction: Instruction,
    pub automatic: bool,
    pub cause: Option<Cause>,

    /// Set when the instruction was already tried and couldn't run.
    pub why_pending: Option<String>,
}

/// Finds the effects fired by a change event.
#[derive(Clone, Copy, Debug)]
pub struct TriggerDispatcher<'a> {
    reader: Reader<'a>,
}

impl<'a> TriggerDispatcher<'a> {
    /// Create a dispatcher over the state after the change.
    #[must_use]
    pub fn new(reader: Reader<'a>) -> Self {
        Self { reader }
    }

    /// Every effect fired by `event`, self effects first, then others in store order.
    #[must_use]
    pub fn fire(&self, event: &ChangeEvent) -> Vec<FiredEffect> {
        let mut fired = Vec::new();

        let sides = [&event.change.gaining, &event.change.removing];
        for this in sides.into_iter().flatten() {
            self.collect(event, this, 1, true, &mut fired);
        }

        for (component, count) in self.reader.store().iter() {
            self.collect(event, component.expr(), count, false, &mut fired);
        }

        fired
    }

    fn collect(&self, event: &ChangeEvent, this: &TypeExpr, copies: u32, is_self: bool, out: &mut Vec<FiredEffect>) {
        let types = self.reader.types();
        let owner = types.owner_of(this);
        let bind_owner = owner.or(event.actor.player());

        for effect in types.effects_of(this) {
            let Effect {
                trigger,
                instruction,
                automatic,
            } = effect.bind(this, bind_owner);
            let Some(scale) = self.hit(&trigger, event, this, is_self) else {
                continue;
            };
            let instruction = instruction.times(scale.saturating_mul(copies));
            if instruction == Instruction::NoOp {
                continue;
            }
            debug!(component = %this, trigger = %trigger, instruction = %instruction, automatic, "trigger fired");
            out.push(FiredEffect {
                owner: owner.map_or(event.actor, Actor::Player),
                instruction,
                automatic,
                cause: Some(Cause {
                    context: Some(this.clone()),
                    trigger_event: Some(event.ordinal),
                }),
                why_pending: None,
            });
        }
    }

    /// How many times `trigger` fires for `event`, if at all.
    fn hit(&self, trigger: &Trigger, event: &ChangeEvent, this: &TypeExpr, is_self: bool) -> Option<u32> {
        let types = self.reader.types();
        let change = &event.change;
        let fires = match trigger {
            Trigger::WhenGain => is_self && change.gaining.as_ref() == Some(this),
            Trigger::WhenRemove => is_self && change.removing.as_ref() == Some(this),
            Trigger::OnGainOf(of) => !is_self && change.gaining.as_ref().is_some_and(|g| types.is_subtype_of(g, of)),
            Trigger::OnRemoveOf(of) => !is_self && change.removing.as_ref().is_some_and(|r| types.is_subtype_of(r, of)),
            Trigger::By { inner, by } => {
                let by_ok = match by {
                    ByActor::Anyone => true,
                    ByActor::Player(p) => event.actor == Actor::Player(*p),
                    // An unowned component answers to whoever acts.
                    ByActor::Owner => match types.owner_of(this) {
                        Some(p) => event.actor == Actor::Player(p),
                        None => true,
                    },
                };
                return if by_ok { self.hit(inner, event, this, is_self) } else { None };
            }
            Trigger::If { inner, condition } => {
                return self.hit(inner, event, this, is_self).filter(|_| self.reader.has(condition));
            }
            Trigger::Unscaled(inner) => return self.hit(inner, event, this, is_self).map(|_| 1),
        };
        fires.then_some(change.count)
    }
}
