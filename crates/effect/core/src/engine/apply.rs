//! Effect application: immunity and target filtering, stacking dispatch,
//! instance creation.

use std::collections::HashMap;

use crate::catalog::{self, PeriodicTemplate, ResolvedEffectType, StackRule};
use crate::entity::EntityId;
use crate::instance::{ApplyOptions, EffectInstance, EffectOverrides, InstanceId};

use super::EffectEngine;

/// Why an application was rejected. All of these are normal game flow, not
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockReason {
    /// The type id is not in the catalog (warn-logged).
    UnknownType,
    /// An immunity prefix on the entity matches the type id.
    Immune,
    /// The type's target filter excludes this entity kind.
    TargetFiltered,
    /// The entity handle no longer resolves.
    MissingEntity,
}

/// Result of one `apply_effect` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new instance was created.
    Applied(InstanceId),
    /// An existing instance of the same type was mutated through its
    /// stacking rule.
    Stacked(InstanceId),
    Blocked(BlockReason),
}

impl ApplyOutcome {
    /// The affected instance, if the application went through.
    pub fn instance(&self) -> Option<InstanceId> {
        match self {
            Self::Applied(id) | Self::Stacked(id) => Some(*id),
            Self::Blocked(_) => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

impl EffectEngine {
    /// Applies an effect type to an entity.
    ///
    /// Checks immunity, then resolves the type, then applies the target
    /// filter. If the entity already carries an instance of this exact type
    /// the stacking handler mutates it; otherwise a fresh instance is
    /// created from the resolved snapshot plus the call's overrides.
    pub fn apply_effect(
        &mut self,
        entity: EntityId,
        type_id: &str,
        opts: ApplyOptions,
    ) -> ApplyOutcome {
        let Some(record) = self.entities.get(entity) else {
            return ApplyOutcome::Blocked(BlockReason::MissingEntity);
        };
        let kind = record.kind;

        if record
            .effects
            .immunities
            .iter()
            .any(|prefix| catalog::matches(type_id, prefix))
        {
            tracing::debug!(%entity, type_id, "application blocked by immunity");
            return ApplyOutcome::Blocked(BlockReason::Immune);
        }

        let Some(resolved) = self.catalog().resolve(type_id) else {
            tracing::warn!(type_id, "unknown effect type");
            return ApplyOutcome::Blocked(BlockReason::UnknownType);
        };

        if !resolved.targets.allows(kind) {
            return ApplyOutcome::Blocked(BlockReason::TargetFiltered);
        }

        let existing = self
            .entities
            .get(entity)
            .and_then(|r| r.effects.instance_of_type(type_id))
            .map(|i| i.id);
        match existing {
            Some(id) => {
                self.stack_existing(entity, id, &resolved, &opts.overrides);
                ApplyOutcome::Stacked(id)
            }
            None => ApplyOutcome::Applied(self.create_instance(entity, type_id, resolved, opts)),
        }
    }

    fn create_instance(
        &mut self,
        entity: EntityId,
        type_id: &str,
        resolved: ResolvedEffectType,
        opts: ApplyOptions,
    ) -> InstanceId {
        let id = self.next_instance_id();
        let clock = self.clock;
        let (duration, modifiers, periodic) = effective_fields(&resolved, &opts.overrides);
        let apply_on_enter = periodic.is_some_and(|p| p.apply_on_enter);

        let instance = EffectInstance {
            id,
            type_id: type_id.to_owned(),
            duration,
            elapsed: 0.0,
            periodic,
            periodic_timer: 0.0,
            stack_count: 1,
            max_stacks: resolved.max_stacks,
            stack_rule: resolved.stack_rule,
            modifiers,
            source: opts.source,
            zone: opts.zone,
            applied_at: clock,
            last_refreshed_at: clock,
            resolved,
        };

        tracing::debug!(%entity, type_id, %id, "effect applied");
        if let Some(record) = self.entities.get_mut(entity) {
            record.effects.push(instance);
        }
        if apply_on_enter {
            self.fire_periodic_tick(entity, id);
        }
        id
    }

    /// Mutates an existing instance according to the type's stacking rule.
    ///
    /// Every branch counts as a refresh: the instance moves to the tail of
    /// the application order and the modifier cache is invalidated.
    fn stack_existing(
        &mut self,
        entity: EntityId,
        id: InstanceId,
        resolved: &ResolvedEffectType,
        overrides: &EffectOverrides,
    ) {
        let clock = self.clock;
        let (duration, modifiers, periodic) = effective_fields(resolved, overrides);
        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        let Some(instance) = record.effects.instance_mut(id) else {
            return;
        };

        match instance.stack_rule {
            StackRule::Replace => {
                instance.duration = duration;
                instance.elapsed = 0.0;
                instance.modifiers = modifiers;
                instance.periodic = periodic;
            }
            StackRule::Multiplicative | StackRule::Additive => {
                // Past the cap the stack count stays put, but the duration
                // still refreshes.
                if instance.stack_count < instance.max_stacks {
                    instance.stack_count += 1;
                }
                instance.elapsed = 0.0;
            }
            StackRule::Longest => {
                let refresh = match (duration, instance.remaining()) {
                    (None, Some(_)) => true,
                    (Some(new), Some(remaining)) => new > remaining,
                    (_, None) => false,
                };
                if refresh {
                    instance.duration = duration;
                    instance.elapsed = 0.0;
                }
            }
            StackRule::Lowest => {
                for (key, value) in modifiers {
                    instance
                        .modifiers
                        .entry(key)
                        .and_modify(|current| *current = current.min(value))
                        .or_insert(value);
                }
                instance.elapsed = 0.0;
            }
            StackRule::Highest => {
                for (key, value) in modifiers {
                    instance
                        .modifiers
                        .entry(key)
                        .and_modify(|current| *current = current.max(value))
                        .or_insert(value);
                }
                instance.elapsed = 0.0;
            }
        }

        instance.last_refreshed_at = clock;
        tracing::debug!(%entity, type_id = %instance.type_id, %id, "effect refreshed");
        record.effects.touch(id);
    }
}

/// Effective instance fields for one application: resolved defaults with
/// the call's overrides layered on top.
fn effective_fields(
    resolved: &ResolvedEffectType,
    overrides: &EffectOverrides,
) -> (Option<f32>, HashMap<String, f32>, Option<PeriodicTemplate>) {
    let duration = overrides.duration.or(resolved.duration);

    let mut modifiers = resolved.modifiers.clone();
    if let Some(extra) = &overrides.modifiers {
        modifiers.extend(extra.iter().map(|(k, v)| (k.clone(), *v)));
    }

    let periodic = match (&resolved.periodic, &overrides.periodic) {
        (Some(template), Some(spec)) => Some(template.overridden_by(spec)),
        (Some(template), None) => Some(*template),
        (None, Some(spec)) => Some(PeriodicTemplate::from_spec(spec)),
        (None, None) => None,
    };

    (duration, modifiers, periodic)
}
