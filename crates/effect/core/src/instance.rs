//! Live effect instances and per-application options.

use std::collections::HashMap;

use crate::catalog::{PeriodicSpec, PeriodicTemplate, ResolvedEffectType, StackRule};
use crate::entity::EntityId;
use crate::zone::ZoneId;

/// Monotonic identifier for one live effect instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// One entity's live occurrence of one effect type.
///
/// At most one instance per (entity, type id) exists at any time; repeat
/// application mutates the existing instance through its stacking rule.
#[derive(Clone, Debug)]
pub struct EffectInstance {
    pub id: InstanceId,
    pub type_id: String,
    /// Snapshot of the resolved type at application time.
    pub resolved: ResolvedEffectType,
    /// Milliseconds until expiry, counted from the last refresh. `None`
    /// means the instance only goes away through explicit removal.
    pub duration: Option<f32>,
    pub elapsed: f32,
    pub periodic: Option<PeriodicTemplate>,
    pub periodic_timer: f32,
    pub stack_count: u32,
    pub max_stacks: u32,
    pub stack_rule: StackRule,
    /// Effective modifier contributions (resolved defaults possibly
    /// overridden at apply time).
    pub modifiers: HashMap<String, f32>,
    /// Entity that caused this effect, if any.
    pub source: Option<EntityId>,
    /// Zone that granted this effect, if any.
    pub zone: Option<ZoneId>,
    /// Engine clock (ms) at creation.
    pub applied_at: f32,
    /// Engine clock (ms) at the most recent (re-)application.
    pub last_refreshed_at: f32,
}

impl EffectInstance {
    /// Milliseconds left before expiry; `None` for unbounded instances.
    pub fn remaining(&self) -> Option<f32> {
        self.duration.map(|d| (d - self.elapsed).max(0.0))
    }

    pub fn is_expired(&self) -> bool {
        self.duration.is_some_and(|d| self.elapsed >= d)
    }

    #[cfg(test)]
    pub(crate) fn fixture(id: InstanceId, type_id: &str) -> Self {
        use crate::catalog::EffectTypeDefinition;

        let resolved =
            ResolvedEffectType::from_definition(type_id, EffectTypeDefinition::new());
        Self {
            id,
            type_id: type_id.to_owned(),
            modifiers: resolved.modifiers.clone(),
            duration: resolved.duration,
            elapsed: 0.0,
            periodic: resolved.periodic,
            periodic_timer: 0.0,
            stack_count: 1,
            max_stacks: resolved.max_stacks,
            stack_rule: resolved.stack_rule,
            resolved,
            source: None,
            zone: None,
            applied_at: 0.0,
            last_refreshed_at: 0.0,
        }
    }
}

/// Per-instance overrides a caller or zone may layer on top of the
/// resolved type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectOverrides {
    pub duration: Option<f32>,
    /// Per-key overrides merged over the resolved modifier map.
    pub modifiers: Option<HashMap<String, f32>>,
    pub periodic: Option<PeriodicSpec>,
}

impl EffectOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, millis: f32) -> Self {
        self.duration = Some(millis);
        self
    }

    pub fn with_modifier(mut self, key: impl Into<String>, value: f32) -> Self {
        self.modifiers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_periodic(mut self, periodic: PeriodicSpec) -> Self {
        self.periodic = Some(periodic);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.duration.is_none() && self.modifiers.is_none() && self.periodic.is_none()
    }
}

/// Options for a single `apply_effect` call.
#[derive(Clone, Debug, Default)]
pub struct ApplyOptions {
    pub overrides: EffectOverrides,
    /// Owning entity recorded on the instance (drives source-death cascade).
    pub source: Option<EntityId>,
    /// Granting zone recorded on the instance (drives zone-exit cascade).
    pub zone: Option<ZoneId>,
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_overrides(overrides: EffectOverrides) -> Self {
        Self {
            overrides,
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, millis: f32) -> Self {
        self.overrides.duration = Some(millis);
        self
    }

    pub fn with_modifier(mut self, key: impl Into<String>, value: f32) -> Self {
        self.overrides = self.overrides.with_modifier(key, value);
        self
    }

    pub fn with_periodic(mut self, periodic: PeriodicSpec) -> Self {
        self.overrides.periodic = Some(periodic);
        self
    }

    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_zone(mut self, zone: ZoneId) -> Self {
        self.zone = Some(zone);
        self
    }
}
