//! Effect-type definitions and parent-chain merging.
//!
//! An [`EffectTypeDefinition`] is authored data: every field is optional so a
//! child type only states what it changes relative to its parent. Resolution
//! walks the parent chain and deep-merges child over parent, producing a
//! [`ResolvedEffectType`] with every default filled in.
//!
//! # Merge Rules
//!
//! - Leaf scalars: the child value replaces the parent value outright.
//! - Nested specs (`stacking`, `periodic`, `targets`): merged field by field.
//! - The `modifiers` map: merged key by key, child keys win.
//! - The opaque `visual` block: JSON objects merge key by key, everything
//!   else (scalars, arrays, null) is replaced wholesale.

use std::collections::HashMap;

use serde_json::Value;

use crate::entity::EntityKind;

/// Policy for what happens when a type is re-applied to an entity that
/// already carries an instance of it.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StackRule {
    /// Overwrite duration, elapsed, and modifiers with the new application.
    #[default]
    Replace,
    /// Increment the stack count (capped), reset elapsed.
    Multiplicative,
    /// Increment the stack count (capped), reset elapsed.
    Additive,
    /// Refresh only if the new duration exceeds the remaining time.
    Longest,
    /// Keep the per-key minimum of old and new modifier values.
    Lowest,
    /// Keep the per-key maximum of old and new modifier values.
    Highest,
}

/// Stacking behavior of an effect type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StackingSpec {
    pub max_stacks: Option<u32>,
    pub rule: Option<StackRule>,
}

impl StackingSpec {
    fn merged_over(&self, parent: &Self) -> Self {
        Self {
            max_stacks: self.max_stacks.or(parent.max_stacks),
            rule: self.rule.or(parent.rule),
        }
    }
}

/// Periodic tick behavior of an effect type (damage/heal over time).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PeriodicSpec {
    /// Milliseconds between ticks.
    pub interval: Option<f32>,
    /// Health subtracted per tick, scaled by stack count.
    pub damage: Option<f32>,
    /// Health added per tick, scaled by stack count.
    pub heal: Option<f32>,
    /// Fire one tick immediately when the instance is created.
    pub apply_on_enter: Option<bool>,
}

impl PeriodicSpec {
    fn merged_over(&self, parent: &Self) -> Self {
        Self {
            interval: self.interval.or(parent.interval),
            damage: self.damage.or(parent.damage),
            heal: self.heal.or(parent.heal),
            apply_on_enter: self.apply_on_enter.or(parent.apply_on_enter),
        }
    }
}

/// Which entity kinds an effect type may be applied to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TargetSpec {
    pub player: Option<bool>,
    pub enemies: Option<bool>,
}

impl TargetSpec {
    fn merged_over(&self, parent: &Self) -> Self {
        Self {
            player: self.player.or(parent.player),
            enemies: self.enemies.or(parent.enemies),
        }
    }
}

/// Authored definition of one effect type.
///
/// Definitions live in the catalog keyed by their dot-hierarchical id
/// (e.g. `"fire.major"`) and are immutable after load.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectTypeDefinition {
    /// Id of the type this definition inherits from.
    pub parent: Option<String>,
    /// Modifier contributions, keyed by registered modifier key.
    pub modifiers: HashMap<String, f32>,
    pub stacking: Option<StackingSpec>,
    /// Milliseconds before an instance expires. `None` = never expires.
    pub duration: Option<f32>,
    pub periodic: Option<PeriodicSpec>,
    pub targets: Option<TargetSpec>,
    /// Opaque rendering parameters, passed through verbatim.
    pub visual: Option<Value>,
    /// Whether instances of this type survive their source entity's death.
    pub persists_on_death: Option<bool>,
}

impl EffectTypeDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_modifier(mut self, key: impl Into<String>, value: f32) -> Self {
        self.modifiers.insert(key.into(), value);
        self
    }

    pub fn with_stacking(mut self, max_stacks: u32, rule: StackRule) -> Self {
        self.stacking = Some(StackingSpec {
            max_stacks: Some(max_stacks),
            rule: Some(rule),
        });
        self
    }

    pub fn with_duration(mut self, millis: f32) -> Self {
        self.duration = Some(millis);
        self
    }

    pub fn with_periodic(mut self, periodic: PeriodicSpec) -> Self {
        self.periodic = Some(periodic);
        self
    }

    pub fn with_targets(mut self, player: bool, enemies: bool) -> Self {
        self.targets = Some(TargetSpec {
            player: Some(player),
            enemies: Some(enemies),
        });
        self
    }

    pub fn with_visual(mut self, visual: Value) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn with_persists_on_death(mut self, persists: bool) -> Self {
        self.persists_on_death = Some(persists);
        self
    }

    /// Deep-merges `self` (the child) over an already-merged parent.
    pub(crate) fn merged_over(&self, parent: &Self) -> Self {
        let mut modifiers = parent.modifiers.clone();
        modifiers.extend(self.modifiers.iter().map(|(k, v)| (k.clone(), *v)));

        Self {
            parent: self.parent.clone(),
            modifiers,
            stacking: merge_nested(&self.stacking, &parent.stacking, StackingSpec::merged_over),
            duration: self.duration.or(parent.duration),
            periodic: merge_nested(&self.periodic, &parent.periodic, PeriodicSpec::merged_over),
            targets: merge_nested(&self.targets, &parent.targets, TargetSpec::merged_over),
            visual: merge_nested(&self.visual, &parent.visual, merge_visual),
            persists_on_death: self.persists_on_death.or(parent.persists_on_death),
        }
    }
}

fn merge_nested<T: Clone>(
    child: &Option<T>,
    parent: &Option<T>,
    merge: impl Fn(&T, &T) -> T,
) -> Option<T> {
    match (child, parent) {
        (Some(c), Some(p)) => Some(merge(c, p)),
        (Some(c), None) => Some(c.clone()),
        (None, Some(p)) => Some(p.clone()),
        (None, None) => None,
    }
}

/// JSON deep merge: objects merge key by key, everything else (scalars,
/// arrays, null) is replaced by the child wholesale.
fn merge_visual(child: &Value, parent: &Value) -> Value {
    match (child, parent) {
        (Value::Object(c), Value::Object(p)) => {
            let mut merged = p.clone();
            for (key, child_value) in c {
                let value = match p.get(key) {
                    Some(parent_value) => merge_visual(child_value, parent_value),
                    None => child_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        _ => child.clone(),
    }
}

/// Periodic behavior with every default filled in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodicTemplate {
    pub interval: f32,
    pub damage: f32,
    pub heal: f32,
    pub apply_on_enter: bool,
}

impl PeriodicTemplate {
    /// Default tick interval when a periodic spec omits one.
    pub const DEFAULT_INTERVAL: f32 = 1000.0;

    /// Shortest permitted interval. Keeps the catch-up loop finite.
    pub const MIN_INTERVAL: f32 = 1.0;

    pub(crate) fn from_spec(spec: &PeriodicSpec) -> Self {
        Self {
            interval: spec
                .interval
                .unwrap_or(Self::DEFAULT_INTERVAL)
                .max(Self::MIN_INTERVAL),
            damage: spec.damage.unwrap_or(0.0),
            heal: spec.heal.unwrap_or(0.0),
            apply_on_enter: spec.apply_on_enter.unwrap_or(false),
        }
    }

    /// Applies a per-application override spec on top of this template.
    pub(crate) fn overridden_by(&self, spec: &PeriodicSpec) -> Self {
        Self {
            interval: spec.interval.unwrap_or(self.interval).max(Self::MIN_INTERVAL),
            damage: spec.damage.unwrap_or(self.damage),
            heal: spec.heal.unwrap_or(self.heal),
            apply_on_enter: spec.apply_on_enter.unwrap_or(self.apply_on_enter),
        }
    }
}

/// Target filter with defaults applied (everything targetable).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetFilter {
    pub player: bool,
    pub enemies: bool,
}

impl TargetFilter {
    pub fn allows(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Player => self.player,
            EntityKind::Enemy => self.enemies,
        }
    }
}

impl Default for TargetFilter {
    fn default() -> Self {
        Self {
            player: true,
            enemies: true,
        }
    }
}

/// An effect type with its full parent chain flattened and defaults applied.
///
/// Instances snapshot the resolved type at application time, so later catalog
/// edits (there are none at runtime) can never mutate live effects.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEffectType {
    pub id: String,
    pub modifiers: HashMap<String, f32>,
    pub max_stacks: u32,
    pub stack_rule: StackRule,
    /// Milliseconds before instances expire. `None` = until removed.
    pub duration: Option<f32>,
    pub periodic: Option<PeriodicTemplate>,
    pub targets: TargetFilter,
    pub visual: Option<Value>,
    pub persists_on_death: bool,
}

impl ResolvedEffectType {
    pub(crate) fn from_definition(id: &str, def: EffectTypeDefinition) -> Self {
        let stacking = def.stacking.unwrap_or_default();
        let targets = def.targets.unwrap_or_default();
        Self {
            id: id.to_owned(),
            modifiers: def.modifiers,
            max_stacks: stacking.max_stacks.unwrap_or(1).max(1),
            stack_rule: stacking.rule.unwrap_or_default(),
            duration: def.duration,
            periodic: def.periodic.as_ref().map(PeriodicTemplate::from_spec),
            targets: TargetFilter {
                player: targets.player.unwrap_or(true),
                enemies: targets.enemies.unwrap_or(true),
            },
            visual: def.visual,
            persists_on_death: def.persists_on_death.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn child_scalar_overrides_parent() {
        let parent = EffectTypeDefinition::new()
            .with_duration(3000.0)
            .with_targets(true, false);
        let child = EffectTypeDefinition::new()
            .with_parent("fire")
            .with_duration(5000.0);

        let merged = child.merged_over(&parent);
        assert_eq!(merged.duration, Some(5000.0));
        // Inherited unchanged from the parent.
        assert_eq!(
            merged.targets,
            Some(TargetSpec {
                player: Some(true),
                enemies: Some(false),
            })
        );
    }

    #[test]
    fn modifier_maps_merge_key_by_key() {
        let parent = EffectTypeDefinition::new()
            .with_modifier("speed_mult", 0.7)
            .with_modifier("damage_mult", 1.2);
        let child = EffectTypeDefinition::new().with_modifier("speed_mult", 0.3);

        let merged = child.merged_over(&parent);
        assert_eq!(merged.modifiers.get("speed_mult"), Some(&0.3));
        assert_eq!(merged.modifiers.get("damage_mult"), Some(&1.2));
    }

    #[test]
    fn nested_specs_merge_field_by_field() {
        let parent = EffectTypeDefinition::new().with_periodic(PeriodicSpec {
            interval: Some(500.0),
            damage: Some(3.0),
            ..PeriodicSpec::default()
        });
        let child = EffectTypeDefinition::new().with_periodic(PeriodicSpec {
            damage: Some(8.0),
            ..PeriodicSpec::default()
        });

        let merged = child.merged_over(&parent);
        let periodic = merged.periodic.unwrap();
        assert_eq!(periodic.interval, Some(500.0));
        assert_eq!(periodic.damage, Some(8.0));
    }

    #[test]
    fn visual_objects_merge_arrays_replace() {
        let parent = EffectTypeDefinition::new().with_visual(json!({
            "color": "#ff4400",
            "fade": { "in": 100, "out": 400 },
            "layers": ["glow", "smoke"],
        }));
        let child = EffectTypeDefinition::new().with_visual(json!({
            "fade": { "out": 800 },
            "layers": ["embers"],
        }));

        let merged = child.merged_over(&parent);
        let visual = merged.visual.unwrap();
        assert_eq!(visual["color"], "#ff4400");
        assert_eq!(visual["fade"]["in"], 100);
        assert_eq!(visual["fade"]["out"], 800);
        assert_eq!(visual["layers"], json!(["embers"]));
    }

    #[test]
    fn resolution_defaults() {
        let resolved =
            ResolvedEffectType::from_definition("fire", EffectTypeDefinition::new());
        assert_eq!(resolved.max_stacks, 1);
        assert_eq!(resolved.stack_rule, StackRule::Replace);
        assert_eq!(resolved.duration, None);
        assert!(resolved.periodic.is_none());
        assert!(resolved.targets.player && resolved.targets.enemies);
        assert!(!resolved.persists_on_death);
    }

    #[test]
    fn periodic_template_clamps_interval() {
        let template = PeriodicTemplate::from_spec(&PeriodicSpec {
            interval: Some(0.0),
            damage: Some(1.0),
            ..PeriodicSpec::default()
        });
        assert_eq!(template.interval, PeriodicTemplate::MIN_INTERVAL);
    }
}
