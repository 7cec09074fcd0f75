//! Modifier aggregation: combining active effects into one snapshot.
//!
//! Each modifier key (e.g. `"speed_mult"`) registers a default value, an
//! aggregation rule, and optional clamp bounds. [`ModifierRegistry::combine`]
//! folds an ordered list of active effects into a [`Modifiers`] snapshot:
//!
//! 1. Start from every registered key's default.
//! 2. Walk effects in application order (oldest first; a refreshed effect
//!    sits at the tail), dispatching each contributed key on its rule.
//! 3. Apply the `last_wins` side map after the main pass.
//! 4. Clamp every key to its registered bounds.
//!
//! An effect's own stacking rule, not the key's aggregation rule, decides
//! whether its stack count scales the contribution: only `multiplicative`
//! and `additive` stacking multiply by `stack_count`. The two rule families
//! are independent axes.

use std::collections::HashMap;

use crate::instance::EffectInstance;
use crate::catalog::StackRule;

/// Policy for combining one key's value across all active effects.
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
pub enum AggregationRule {
    /// Compounds deviations from the neutral value 1.0.
    #[default]
    Multiplicative,
    /// Sums contributions.
    Additive,
    /// The most recently (re-)applied effect's value wins outright.
    LastWins,
    /// Keeps the minimum of the running value and each contribution.
    Lowest,
    /// Keeps the maximum of the running value and each contribution.
    Highest,
}

/// Registration record for one modifier key.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierRule {
    pub default: f32,
    pub aggregation: AggregationRule,
    #[cfg_attr(feature = "serde", serde(default))]
    pub min: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max: Option<f32>,
}

impl ModifierRule {
    pub fn new(default: f32, aggregation: AggregationRule) -> Self {
        Self {
            default,
            aggregation,
            min: None,
            max: None,
        }
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// A fully-populated snapshot of modifier values for one entity.
///
/// Always contains one entry per registered key, even when no active effect
/// touches it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Modifiers {
    values: HashMap<String, f32>,
}

impl Modifiers {
    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Static table of per-key combination rules.
#[derive(Clone, Debug, Default)]
pub struct ModifierRegistry {
    rules: HashMap<String, ModifierRule>,
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: HashMap<String, ModifierRule>) -> Self {
        Self { rules }
    }

    pub fn register(&mut self, key: impl Into<String>, rule: ModifierRule) {
        self.rules.insert(key.into(), rule);
    }

    pub fn rule(&self, key: &str) -> Option<&ModifierRule> {
        self.rules.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// One entry per registered key, set to its default.
    pub fn defaults(&self) -> Modifiers {
        Modifiers {
            values: self
                .rules
                .iter()
                .map(|(key, rule)| (key.clone(), rule.default))
                .collect(),
        }
    }

    /// Combines effects, oldest-applied first, into one snapshot.
    pub fn combine<'a, I>(&self, effects: I) -> Modifiers
    where
        I: IntoIterator<Item = &'a EffectInstance>,
    {
        let mut out = self.defaults();
        let mut last_wins: Vec<(&str, f32)> = Vec::new();

        for effect in effects {
            // Stack scaling is driven by the instance's stacking rule.
            let stack_mult = match effect.stack_rule {
                StackRule::Multiplicative | StackRule::Additive => effect.stack_count as f32,
                _ => 1.0,
            };

            for (key, &value) in &effect.modifiers {
                let Some(rule) = self.rules.get(key) else {
                    tracing::debug!(key = %key, effect = %effect.type_id, "unregistered modifier key ignored");
                    continue;
                };
                let Some(slot) = out.values.get_mut(key) else {
                    continue;
                };
                match rule.aggregation {
                    // Scales the deviation from neutral linearly with the
                    // stack count, then compounds against other effects.
                    AggregationRule::Multiplicative => {
                        *slot *= 1.0 + (value - 1.0) * stack_mult;
                    }
                    AggregationRule::Additive => *slot += value * stack_mult,
                    AggregationRule::LastWins => last_wins.push((key, value)),
                    AggregationRule::Lowest => *slot = slot.min(value),
                    AggregationRule::Highest => *slot = slot.max(value),
                }
            }
        }

        // Later entries overwrite earlier ones, so with effects ordered
        // oldest-first the most recently touched effect wins.
        for (key, value) in last_wins {
            if let Some(slot) = out.values.get_mut(key) {
                *slot = value;
            }
        }

        for (key, slot) in &mut out.values {
            if let Some(rule) = self.rules.get(key) {
                if let Some(min) = rule.min {
                    *slot = slot.max(min);
                }
                if let Some(max) = rule.max {
                    *slot = slot.min(max);
                }
            }
        }

        out
    }
}
