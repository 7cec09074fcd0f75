//! Per-entity immunity: hierarchical type blocking with optional timed
//! grants.
//!
//! A timed grant enqueues a revocation event instead of arming a
//! fire-and-forget timer. The queue is drained inside `update`; an event
//! whose generation-checked handle no longer resolves is dropped silently,
//! so a revocation can never touch an entity that died in the meantime.

use crate::catalog;
use crate::entity::EntityId;

use super::EffectEngine;

/// A pending timed-immunity revocation.
#[derive(Clone, Debug)]
pub(crate) struct ImmunityTimer {
    pub entity: EntityId,
    pub prefix: String,
    pub remaining: f32,
}

impl EffectEngine {
    /// True if any immunity prefix on the entity hierarchically matches
    /// `type_id`.
    pub fn is_immune_to(&self, entity: EntityId, type_id: &str) -> bool {
        self.entities.get(entity).is_some_and(|record| {
            record
                .effects
                .immunities
                .iter()
                .any(|prefix| catalog::matches(type_id, prefix))
        })
    }

    /// Grants immunity to `prefix` (and all its descendants), immediately
    /// stripping any currently-active matching effects.
    ///
    /// With a `duration` the immunity auto-revokes once that many
    /// milliseconds of engine time have passed; re-granting extends an
    /// existing timer rather than stacking a second one.
    pub fn grant_immunity(&mut self, entity: EntityId, prefix: &str, duration: Option<f32>) {
        if !self.entities.contains(entity) {
            return;
        }
        self.remove_effects_by_type(entity, prefix);

        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        if !record.effects.immunities.iter().any(|p| p == prefix) {
            record.effects.immunities.push(prefix.to_owned());
        }
        tracing::debug!(%entity, prefix, ?duration, "immunity granted");

        if let Some(millis) = duration {
            match self
                .immunity_timers
                .iter_mut()
                .find(|t| t.entity == entity && t.prefix == prefix)
            {
                Some(timer) => timer.remaining = timer.remaining.max(millis),
                None => self.immunity_timers.push(ImmunityTimer {
                    entity,
                    prefix: prefix.to_owned(),
                    remaining: millis,
                }),
            }
        }
    }

    /// Drops an immunity prefix. No-op for a missing entity or an
    /// unlisted prefix.
    pub fn revoke_immunity(&mut self, entity: EntityId, prefix: &str) {
        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        record.effects.immunities.retain(|p| p != prefix);
    }

    /// Drains due revocation events. Events for despawned entities fall
    /// through `revoke_immunity`'s handle check and vanish.
    pub(crate) fn advance_immunity_timers(&mut self, dt: f32) {
        for timer in &mut self.immunity_timers {
            timer.remaining -= dt;
        }
        let mut due = Vec::new();
        // Reverse index iteration so swap_remove cannot skip an entry.
        for index in (0..self.immunity_timers.len()).rev() {
            if self.immunity_timers[index].remaining <= 0.0 {
                due.push(self.immunity_timers.swap_remove(index));
            }
        }
        for timer in due {
            self.revoke_immunity(timer.entity, &timer.prefix);
        }
    }
}
