//! The removal family and the source-death cascade.
//!
//! Every removal path goes through the component's `remove_where`, which
//! keeps the application order consistent and invalidates the modifier
//! cache. All of these are no-ops on a missing entity.

use crate::catalog;
use crate::entity::EntityId;
use crate::instance::{EffectInstance, InstanceId};
use crate::zone::ZoneId;

use super::EffectEngine;

impl EffectEngine {
    /// Removes one instance by id. Returns whether anything was removed.
    pub fn remove_effect(&mut self, entity: EntityId, id: InstanceId) -> bool {
        self.remove_matching(entity, |i| i.id == id) > 0
    }

    /// Removes every instance whose type hierarchically matches `query`.
    pub fn remove_effects_by_type(&mut self, entity: EntityId, query: &str) -> usize {
        self.remove_matching(entity, |i| catalog::matches(&i.type_id, query))
    }

    /// Removes every instance recorded as caused by `source`.
    pub fn remove_effects_by_source(&mut self, entity: EntityId, source: EntityId) -> usize {
        self.remove_matching(entity, |i| i.source == Some(source))
    }

    /// Removes every instance granted by `zone`, regardless of remaining
    /// duration.
    pub fn remove_effects_by_zone(&mut self, entity: EntityId, zone: ZoneId) -> usize {
        self.remove_matching(entity, |i| i.zone == Some(zone))
    }

    pub fn clear_all_effects(&mut self, entity: EntityId) -> usize {
        self.remove_matching(entity, |_| true)
    }

    /// Strips, from every tracked entity, the active instances `source`
    /// caused whose type does not persist past its death.
    pub fn on_source_death(&mut self, source: EntityId) {
        for entity in self.entities.handles() {
            let removed = self.remove_matching(entity, |i| {
                i.source == Some(source) && !i.resolved.persists_on_death
            });
            if removed > 0 {
                tracing::debug!(%entity, %source, removed, "effects stripped by source death");
            }
        }
    }

    fn remove_matching(
        &mut self,
        entity: EntityId,
        predicate: impl FnMut(&EffectInstance) -> bool,
    ) -> usize {
        let Some(record) = self.entities.get_mut(entity) else {
            return 0;
        };
        record.effects.remove_where(predicate).len()
    }
}
