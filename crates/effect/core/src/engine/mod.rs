//! The effect engine: owner of all per-entity effect state.
//!
//! All mutation of effect state flows through this type, mirroring the
//! single-writer discipline of the wider game loop. Collaborators feed it
//! apply/remove calls and `update(dt)` once per frame, then read aggregated
//! modifiers and drain the feedback queue.
//!
//! Execution is single-threaded and frame-stepped: nothing here suspends,
//! blocks, or runs concurrently. The one deferred behavior, timed immunity
//! revocation, is a queue drained inside `update` with generation-checked
//! entity handles.

mod apply;
mod immunity;
mod removal;
mod update;

pub use apply::{ApplyOutcome, BlockReason};
pub(crate) use immunity::ImmunityTimer;

use crate::catalog::{self, EffectCatalog};
use crate::component::EntityEffects;
use crate::config::EngineConfig;
use crate::entity::{EntityArena, EntityId, EntityRecord};
use crate::events::FeedbackEvent;
use crate::instance::InstanceId;
use crate::modifier::{ModifierRegistry, Modifiers};

/// Owner of the effect catalog, modifier registry, and every tracked
/// entity's effect state.
#[derive(Debug)]
pub struct EffectEngine {
    catalog: EffectCatalog,
    registry: ModifierRegistry,
    config: EngineConfig,
    pub(crate) entities: EntityArena,
    next_instance: u64,
    pub(crate) clock: f32,
    pub(crate) immunity_timers: Vec<ImmunityTimer>,
    pub(crate) feedback: Vec<FeedbackEvent>,
    pub(crate) player_downed: bool,
}

impl EffectEngine {
    pub fn new(catalog: EffectCatalog, registry: ModifierRegistry) -> Self {
        Self::with_config(catalog, registry, EngineConfig::default())
    }

    pub fn with_config(
        catalog: EffectCatalog,
        registry: ModifierRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            registry,
            config,
            entities: EntityArena::new(),
            next_instance: 0,
            clock: 0.0,
            immunity_timers: Vec::new(),
            feedback: Vec::new(),
            player_downed: false,
        }
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ModifierRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Accumulated engine time in milliseconds.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    // ========================================================================
    // Entity management
    // ========================================================================

    pub fn spawn_entity(&mut self, record: EntityRecord) -> EntityId {
        self.entities.spawn(record)
    }

    /// Removes an entity and its effect state. Outstanding handles (zone
    /// bookkeeping, immunity timers) resolve to nothing afterwards.
    pub fn despawn_entity(&mut self, id: EntityId) -> Option<EntityRecord> {
        self.entities.despawn(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.entities.get_mut(id)
    }

    /// Stable snapshot of live entity handles.
    pub fn handles(&self) -> Vec<EntityId> {
        self.entities.handles()
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> {
        self.entities.iter()
    }

    pub fn effects(&self, entity: EntityId) -> Option<&EntityEffects> {
        self.entities.get(entity).map(EntityRecord::effects)
    }

    /// True if any active instance hierarchically matches `query`.
    pub fn has_effect(&self, entity: EntityId, query: &str) -> bool {
        self.effects(entity).is_some_and(|effects| {
            effects
                .active()
                .iter()
                .any(|i| catalog::matches(&i.type_id, query))
        })
    }

    // ========================================================================
    // Aggregated modifiers
    // ========================================================================

    /// Current aggregated modifiers for an entity.
    ///
    /// Lazily recomputed: the combined snapshot is cached on the entity and
    /// invalidated by any mutation of its active-effect list.
    pub fn modifiers(&mut self, entity: EntityId) -> Option<&Modifiers> {
        let record = self.entities.get_mut(entity)?;
        if record.effects.cache.is_none() {
            let combined = self.registry.combine(record.effects.ordered());
            record.effects.cache = Some(combined);
        }
        record.effects.cache.as_ref()
    }

    // ========================================================================
    // Outbound state
    // ========================================================================

    /// True once the protagonist's health has reached zero. Polled by the
    /// game-state collaborator; the engine never drives scene transitions.
    pub fn player_downed(&self) -> bool {
        self.player_downed
    }

    pub fn clear_player_downed(&mut self) {
        self.player_downed = false;
    }

    /// Takes all numeric-feedback notifications accumulated since the last
    /// drain.
    pub fn drain_feedback(&mut self) -> Vec<FeedbackEvent> {
        std::mem::take(&mut self.feedback)
    }

    pub(crate) fn next_instance_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        id
    }
}
