//! Spatial effect zones: volumes that grant an effect to entities they
//! contain.
//!
//! The manager owns every zone and, once per frame after the host has
//! written entity positions, recomputes attachment and evolution, tests
//! containment against every tracked entity, and drives the effect engine's
//! apply/remove calls on enter and exit. A zone's lifetime is independent
//! of the effect instances it grants: leaving the zone strips the granted
//! instance no matter how much nominal duration it had left.

pub mod shape;

use std::collections::{HashMap, HashSet};
use std::fmt;

use glam::Vec3;
use serde_json::Value;

use crate::engine::EffectEngine;
use crate::entity::EntityId;
use crate::events::ZoneEvent;
use crate::instance::{ApplyOptions, EffectOverrides};

pub use shape::{Evolution, EvolutionKind, Shape};

/// Monotonic identifier for one zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoneId(pub u64);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "z{}", self.0)
    }
}

/// Anchors a zone to an entity; the zone's position is recomputed from the
/// anchor every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attachment {
    pub entity: EntityId,
    pub offset: Vec3,
}

/// Placement request from gameplay code (boss ability, hazard spawner).
#[derive(Clone, Debug)]
pub struct ZoneRequest {
    pub effect_type_id: String,
    pub position: Vec3,
    pub shape: Shape,
    /// Milliseconds the zone stays in play. `None` = until removed.
    pub duration: Option<f32>,
    pub source: Option<EntityId>,
    pub attached_to: Option<Attachment>,
    pub evolution: Option<Evolution>,
    pub effect_overrides: Option<EffectOverrides>,
    /// Re-apply cadence for entities that stay inside; `0` disables.
    pub reapply_interval: f32,
    /// Whether the zone outlives its source entity. Independent of the
    /// effect-type-level flag consumed by the engine's source-death cascade.
    pub persists_on_death: bool,
}

impl ZoneRequest {
    pub fn new(effect_type_id: impl Into<String>, position: Vec3, shape: Shape) -> Self {
        Self {
            effect_type_id: effect_type_id.into(),
            position,
            shape,
            duration: None,
            source: None,
            attached_to: None,
            evolution: None,
            effect_overrides: None,
            reapply_interval: 0.0,
            persists_on_death: false,
        }
    }

    pub fn with_duration(mut self, millis: f32) -> Self {
        self.duration = Some(millis);
        self
    }

    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn attached_to(mut self, entity: EntityId, offset: Vec3) -> Self {
        self.attached_to = Some(Attachment { entity, offset });
        self
    }

    pub fn with_evolution(mut self, evolution: Evolution) -> Self {
        self.evolution = Some(evolution);
        self
    }

    pub fn with_effect_overrides(mut self, overrides: EffectOverrides) -> Self {
        self.effect_overrides = Some(overrides);
        self
    }

    pub fn with_reapply_interval(mut self, millis: f32) -> Self {
        self.reapply_interval = millis;
        self
    }

    pub fn with_persists_on_death(mut self, persists: bool) -> Self {
        self.persists_on_death = persists;
        self
    }
}

/// One live zone.
#[derive(Clone, Debug)]
pub struct Zone {
    id: ZoneId,
    effect_type_id: String,
    effect_overrides: Option<EffectOverrides>,
    pub position: Vec3,
    pub shape: Shape,
    attached_to: Option<Attachment>,
    evolution: Option<Evolution>,
    duration: Option<f32>,
    elapsed: f32,
    persists_on_death: bool,
    source: Option<EntityId>,
    entities_inside: HashSet<EntityId>,
    reapply_interval: f32,
    reapply_timers: HashMap<EntityId, f32>,
    /// Snapshot of the resolved type's `visual` block, for telegraphs.
    visual: Option<Value>,
}

impl Zone {
    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn effect_type_id(&self) -> &str {
        &self.effect_type_id
    }

    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn remaining(&self) -> Option<f32> {
        self.duration.map(|d| (d - self.elapsed).max(0.0))
    }

    pub fn is_expired(&self) -> bool {
        self.duration.is_some_and(|d| self.elapsed >= d)
    }

    pub fn entities_inside(&self) -> &HashSet<EntityId> {
        &self.entities_inside
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.shape.contains(self.position, point)
    }

    /// Rendering parameters passed through verbatim from the effect type.
    pub fn visual(&self) -> Option<&Value> {
        self.visual.as_ref()
    }

    fn apply_options(&self) -> ApplyOptions {
        let mut opts = match &self.effect_overrides {
            Some(overrides) => ApplyOptions::from_overrides(overrides.clone()),
            None => ApplyOptions::new(),
        };
        if let Some(source) = self.source {
            opts = opts.with_source(source);
        }
        opts.with_zone(self.id)
    }
}

/// Owner of every spatial effect zone.
#[derive(Debug, Default)]
pub struct ZoneManager {
    zones: Vec<Zone>,
    next_id: u64,
    events: Vec<ZoneEvent>,
}

impl ZoneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zone from a placement request, snapshotting the resolved
    /// type's visual block. An unknown effect type is warn-logged; the zone
    /// still spawns and its apply calls no-op with the same warning.
    pub fn spawn(&mut self, request: ZoneRequest, engine: &EffectEngine) -> ZoneId {
        let visual = match engine.catalog().resolve(&request.effect_type_id) {
            Some(resolved) => resolved.visual,
            None => {
                tracing::warn!(type_id = %request.effect_type_id, "zone references unknown effect type");
                None
            }
        };

        let id = ZoneId(self.next_id);
        self.next_id += 1;
        self.zones.push(Zone {
            id,
            effect_type_id: request.effect_type_id,
            effect_overrides: request.effect_overrides,
            position: request.position,
            shape: request.shape,
            attached_to: request.attached_to,
            evolution: request.evolution,
            duration: request.duration,
            elapsed: 0.0,
            persists_on_death: request.persists_on_death,
            source: request.source,
            entities_inside: HashSet::new(),
            reapply_interval: request.reapply_interval.max(0.0),
            reapply_timers: HashMap::new(),
            visual,
        });
        tracing::debug!(zone = %id, "zone spawned");
        id
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Takes all containment/teardown events accumulated since the last
    /// drain.
    pub fn drain_events(&mut self) -> Vec<ZoneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advances every zone by `dt` milliseconds.
    ///
    /// Must run after the host has written entity positions for the frame,
    /// so containment decisions never use stale positions. Per zone:
    /// recompute attachment, evolve the shape, then diff containment per
    /// entity (enter applies the effect, exit strips it, staying inside
    /// accrues the reapply timer). Expired zones are torn down afterwards.
    pub fn update(&mut self, dt: f32, engine: &mut EffectEngine) {
        let handles = engine.handles();

        for index in 0..self.zones.len() {
            let zone = &mut self.zones[index];
            zone.elapsed += dt;

            if let Some(attachment) = zone.attached_to {
                // A despawned anchor leaves the zone at its last position.
                if let Some(anchor) = engine.entity(attachment.entity) {
                    zone.position = anchor.position + attachment.offset;
                }
            }

            if let Some(evolution) = &mut zone.evolution {
                let next = evolution.advance(zone.shape.size(), dt);
                zone.shape.set_size(next);
            }

            // Entities that despawned while inside: the component died with
            // them, only the bookkeeping needs dropping.
            zone.entities_inside.retain(|e| engine.entity(*e).is_some());
            zone.reapply_timers.retain(|e, _| engine.entity(*e).is_some());

            for &entity in &handles {
                let Some(record) = engine.entity(entity) else {
                    continue;
                };
                let is_inside = zone.shape.contains(zone.position, record.position);
                let was_inside = zone.entities_inside.contains(&entity);

                if is_inside && !was_inside {
                    engine.apply_effect(entity, &zone.effect_type_id, zone.apply_options());
                    zone.entities_inside.insert(entity);
                    zone.reapply_timers.insert(entity, 0.0);
                    self.events.push(ZoneEvent::Entered {
                        zone: zone.id,
                        entity,
                    });
                    tracing::debug!(zone = %zone.id, %entity, "entity entered zone");
                } else if !is_inside && was_inside {
                    engine.remove_effects_by_zone(entity, zone.id);
                    zone.entities_inside.remove(&entity);
                    zone.reapply_timers.remove(&entity);
                    self.events.push(ZoneEvent::Exited {
                        zone: zone.id,
                        entity,
                    });
                    tracing::debug!(zone = %zone.id, %entity, "entity exited zone");
                } else if is_inside && zone.reapply_interval > 0.0 {
                    let timer = zone.reapply_timers.entry(entity).or_insert(0.0);
                    *timer += dt;
                    if *timer >= zone.reapply_interval {
                        *timer = 0.0;
                        // Subject to the effect type's own stacking rule.
                        engine.apply_effect(entity, &zone.effect_type_id, zone.apply_options());
                    }
                }
            }
        }

        // Teardown pass, reverse index order so swap_remove cannot skip.
        for index in (0..self.zones.len()).rev() {
            if self.zones[index].is_expired() {
                let zone = self.zones.swap_remove(index);
                tracing::debug!(zone = %zone.id, "zone expired");
                Self::tear_down(zone, engine, &mut self.events);
            }
        }
    }

    /// Explicitly removes a zone, stripping its granted effects first.
    pub fn remove_zone(&mut self, id: ZoneId, engine: &mut EffectEngine) -> bool {
        let Some(index) = self.zones.iter().position(|z| z.id == id) else {
            return false;
        };
        let zone = self.zones.swap_remove(index);
        Self::tear_down(zone, engine, &mut self.events);
        true
    }

    /// Removes every non-persistent zone whose source is `source`.
    pub fn on_zone_source_death(&mut self, source: EntityId, engine: &mut EffectEngine) {
        for index in (0..self.zones.len()).rev() {
            let zone = &self.zones[index];
            if zone.source == Some(source) && !zone.persists_on_death {
                let zone = self.zones.swap_remove(index);
                Self::tear_down(zone, engine, &mut self.events);
            }
        }
    }

    fn tear_down(zone: Zone, engine: &mut EffectEngine, events: &mut Vec<ZoneEvent>) {
        for &entity in &zone.entities_inside {
            engine.remove_effects_by_zone(entity, zone.id);
            events.push(ZoneEvent::Exited {
                zone: zone.id,
                entity,
            });
        }
        events.push(ZoneEvent::Expired { zone: zone.id });
    }
}
