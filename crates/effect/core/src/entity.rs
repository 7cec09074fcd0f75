//! Tracked entities and their generational handles.
//!
//! Every entity the engine touches lives in an [`EntityArena`]. Handles are
//! generational: despawning a slot bumps its generation, so a stale
//! [`EntityId`] held by a timer or a zone resolves to `None` instead of
//! aliasing whatever entity reuses the slot.

use std::fmt;

use glam::Vec3;

use crate::component::EntityEffects;

/// Unique, generation-checked identifier for a tracked entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Broad classification used by effect target filters.
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
pub enum EntityKind {
    /// The protagonist. At most one is expected, though the arena does not
    /// enforce it.
    Player,
    #[default]
    Enemy,
}

/// State the engine tracks per entity.
///
/// The host owns movement and writes `position` each frame before zone
/// evaluation runs. The effects component is always present; it is created
/// with the record so no call path ever has to heal a missing one.
#[derive(Clone, Debug, Default)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub position: Vec3,
    pub health: f32,
    pub max_health: f32,
    pub(crate) effects: EntityEffects,
}

impl EntityRecord {
    pub fn new(kind: EntityKind, position: Vec3, max_health: f32) -> Self {
        Self {
            kind,
            position,
            health: max_health,
            max_health,
            effects: EntityEffects::default(),
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// Read-only view of the entity's effect state.
    pub fn effects(&self) -> &EntityEffects {
        &self.effects
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    record: Option<EntityRecord>,
}

/// Slot arena owning every tracked entity.
#[derive(Clone, Debug, Default)]
pub struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, record: EntityRecord) -> EntityId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.record = Some(record);
                EntityId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                EntityId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Removes an entity, invalidating every outstanding handle to it.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityRecord> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let record = slot.record.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(record)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.record.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.record.as_mut()
    }

    /// Stable snapshot of live handles, safe to iterate while mutating.
    pub fn handles(&self) -> Vec<EntityId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.record.is_some())
            .map(|(index, slot)| EntityId {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.record.as_ref().map(|record| {
                (
                    EntityId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    record,
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.record.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EntityRecord {
        EntityRecord::new(EntityKind::Enemy, Vec3::ZERO, 100.0)
    }

    #[test]
    fn spawn_and_lookup() {
        let mut arena = EntityArena::new();
        let id = arena.spawn(record());
        assert!(arena.contains(id));
        assert_eq!(arena.get(id).unwrap().health, 100.0);
    }

    #[test]
    fn despawn_invalidates_handle() {
        let mut arena = EntityArena::new();
        let id = arena.spawn(record());
        assert!(arena.despawn(id).is_some());
        assert!(!arena.contains(id));
        assert!(arena.despawn(id).is_none());
    }

    #[test]
    fn reused_slot_gets_new_generation() {
        let mut arena = EntityArena::new();
        let stale = arena.spawn(record());
        arena.despawn(stale);
        let fresh = arena.spawn(record());

        assert_ne!(stale, fresh);
        assert!(arena.get(stale).is_none());
        assert!(arena.get(fresh).is_some());
    }

    #[test]
    fn handles_snapshot_skips_dead_slots() {
        let mut arena = EntityArena::new();
        let a = arena.spawn(record());
        let b = arena.spawn(record());
        arena.despawn(a);

        assert_eq!(arena.handles(), vec![b]);
        assert_eq!(arena.len(), 1);
    }
}
