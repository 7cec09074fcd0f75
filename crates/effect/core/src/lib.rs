//! Data-driven gameplay-effect engine.
//!
//! `effect-core` owns the rules for buffs, debuffs, and hazards: a catalog
//! of hierarchically-inheriting effect types, a rule-based aggregator that
//! folds every simultaneously-active effect into one modifier snapshot per
//! entity, the engine that applies, stacks, ticks, and expires effect
//! instances, and a spatial zone layer that grants and revokes effects by
//! geometric containment.
//!
//! The crate is pure state and rules. Rendering, audio, input, and physics
//! are collaborators: they feed in effect-type tables and zone placements,
//! and consume modifier snapshots and the outbound event queues. All state
//! mutation flows through [`engine::EffectEngine`] and [`zone::ZoneManager`],
//! once per frame, on one thread.

pub mod catalog;
pub mod component;
pub mod config;
pub mod engine;
pub mod entity;
pub mod events;
pub mod instance;
pub mod modifier;
pub mod zone;

pub use catalog::{
    CatalogError, EffectCatalog, EffectTypeDefinition, PeriodicSpec, PeriodicTemplate,
    ResolvedEffectType, StackRule, StackingSpec, TargetFilter, TargetSpec, matches,
};
pub use component::EntityEffects;
pub use config::EngineConfig;
pub use engine::{ApplyOutcome, BlockReason, EffectEngine};
pub use entity::{EntityArena, EntityId, EntityKind, EntityRecord};
pub use events::{FeedbackEvent, ZoneEvent};
pub use instance::{ApplyOptions, EffectInstance, EffectOverrides, InstanceId};
pub use modifier::{AggregationRule, ModifierRegistry, ModifierRule, Modifiers};
pub use zone::{
    Attachment, Evolution, EvolutionKind, Shape, Zone, ZoneId, ZoneManager, ZoneRequest,
};
