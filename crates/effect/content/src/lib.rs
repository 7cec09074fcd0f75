//! Data-driven content loaders for the effect engine.
//!
//! This crate converts author files into `effect-core` values:
//! - Effect-type tables (data-driven via RON)
//! - Modifier-aggregation tables (data-driven via TOML)
//! - Engine configuration (data-driven via TOML)
//!
//! Content is loaded once at startup and immutable thereafter; validation
//! (parent cycles, unknown parents) happens here, at load time, not at
//! first use.
//!
//! All loaders use effect-core types directly with serde for RON/TOML
//! deserialization.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, EffectTableLoader, ModifierTableLoader};
