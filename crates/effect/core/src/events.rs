//! Outbound notifications for rendering/audio/UI collaborators.
//!
//! The core never draws or plays anything. It records what happened; the
//! host drains these queues each frame and mirrors them however it likes.

use glam::Vec3;

use crate::entity::EntityId;
use crate::zone::ZoneId;

/// Numeric feedback emitted by a periodic tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedbackEvent {
    pub entity: EntityId,
    /// Entity position at tick time.
    pub position: Vec3,
    /// Signed amount: negative for damage, positive for healing.
    pub amount: f32,
    /// Color tag from the effect type's `visual` block, if any.
    pub color: Option<String>,
}

/// Containment transitions and zone teardown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneEvent {
    Entered { zone: ZoneId, entity: EntityId },
    Exited { zone: ZoneId, entity: EntityId },
    /// The zone left play: duration expiry or explicit removal. Contained
    /// entities receive an `Exited` event first.
    Expired { zone: ZoneId },
}
