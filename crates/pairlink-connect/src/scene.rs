//! Scene and feedback collaborators

use glam::Vec3;
use pairlink_world::EntityId;

/// Scene ownership queries the orchestrator consumes
///
/// `position` returning `None` is the existence probe for entities destroyed
/// mid-tick by an unrelated system; callers treat it as a no-op, not an
/// error.
pub trait Scene {
    /// Current world-space position of an object, if it still exists
    fn position(&self, entity: EntityId) -> Option<Vec3>;

    /// Move an object to a world-space position
    fn set_position(&mut self, entity: EntityId, position: Vec3);

    /// Toggle an object's visibility
    fn set_visible(&mut self, entity: EntityId, visible: bool);
}

/// Success-feedback signal, fire-and-forget
pub trait FeedbackSink {
    /// A pair connected; play whatever the host wants (sound, emoji, ...)
    fn success(&mut self);
}
