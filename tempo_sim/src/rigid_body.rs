//! Rigid body component.
//!
//! Links an entity's `Transform` to a body owned by the physics world. The
//! component never owns the body: it holds a handle, and destruction is only
//! requested here. Requested bodies wait in `dispose_list` until the stepper
//! reaches its disposal point at the end of a frame.
//!
//! Remove the component with `PhysicsStepper::detach`, not `World::remove`,
//! or its bodies are never destroyed.

use tempo_shared::{math::Vec2, physics::BodyId};

/// Per-entity bridge between a visual transform and a physics body.
#[derive(Debug, Clone, Default)]
pub struct RigidBody {
    pub(crate) body: Option<BodyId>,
    /// Pose at the start of the most recent fixed step, physics units.
    pub(crate) previous_position: Vec2,
    pub(crate) previous_angle: f32,
    pub(crate) out_of_sync: bool,
    pub(crate) dispose_list: Vec<BodyId>,
}

impl RigidBody {
    /// A component with no body attached yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A component attached to `body`. The transform is pushed into the
    /// body on the next frame.
    pub fn with_body(body: BodyId) -> Self {
        Self {
            body: Some(body),
            out_of_sync: true,
            ..Self::default()
        }
    }

    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Attaches `body`, queueing any previous body for disposal.
    pub fn attach(&mut self, body: BodyId) {
        if let Some(old) = self.body.replace(body) {
            self.dispose_list.push(old);
        }
        self.out_of_sync = true;
    }

    /// Detaches the current body and queues it for disposal.
    /// Returns the queued handle, if any.
    pub fn queue_dispose(&mut self) -> Option<BodyId> {
        let old = self.body.take()?;
        self.dispose_list.push(old);
        self.out_of_sync = false;
        Some(old)
    }

    /// Flags that the transform was edited and must overwrite the body
    /// before the next step (teleports, scripted moves).
    pub fn mark_out_of_sync(&mut self) {
        self.out_of_sync = true;
    }

    pub fn is_out_of_sync(&self) -> bool {
        self.out_of_sync
    }

    /// Pose recorded before the most recent step. Only meaningful while a
    /// non-static body is attached.
    pub fn previous_pose(&self) -> (Vec2, f32) {
        (self.previous_position, self.previous_angle)
    }

    /// Bodies waiting for the end-of-frame disposal point.
    pub fn pending_disposals(&self) -> &[BodyId] {
        &self.dispose_list
    }
}
