//! Spring nodes: the point masses of the cloth.

use glam::Vec3;
use weft_contact::{CollisionResponder, SpatialHashable, SphereResponder};
use weft_types::NodeId;

use crate::integrator::{IntegrationState, Integrator, NodeIntegrator};

/// A point mass with a collision sphere.
///
/// Forces are accumulated between integration sub-steps and cleared by
/// [`apply_force`](Self::apply_force).
#[derive(Debug, Clone)]
pub struct SpringNode {
    id: NodeId,
    position: Vec3,
    velocity: Vec3,
    radius: f32,
    inverse_mass: f32,
    force: Vec3,
    start_position: Vec3,
    integrator: NodeIntegrator,
}

impl SpringNode {
    pub fn new(
        id: NodeId,
        position: Vec3,
        radius: f32,
        inverse_mass: f32,
        integrator: NodeIntegrator,
    ) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            radius,
            inverse_mass,
            force: Vec3::ZERO,
            start_position: position,
            integrator,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn start_position(&self) -> Vec3 {
        self.start_position
    }

    /// Force accumulated for the current sub-step.
    pub fn force(&self) -> Vec3 {
        self.force
    }

    pub fn integrator(&self) -> &NodeIntegrator {
        &self.integrator
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Integrates one sub-step under the accumulated force plus gravity,
    /// then clears the accumulator.
    pub fn apply_force(&mut self, gravity: Vec3, delta_time: f32) {
        let acceleration = self.force * self.inverse_mass + gravity;
        let next = self.integrator.integrate(
            acceleration,
            delta_time,
            IntegrationState::new(self.position, self.velocity),
        );
        self.position = next.position;
        self.velocity = next.velocity;
        self.force = Vec3::ZERO;
    }

    /// Moves the node towards `position`.
    ///
    /// With `update_velocity` the node is not teleported; its velocity is
    /// set so the next tick of length `fixed_delta_time` carries it there.
    /// Otherwise the position is set directly and the velocity zeroed.
    pub fn snap_to(&mut self, position: Vec3, update_velocity: bool, fixed_delta_time: f32) {
        if update_velocity {
            self.velocity = (position - self.position) / fixed_delta_time;
        } else {
            self.velocity = Vec3::ZERO;
            self.position = position;
        }
    }

    /// Returns to the start position at rest with empty history.
    pub fn reset_to_initial_state(&mut self) {
        self.position = self.start_position;
        self.velocity = Vec3::ZERO;
        self.force = Vec3::ZERO;
        self.integrator.reset_internal_state();
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.velocity.length_squared() / self.inverse_mass
    }
}

impl CollisionResponder for SpringNode {
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    fn apply_collision_effect(&mut self, translation: Vec3, impulse: Vec3) {
        self.position += translation * self.inverse_mass;
        self.velocity += impulse * self.inverse_mass;
    }
}

impl SphereResponder for SpringNode {
    fn center(&self) -> Vec3 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

impl SpatialHashable for SpringNode {
    fn centroid(&self) -> Vec3 {
        self.position
    }

    /// The bounding cube of the collision sphere.
    fn size(&self) -> Vec3 {
        Vec3::splat(2.0 * self.radius)
    }
}
