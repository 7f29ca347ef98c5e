//! Spring dampers: damped springs connecting two nodes.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weft_types::NodeId;

use crate::config::{DamperType, PhysicsConfig};
use crate::node::SpringNode;

/// Force a damped spring exerts on its first endpoint.
///
/// `d = position_b - position_a`, and the damping term only uses the
/// relative velocity along `d`. The second endpoint receives the negation.
/// Coincident endpoints produce non-finite output.
pub fn spring_damper_force(
    position_a: Vec3,
    velocity_a: Vec3,
    position_b: Vec3,
    velocity_b: Vec3,
    rest_distance: f32,
    spring_constant: f32,
    damping: f32,
) -> Vec3 {
    let delta = position_b - position_a;
    let distance = delta.length();
    let direction = delta / distance;
    let relative_velocity = velocity_b - velocity_a;
    let damping_velocity = relative_velocity.dot(direction) * direction;
    spring_constant * (distance - rest_distance) * direction + damping * damping_velocity
}

/// A damped spring between two distinct nodes.
///
/// The spring constant is resolved from the damper type once, when the
/// damper is added, so a damper is self-contained after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringDamper {
    pub first: NodeId,
    pub second: NodeId,
    pub kind: DamperType,
    pub rest_distance: f32,
    pub spring_constant: f32,
    pub damping: f32,
}

impl SpringDamper {
    pub fn new(
        kind: DamperType,
        rest_distance: f32,
        first: NodeId,
        second: NodeId,
        config: &PhysicsConfig,
    ) -> Self {
        Self {
            first,
            second,
            kind,
            rest_distance,
            spring_constant: config.spring_constant_for(kind),
            damping: config.damping,
        }
    }

    /// Current force on the first endpoint.
    pub fn force(&self, nodes: &[SpringNode]) -> Vec3 {
        let a = &nodes[self.first.index()];
        let b = &nodes[self.second.index()];
        spring_damper_force(
            a.position(),
            a.velocity(),
            b.position(),
            b.velocity(),
            self.rest_distance,
            self.spring_constant,
            self.damping,
        )
    }

    /// Adds the spring force to both endpoints' accumulators.
    pub fn apply_spring_force(&self, nodes: &mut [SpringNode]) {
        let force = self.force(nodes);
        nodes[self.first.index()].add_force(force);
        nodes[self.second.index()].add_force(-force);
    }

    /// Elastic potential energy stored in the spring.
    pub fn potential_energy(&self, nodes: &[SpringNode]) -> f32 {
        let a = nodes[self.first.index()].position();
        let b = nodes[self.second.index()].position();
        let stretch = a.distance(b) - self.rest_distance;
        0.5 * self.spring_constant * stretch * stretch
    }
}
