//! Per-node time integrators.
//!
//! Each node owns one integrator instance, so schemes with history
//! (velocity Verlet) keep that history per node. Acceleration is treated
//! as constant over a single sub-step by every scheme.

use glam::Vec3;

/// Position and velocity of a node, the state every integrator advances.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegrationState {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl IntegrationState {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self { position, velocity }
    }

    fn add_scaled(self, derivative: IntegrationState, scale: f32) -> Self {
        Self {
            position: self.position + derivative.position * scale,
            velocity: self.velocity + derivative.velocity * scale,
        }
    }
}

/// Trait for time integration schemes.
///
/// # Implementations
/// - [`ExplicitEuler`]: first order, position advanced with the old velocity
/// - [`VelocityVerlet`]: second order, remembers the previous acceleration
/// - [`Rk4`]: classical four-stage Runge–Kutta
pub trait Integrator: Send {
    /// Advances `state` by `delta_time` under `acceleration`.
    fn integrate(
        &mut self,
        acceleration: Vec3,
        delta_time: f32,
        state: IntegrationState,
    ) -> IntegrationState;

    /// Forgets any history, returning to a resting start state.
    fn reset_internal_state(&mut self);

    /// Returns the integrator's name.
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitEuler;

impl Integrator for ExplicitEuler {
    fn integrate(
        &mut self,
        acceleration: Vec3,
        delta_time: f32,
        state: IntegrationState,
    ) -> IntegrationState {
        IntegrationState {
            position: state.position + state.velocity * delta_time,
            velocity: state.velocity + acceleration * delta_time,
        }
    }

    fn reset_internal_state(&mut self) {}

    fn name(&self) -> &str {
        "explicit_euler"
    }
}

/// Velocity Verlet. The first step after construction or reset uses a
/// zero previous acceleration.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityVerlet {
    old_acceleration: Vec3,
}

impl VelocityVerlet {
    pub fn old_acceleration(&self) -> Vec3 {
        self.old_acceleration
    }
}

impl Integrator for VelocityVerlet {
    fn integrate(
        &mut self,
        acceleration: Vec3,
        delta_time: f32,
        state: IntegrationState,
    ) -> IntegrationState {
        let position = state.position
            + state.velocity * delta_time
            + self.old_acceleration * (delta_time * delta_time * 0.5);
        let velocity = state.velocity + (self.old_acceleration + acceleration) * (delta_time * 0.5);
        self.old_acceleration = acceleration;
        IntegrationState { position, velocity }
    }

    fn reset_internal_state(&mut self) {
        self.old_acceleration = Vec3::ZERO;
    }

    fn name(&self) -> &str {
        "velocity_verlet"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn integrate(
        &mut self,
        acceleration: Vec3,
        delta_time: f32,
        state: IntegrationState,
    ) -> IntegrationState {
        // (x, v)' = (v, a), independent of time.
        let derivative = |s: IntegrationState| IntegrationState::new(s.velocity, acceleration);

        let k1 = derivative(state);
        let k2 = derivative(state.add_scaled(k1, delta_time * 0.5));
        let k3 = derivative(state.add_scaled(k2, delta_time * 0.5));
        let k4 = derivative(state.add_scaled(k3, delta_time));

        let sixth = delta_time / 6.0;
        IntegrationState {
            position: state.position
                + (k1.position + (k2.position + k3.position) * 2.0 + k4.position) * sixth,
            velocity: state.velocity
                + (k1.velocity + (k2.velocity + k3.velocity) * 2.0 + k4.velocity) * sixth,
        }
    }

    fn reset_internal_state(&mut self) {}

    fn name(&self) -> &str {
        "rk4"
    }
}

/// The integrator owned by a node, dispatched without boxing.
#[derive(Debug, Clone, Copy)]
pub enum NodeIntegrator {
    ExplicitEuler(ExplicitEuler),
    VelocityVerlet(VelocityVerlet),
    Rk4(Rk4),
}

impl NodeIntegrator {
    pub fn explicit_euler() -> Self {
        NodeIntegrator::ExplicitEuler(ExplicitEuler)
    }

    pub fn velocity_verlet() -> Self {
        NodeIntegrator::VelocityVerlet(VelocityVerlet::default())
    }

    pub fn rk4() -> Self {
        NodeIntegrator::Rk4(Rk4)
    }

    fn inner(&mut self) -> &mut dyn Integrator {
        match self {
            NodeIntegrator::ExplicitEuler(i) => i,
            NodeIntegrator::VelocityVerlet(i) => i,
            NodeIntegrator::Rk4(i) => i,
        }
    }
}

impl Integrator for NodeIntegrator {
    fn integrate(
        &mut self,
        acceleration: Vec3,
        delta_time: f32,
        state: IntegrationState,
    ) -> IntegrationState {
        self.inner().integrate(acceleration, delta_time, state)
    }

    fn reset_internal_state(&mut self) {
        self.inner().reset_internal_state();
    }

    fn name(&self) -> &str {
        match self {
            NodeIntegrator::ExplicitEuler(i) => i.name(),
            NodeIntegrator::VelocityVerlet(i) => i.name(),
            NodeIntegrator::Rk4(i) => i.name(),
        }
    }
}
