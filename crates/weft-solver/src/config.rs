//! Physics configuration.
//!
//! A flat, read-only set of named parameters shared by every node and
//! damper of a processor. Built once (usually deserialized from TOML),
//! validated, then only ever borrowed.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weft_contact::ContactParams;
use weft_types::constants::{
    DEFAULT_DELTA_TIME_DIVISOR, DEFAULT_FIXED_DT, GRAVITY, MAX_DELTA_TIME_DIVISOR,
};
use weft_types::{WeftError, WeftResult};

use crate::integrator::NodeIntegrator;

/// Which integration scheme the CPU backend uses for every node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationType {
    ExplicitEuler,
    #[default]
    VelocityVerlet,
    Rk4,
}

impl IntegrationType {
    /// A fresh integrator of this kind with empty history.
    pub fn create_integrator(self) -> NodeIntegrator {
        match self {
            IntegrationType::ExplicitEuler => NodeIntegrator::explicit_euler(),
            IntegrationType::VelocityVerlet => NodeIntegrator::velocity_verlet(),
            IntegrationType::Rk4 => NodeIntegrator::rk4(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntegrationType::ExplicitEuler => "explicit_euler",
            IntegrationType::VelocityVerlet => "velocity_verlet",
            IntegrationType::Rk4 => "rk4",
        }
    }
}

/// Role of a spring damper, which selects its spring constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamperType {
    /// Structural spring between direct grid neighbours.
    Elastic,
    /// Diagonal spring resisting in-plane shearing.
    Shear,
    /// Skip-one spring resisting folding.
    Bend,
    /// Structural spring derived from a mesh edge.
    MeshElastic,
    /// Shear spring derived from mesh triangles.
    MeshShear,
}

impl DamperType {
    pub const ALL: [DamperType; 5] = [
        DamperType::Elastic,
        DamperType::Shear,
        DamperType::Bend,
        DamperType::MeshElastic,
        DamperType::MeshShear,
    ];
}

/// Configuration for a spring processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Integration sub-steps per tick.
    pub delta_time_divisor: u32,

    /// Scale applied to `base_gravity`.
    pub gravity_multiplier: f32,

    /// Unscaled gravity vector in m/s².
    pub base_gravity: Vec3,

    pub integration_type: IntegrationType,

    pub elastic_spring_constant: f32,
    pub shear_spring_constant: f32,
    pub bend_spring_constant: f32,
    pub mesh_elastic_spring_constant: f32,
    pub mesh_shear_spring_constant: f32,

    /// Inverse mass shared by every node.
    pub inverse_mass: f32,

    /// Damping coefficient shared by every damper.
    pub damping: f32,

    /// Coefficient of restitution, in `[0, 1]`.
    pub restitution: f32,

    /// Coefficient of friction, in `[0, 1]`.
    pub friction: f32,

    /// Host fixed tick length, used to turn a snap offset into a velocity.
    pub fixed_delta_time: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            delta_time_divisor: DEFAULT_DELTA_TIME_DIVISOR,
            gravity_multiplier: 0.25,
            base_gravity: Vec3::new(0.0, -GRAVITY, 0.0),
            integration_type: IntegrationType::VelocityVerlet,
            elastic_spring_constant: 5400.0,
            shear_spring_constant: 3000.0,
            bend_spring_constant: 2400.0,
            mesh_elastic_spring_constant: 2400.0,
            mesh_shear_spring_constant: 2400.0,
            inverse_mass: 0.125,
            damping: 38.0,
            restitution: 0.02,
            friction: 0.95,
            fixed_delta_time: DEFAULT_FIXED_DT,
        }
    }
}

impl PhysicsConfig {
    /// Stiffer cloth: doubled spring constants, heavier damping.
    pub fn stiff() -> Self {
        let base = Self::default();
        Self {
            elastic_spring_constant: base.elastic_spring_constant * 2.0,
            shear_spring_constant: base.shear_spring_constant * 2.0,
            bend_spring_constant: base.bend_spring_constant * 2.0,
            mesh_elastic_spring_constant: base.mesh_elastic_spring_constant * 2.0,
            mesh_shear_spring_constant: base.mesh_shear_spring_constant * 2.0,
            damping: 60.0,
            delta_time_divisor: 30,
            ..base
        }
    }

    /// Softer cloth: halved spring constants, lighter damping.
    pub fn soft() -> Self {
        let base = Self::default();
        Self {
            elastic_spring_constant: base.elastic_spring_constant * 0.5,
            shear_spring_constant: base.shear_spring_constant * 0.5,
            bend_spring_constant: base.bend_spring_constant * 0.5,
            mesh_elastic_spring_constant: base.mesh_elastic_spring_constant * 0.5,
            mesh_shear_spring_constant: base.mesh_shear_spring_constant * 0.5,
            damping: 20.0,
            ..base
        }
    }

    /// Effective gravity acceleration.
    pub fn gravity(&self) -> Vec3 {
        self.base_gravity * self.gravity_multiplier
    }

    pub fn spring_constant_for(&self, kind: DamperType) -> f32 {
        match kind {
            DamperType::Elastic => self.elastic_spring_constant,
            DamperType::Shear => self.shear_spring_constant,
            DamperType::Bend => self.bend_spring_constant,
            DamperType::MeshElastic => self.mesh_elastic_spring_constant,
            DamperType::MeshShear => self.mesh_shear_spring_constant,
        }
    }

    pub fn contact_params(&self) -> ContactParams {
        ContactParams {
            restitution: self.restitution,
            friction: self.friction,
        }
    }

    /// Length of one integration sub-step for a tick of `delta_time`.
    pub fn sub_delta_time(&self, delta_time: f32) -> f32 {
        delta_time / self.delta_time_divisor as f32
    }

    /// Rejects out-of-range parameters.
    pub fn validate(&self) -> WeftResult<()> {
        if !(1..=MAX_DELTA_TIME_DIVISOR).contains(&self.delta_time_divisor) {
            return Err(WeftError::InvalidConfig(format!(
                "delta_time_divisor must be in 1..={MAX_DELTA_TIME_DIVISOR}, got {}",
                self.delta_time_divisor
            )));
        }
        if !(self.inverse_mass.is_finite() && self.inverse_mass > 0.0) {
            return Err(WeftError::InvalidConfig(format!(
                "inverse_mass must be positive, got {}",
                self.inverse_mass
            )));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(WeftError::InvalidConfig(format!(
                "restitution must be in [0, 1], got {}",
                self.restitution
            )));
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return Err(WeftError::InvalidConfig(format!(
                "friction must be in [0, 1], got {}",
                self.friction
            )));
        }
        if !(self.damping.is_finite() && self.damping >= 0.0) {
            return Err(WeftError::InvalidConfig(format!(
                "damping must be non-negative, got {}",
                self.damping
            )));
        }
        for kind in DamperType::ALL {
            let k = self.spring_constant_for(kind);
            if !(k.is_finite() && k >= 0.0) {
                return Err(WeftError::InvalidConfig(format!(
                    "{kind:?} spring constant must be non-negative, got {k}"
                )));
            }
        }
        if !(self.fixed_delta_time.is_finite() && self.fixed_delta_time > 0.0) {
            return Err(WeftError::InvalidConfig(format!(
                "fixed_delta_time must be positive, got {}",
                self.fixed_delta_time
            )));
        }
        if !self.gravity().is_finite() {
            return Err(WeftError::InvalidConfig("gravity must be finite".into()));
        }
        Ok(())
    }
}
