//! # weft-solver
//!
//! Spring-mass cloth dynamics: configuration, integrators, nodes,
//! dampers, and the CPU implementation of the spring processor contract.
//!
//! ## Key Types
//!
//! - [`PhysicsConfig`]: flat, validated simulation parameters
//! - [`Integrator`]: explicit Euler, velocity Verlet and RK4 schemes
//! - [`SpringNode`] / [`SpringDamper`]: the point masses and the springs between them
//! - [`SpringProcessor`]: backend-independent processor contract
//! - [`CpuSpringProcessor`]: reference backend with node–node collisions

pub mod config;
pub mod cpu;
pub mod damper;
pub mod integrator;
pub mod node;
pub mod processor;

pub use config::{DamperType, IntegrationType, PhysicsConfig};
pub use cpu::CpuSpringProcessor;
pub use damper::{spring_damper_force, SpringDamper};
pub use integrator::{IntegrationState, Integrator, NodeIntegrator};
pub use node::SpringNode;
pub use processor::{Capabilities, NodeHandle, NodeHandleMut, SpringProcessor, TickReport};
