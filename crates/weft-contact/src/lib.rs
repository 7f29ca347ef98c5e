//! # weft-contact
//!
//! Collision detection and contact response for spring-node cloth.
//!
//! The collision pipeline is split into three phases:
//! 1. **Broad phase**: [`SpatialHasher`], a uniform grid with O(1) removal
//! 2. **Narrow phase**: exact sphere–sphere and sphere–cuboid overlap tests
//! 3. **Contact response**: impulse with restitution and friction plus a
//!    mass-weighted separating translation
//!
//! Anything that takes part in a collision implements [`CollisionResponder`];
//! immovable scene shapes ([`ImmovableSphere`], [`ImmovableCuboid`]) report a
//! zero inverse mass and ignore the effects applied to them.

pub mod box_collider;
pub mod broad;
pub mod contact;
pub mod narrow;
pub mod response;
pub mod spatial_hash;
pub mod sphere;

pub use box_collider::ImmovableCuboid;
pub use broad::{GridBounds, SpatialHashable};
pub use contact::{Contact, ContactCounts};
pub use narrow::{respond_to_cuboid, respond_to_sphere};
pub use response::{
    compute_response, resolve, CollisionEffect, CollisionResponder, ContactParams,
    CuboidResponder, SphereResponder,
};
pub use spatial_hash::SpatialHasher;
pub use sphere::ImmovableSphere;
