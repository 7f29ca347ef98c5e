//! Impulse-based contact response.
//!
//! Given a [`Contact`], the two bodies are pushed apart by a translation
//! split according to their inverse masses, and receive an impulse that
//! reflects the approaching component of their relative velocity scaled by
//! `1 + restitution`. Friction removes a share of the tangential relative
//! velocity. Bodies already separating are left untouched.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::contact::Contact;

/// Anything that can receive a collision response.
///
/// # Implementations
/// - `SpringNode` (in `weft-solver`): a movable cloth node
/// - [`ImmovableSphere`](crate::ImmovableSphere) and
///   [`ImmovableCuboid`](crate::ImmovableCuboid): static scene shapes
pub trait CollisionResponder {
    /// Current velocity.
    fn velocity(&self) -> Vec3;

    /// Inverse mass; zero for immovable bodies.
    fn inverse_mass(&self) -> f32;

    /// Applies an already mass-normalised translation and impulse.
    fn apply_collision_effect(&mut self, translation: Vec3, impulse: Vec3);
}

/// A responder whose collision shape is a sphere.
pub trait SphereResponder: CollisionResponder {
    fn center(&self) -> Vec3;
    fn radius(&self) -> f32;
}

/// A responder whose collision shape is an axis-aligned box.
pub trait CuboidResponder: CollisionResponder {
    fn minimum(&self) -> Vec3;
    fn maximum(&self) -> Vec3;
}

/// Material coefficients for a contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactParams {
    /// Fraction of approach speed returned after impact, in `[0, 1]`.
    pub restitution: f32,
    /// Fraction of tangential relative velocity removed, in `[0, 1]`.
    pub friction: f32,
}

/// Translation and impulse for the first body, divided by the summed
/// inverse mass. The second body receives the negation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEffect {
    pub translation: Vec3,
    pub impulse: Vec3,
}

/// Computes the response for a contact, or `None` if the bodies are
/// separating.
///
/// `relative_velocity` is the first body's velocity minus the second's.
/// A contact whose normal is undefined (coincident centres) compares as
/// NaN and is skipped.
pub fn compute_response(
    contact: &Contact,
    relative_velocity: Vec3,
    sum_inverse_mass: f32,
    params: &ContactParams,
) -> Option<CollisionEffect> {
    let v_dot_dir = relative_velocity.dot(contact.normal);
    if v_dot_dir.is_nan() || v_dot_dir > 0.0 {
        return None;
    }

    let impulse_length = -(1.0 + params.restitution) * v_dot_dir / sum_inverse_mass;
    let tangential = relative_velocity - contact.normal * v_dot_dir;
    let impulse =
        contact.normal * impulse_length - tangential * (params.friction / sum_inverse_mass);

    Some(CollisionEffect {
        translation: contact.translation / sum_inverse_mass,
        impulse,
    })
}

/// Resolves `contact` between two responders. Returns true if a response
/// was applied.
pub fn resolve<A, B>(a: &mut A, b: &mut B, contact: &Contact, params: &ContactParams) -> bool
where
    A: CollisionResponder + ?Sized,
    B: CollisionResponder + ?Sized,
{
    let sum_inverse_mass = a.inverse_mass() + b.inverse_mass();
    let relative_velocity = a.velocity() - b.velocity();
    match compute_response(contact, relative_velocity, sum_inverse_mass, params) {
        Some(effect) => {
            a.apply_collision_effect(effect.translation, effect.impulse);
            b.apply_collision_effect(-effect.translation, -effect.impulse);
            true
        }
        None => false,
    }
}
