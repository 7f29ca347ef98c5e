//! Narrow phase: exact overlap tests for sphere–sphere and sphere–cuboid.

use glam::Vec3;

use crate::contact::Contact;
use crate::response::{resolve, ContactParams, CuboidResponder, SphereResponder};

/// Overlap between two spheres. Touching spheres do not collide.
pub fn sphere_sphere(center_a: Vec3, radius_a: f32, center_b: Vec3, radius_b: f32) -> Option<Contact> {
    let delta = center_a - center_b;
    let distance_sq = delta.length_squared();
    let reach = radius_a + radius_b;
    if distance_sq >= reach * reach {
        return None;
    }

    let distance = distance_sq.sqrt();
    let normal = delta / distance;
    Some(Contact {
        normal,
        translation: normal * (reach - distance),
    })
}

/// Overlap between a sphere and an axis-aligned box.
///
/// Measured from the closest point of the box to the sphere centre, so a
/// centre lying inside the box yields an undefined normal.
pub fn sphere_cuboid(center: Vec3, radius: f32, minimum: Vec3, maximum: Vec3) -> Option<Contact> {
    let closest = center.max(minimum).min(maximum);
    let delta = center - closest;
    let distance_sq = delta.length_squared();
    if distance_sq > radius * radius {
        return None;
    }

    let distance = distance_sq.sqrt();
    let normal = delta / distance;
    Some(Contact {
        normal,
        translation: normal * (radius - distance),
    })
}

/// Detects and resolves a sphere–sphere contact.
pub fn respond_to_sphere<A, B>(a: &mut A, b: &mut B, params: &ContactParams) -> bool
where
    A: SphereResponder + ?Sized,
    B: SphereResponder + ?Sized,
{
    match sphere_sphere(a.center(), a.radius(), b.center(), b.radius()) {
        Some(contact) => resolve(a, b, &contact, params),
        None => false,
    }
}

/// Detects and resolves a sphere–cuboid contact.
pub fn respond_to_cuboid<A, B>(a: &mut A, b: &mut B, params: &ContactParams) -> bool
where
    A: SphereResponder + ?Sized,
    B: CuboidResponder + ?Sized,
{
    match sphere_cuboid(a.center(), a.radius(), b.minimum(), b.maximum()) {
        Some(contact) => resolve(a, b, &contact, params),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_spheres_do_not_collide() {
        assert!(sphere_sphere(Vec3::ZERO, 0.5, Vec3::X, 0.5).is_none());
        let c = sphere_sphere(Vec3::ZERO, 0.6, Vec3::X, 0.5).unwrap();
        assert!((c.normal + Vec3::X).length() < 1e-6);
        assert!((c.depth() - 0.1).abs() < 1e-5);
    }

    #[test]
    fn sphere_above_box_pushed_up() {
        let c = sphere_cuboid(Vec3::new(0.0, 1.05, 0.0), 0.1, Vec3::splat(-1.0), Vec3::ONE).unwrap();
        assert!((c.normal - Vec3::Y).length() < 1e-6);
        assert!((c.depth() - 0.05).abs() < 1e-5);
    }
}
