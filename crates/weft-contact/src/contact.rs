//! Contact records produced by the narrow phase.

use std::ops::AddAssign;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A detected overlap between two colliders.
///
/// `normal` points from the second collider towards the first, and
/// `translation` is the full displacement that would move the first
/// collider out of the second if it were the only one to move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit separation direction (first minus second).
    pub normal: Vec3,
    /// Separating displacement for the first collider.
    pub translation: Vec3,
}

impl Contact {
    /// Penetration depth along the normal.
    pub fn depth(&self) -> f32 {
        self.translation.length()
    }
}

/// Per-tick contact statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCounts {
    /// Node pairs that reached the narrow phase.
    pub pairs_tested: u32,
    /// Node–node contacts that produced a response.
    pub node_contacts: u32,
    /// Node–scene contacts that produced a response.
    pub static_contacts: u32,
}

impl ContactCounts {
    /// All contacts that produced a response.
    pub fn total(&self) -> u32 {
        self.node_contacts + self.static_contacts
    }
}

impl AddAssign for ContactCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.pairs_tested += rhs.pairs_tested;
        self.node_contacts += rhs.node_contacts;
        self.static_contacts += rhs.static_contacts;
    }
}
