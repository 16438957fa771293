//! Spatial indices for the Barnes-Hut engine (§4.3): three layouts sharing
//! one multipole-acceptance criterion and bounding-box bookkeeping, and two
//! traversal strategies over whichever layout is selected.

pub mod heap;
pub mod heap_stackless;
pub mod tree;

use crate::types::{Coord, Vec3};

/// Per-body cycle (one tree walk per body) vs. dual-tree nested-tree walk
/// (§4.3/§4.4): both must agree to within 1e-14 at fixed theta (§8 property 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraverseType {
    Cycle,
    NestedTree,
}

/// A node's summary: total mass, center of mass, and the axis-aligned
/// bounding box of everything beneath it. `size()` is the `R` of the
/// multipole-acceptance criterion `D > theta * R`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeAggregate {
    pub mass: Coord,
    pub com: Vec3,
    pub min: Vec3,
    pub max: Vec3,
}

impl NodeAggregate {
    #[inline]
    pub fn size(&self) -> Coord {
        let d = self.max - self.min;
        d.x.max(d.y).max(d.z) / 2.0
    }

    #[inline]
    fn combine(left: NodeAggregate, right: NodeAggregate) -> NodeAggregate {
        let total_mass = left.mass + right.mass;
        let com = if total_mass > 0.0 {
            (left.com * left.mass + right.com * right.mass) / total_mass
        } else {
            Vec3::ZERO
        };
        NodeAggregate {
            mass: total_mass,
            com,
            min: left.min.min(&right.min),
            max: left.max.max(&right.max),
        }
    }
}

/// A spatial index built once per `fcompute` call (§4.3: "rebuilt from
/// scratch every force evaluation; no incremental update") and queried once
/// per body (or pair of subtrees, for [`TraverseType::NestedTree`]).
pub trait SpatialIndex: Send + Sync {
    fn build(positions: &[Vec3], mass: &[Coord]) -> Self
    where
        Self: Sized;

    fn accelerate(
        &self,
        positions: &[Vec3],
        g: Coord,
        eps2: Coord,
        theta: Coord,
        traverse: TraverseType,
    ) -> Vec<Vec3>;
}

/// `D > theta * R`: true means "accept this node as a single mass", i.e.
/// stop descending (§4.3).
#[inline]
pub(crate) fn mac_satisfied(size: Coord, dist_sqr: Coord, theta: Coord) -> bool {
    let limit = theta * size;
    dist_sqr > limit * limit
}

/// Newtonian softened acceleration contribution of a single mass summary
/// acting at `com` on a point at `at`, shared by every layout's leaf/MAC
/// evaluation.
#[inline]
pub(crate) fn contribution(com: Vec3, mass: Coord, at: Vec3, g: Coord, eps2: Coord) -> Vec3 {
    let d = com - at;
    let d2 = d.norm_sqr() + eps2;
    let inv_d3 = d2.powf(-1.5);
    d * (g * mass * inv_d3)
}

pub(crate) fn bounding_box(indices: &[usize], positions: &[Vec3]) -> (Vec3, Vec3) {
    let mut min = positions[indices[0]];
    let mut max = positions[indices[0]];
    for &i in &indices[1..] {
        min = min.min(&positions[i]);
        max = max.max(&positions[i]);
    }
    (min, max)
}

pub(crate) fn longest_axis(min: Vec3, max: Vec3) -> usize {
    let d = max - min;
    if d.x >= d.y && d.x >= d.z {
        0
    } else if d.y >= d.z {
        1
    } else {
        2
    }
}
