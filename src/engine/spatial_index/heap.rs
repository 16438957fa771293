//! The implicit heap layout (§4.3): a breadth-first flat array where the
//! children of slot `k` live at `2k+1` and `2k+2`, padded out to a complete
//! binary tree with zero-mass phantom leaves so every internal slot has
//! both children present (§9 open question (b): padding policy).

use rayon::prelude::*;

use super::{NodeAggregate, SpatialIndex, TraverseType, contribution, longest_axis, mac_satisfied};
use crate::types::{Coord, Vec3};

fn next_pow2(n: usize) -> usize {
    let mut p = 1;
    while p < n.max(1) {
        p *= 2;
    }
    p
}

fn bounding_box_bodies(bodies: &[usize], positions: &[Vec3]) -> (Vec3, Vec3) {
    let mut min = None;
    let mut max = None;
    for &i in bodies {
        let p = positions[i];
        min = Some(match min {
            None => p,
            Some(m) => Vec3::min(&m, &p),
        });
        max = Some(match max {
            None => p,
            Some(m) => Vec3::max(&m, &p),
        });
    }
    (min.unwrap_or(Vec3::ZERO), max.unwrap_or(Vec3::ZERO))
}

/// Shared between [`HeapIndex`] and the stackless variant: builds the
/// aggregate array and the per-slot leaf body index. `capacity` (always a
/// power of two) is the number of leaf slots available to the subtree
/// rooted at `slot_idx`; the median split at each level divides the real
/// bodies in half (matching the pointer tree's own median split), never
/// the slot capacity, so an N that isn't a power of two doesn't skew the
/// tree topology toward one side (§9 open question (b): phantom padding
/// fills out whatever capacity the real bodies don't use).
pub(crate) fn build_aggregates(
    positions: &[Vec3],
    mass: &[Coord],
) -> (Vec<NodeAggregate>, Vec<Option<usize>>, usize) {
    let n = positions.len();
    let size = next_pow2(n);
    let arr_len = 2 * size - 1;
    let mut arr = vec![NodeAggregate::default(); arr_len];
    let mut leaf_body = vec![None; arr_len];

    let mut bodies: Vec<usize> = (0..n).collect();
    build_recursive(&mut bodies, positions, mass, size, 0, &mut arr, &mut leaf_body);
    (arr, leaf_body, size)
}

fn build_recursive(
    bodies: &mut [usize],
    positions: &[Vec3],
    mass: &[Coord],
    capacity: usize,
    slot_idx: usize,
    arr: &mut [NodeAggregate],
    leaf_body: &mut [Option<usize>],
) {
    if bodies.is_empty() {
        return;
    }

    if capacity == 1 {
        let i = bodies[0];
        arr[slot_idx] = NodeAggregate { mass: mass[i], com: positions[i], min: positions[i], max: positions[i] };
        leaf_body[slot_idx] = Some(i);
        return;
    }

    let (min, max) = bounding_box_bodies(bodies, positions);
    let axis = longest_axis(min, max);
    bodies.sort_by(|&i, &j| {
        positions[i]
            .component(axis)
            .partial_cmp(&positions[j].component(axis))
            .expect("non-NaN coordinate")
    });

    let mid = bodies.len() / 2;
    let (left, right) = bodies.split_at_mut(mid);
    let half_capacity = capacity / 2;
    let left_idx = 2 * slot_idx + 1;
    let right_idx = 2 * slot_idx + 2;
    build_recursive(left, positions, mass, half_capacity, left_idx, arr, leaf_body);
    build_recursive(right, positions, mass, half_capacity, right_idx, arr, leaf_body);
    arr[slot_idx] = NodeAggregate::combine(arr[left_idx], arr[right_idx]);
}

#[inline]
pub(crate) fn is_leaf(slot: usize, size: usize) -> bool {
    slot >= size - 1
}

fn accumulate_cycle(
    arr: &[NodeAggregate],
    leaf_body: &[Option<usize>],
    size: usize,
    slot: usize,
    at: Vec3,
    exclude: usize,
    g: Coord,
    eps2: Coord,
    theta: Coord,
    out: &mut Vec3,
) {
    let agg = arr[slot];
    if agg.mass == 0.0 {
        return;
    }

    if is_leaf(slot, size) {
        if leaf_body[slot] == Some(exclude) {
            return;
        }
        *out += contribution(agg.com, agg.mass, at, g, eps2);
        return;
    }

    let dist_sqr = (agg.com - at).norm_sqr();
    if mac_satisfied(agg.size(), dist_sqr, theta) {
        *out += contribution(agg.com, agg.mass, at, g, eps2);
        return;
    }

    accumulate_cycle(arr, leaf_body, size, 2 * slot + 1, at, exclude, g, eps2, theta, out);
    accumulate_cycle(arr, leaf_body, size, 2 * slot + 2, at, exclude, g, eps2, theta, out);
}

pub(crate) fn for_each_leaf(arr: &[NodeAggregate], leaf_body: &[Option<usize>], size: usize, slot: usize, f: &mut impl FnMut(usize)) {
    if arr[slot].mass == 0.0 {
        return;
    }
    if is_leaf(slot, size) {
        if let Some(i) = leaf_body[slot] {
            f(i);
        }
        return;
    }
    for_each_leaf(arr, leaf_body, size, 2 * slot + 1, f);
    for_each_leaf(arr, leaf_body, size, 2 * slot + 2, f);
}

pub(crate) fn apply_node_to_subtree(
    arr: &[NodeAggregate],
    leaf_body: &[Option<usize>],
    size: usize,
    source: usize,
    target: usize,
    positions: &[Vec3],
    g: Coord,
    eps2: Coord,
    out: &mut [Vec3],
) {
    let src = arr[source];
    for_each_leaf(arr, leaf_body, size, target, &mut |i| {
        out[i] += contribution(src.com, src.mass, positions[i], g, eps2);
    });
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn dual_recurse(
    arr: &[NodeAggregate],
    leaf_body: &[Option<usize>],
    size: usize,
    source: usize,
    target: usize,
    positions: &[Vec3],
    g: Coord,
    eps2: Coord,
    theta: Coord,
    out: &mut [Vec3],
) {
    let src = arr[source];
    let tgt = arr[target];
    if src.mass == 0.0 || tgt.mass == 0.0 {
        return;
    }

    let source_leaf = is_leaf(source, size);
    let target_leaf = is_leaf(target, size);
    if source_leaf && target_leaf && leaf_body[source] == leaf_body[target] {
        return;
    }

    let dist_sqr = (tgt.com - src.com).norm_sqr();
    let node_size = src.size().max(tgt.size());
    if mac_satisfied(node_size, dist_sqr, theta) || (source_leaf && target_leaf) {
        apply_node_to_subtree(arr, leaf_body, size, source, target, positions, g, eps2, out);
        return;
    }

    if src.size() >= tgt.size() && !source_leaf {
        dual_recurse(arr, leaf_body, size, 2 * source + 1, target, positions, g, eps2, theta, out);
        dual_recurse(arr, leaf_body, size, 2 * source + 2, target, positions, g, eps2, theta, out);
    } else if !target_leaf {
        dual_recurse(arr, leaf_body, size, source, 2 * target + 1, positions, g, eps2, theta, out);
        dual_recurse(arr, leaf_body, size, source, 2 * target + 2, positions, g, eps2, theta, out);
    } else {
        apply_node_to_subtree(arr, leaf_body, size, source, target, positions, g, eps2, out);
    }
}

pub struct HeapIndex {
    arr: Vec<NodeAggregate>,
    leaf_body: Vec<Option<usize>>,
    size: usize,
}

impl SpatialIndex for HeapIndex {
    fn build(positions: &[Vec3], mass: &[Coord]) -> Self {
        if positions.is_empty() {
            return HeapIndex { arr: Vec::new(), leaf_body: Vec::new(), size: 0 };
        }
        let (arr, leaf_body, size) = build_aggregates(positions, mass);
        HeapIndex { arr, leaf_body, size }
    }

    fn accelerate(
        &self,
        positions: &[Vec3],
        g: Coord,
        eps2: Coord,
        theta: Coord,
        traverse: TraverseType,
    ) -> Vec<Vec3> {
        let n = positions.len();
        if self.size == 0 {
            return vec![Vec3::ZERO; n];
        }

        match traverse {
            TraverseType::Cycle => (0..n)
                .into_par_iter()
                .map(|i| {
                    let mut acc = Vec3::ZERO;
                    accumulate_cycle(&self.arr, &self.leaf_body, self.size, 0, positions[i], i, g, eps2, theta, &mut acc);
                    acc
                })
                .collect(),
            TraverseType::NestedTree => {
                let mut out = vec![Vec3::ZERO; n];
                dual_recurse(&self.arr, &self.leaf_body, self.size, 0, 0, positions, g, eps2, theta, &mut out);
                out
            }
        }
    }
}
