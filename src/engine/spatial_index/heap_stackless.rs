//! The stackless heap layout (§4.3): the same implicit heap array as
//! [`super::heap`], plus two precomputed "skip link" arrays that let the
//! per-body cycle traversal walk the tree with an explicit loop instead of
//! recursion — `dfs_next[k]` is where to go if slot `k` is descended into,
//! `dfs_skip[k]` is where to go once slot `k` (and everything under it) is
//! done with, whether because it was accepted by the MAC or because it is a
//! leaf. The nested-tree traversal still recurses pairwise (the skip-link
//! trick is specific to the single-source cycle walk) and is shared with
//! the plain heap layout's dual-tree recursion.

use rayon::prelude::*;

use super::heap::{build_aggregates, dual_recurse, is_leaf};
use super::{NodeAggregate, SpatialIndex, TraverseType, contribution, mac_satisfied};
use crate::types::{Coord, Vec3};

/// Sentinel "done" value for the skip-link walk; `arr.len()` always fits in
/// far fewer bits than `usize::MAX` for any tree this crate builds.
const DONE: usize = usize::MAX;

fn compute_links(size: usize, slot: usize, after: usize, dfs_next: &mut [usize], dfs_skip: &mut [usize]) {
    if is_leaf(slot, size) {
        dfs_next[slot] = after;
        dfs_skip[slot] = after;
        return;
    }
    let left = 2 * slot + 1;
    let right = 2 * slot + 2;
    dfs_next[slot] = left;
    dfs_skip[slot] = after;
    compute_links(size, left, right, dfs_next, dfs_skip);
    compute_links(size, right, after, dfs_next, dfs_skip);
}

pub struct StacklessHeapIndex {
    arr: Vec<NodeAggregate>,
    leaf_body: Vec<Option<usize>>,
    dfs_next: Vec<usize>,
    dfs_skip: Vec<usize>,
    size: usize,
}

fn accumulate_skip_links(
    arr: &[NodeAggregate],
    leaf_body: &[Option<usize>],
    dfs_next: &[usize],
    dfs_skip: &[usize],
    size: usize,
    at: Vec3,
    exclude: usize,
    g: Coord,
    eps2: Coord,
    theta: Coord,
) -> Vec3 {
    let mut acc = Vec3::ZERO;
    let mut cur = 0usize;
    while cur != DONE {
        let agg = arr[cur];
        if agg.mass == 0.0 {
            cur = dfs_skip[cur];
            continue;
        }

        if is_leaf(cur, size) {
            if leaf_body[cur] != Some(exclude) {
                acc += contribution(agg.com, agg.mass, at, g, eps2);
            }
            cur = dfs_skip[cur];
            continue;
        }

        let dist_sqr = (agg.com - at).norm_sqr();
        if mac_satisfied(agg.size(), dist_sqr, theta) {
            acc += contribution(agg.com, agg.mass, at, g, eps2);
            cur = dfs_skip[cur];
        } else {
            cur = dfs_next[cur];
        }
    }
    acc
}

impl SpatialIndex for StacklessHeapIndex {
    fn build(positions: &[Vec3], mass: &[Coord]) -> Self {
        if positions.is_empty() {
            return StacklessHeapIndex {
                arr: Vec::new(),
                leaf_body: Vec::new(),
                dfs_next: Vec::new(),
                dfs_skip: Vec::new(),
                size: 0,
            };
        }
        let (arr, leaf_body, size) = build_aggregates(positions, mass);
        let arr_len = arr.len();
        let mut dfs_next = vec![DONE; arr_len];
        let mut dfs_skip = vec![DONE; arr_len];
        compute_links(size, 0, DONE, &mut dfs_next, &mut dfs_skip);
        StacklessHeapIndex { arr, leaf_body, dfs_next, dfs_skip, size }
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
                    accumulate_skip_links(
                        &self.arr,
                        &self.leaf_body,
                        &self.dfs_next,
                        &self.dfs_skip,
                        self.size,
                        positions[i],
                        i,
                        g,
                        eps2,
                        theta,
                    )
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
