//! The pointer-tree layout (§4.3): an ordinary recursive `Box`-linked binary
//! tree, split on the longest axis at the median. This is the baseline
//! layout the other two (heap, stackless heap) are checked against for
//! cross-layout agreement (§8 property 6).

use rayon::prelude::*;

use super::{
    NodeAggregate, SpatialIndex, TraverseType, bounding_box, contribution, longest_axis,
    mac_satisfied,
};
use crate::types::{Coord, Vec3};

struct TreeNode {
    agg: NodeAggregate,
    body: Option<usize>,
    children: Option<Box<(TreeNode, TreeNode)>>,
}

pub struct TreeIndex {
    root: Option<TreeNode>,
}

fn build_node(indices: &[usize], positions: &[Vec3], mass: &[Coord]) -> TreeNode {
    if indices.len() == 1 {
        let i = indices[0];
        return TreeNode {
            agg: NodeAggregate { mass: mass[i], com: positions[i], min: positions[i], max: positions[i] },
            body: Some(i),
            children: None,
        };
    }

    let (min, max) = bounding_box(indices, positions);
    let axis = longest_axis(min, max);
    let mut sorted = indices.to_vec();
    sorted.sort_by(|&a, &b| {
        positions[a]
            .component(axis)
            .partial_cmp(&positions[b].component(axis))
            .expect("non-NaN coordinate")
    });
    let mid = sorted.len() / 2;
    let (left_idx, right_idx) = sorted.split_at(mid);

    let left = build_node(left_idx, positions, mass);
    let right = build_node(right_idx, positions, mass);
    let agg = NodeAggregate::combine(left.agg, right.agg);

    TreeNode { agg, body: None, children: Some(Box::new((left, right))) }
}

fn accumulate_cycle(
    node: &TreeNode,
    at: Vec3,
    exclude: usize,
    g: Coord,
    eps2: Coord,
    theta: Coord,
    out: &mut Vec3,
) {
    if let Some(i) = node.body {
        if i == exclude {
            return;
        }
        *out += contribution(node.agg.com, node.agg.mass, at, g, eps2);
        return;
    }

    let dist_sqr = (node.agg.com - at).norm_sqr();
    if mac_satisfied(node.agg.size(), dist_sqr, theta) {
        *out += contribution(node.agg.com, node.agg.mass, at, g, eps2);
        return;
    }

    if let Some(children) = &node.children {
        accumulate_cycle(&children.0, at, exclude, g, eps2, theta, out);
        accumulate_cycle(&children.1, at, exclude, g, eps2, theta, out);
    }
}

fn for_each_leaf(node: &TreeNode, f: &mut impl FnMut(usize)) {
    if let Some(i) = node.body {
        f(i);
        return;
    }
    if let Some(children) = &node.children {
        for_each_leaf(&children.0, f);
        for_each_leaf(&children.1, f);
    }
}

fn apply_node_to_subtree(source: &TreeNode, target: &TreeNode, positions: &[Vec3], g: Coord, eps2: Coord, out: &mut [Vec3]) {
    for_each_leaf(target, &mut |i| {
        out[i] += contribution(source.agg.com, source.agg.mass, positions[i], g, eps2);
    });
}

/// Dual-tree recursion (§4.4 nested-tree traversal): descends whichever of
/// `source`/`target` has the larger bounding box until the MAC is satisfied
/// for the pair, or both sides are single-body leaves.
fn dual_recurse(
    source: &TreeNode,
    target: &TreeNode,
    positions: &[Vec3],
    g: Coord,
    eps2: Coord,
    theta: Coord,
    out: &mut [Vec3],
) {
    if let (Some(a), Some(b)) = (source.body, target.body) {
        if a == b {
            return;
        }
    }

    let dist_sqr = (target.agg.com - source.agg.com).norm_sqr();
    let size = source.agg.size().max(target.agg.size());
    let both_leaves = source.body.is_some() && target.body.is_some();

    if mac_satisfied(size, dist_sqr, theta) || both_leaves {
        apply_node_to_subtree(source, target, positions, g, eps2, out);
        return;
    }

    if source.agg.size() >= target.agg.size() && source.children.is_some() {
        let children = source.children.as_ref().unwrap();
        dual_recurse(&children.0, target, positions, g, eps2, theta, out);
        dual_recurse(&children.1, target, positions, g, eps2, theta, out);
    } else if let Some(children) = &target.children {
        dual_recurse(source, &children.0, positions, g, eps2, theta, out);
        dual_recurse(source, &children.1, positions, g, eps2, theta, out);
    } else {
        apply_node_to_subtree(source, target, positions, g, eps2, out);
    }
}

impl SpatialIndex for TreeIndex {
    fn build(positions: &[Vec3], mass: &[Coord]) -> Self {
        if positions.is_empty() {
            return TreeIndex { root: None };
        }
        let indices: Vec<usize> = (0..positions.len()).collect();
        TreeIndex { root: Some(build_node(&indices, positions, mass)) }
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
        let Some(root) = &self.root else {
            return vec![Vec3::ZERO; n];
        };

        match traverse {
            TraverseType::Cycle => (0..n)
                .into_par_iter()
                .map(|i| {
                    let mut acc = Vec3::ZERO;
                    accumulate_cycle(root, positions[i], i, g, eps2, theta, &mut acc);
                    acc
                })
                .collect(),
            TraverseType::NestedTree => {
                let mut out = vec![Vec3::ZERO; n];
                dual_recurse(root, root, positions, g, eps2, theta, &mut out);
                out
            }
        }
    }
}
