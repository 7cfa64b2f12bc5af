// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit-chain resolution: z-ordered descent from the roots to the topmost
//! node under a point.
//!
//! A hit chain is resolved exactly once per contact, at its first press,
//! and stays fixed for the contact's lifetime. At each tree level the
//! descent admits only the frontmost overlapping branch: among the visible
//! children whose bounds contain the point, the one with the greatest
//! `z_index` wins, and an equal-z tie resolves to the later sibling (paint
//! order, topmost wins). Pointer-ineligible nodes still compete for z-order
//! but are excluded from the resulting chain.

use kurbo::Point;
use smallvec::SmallVec;

use crate::tree::SceneTree;
use crate::types::{NodeFlags, NodeId};

/// Ordered root→leaf sequence of pointer-eligible nodes under a point.
///
/// Produced by [`SceneTree::hit_chain`]. Empty when nothing was hit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HitChain {
    nodes: SmallVec<[NodeId; 8]>,
}

impl HitChain {
    /// The empty chain.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Nodes in root→leaf order.
    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The deepest (topmost) node of the chain, if any.
    pub fn leaf(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// The shallowest node of the chain, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    /// Number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chain is empty (nothing was hit).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate nodes in root→leaf order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }
}

impl SceneTree {
    /// Resolve the hit chain for a world-space point.
    ///
    /// Descends depth-first from the roots. At each level only the
    /// frontmost overlapping visible branch is entered; the chain collects
    /// the pointer-eligible nodes along that winning path, root→leaf.
    /// Returns an empty chain when no node contains the point.
    ///
    /// World transforms must be current; call [`SceneTree::commit`] after
    /// mutations.
    pub fn hit_chain(&self, point: Point) -> HitChain {
        let mut chain = HitChain::empty();
        let Some(mut current) = self.frontmost_containing(self.roots(), point) else {
            return chain;
        };
        loop {
            if self
                .flags(current)
                .is_some_and(|f| f.contains(NodeFlags::POINTER))
            {
                chain.nodes.push(current);
            }
            match self.frontmost_containing(self.children_of(current), point) {
                Some(child) => current = child,
                None => break,
            }
        }
        chain
    }

    /// Resolve the single topmost pointer-eligible node under a point.
    ///
    /// Used for hover samples, which re-hit-test fresh each time and carry
    /// no chain.
    pub fn hover_target(&self, point: Point) -> Option<NodeId> {
        self.hit_chain(point).leaf()
    }

    /// Among `candidates` (in paint order), pick the visible node whose
    /// bounds contain `point` with the greatest z; equal z prefers the
    /// later sibling.
    fn frontmost_containing(&self, candidates: &[NodeId], point: Point) -> Option<NodeId> {
        let mut best: Option<(NodeId, i32)> = None;
        for &id in candidates {
            let node = self.node(id);
            if !node.local.flags.contains(NodeFlags::VISIBLE) {
                continue;
            }
            let local_point = node.world_transform.inverse() * point;
            if !node.local.bounds.contains(local_point) {
                continue;
            }
            let z = node.local.z_index;
            match best {
                // Later siblings paint on top, so >= keeps the last winner.
                Some((_, best_z)) if z < best_z => {}
                _ => best = Some((id, z)),
            }
        }
        best.map(|(id, _)| id)
    }
}
