// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, updates, accessors.

use alloc::vec::Vec;
use kurbo::{Affine, Rect};

use crate::types::{LocalNode, NodeFlags, NodeId};

/// Scene tree consumed by the hit tester.
///
/// The tree stores parent/child structure, per-node local geometry, and the
/// world transforms derived from them. Changes to local node data (bounds,
/// transform, z, flags) do **not** take effect on queries immediately; they
/// are applied when [`SceneTree::commit`] is called, which recomputes world
/// transforms top-down.
///
/// Child order is paint order: a later-inserted sibling draws on top of an
/// earlier one at equal `z_index`, and hit-chain resolution follows the same
/// rule.
///
/// ## Example
///
/// ```rust
/// use kurbo::Rect;
/// use thicket_scene::{LocalNode, SceneTree};
///
/// let mut tree = SceneTree::new();
/// let root = tree.insert(
///     None,
///     LocalNode {
///         bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
///         ..LocalNode::default()
///     },
/// );
/// tree.commit();
/// assert!(tree.is_alive(root));
/// ```
pub struct SceneTree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// Root nodes in insertion order (paint order for z ties).
    roots: Vec<NodeId>,
}

impl core::fmt::Debug for SceneTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("SceneTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("roots", &self.roots.len())
            .finish_non_exhaustive()
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) local: LocalNode,
    /// Local→world transform as of the last commit.
    pub(crate) world_transform: Affine,
}

impl Node {
    fn new(generation: u32, local: LocalNode) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
            world_transform: Affine::IDENTITY,
        }
    }
}

impl SceneTree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Insert a new node as a child of `parent` (or as a root if `None`).
    ///
    /// The returned [`NodeId`] becomes live immediately, but world
    /// transforms are only updated on the next call to
    /// [`SceneTree::commit`]. The new node becomes the last sibling, which
    /// puts it on top at equal `z_index`.
    pub fn insert(&mut self, parent: Option<NodeId>, local: LocalNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        match parent {
            Some(p) => self.link_parent(id, p),
            None => self.roots.push(id),
        }
        id
    }

    /// Remove a node (and its subtree) from the tree.
    ///
    /// The identifier becomes stale immediately.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        match self.node(id).parent {
            Some(parent) => self.unlink_parent(id, parent),
            None => self.roots.retain(|&r| r != id),
        }
        let children = self.node(id).children.clone();
        for child in children {
            self.remove(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Reparent `id` under `new_parent` (or make it a root with `None`).
    ///
    /// The node becomes the last sibling of its new parent.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        if !self.is_alive(id) {
            return;
        }
        match self.node(id).parent {
            Some(parent) => self.unlink_parent(id, parent),
            None => self.roots.retain(|&r| r != id),
        }
        match new_parent {
            Some(p) => self.link_parent(id, p),
            None => self.roots.push(id),
        }
    }

    /// Update parent-relative bounds.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.bounds = bounds;
        }
    }

    /// Update the local transform.
    pub fn set_transform(&mut self, id: NodeId, tf: Affine) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.transform = tf;
        }
    }

    /// Update z index.
    pub fn set_z_index(&mut self, id: NodeId, z: i32) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.z_index = z;
        }
    }

    /// Update node flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.flags = flags;
        }
    }

    /// Recompute world transforms for all live nodes.
    ///
    /// Call after mutating local data or tree structure, before issuing
    /// hit-chain queries.
    pub fn commit(&mut self) {
        let roots = self.roots.clone();
        for root in roots {
            self.update_world_recursive(root, Affine::IDENTITY);
        }
    }

    fn update_world_recursive(&mut self, id: NodeId, parent_world: Affine) {
        let world = {
            let n = self.node_mut(id);
            let world = parent_world * n.local.transform;
            n.world_transform = world;
            world
        };
        let children = self.node(id).children.clone();
        for child in children {
            self.update_world_recursive(child, world);
        }
    }

    /// Whether `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|slot| slot.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Return the parent of a live node, or `None` for roots and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        self.node(id).parent
    }

    /// Return the children of a live node in paint order.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        if !self.is_alive(id) {
            return &[];
        }
        &self.node(id).children
    }

    /// Return the flags of a live node.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        if !self.is_alive(id) {
            return None;
        }
        Some(self.node(id).local.flags)
    }

    /// Return the z index of a live node.
    pub fn z_index(&self, id: NodeId) -> Option<i32> {
        if !self.is_alive(id) {
            return None;
        }
        Some(self.node(id).local.z_index)
    }

    /// Return the local→world transform as of the last [`SceneTree::commit`].
    pub fn world_transform(&self, id: NodeId) -> Option<Affine> {
        if !self.is_alive(id) {
            return None;
        }
        Some(self.node(id).world_transform)
    }

    /// Root nodes in insertion order.
    pub(crate) fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if !self.is_alive(id) {
            return None;
        }
        self.nodes[id.idx()].as_mut()
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(id).parent = Some(parent);
        self.node_mut(parent).children.push(id);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.retain(|&c| c != id);
        self.node_mut(id).parent = None;
    }
}
