// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene tree: node identifiers, flags, and local geometry.

use kurbo::{Affine, Rect};

/// Identifier for a node in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node flags controlling hit-test participation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible. An invisible node hides its whole subtree from
        /// hit testing.
        const VISIBLE = 0b0000_0001;
        /// Node receives pointer events. An ineligible node is still
        /// consulted for z-order while descending, but never appears in a
        /// hit chain.
        const POINTER = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::POINTER
    }
}

/// Local data for a node.
#[derive(Clone, Debug)]
pub struct LocalNode {
    /// Local (untransformed) bounds. `transform` places them in parent
    /// space.
    pub bounds: Rect,
    /// Local transform relative to parent space.
    pub transform: Affine,
    /// Z-order within the parent. Higher is on top; equal z resolves to
    /// the later-inserted sibling (paint order).
    pub z_index: i32,
    /// Visibility and pointer-eligibility flags.
    pub flags: NodeFlags,
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            transform: Affine::IDENTITY,
            z_index: 0,
            flags: NodeFlags::default(),
        }
    }
}
