// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Scene: a kurbo-native node tree with z-ordered hit-chain
//! resolution.
//!
//! ## Overview
//!
//! This crate holds the geometry side of the Thicket pointer pipeline:
//!
//! - [`SceneTree`] stores a hierarchy of nodes with local bounds, affine
//!   transforms, z-order, and visibility/pointer flags, with a batched
//!   [`SceneTree::commit`] step that recomputes world transforms.
//! - [`SceneTree::hit_chain`] resolves the ordered root→leaf path of
//!   pointer-eligible nodes under a point. At each level only the frontmost
//!   overlapping branch is admitted: highest `z_index` wins and equal z
//!   resolves to the later sibling (paint order, topmost wins).
//! - [`SceneTree::hover_target`] resolves the single topmost eligible node
//!   for hover samples, which carry no chain.
//!
//! ## Not a layout engine
//!
//! This crate does not perform layout or painting. Upstream code computes
//! positions and sizes with whatever layout system it chooses and mirrors
//! the results into this tree; downstream code consumes hit chains.
//!
//! The hit tester is intended to be invoked once per contact at its first
//! press: the resulting [`HitChain`] stays bound to that contact for its
//! whole lifetime. Session ownership and event delivery live in
//! `thicket_router`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod chain;
mod tree;
mod types;

pub use chain::HitChain;
pub use tree::SceneTree;
pub use types::{LocalNode, NodeFlags, NodeId};
