// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic pointer event routing.
//!
//! ## Overview
//!
//! This crate turns raw platform input records into pointer events bound
//! to hit chains and delivers them across three ordered passes:
//!
//! - [`SessionManager`] admits [`RawInput`] records, establishing one
//!   immutable chain per contact at press time and batching one sample per
//!   active contact into each [`PointerEvent`].
//! - [`route`] delivers an event to a chain: an initial root→leaf pass, a
//!   main leaf→root pass, and a final root→leaf pass, with advisory
//!   per-sample consumption and per-node fault isolation.
//! - [`HandlerRegistry`] records what each node wants to receive, and
//!   [`HoverState`] tracks chainless enter/exit for hovering devices.
//!
//! Node identity is generic: any `Copy + Eq + Hash` key works, so the
//! router has no dependency on a particular tree.

#![no_std]

extern crate alloc;

mod event;
mod hover;
mod registry;
mod router;
mod session;

pub use event::{
    DeviceType, Pass, PassSet, PointerEvent, PointerEventKind, PointerId, PointerSample, RawInput,
    RawPhase, Timestamp,
};
pub use hover::{HoverState, HoverTransition};
pub use registry::{Axis, DragOptions, HandlerRecord, HandlerRegistry, TapOptions};
pub use router::{route, Fault, HandlerFault, RouteReport, PASSES};
pub use session::{Admission, InputRejection, Routed, SessionManager};
