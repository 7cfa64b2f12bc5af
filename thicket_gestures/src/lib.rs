// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture recognition over routed pointer events.
//!
//! ## Overview
//!
//! This crate sits on top of `thicket_scene` and `thicket_router` and
//! turns raw pointer input into gesture callbacks:
//!
//! - [`GestureEngine`] is the integration point: feed it raw input
//!   records and it hit-tests presses, routes events over their chains,
//!   steps the registered detectors, and returns the ordered callbacks.
//! - [`TapDetector`], [`DragDetector`], and [`TransformDetector`] are the
//!   per-node state machines behind tap/long-press/double-tap, drag, and
//!   multi-touch pan/zoom/rotate recognition.
//! - [`TimerQueue`] schedules deadlines against event time, so tests can
//!   drive long presses and double-tap windows with a virtual clock; the
//!   [`replay`] module replays whole synthetic scripts deterministically.
//! - [`VelocityTracker`] estimates release velocity over a trailing
//!   ~100ms window of samples.
//!
//! Ambiguity between tap and drag intent is resolved by slop first and
//! deadlines second; nothing in the pipeline reads a wall clock.

#![no_std]

extern crate alloc;

mod clock;
mod drag;
mod engine;
pub mod replay;
mod tap;
mod transform;
mod velocity;

pub use clock::{Firing, TimerQueue, TimerToken};
pub use drag::{DragCallback, DragDetector, DragEffects};
pub use engine::{CallbackRecord, FeedOutcome, GestureEngine, RawHandler};
pub use tap::{TapCallback, TapDetector, TapEffects, TapTimerKind, TimerRequest};
pub use transform::{TransformCallback, TransformDetector};
pub use velocity::{VelocityTracker, VelocityTracker1D};
