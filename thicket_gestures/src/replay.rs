// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic replay of synthetic input scripts.
//!
//! A script is a flat list of raw input records and virtual-clock
//! advances. Replaying it drives a [`GestureEngine`] sample by sample and
//! returns every callback in emission order, with no real hardware and no
//! wall clock involved.

use alloc::vec::Vec;

use kurbo::Point;
use thicket_router::{DeviceType, PointerId, RawInput, RawPhase, Timestamp};

use crate::engine::{CallbackRecord, FeedOutcome, GestureEngine};

/// One step of a replay script.
#[derive(Copy, Clone, Debug)]
pub enum ScriptStep {
    /// Feed a raw input record.
    Input(RawInput),
    /// Advance the virtual clock to an absolute timestamp, firing any
    /// deadlines due by then.
    AdvanceTime(Timestamp),
}

/// Result of replaying a script.
#[derive(Clone, Debug, Default)]
pub struct ReplayResult {
    /// Every callback emitted, in order.
    pub callbacks: Vec<CallbackRecord>,
    /// Outcome of each step, in script order.
    pub steps: Vec<FeedOutcome>,
}

/// Drive an engine through a script and collect the ordered callbacks.
pub fn replay(engine: &mut GestureEngine, script: &[ScriptStep]) -> ReplayResult {
    let mut result = ReplayResult::default();
    for step in script {
        let outcome = match step {
            ScriptStep::Input(raw) => engine.feed(raw),
            ScriptStep::AdvanceTime(now) => engine.advance_time(*now),
        };
        result.callbacks.extend(outcome.callbacks.iter().copied());
        result.steps.push(outcome);
    }
    result
}

fn touch(id: PointerId, phase: RawPhase, x: f64, y: f64, timestamp: Timestamp) -> ScriptStep {
    ScriptStep::Input(RawInput {
        device_id: 0,
        pointer_id: id,
        position: Point::new(x, y),
        device: DeviceType::Touch,
        phase,
        timestamp,
    })
}

/// A touch contact going down.
pub fn press(id: PointerId, x: f64, y: f64, timestamp: Timestamp) -> ScriptStep {
    touch(id, RawPhase::Down, x, y, timestamp)
}

/// A pressed touch contact moving.
pub fn move_to(id: PointerId, x: f64, y: f64, timestamp: Timestamp) -> ScriptStep {
    touch(id, RawPhase::Move, x, y, timestamp)
}

/// A touch contact lifting.
pub fn release(id: PointerId, x: f64, y: f64, timestamp: Timestamp) -> ScriptStep {
    touch(id, RawPhase::Up, x, y, timestamp)
}

/// A touch contact cancelled by the platform.
pub fn cancel(id: PointerId, x: f64, y: f64, timestamp: Timestamp) -> ScriptStep {
    touch(id, RawPhase::Cancel, x, y, timestamp)
}

/// A mouse moving with no button pressed (a hover sample).
pub fn hover(id: PointerId, x: f64, y: f64, timestamp: Timestamp) -> ScriptStep {
    ScriptStep::Input(RawInput {
        device_id: 0,
        pointer_id: id,
        position: Point::new(x, y),
        device: DeviceType::Mouse,
        phase: RawPhase::Move,
        timestamp,
    })
}

/// Advance the virtual clock to an absolute timestamp.
pub fn advance(timestamp: Timestamp) -> ScriptStep {
    ScriptStep::AdvanceTime(timestamp)
}
