// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag detection with axis constraints and release velocity.
//!
//! ## States
//!
//! - **Idle**: a press arms the detector at its origin.
//! - **Armed**: motion is measured against the origin along the permitted
//!   axis; crossing slop starts the drag. A release before that is not a
//!   drag and produces nothing.
//! - **Dragging**: every move reports its projected delta and asks the
//!   router to consume the sample; release reports the velocity over a
//!   trailing ~100ms window.
//!
//! Cancellation during Armed or Dragging reports a drag cancel and
//! discards pending velocity. The drag needs no timer service.

use kurbo::{Point, Vec2};
use smallvec::SmallVec;

use thicket_router::{Axis, DragOptions, PointerId, PointerSample};

use crate::velocity::VelocityTracker;

/// Callback produced by the drag detector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DragCallback {
    /// Slop was crossed; the drag starts at the press origin.
    DragStart(Point),
    /// Projected displacement since the previous sample.
    Drag(Vec2),
    /// The contact lifted; velocity over the trailing window, projected.
    DragEnd(Vec2),
    /// The contact was cancelled mid-gesture.
    DragCancel,
}

/// Callback and consumption side effects of one detector step.
#[derive(Clone, Debug, Default)]
pub struct DragEffects {
    /// Callbacks to emit, in order.
    pub callbacks: SmallVec<[DragCallback; 2]>,
    /// Whether the detector claims the sample for consumption.
    pub consume: bool,
}

#[derive(Copy, Clone, Debug)]
enum State {
    Idle,
    Armed { pointer: PointerId, origin: Point },
    Dragging { pointer: PointerId },
}

/// Drag detector for one chain.
#[derive(Clone, Debug)]
pub struct DragDetector {
    options: DragOptions,
    state: State,
    tracker: VelocityTracker,
}

impl DragDetector {
    /// Create an idle detector.
    pub fn new(options: DragOptions) -> Self {
        Self {
            options,
            state: State::Idle,
            tracker: VelocityTracker::new(),
        }
    }

    /// Whether the detector holds no state worth keeping.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// A contact pressed on this chain.
    pub fn on_press(&mut self, sample: &PointerSample) -> DragEffects {
        if !matches!(self.state, State::Idle) {
            // Additional contacts never join a drag in flight.
            return DragEffects::default();
        }
        self.state = State::Armed {
            pointer: sample.id,
            origin: sample.position,
        };
        self.tracker.reset();
        self.tracker.add(sample.timestamp, sample.position);
        DragEffects::default()
    }

    /// A contact moved.
    pub fn on_move(&mut self, sample: &PointerSample) -> DragEffects {
        match self.state {
            State::Armed { pointer, origin } if pointer == sample.id => {
                self.tracker.add(sample.timestamp, sample.position);
                let travel = self.project(sample.position - origin);
                if travel.hypot() <= self.options.slop {
                    return DragEffects::default();
                }
                self.state = State::Dragging { pointer };
                let delta = self.project(sample.position - sample.previous_position);
                DragEffects {
                    callbacks: smallvec::smallvec![
                        DragCallback::DragStart(origin),
                        DragCallback::Drag(delta),
                    ],
                    consume: true,
                }
            }
            State::Dragging { pointer } if pointer == sample.id => {
                self.tracker.add(sample.timestamp, sample.position);
                let delta = self.project(sample.position - sample.previous_position);
                DragEffects {
                    callbacks: smallvec::smallvec![DragCallback::Drag(delta)],
                    consume: true,
                }
            }
            _ => DragEffects::default(),
        }
    }

    /// A contact released.
    pub fn on_release(&mut self, sample: &PointerSample) -> DragEffects {
        match self.state {
            State::Armed { pointer, .. } if pointer == sample.id => {
                // Never crossed slop: not a drag.
                self.state = State::Idle;
                self.tracker.reset();
                DragEffects::default()
            }
            State::Dragging { pointer } if pointer == sample.id => {
                self.tracker.add(sample.timestamp, sample.position);
                let velocity = self.project(self.tracker.velocity());
                self.state = State::Idle;
                self.tracker.reset();
                DragEffects {
                    callbacks: smallvec::smallvec![DragCallback::DragEnd(velocity)],
                    consume: true,
                }
            }
            _ => DragEffects::default(),
        }
    }

    /// The press was cancelled. Pending velocity is discarded.
    pub fn on_cancel(&mut self) -> DragEffects {
        let active = !matches!(self.state, State::Idle);
        self.state = State::Idle;
        self.tracker.reset();
        if active {
            DragEffects {
                callbacks: smallvec::smallvec![DragCallback::DragCancel],
                consume: false,
            }
        } else {
            DragEffects::default()
        }
    }

    /// Project a displacement onto the permitted axis or axes.
    fn project(&self, v: Vec2) -> Vec2 {
        match self.options.axis {
            Axis::Horizontal => Vec2::new(v.x, 0.0),
            Axis::Vertical => Vec2::new(0.0, v.y),
            Axis::Both => v,
        }
    }
}
