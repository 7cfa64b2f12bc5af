// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tap, long-press, and double-tap detection.
//!
//! ## States
//!
//! - **Idle**: no press in flight. A press records the origin and arms the
//!   long-press deadline.
//! - **Pressed**: motion beyond slop cancels the press silently. A release
//!   before the long-press deadline either completes a double tap (when a
//!   prior tap is pending within the window and slop) or becomes the
//!   pending tap itself, confirmed as a single tap when the double-tap
//!   window expires without a second tap.
//! - **LongPressed**: the long-press deadline fired while the press was
//!   still stationary; the rest of the tap family is suppressed for this
//!   press.
//!
//! Cancellation resets everything without a callback. Ambiguity between
//! tap and drag intent is resolved by slop first, deadlines second, never
//! probabilistically.
//!
//! Without a timer service the detector degrades: long presses and double
//! taps never fire, and a release reports its tap immediately.

use kurbo::Point;
use smallvec::SmallVec;

use thicket_router::{PointerId, PointerSample, TapOptions, Timestamp};

/// Callback produced by the tap family.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TapCallback {
    /// A completed single tap.
    Tap(Point),
    /// Two taps within the double-tap window and slop.
    DoubleTap(Point),
    /// A stationary press held past the long-press deadline.
    LongPress(Point),
}

/// Deadline kinds the detector asks its driver to schedule.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TapTimerKind {
    /// Fires when a stationary press becomes a long press.
    LongPress,
    /// Fires when a pending tap can no longer become a double tap.
    DoubleTapWindow,
}

/// A deadline the driver must schedule against event time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimerRequest {
    /// Which deadline to (re)arm.
    pub kind: TapTimerKind,
    /// Absolute event-time deadline in milliseconds.
    pub deadline: Timestamp,
}

/// Timer and callback side effects of one detector step.
#[derive(Clone, Debug, Default)]
pub struct TapEffects {
    /// Callbacks to emit, in order.
    pub callbacks: SmallVec<[TapCallback; 2]>,
    /// Deadlines to arm.
    pub arm: SmallVec<[TimerRequest; 1]>,
    /// Deadlines to disarm. Disarming an unarmed kind is a no-op.
    pub disarm: SmallVec<[TapTimerKind; 2]>,
}

impl TapEffects {
    fn schedule(mut self, kind: TapTimerKind, deadline: Timestamp) -> Self {
        self.arm.push(TimerRequest { kind, deadline });
        self
    }

    fn unschedule(mut self, kind: TapTimerKind) -> Self {
        self.disarm.push(kind);
        self
    }

    fn emit(mut self, callback: TapCallback) -> Self {
        self.callbacks.push(callback);
        self
    }
}

#[derive(Copy, Clone, Debug)]
enum State {
    Idle,
    Pressed { pointer: PointerId, origin: Point },
    LongPressed { pointer: PointerId },
}

#[derive(Copy, Clone, Debug)]
struct PendingTap {
    position: Point,
    released_at: Timestamp,
}

/// Tap-family detector for one chain.
#[derive(Clone, Debug)]
pub struct TapDetector {
    options: TapOptions,
    timers_available: bool,
    state: State,
    pending: Option<PendingTap>,
}

impl TapDetector {
    /// Create an idle detector.
    ///
    /// With `timers_available` false the detector degrades: releases
    /// report taps immediately and long presses and double taps never
    /// fire.
    pub fn new(options: TapOptions, timers_available: bool) -> Self {
        Self {
            options,
            timers_available,
            state: State::Idle,
            pending: None,
        }
    }

    /// Whether the detector holds no state worth keeping.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle) && self.pending.is_none()
    }

    /// A contact pressed on this chain.
    pub fn on_press(&mut self, sample: &PointerSample) -> TapEffects {
        if !matches!(self.state, State::Idle) {
            // Additional contacts never join a tap in flight.
            return TapEffects::default();
        }
        self.state = State::Pressed {
            pointer: sample.id,
            origin: sample.position,
        };
        let effects = TapEffects::default();
        if self.timers_available {
            effects.schedule(
                TapTimerKind::LongPress,
                sample.timestamp + self.options.long_press_ms,
            )
        } else {
            effects
        }
    }

    /// A contact moved.
    pub fn on_move(&mut self, sample: &PointerSample) -> TapEffects {
        let State::Pressed { pointer, origin } = self.state else {
            return TapEffects::default();
        };
        if sample.id != pointer {
            return TapEffects::default();
        }
        if origin.distance(sample.position) > self.options.slop {
            // Moved past slop: no longer a tap, cancelled silently.
            self.state = State::Idle;
            return TapEffects::default().unschedule(TapTimerKind::LongPress);
        }
        TapEffects::default()
    }

    /// A contact released.
    pub fn on_release(&mut self, sample: &PointerSample) -> TapEffects {
        match self.state {
            State::Pressed { pointer, .. } if pointer == sample.id => {
                self.state = State::Idle;
                let effects = TapEffects::default().unschedule(TapTimerKind::LongPress);
                self.complete_tap(effects, sample.position, sample.timestamp)
            }
            State::LongPressed { pointer } if pointer == sample.id => {
                // The long press already claimed this press.
                self.state = State::Idle;
                TapEffects::default()
            }
            _ => TapEffects::default(),
        }
    }

    /// The press was cancelled. Resets everything without a callback.
    pub fn on_cancel(&mut self) -> TapEffects {
        self.state = State::Idle;
        self.pending = None;
        TapEffects::default()
            .unschedule(TapTimerKind::LongPress)
            .unschedule(TapTimerKind::DoubleTapWindow)
    }

    /// A previously armed deadline fired.
    pub fn on_timer(&mut self, kind: TapTimerKind) -> TapEffects {
        match kind {
            TapTimerKind::LongPress => {
                let State::Pressed { pointer, origin } = self.state else {
                    return TapEffects::default();
                };
                // Still pressed and within slop, or the deadline would
                // have been disarmed.
                self.state = State::LongPressed { pointer };
                TapEffects::default().emit(TapCallback::LongPress(origin))
            }
            TapTimerKind::DoubleTapWindow => match self.pending.take() {
                // The window closed without a second tap.
                Some(pending) => TapEffects::default().emit(TapCallback::Tap(pending.position)),
                None => TapEffects::default(),
            },
        }
    }

    /// Resolve a release that stayed within slop and beat the long press.
    fn complete_tap(
        &mut self,
        effects: TapEffects,
        position: Point,
        timestamp: Timestamp,
    ) -> TapEffects {
        if !self.timers_available {
            // Degraded mode: taps confirm immediately, doubles never form.
            return effects.emit(TapCallback::Tap(position));
        }
        if let Some(pending) = self.pending {
            let in_window = timestamp.saturating_sub(pending.released_at) <= self.options.double_tap_ms;
            let in_slop = pending.position.distance(position) <= self.options.slop;
            if in_window && in_slop {
                self.pending = None;
                return effects
                    .unschedule(TapTimerKind::DoubleTapWindow)
                    .emit(TapCallback::DoubleTap(position));
            }
            // A non-matching tap can no longer double the pending one.
            self.pending = Some(PendingTap {
                position,
                released_at: timestamp,
            });
            return effects
                .unschedule(TapTimerKind::DoubleTapWindow)
                .emit(TapCallback::Tap(pending.position))
                .schedule(
                    TapTimerKind::DoubleTapWindow,
                    timestamp + self.options.double_tap_ms,
                );
        }
        self.pending = Some(PendingTap {
            position,
            released_at: timestamp,
        });
        effects.schedule(
            TapTimerKind::DoubleTapWindow,
            timestamp + self.options.double_tap_ms,
        )
    }
}
