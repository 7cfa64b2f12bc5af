// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer velocity estimation over a trailing sample window.
//!
//! Velocity is derived from a ring buffer of recent positions using
//! recency-weighted least-squares regression. Only samples within a
//! trailing ~100ms horizon of the newest sample contribute, and a pointer
//! that rests near one spot for longer than the stop window reports zero.

use kurbo::Vec2;

use thicket_router::Timestamp;

const HISTORY_SIZE: usize = 20;

/// Samples older than this, relative to the newest, are ignored.
const HORIZON_MS: u64 = 100;

/// A pointer resting longer than this reports zero velocity.
const ASSUME_STOPPED_MS: u64 = 40;

/// Total displacement below this over the stop window counts as resting.
const MIN_MOVEMENT: f64 = 2.0;

/// Recency weight decay per step back in history.
const DECAY: f64 = 0.95;

#[derive(Copy, Clone, Debug)]
struct DataPoint {
    time: Timestamp,
    value: f64,
}

/// Velocity tracker for one axis.
#[derive(Clone, Debug)]
pub struct VelocityTracker1D {
    samples: [Option<DataPoint>; HISTORY_SIZE],
    index: usize,
}

impl Default for VelocityTracker1D {
    fn default() -> Self {
        Self::new()
    }
}

impl VelocityTracker1D {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            samples: [None; HISTORY_SIZE],
            index: 0,
        }
    }

    /// Record an absolute position at the given event timestamp.
    pub fn add(&mut self, time: Timestamp, value: f64) {
        self.index = (self.index + 1) % HISTORY_SIZE;
        self.samples[self.index] = Some(DataPoint { time, value });
    }

    /// Drop all recorded samples.
    pub fn reset(&mut self) {
        self.samples = [None; HISTORY_SIZE];
        self.index = 0;
    }

    /// Estimated velocity in units per second.
    ///
    /// Zero when fewer than two samples fall within the horizon, or when
    /// the pointer has effectively stopped.
    pub fn velocity(&self) -> f64 {
        let Some(newest) = self.samples[self.index] else {
            return 0.0;
        };

        let mut values = [0.0_f64; HISTORY_SIZE];
        let mut times = [0.0_f64; HISTORY_SIZE];
        let mut count = 0;
        let mut oldest = newest;

        let mut i = self.index;
        loop {
            let Some(sample) = self.samples[i] else {
                break;
            };
            let age = newest.time.saturating_sub(sample.time);
            if age > HORIZON_MS {
                break;
            }
            oldest = sample;
            values[count] = sample.value;
            // Ages count backwards from the newest sample.
            times[count] = -(age as f64);
            i = if i == 0 { HISTORY_SIZE - 1 } else { i - 1 };
            count += 1;
            if count >= HISTORY_SIZE {
                break;
            }
        }

        if count < 2 {
            return 0.0;
        }

        let span = newest.time.saturating_sub(oldest.time);
        let travel = (newest.value - oldest.value).abs();
        if span > ASSUME_STOPPED_MS && travel < MIN_MOVEMENT {
            return 0.0;
        }

        regress(&values[..count], &times[..count]) * 1000.0
    }
}

/// Recency-weighted least-squares slope of `value = a + b·time`, in units
/// per millisecond. Index 0 is the newest sample and gets the highest
/// weight.
fn regress(values: &[f64], times: &[f64]) -> f64 {
    let mut sum_w = 0.0;
    let mut sum_t = 0.0;
    let mut sum_x = 0.0;
    let mut sum_tt = 0.0;
    let mut sum_tx = 0.0;

    let mut weight = 1.0;
    for (&t, &x) in times.iter().zip(values) {
        sum_w += weight;
        sum_t += weight * t;
        sum_x += weight * x;
        sum_tt += weight * t * t;
        sum_tx += weight * t * x;
        weight *= DECAY;
    }

    let denom = sum_w * sum_tt - sum_t * sum_t;
    if denom.abs() < f64::EPSILON {
        return 0.0;
    }
    (sum_w * sum_tx - sum_t * sum_x) / denom
}

/// Velocity tracker for a 2D pointer, one axis tracker per dimension.
#[derive(Clone, Debug, Default)]
pub struct VelocityTracker {
    x: VelocityTracker1D,
    y: VelocityTracker1D,
}

impl VelocityTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an absolute position at the given event timestamp.
    pub fn add(&mut self, time: Timestamp, position: kurbo::Point) {
        self.x.add(time, position.x);
        self.y.add(time, position.y);
    }

    /// Drop all recorded samples.
    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    /// Estimated velocity in units per second.
    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.x.velocity(), self.y.velocity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn empty_and_single_sample_report_zero() {
        let mut tracker = VelocityTracker1D::new();
        assert_eq!(tracker.velocity(), 0.0);
        tracker.add(0, 100.0);
        assert_eq!(tracker.velocity(), 0.0);
    }

    #[test]
    fn constant_motion_reports_its_speed() {
        let mut tracker = VelocityTracker1D::new();
        // 100 units per 10ms = 10_000 units/s.
        for step in 0..4 {
            tracker.add(step * 10, step as f64 * 100.0);
        }
        let v = tracker.velocity();
        assert!((v - 10_000.0).abs() < 1_000.0, "expected ~10000, got {v}");
    }

    #[test]
    fn reversed_motion_is_negative() {
        let mut tracker = VelocityTracker1D::new();
        tracker.add(0, 300.0);
        tracker.add(10, 200.0);
        tracker.add(20, 100.0);
        assert!(tracker.velocity() < 0.0);
    }

    #[test]
    fn samples_beyond_the_horizon_are_ignored() {
        let mut tracker = VelocityTracker1D::new();
        tracker.add(0, 0.0);
        tracker.add(150, 100.0);
        tracker.add(160, 200.0);
        tracker.add(170, 300.0);
        // Only the recent cluster contributes: ~10_000 units/s, not the
        // much slower average over the full span.
        let v = tracker.velocity();
        assert!((v - 10_000.0).abs() < 1_000.0, "expected ~10000, got {v}");
    }

    #[test]
    fn resting_pointer_reports_zero() {
        let mut tracker = VelocityTracker1D::new();
        tracker.add(0, 100.0);
        tracker.add(30, 100.5);
        tracker.add(60, 100.2);
        tracker.add(90, 100.4);
        assert_eq!(tracker.velocity(), 0.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut tracker = VelocityTracker1D::new();
        tracker.add(0, 0.0);
        tracker.add(10, 100.0);
        tracker.reset();
        assert_eq!(tracker.velocity(), 0.0);
    }

    #[test]
    fn two_dimensional_velocity_tracks_each_axis() {
        let mut tracker = VelocityTracker::new();
        for step in 0..4_u64 {
            tracker.add(step * 10, Point::new(step as f64 * 100.0, 0.0));
        }
        let v = tracker.velocity();
        assert!((v.x - 10_000.0).abs() < 1_000.0);
        assert!(v.y.abs() < f64::EPSILON);
    }
}
