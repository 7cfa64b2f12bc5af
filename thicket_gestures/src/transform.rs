// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-touch transform detection: pan, zoom, and rotation.
//!
//! The detector engages once two or more contacts are live on the chain.
//! Each qualifying move batch reports:
//!
//! - **centroid**: mean position of the active contacts;
//! - **pan**: centroid displacement since the previous batch;
//! - **zoom**: ratio of mean pairwise contact distance to the previous
//!   batch (`1.0` when contacts are coincident);
//! - **rotation**: mean signed angular change, in radians, of the contact
//!   vectors around the centroid.
//!
//! The gesture ends when the live contact count drops below two or the
//! chain is cancelled. No timer service is needed.

use alloc::collections::BTreeMap;
use core::f64::consts::{PI, TAU};

use kurbo::{Point, Vec2};
use smallvec::SmallVec;

use thicket_router::{PointerId, PointerSample};

/// Callback produced by the transform detector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TransformCallback {
    /// A qualifying move batch changed the transform.
    Transform {
        /// Mean position of the active contacts.
        centroid: Point,
        /// Centroid displacement since the previous batch.
        pan: Vec2,
        /// Mean pairwise distance ratio against the previous batch.
        zoom: f64,
        /// Mean signed angular change around the centroid, in radians.
        rotation: f64,
    },
    /// The contact count dropped below two, or the chain was cancelled.
    TransformEnd,
}

/// Transform detector for one chain.
#[derive(Clone, Debug, Default)]
pub struct TransformDetector {
    positions: BTreeMap<PointerId, Point>,
    engaged: bool,
}

impl TransformDetector {
    /// Create an idle detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the detector holds no state worth keeping.
    pub fn is_idle(&self) -> bool {
        self.positions.is_empty() && !self.engaged
    }

    /// A contact pressed on this chain; `samples` is the full batch.
    pub fn on_press(&mut self, samples: &[PointerSample]) -> SmallVec<[TransformCallback; 2]> {
        for sample in samples.iter().filter(|s| s.pressed) {
            self.positions.insert(sample.id, sample.position);
        }
        if self.positions.len() >= 2 {
            self.engaged = true;
        }
        SmallVec::new()
    }

    /// A contact moved; `samples` is the full batch.
    pub fn on_move(&mut self, samples: &[PointerSample]) -> SmallVec<[TransformCallback; 2]> {
        let mut callbacks = SmallVec::new();
        let active: SmallVec<[&PointerSample; 4]> =
            samples.iter().filter(|s| s.pressed).collect();
        if self.engaged && active.len() >= 2 {
            if let Some(callback) = self.compute(&active) {
                callbacks.push(callback);
            }
        }
        for sample in &active {
            self.positions.insert(sample.id, sample.position);
        }
        callbacks
    }

    /// A contact released; `samples` is the full batch.
    pub fn on_release(&mut self, samples: &[PointerSample]) -> SmallVec<[TransformCallback; 2]> {
        for sample in samples.iter().filter(|s| !s.pressed) {
            self.positions.remove(&sample.id);
        }
        let mut callbacks = SmallVec::new();
        if self.engaged && self.positions.len() < 2 {
            self.engaged = false;
            callbacks.push(TransformCallback::TransformEnd);
        }
        callbacks
    }

    /// The chain was cancelled. Ends any engaged gesture.
    pub fn on_cancel(&mut self) -> SmallVec<[TransformCallback; 2]> {
        let engaged = self.engaged;
        self.positions.clear();
        self.engaged = false;
        let mut callbacks = SmallVec::new();
        if engaged {
            callbacks.push(TransformCallback::TransformEnd);
        }
        callbacks
    }

    /// Compare the active contacts against their stored positions.
    ///
    /// Returns `None` when fewer than two active contacts have a stored
    /// previous position.
    fn compute(&self, active: &[&PointerSample]) -> Option<TransformCallback> {
        let tracked: SmallVec<[(Point, Point); 4]> = active
            .iter()
            .filter_map(|s| self.positions.get(&s.id).map(|&prev| (prev, s.position)))
            .collect();
        if tracked.len() < 2 {
            return None;
        }

        let prev_centroid = centroid(tracked.iter().map(|&(prev, _)| prev));
        let now_centroid = centroid(tracked.iter().map(|&(_, now)| now));
        let pan = now_centroid - prev_centroid;

        let prev_spread = mean_pairwise_distance(tracked.iter().map(|&(prev, _)| prev));
        let now_spread = mean_pairwise_distance(tracked.iter().map(|&(_, now)| now));
        // Coincident contacts give no scale information.
        let zoom = if prev_spread > f64::EPSILON && now_spread > f64::EPSILON {
            now_spread / prev_spread
        } else {
            1.0
        };

        let mut angle_sum = 0.0;
        let mut angle_count = 0;
        for &(prev, now) in &tracked {
            let prev_arm = prev - prev_centroid;
            let now_arm = now - now_centroid;
            if prev_arm.hypot() > f64::EPSILON && now_arm.hypot() > f64::EPSILON {
                angle_sum += wrap_angle(now_arm.atan2() - prev_arm.atan2());
                angle_count += 1;
            }
        }
        let rotation = if angle_count > 0 {
            angle_sum / f64::from(angle_count)
        } else {
            0.0
        };

        Some(TransformCallback::Transform {
            centroid: now_centroid,
            pan,
            zoom,
            rotation,
        })
    }
}

fn centroid(points: impl Iterator<Item = Point>) -> Point {
    let mut sum = Vec2::ZERO;
    let mut count = 0;
    for p in points {
        sum += p.to_vec2();
        count += 1;
    }
    if count == 0 {
        Point::ZERO
    } else {
        (sum / f64::from(count)).to_point()
    }
}

fn mean_pairwise_distance(points: impl Iterator<Item = Point>) -> f64 {
    let points: SmallVec<[Point; 4]> = points.collect();
    let mut sum = 0.0;
    let mut count = 0;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            sum += a.distance(*b);
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// Wrap an angular difference into `(-PI, PI]`.
fn wrap_angle(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}
