// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handler registry: node identity → ordered list of typed handler records.
//!
//! Instead of attaching arbitrary callback closures to nodes, the registry
//! stores tagged records describing what a node wants: a gesture detector
//! (tap family, drag, transform) or raw per-pass delivery. Late binding is
//! preserved — records can be added or removed at any time — without
//! virtual dispatch; the actual handler bodies are caller-owned functions
//! driven by the router and the gesture engine.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::event::PassSet;

/// Permitted drag axis or axes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Axis {
    /// Horizontal displacement only.
    Horizontal,
    /// Vertical displacement only.
    Vertical,
    /// Unconstrained.
    #[default]
    Both,
}

/// Options for the tap / long-press / double-tap detector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TapOptions {
    /// Hold duration before a long press fires, in milliseconds.
    pub long_press_ms: u64,
    /// Window after a completed tap in which a second tap counts as a
    /// double tap, in milliseconds.
    pub double_tap_ms: u64,
    /// Maximum displacement before a press stops counting as stationary.
    pub slop: f64,
}

impl Default for TapOptions {
    fn default() -> Self {
        Self {
            long_press_ms: 500,
            double_tap_ms: 300,
            slop: 18.0,
        }
    }
}

impl TapOptions {
    /// Override the long-press hold duration.
    pub fn with_long_press_ms(mut self, ms: u64) -> Self {
        self.long_press_ms = ms;
        self
    }

    /// Override the double-tap window.
    pub fn with_double_tap_ms(mut self, ms: u64) -> Self {
        self.double_tap_ms = ms;
        self
    }

    /// Override the touch slop.
    pub fn with_slop(mut self, slop: f64) -> Self {
        self.slop = slop;
        self
    }
}

/// Options for the drag detector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragOptions {
    /// Displacement along the permitted axis before a drag starts.
    pub slop: f64,
    /// Permitted axis or axes.
    pub axis: Axis,
}

impl Default for DragOptions {
    fn default() -> Self {
        Self {
            slop: 18.0,
            axis: Axis::Both,
        }
    }
}

impl DragOptions {
    /// Restrict the drag to one axis.
    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    /// Override the drag slop.
    pub fn with_slop(mut self, slop: f64) -> Self {
        self.slop = slop;
        self
    }
}

/// A typed handler record attached to a node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HandlerRecord {
    /// Tap / long-press / double-tap detection.
    Tap(TapOptions),
    /// Drag detection.
    Drag(DragOptions),
    /// Multi-touch transform detection.
    Transform,
    /// Raw per-pass pointer event delivery.
    Raw(PassSet),
}

/// Registry mapping node identity to its ordered handler records.
#[derive(Clone, Debug)]
pub struct HandlerRegistry<K> {
    records: HashMap<K, Vec<HandlerRecord>>,
}

impl<K: Copy + Eq + Hash> HandlerRegistry<K> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Append a record to a node's list, preserving registration order.
    pub fn register(&mut self, node: K, record: HandlerRecord) {
        self.records.entry(node).or_default().push(record);
    }

    /// Drop every record for a node.
    pub fn unregister(&mut self, node: K) {
        self.records.remove(&node);
    }

    /// Records registered for a node, in registration order.
    pub fn records_for(&self, node: &K) -> &[HandlerRecord] {
        self.records.get(node).map_or(&[], Vec::as_slice)
    }

    /// Whether the node has any record of interest to the router: the
    /// union of raw subscriptions plus [`PassSet::MAIN`] when any gesture
    /// detector is attached (detectors observe the main pass).
    pub fn pass_set(&self, node: &K) -> PassSet {
        let mut set = PassSet::empty();
        for record in self.records_for(node) {
            match record {
                HandlerRecord::Raw(passes) => set |= *passes,
                HandlerRecord::Tap(_) | HandlerRecord::Drag(_) | HandlerRecord::Transform => {
                    set |= PassSet::MAIN;
                }
            }
        }
        set
    }

    /// Whether the node has at least one record.
    pub fn is_registered(&self, node: &K) -> bool {
        self.records.get(node).is_some_and(|r| !r.is_empty())
    }
}

impl<K: Copy + Eq + Hash> Default for HandlerRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PassSet;

    #[test]
    fn records_keep_registration_order() {
        let mut reg: HandlerRegistry<u32> = HandlerRegistry::new();
        reg.register(1, HandlerRecord::Tap(TapOptions::default()));
        reg.register(1, HandlerRecord::Drag(DragOptions::default()));
        reg.register(1, HandlerRecord::Raw(PassSet::FINAL));

        let records = reg.records_for(&1);
        assert_eq!(records.len(), 3);
        assert!(matches!(records[0], HandlerRecord::Tap(_)));
        assert!(matches!(records[1], HandlerRecord::Drag(_)));
        assert!(matches!(records[2], HandlerRecord::Raw(_)));
    }

    #[test]
    fn pass_set_unions_raw_and_detectors() {
        let mut reg: HandlerRegistry<u32> = HandlerRegistry::new();
        reg.register(1, HandlerRecord::Raw(PassSet::INITIAL | PassSet::FINAL));
        reg.register(1, HandlerRecord::Tap(TapOptions::default()));
        assert_eq!(
            reg.pass_set(&1),
            PassSet::INITIAL | PassSet::MAIN | PassSet::FINAL
        );

        // A detector-only node observes main.
        reg.register(2, HandlerRecord::Transform);
        assert_eq!(reg.pass_set(&2), PassSet::MAIN);

        // Unregistered nodes subscribe to nothing.
        assert_eq!(reg.pass_set(&3), PassSet::empty());
    }

    #[test]
    fn unregister_clears_records() {
        let mut reg: HandlerRegistry<u32> = HandlerRegistry::new();
        reg.register(7, HandlerRecord::Raw(PassSet::MAIN));
        assert!(reg.is_registered(&7));
        reg.unregister(7);
        assert!(!reg.is_registered(&7));
        assert!(reg.records_for(&7).is_empty());
    }

    #[test]
    fn option_builders() {
        let tap = TapOptions::default()
            .with_long_press_ms(700)
            .with_double_tap_ms(250)
            .with_slop(10.0);
        assert_eq!(tap.long_press_ms, 700);
        assert_eq!(tap.double_tap_ms, 250);
        assert_eq!(tap.slop, 10.0);

        let drag = DragOptions::default().with_axis(Axis::Horizontal).with_slop(4.0);
        assert_eq!(drag.axis, Axis::Horizontal);
        assert_eq!(drag.slop, 4.0);
    }
}
