// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer event model: identifiers, samples, events, and passes.
//!
//! ## Overview
//!
//! A [`PointerEvent`] carries one [`PointerSample`] per currently active
//! contact, ordered by [`PointerId`], plus a per-sample consumed flag.
//! Consumption is advisory: setting it never halts delivery, it only
//! informs nodes visited afterward. Flags start false for every new event
//! and, once set, stay set for the rest of that event's passes.

use core::num::NonZeroU64;

use kurbo::Point;
use smallvec::SmallVec;

/// Identifier for one continuous contact, valid from press to
/// release/cancel. Never reused while still live.
pub type PointerId = NonZeroU64;

/// Event timestamp in milliseconds. Timers and velocity windows are
/// measured against these, never against wall-clock reads.
pub type Timestamp = u64;

/// Kind of input device behind a contact.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DeviceType {
    /// Finger on a touch surface.
    Touch,
    /// Mouse pointer.
    Mouse,
    /// Stylus tip.
    Stylus,
    /// Stylus eraser end.
    Eraser,
    /// Unrecognized device.
    Unknown,
}

/// Phase of a raw platform input record.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RawPhase {
    /// Contact went down.
    Down,
    /// Contact moved (or the pointer hovered, when nothing is pressed).
    Move,
    /// Contact went up.
    Up,
    /// Contact was cancelled by the platform.
    Cancel,
}

/// One record from the platform input boundary.
///
/// The engine never reads hardware directly; embedders translate their
/// platform's events into this shape and feed them in order.
#[derive(Copy, Clone, Debug)]
pub struct RawInput {
    /// Source device identifier (opaque to the engine).
    pub device_id: u32,
    /// Contact identifier.
    pub pointer_id: PointerId,
    /// Position in root/world coordinates.
    pub position: Point,
    /// Device kind.
    pub device: DeviceType,
    /// Down/move/up/cancel phase.
    pub phase: RawPhase,
    /// Event timestamp in milliseconds.
    pub timestamp: Timestamp,
}

/// One contact's state within a [`PointerEvent`].
#[derive(Copy, Clone, Debug)]
pub struct PointerSample {
    /// Contact identifier.
    pub id: PointerId,
    /// Current position in root coordinates.
    pub position: Point,
    /// Position carried by the previous event for this contact. Equal to
    /// `position` on press.
    pub previous_position: Point,
    /// Whether the contact is pressed after this event.
    pub pressed: bool,
    /// Device kind.
    pub device: DeviceType,
    /// Event timestamp in milliseconds.
    pub timestamp: Timestamp,
}

/// Kind of a routed pointer event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PointerEventKind {
    /// First sample of a new contact.
    Press,
    /// A pressed contact moved.
    Move,
    /// A contact lifted; terminal for its session.
    Release,
    /// A contact was cancelled; terminal for its session.
    Cancel,
    /// Hover entered a node. Carries no chain.
    Enter,
    /// Hover left a node. Carries no chain.
    Exit,
}

impl PointerEventKind {
    /// Whether this kind ends a session.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Release | Self::Cancel)
    }
}

/// A routed pointer event: kind, per-contact samples, and advisory
/// per-sample consumed flags.
///
/// All three router passes operate on the same event instance; only the
/// consumed flags evolve between passes.
#[derive(Clone, Debug)]
pub struct PointerEvent {
    /// Event kind.
    pub kind: PointerEventKind,
    samples: SmallVec<[PointerSample; 2]>,
    consumed: SmallVec<[bool; 2]>,
}

impl PointerEvent {
    /// Create an event with all consumed flags cleared.
    ///
    /// `samples` must hold one entry per active contact, ordered by id.
    pub fn new(kind: PointerEventKind, samples: SmallVec<[PointerSample; 2]>) -> Self {
        let consumed = smallvec::smallvec![false; samples.len()];
        Self {
            kind,
            samples,
            consumed,
        }
    }

    /// Samples in id order, one per active contact.
    pub fn samples(&self) -> &[PointerSample] {
        &self.samples
    }

    /// Look up the sample for a specific contact.
    pub fn sample(&self, id: PointerId) -> Option<&PointerSample> {
        self.samples.iter().find(|s| s.id == id)
    }

    /// Event timestamp: the timestamp shared by this event's samples.
    pub fn timestamp(&self) -> Timestamp {
        self.samples.first().map_or(0, |s| s.timestamp)
    }

    /// Mark a sample as consumed. Returns `false` when `id` is not part of
    /// this event. Monotonic: there is no way to clear the flag again for
    /// the lifetime of the event.
    pub fn consume(&mut self, id: PointerId) -> bool {
        match self.samples.iter().position(|s| s.id == id) {
            Some(i) => {
                self.consumed[i] = true;
                true
            }
            None => false,
        }
    }

    /// Mark every sample as consumed.
    pub fn consume_all(&mut self) {
        for flag in &mut self.consumed {
            *flag = true;
        }
    }

    /// Whether a specific sample has been consumed.
    pub fn is_consumed(&self, id: PointerId) -> bool {
        self.samples
            .iter()
            .position(|s| s.id == id)
            .is_some_and(|i| self.consumed[i])
    }

    /// Whether any sample has been consumed.
    pub fn any_consumed(&self) -> bool {
        self.consumed.iter().any(|&c| c)
    }
}

/// One of the three ordered delivery passes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Pass {
    /// Root→leaf; ancestors act before descendants.
    Initial,
    /// Leaf→root; the default pass, descendants act before ancestors.
    Main,
    /// Root→leaf; ancestors react to descendant consumption.
    Final,
}

bitflags::bitflags! {
    /// Set of passes a raw handler subscribes to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PassSet: u8 {
        /// The initial (root→leaf) pass.
        const INITIAL = 0b0000_0001;
        /// The main (leaf→root) pass.
        const MAIN = 0b0000_0010;
        /// The final (root→leaf) pass.
        const FINAL = 0b0000_0100;
    }
}

impl Default for PassSet {
    fn default() -> Self {
        Self::MAIN
    }
}

impl PassSet {
    /// Whether the set contains the given pass.
    pub fn subscribes(self, pass: Pass) -> bool {
        match pass {
            Pass::Initial => self.contains(Self::INITIAL),
            Pass::Main => self.contains(Self::MAIN),
            Pass::Final => self.contains(Self::FINAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    pub(crate) fn pid(n: u64) -> PointerId {
        PointerId::new(n).unwrap()
    }

    fn sample(id: u64, x: f64, y: f64) -> PointerSample {
        PointerSample {
            id: pid(id),
            position: Point::new(x, y),
            previous_position: Point::new(x, y),
            pressed: true,
            device: DeviceType::Touch,
            timestamp: 1000,
        }
    }

    #[test]
    fn new_event_has_clear_flags() {
        let ev = PointerEvent::new(
            PointerEventKind::Press,
            smallvec![sample(1, 0.0, 0.0), sample(2, 5.0, 5.0)],
        );
        assert!(!ev.any_consumed());
        assert!(!ev.is_consumed(pid(1)));
        assert!(!ev.is_consumed(pid(2)));
    }

    #[test]
    fn consume_targets_one_sample() {
        let mut ev = PointerEvent::new(
            PointerEventKind::Move,
            smallvec![sample(1, 0.0, 0.0), sample(2, 5.0, 5.0)],
        );
        assert!(ev.consume(pid(2)));
        assert!(!ev.is_consumed(pid(1)));
        assert!(ev.is_consumed(pid(2)));
        assert!(ev.any_consumed());
    }

    #[test]
    fn consume_unknown_id_is_a_no_op() {
        let mut ev = PointerEvent::new(PointerEventKind::Move, smallvec![sample(1, 0.0, 0.0)]);
        assert!(!ev.consume(pid(9)));
        assert!(!ev.any_consumed());
    }

    #[test]
    fn pass_set_default_is_main_only() {
        let set = PassSet::default();
        assert!(!set.subscribes(Pass::Initial));
        assert!(set.subscribes(Pass::Main));
        assert!(!set.subscribes(Pass::Final));
    }

    #[test]
    fn terminal_kinds() {
        assert!(PointerEventKind::Release.is_terminal());
        assert!(PointerEventKind::Cancel.is_terminal());
        assert!(!PointerEventKind::Move.is_terminal());
        assert!(!PointerEventKind::Enter.is_terminal());
    }
}
