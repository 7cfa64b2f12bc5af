// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer session management: one immutable chain per live contact.
//!
//! ## Overview
//!
//! The session manager owns the mapping from [`PointerId`] to the hit
//! chain established at the contact's first press. Press resolves the
//! chain exactly once; every later sample for that id reuses the stored
//! chain unconditionally and is never re-hit-tested. Release and Cancel
//! are terminal: the session is destroyed after the terminal event is
//! built, and any further sample for the id is rejected as malformed.
//!
//! Hover samples (a move while nothing is pressed, from a device that can
//! hover) bypass sessions entirely: they are surfaced as
//! [`Admission::Hover`] for fresh per-sample hit testing, with no persisted
//! chain and no consumption semantics across samples.
//!
//! Malformed input — duplicate press for a live id, move/release for an
//! unknown or already-cancelled id — is dropped with a diagnostic signal
//! and reported as an [`InputRejection`]; it never panics.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use kurbo::Point;
use smallvec::SmallVec;

use crate::event::{
    DeviceType, PointerEvent, PointerEventKind, PointerId, PointerSample, RawInput, RawPhase,
    Timestamp,
};

/// Why a raw input record was dropped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputRejection {
    /// Press for a pointer id that already has a live session.
    DuplicatePress,
    /// Move, release, or cancel for a pointer id with no live session
    /// (never pressed, or already released/cancelled).
    UnknownPointer,
}

/// An event ready for routing, with the chain it is bound to.
#[derive(Clone, Debug)]
pub struct Routed<K> {
    /// The event to deliver.
    pub event: PointerEvent,
    /// The contact this event is about; the other samples are snapshots.
    pub changed: PointerId,
    /// Root→leaf chain bound to the changed contact.
    pub chain: SmallVec<[K; 8]>,
}

/// Result of admitting one raw input record.
#[derive(Clone, Debug)]
pub enum Admission<K> {
    /// A session event bound to a stored chain.
    Routed(Routed<K>),
    /// A hover sample; the caller hit-tests it fresh and delivers
    /// enter/exit to the single resolved node.
    Hover(PointerSample),
}

#[derive(Clone, Debug)]
struct Session<K> {
    chain: SmallVec<[K; 8]>,
    position: Point,
    device: DeviceType,
}

/// Maps live pointer ids to their sessions.
///
/// Sessions iterate in id order, which keeps event sample order
/// deterministic.
#[derive(Clone, Debug, Default)]
pub struct SessionManager<K> {
    sessions: BTreeMap<PointerId, Session<K>>,
}

impl<K: Copy> SessionManager<K> {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
        }
    }

    /// Admit one raw input record.
    ///
    /// `resolve` is invoked only for a press with an unknown id, exactly
    /// once, to establish the chain for the new session.
    pub fn admit(
        &mut self,
        raw: &RawInput,
        resolve: impl FnOnce() -> SmallVec<[K; 8]>,
    ) -> Result<Admission<K>, InputRejection> {
        match raw.phase {
            RawPhase::Down => {
                if self.sessions.contains_key(&raw.pointer_id) {
                    return Err(self.reject(raw, InputRejection::DuplicatePress));
                }
                let chain = resolve();
                self.sessions.insert(
                    raw.pointer_id,
                    Session {
                        chain: chain.clone(),
                        position: raw.position,
                        device: raw.device,
                    },
                );
                let sample = PointerSample {
                    id: raw.pointer_id,
                    position: raw.position,
                    previous_position: raw.position,
                    pressed: true,
                    device: raw.device,
                    timestamp: raw.timestamp,
                };
                let samples = self.batch(raw.pointer_id, sample, raw.timestamp);
                Ok(Admission::Routed(Routed {
                    event: PointerEvent::new(PointerEventKind::Press, samples),
                    changed: raw.pointer_id,
                    chain,
                }))
            }
            RawPhase::Move => {
                let Some(session) = self.sessions.get_mut(&raw.pointer_id) else {
                    // A device that can hover produces chainless hover
                    // samples while nothing is pressed; a touch contact
                    // cannot move without a press.
                    if matches!(
                        raw.device,
                        DeviceType::Mouse | DeviceType::Stylus | DeviceType::Eraser
                    ) {
                        return Ok(Admission::Hover(PointerSample {
                            id: raw.pointer_id,
                            position: raw.position,
                            previous_position: raw.position,
                            pressed: false,
                            device: raw.device,
                            timestamp: raw.timestamp,
                        }));
                    }
                    return Err(self.reject(raw, InputRejection::UnknownPointer));
                };
                let previous = session.position;
                session.position = raw.position;
                let chain = session.chain.clone();
                let sample = PointerSample {
                    id: raw.pointer_id,
                    position: raw.position,
                    previous_position: previous,
                    pressed: true,
                    device: raw.device,
                    timestamp: raw.timestamp,
                };
                let samples = self.batch(raw.pointer_id, sample, raw.timestamp);
                Ok(Admission::Routed(Routed {
                    event: PointerEvent::new(PointerEventKind::Move, samples),
                    changed: raw.pointer_id,
                    chain,
                }))
            }
            RawPhase::Up => self
                .terminate(raw.pointer_id, raw.position, raw.timestamp, PointerEventKind::Release)
                .map(Admission::Routed)
                .ok_or_else(|| self.reject(raw, InputRejection::UnknownPointer)),
            RawPhase::Cancel => self
                .terminate(raw.pointer_id, raw.position, raw.timestamp, PointerEventKind::Cancel)
                .map(Admission::Routed)
                .ok_or_else(|| self.reject(raw, InputRejection::UnknownPointer)),
        }
    }

    /// Cancel one live session, returning its terminal Cancel event.
    ///
    /// Used for exclusivity conflicts between concurrent pointers. Returns
    /// `None` when the id has no live session; the cancellation is
    /// delivered exactly once.
    pub fn cancel(&mut self, id: PointerId, now: Timestamp) -> Option<Routed<K>> {
        let position = self.sessions.get(&id)?.position;
        self.terminate(id, position, now, PointerEventKind::Cancel)
    }

    /// Cancel every live session, in id order.
    ///
    /// Used when input focus or visibility is lost.
    pub fn cancel_all(&mut self, now: Timestamp) -> Vec<Routed<K>> {
        let ids: Vec<PointerId> = self.sessions.keys().copied().collect();
        ids.into_iter()
            .filter_map(|id| self.cancel(id, now))
            .collect()
    }

    /// The stored chain for a live id.
    pub fn chain(&self, id: PointerId) -> Option<&[K]> {
        self.sessions.get(&id).map(|s| s.chain.as_slice())
    }

    /// Whether an id has a live session.
    pub fn is_live(&self, id: PointerId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Number of live sessions.
    pub fn live_count(&self) -> usize {
        self.sessions.len()
    }

    /// Last known positions of live contacts, in id order.
    pub fn positions(&self) -> impl Iterator<Item = (PointerId, Point)> + '_ {
        self.sessions.iter().map(|(&id, s)| (id, s.position))
    }

    /// Build the terminal event for `id` and destroy its session.
    fn terminate(
        &mut self,
        id: PointerId,
        position: Point,
        timestamp: Timestamp,
        kind: PointerEventKind,
    ) -> Option<Routed<K>> {
        let session = self.sessions.get(&id)?;
        let previous = session.position;
        let sample = PointerSample {
            id,
            position,
            previous_position: previous,
            pressed: false,
            device: session.device,
            timestamp,
        };
        let samples = self.batch(id, sample, timestamp);
        let session = self.sessions.remove(&id)?;
        Some(Routed {
            event: PointerEvent::new(kind, samples),
            changed: id,
            chain: session.chain,
        })
    }

    /// One sample per live contact, ordered by id: the changed contact's
    /// fresh sample plus snapshots of every other live contact.
    fn batch(
        &self,
        changed: PointerId,
        changed_sample: PointerSample,
        timestamp: Timestamp,
    ) -> SmallVec<[PointerSample; 2]> {
        let mut samples = SmallVec::new();
        for (&id, session) in &self.sessions {
            if id == changed {
                samples.push(changed_sample);
            } else {
                samples.push(PointerSample {
                    id,
                    position: session.position,
                    previous_position: session.position,
                    pressed: true,
                    device: session.device,
                    timestamp,
                });
            }
        }
        samples
    }

    fn reject(&self, raw: &RawInput, rejection: InputRejection) -> InputRejection {
        #[cfg(feature = "log")]
        log::warn!(
            "dropped malformed input: {rejection:?} (pointer {}, phase {:?})",
            raw.pointer_id,
            raw.phase
        );
        #[cfg(not(feature = "log"))]
        let _ = raw;
        rejection
    }
}
