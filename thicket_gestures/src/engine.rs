// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The gesture engine: raw input in, ordered callbacks out.
//!
//! ## Overview
//!
//! [`GestureEngine`] wires the whole pipeline together:
//!
//! 1. Pending deadlines up to the incoming timestamp fire first, so a
//!    long press scheduled for `t` beats a release arriving at `t`.
//! 2. The session manager admits the record: a press hit-tests the scene
//!    once and binds the chain for the contact's lifetime; malformed
//!    records are dropped and reported.
//! 3. The router delivers the event across the three passes. During each
//!    node's main-pass visit its registered records run in registration
//!    order: raw handlers are invoked on their subscribed passes, and
//!    detector records step their per-node state machines.
//! 4. Detector callbacks, hover transitions, handler faults, and the
//!    rejection (if any) come back on the [`FeedOutcome`].
//!
//! Detector state lives per registered node, shared by every contact
//! whose chain crosses that node — which is what lets two fingers on one
//! surface drive a single transform. State is torn down once its last
//! contact ends and the detector has nothing pending.
//!
//! The router completes all three passes for one event before the next
//! record is admitted; two events for one chain are never in flight at
//! once.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use smallvec::SmallVec;

use thicket_router::{
    route, Admission, Fault, HandlerFault, HandlerRecord, HandlerRegistry, HoverState,
    InputRejection, Pass, PointerEvent, PointerEventKind, PointerId, PointerSample, RawInput,
    Routed, SessionManager, Timestamp,
};
use thicket_scene::{NodeId, SceneTree};

use crate::clock::{TimerQueue, TimerToken};
use crate::drag::{DragCallback, DragDetector};
use crate::tap::{TapCallback, TapDetector, TapEffects, TapTimerKind};
use crate::transform::{TransformCallback, TransformDetector};

/// One emitted callback, tagged with the node that owns the handler.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CallbackRecord {
    /// A completed single tap.
    Tap {
        /// Owning node.
        node: NodeId,
        /// Release position.
        position: Point,
    },
    /// Two taps within the double-tap window and slop.
    DoubleTap {
        /// Owning node.
        node: NodeId,
        /// Second release position.
        position: Point,
    },
    /// A stationary press held past the long-press deadline.
    LongPress {
        /// Owning node.
        node: NodeId,
        /// Press origin.
        position: Point,
    },
    /// A drag crossed slop.
    DragStart {
        /// Owning node.
        node: NodeId,
        /// Press origin.
        origin: Point,
    },
    /// Projected displacement since the previous sample.
    Drag {
        /// Owning node.
        node: NodeId,
        /// Projected delta.
        delta: Vec2,
    },
    /// A drag ended; velocity over the trailing window.
    DragEnd {
        /// Owning node.
        node: NodeId,
        /// Projected velocity in units per second.
        velocity: Vec2,
    },
    /// A drag was cancelled.
    DragCancel {
        /// Owning node.
        node: NodeId,
    },
    /// A multi-touch transform changed.
    Transform {
        /// Owning node.
        node: NodeId,
        /// Mean position of the active contacts.
        centroid: Point,
        /// Centroid displacement since the previous batch.
        pan: Vec2,
        /// Mean pairwise distance ratio against the previous batch.
        zoom: f64,
        /// Mean signed angular change around the centroid, in radians.
        rotation: f64,
    },
    /// A multi-touch transform ended.
    TransformEnd {
        /// Owning node.
        node: NodeId,
    },
    /// Hover entered a node.
    Enter {
        /// The node under the pointer.
        node: NodeId,
    },
    /// Hover left a node.
    Exit {
        /// The node the pointer left.
        node: NodeId,
    },
}

/// Everything one engine step produced, in emission order.
#[derive(Clone, Debug, Default)]
pub struct FeedOutcome {
    /// Callbacks emitted, in order.
    pub callbacks: Vec<CallbackRecord>,
    /// Raw-handler faults, surfaced after the event completed.
    pub faults: Vec<Fault<NodeId>>,
    /// Set when the record was dropped as malformed.
    pub rejected: Option<InputRejection>,
}

impl FeedOutcome {
    /// Whether the step produced nothing at all.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty() && self.faults.is_empty() && self.rejected.is_none()
    }
}

/// Raw per-pass handler invoked for nodes with raw records.
pub type RawHandler<'a> =
    &'a mut dyn FnMut(NodeId, Pass, &mut PointerEvent) -> Result<(), HandlerFault>;

#[derive(Copy, Clone, Debug)]
struct TimerPayload {
    node: NodeId,
    kind: TapTimerKind,
}

#[derive(Debug, Default)]
struct DetectorState {
    tap: Option<TapDetector>,
    drag: Option<DragDetector>,
    transform: Option<TransformDetector>,
    contacts: usize,
}

impl DetectorState {
    fn is_idle(&self) -> bool {
        self.contacts == 0
            && self.tap.as_ref().is_none_or(TapDetector::is_idle)
            && self.drag.as_ref().is_none_or(DragDetector::is_idle)
            && self.transform.as_ref().is_none_or(TransformDetector::is_idle)
    }
}

/// Pointer input engine over a scene tree.
#[derive(Debug)]
pub struct GestureEngine {
    tree: SceneTree,
    registry: HandlerRegistry<NodeId>,
    sessions: SessionManager<NodeId>,
    hover: HoverState<NodeId>,
    timers: Option<TimerQueue<TimerPayload>>,
    tokens: HashMap<(NodeId, TapTimerKind), TimerToken>,
    detectors: HashMap<NodeId, DetectorState>,
}

impl GestureEngine {
    /// Create an engine with a working timer service.
    pub fn new(tree: SceneTree) -> Self {
        Self {
            tree,
            registry: HandlerRegistry::new(),
            sessions: SessionManager::new(),
            hover: HoverState::new(),
            timers: Some(TimerQueue::new()),
            tokens: HashMap::new(),
            detectors: HashMap::new(),
        }
    }

    /// Create an engine without a timer service.
    ///
    /// Long-press and double-tap detection degrade to never firing; drag
    /// and transform detection are unaffected.
    pub fn without_timers(tree: SceneTree) -> Self {
        #[cfg(feature = "log")]
        log::warn!("no timer service: long press and double tap will never fire");
        Self {
            timers: None,
            ..Self::new(tree)
        }
    }

    /// The scene tree.
    pub fn scene(&self) -> &SceneTree {
        &self.tree
    }

    /// Mutable access to the scene tree. Remember to
    /// [`commit`](SceneTree::commit) after structural changes.
    pub fn scene_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }

    /// Attach a handler record to a node.
    pub fn register(&mut self, node: NodeId, record: HandlerRecord) {
        self.registry.register(node, record);
    }

    /// Drop every record for a node.
    pub fn unregister(&mut self, node: NodeId) {
        self.registry.unregister(node);
    }

    /// Feed one raw input record with no raw handlers attached.
    pub fn feed(&mut self, raw: &RawInput) -> FeedOutcome {
        self.feed_with(raw, &mut |_, _, _| Ok(()))
    }

    /// Feed one raw input record, invoking `raw_handler` for every node
    /// visit that a raw record subscribes to.
    pub fn feed_with(&mut self, raw: &RawInput, raw_handler: RawHandler<'_>) -> FeedOutcome {
        let mut outcome = FeedOutcome::default();
        // Deadlines at or before this sample fire first.
        self.fire_due_timers(raw.timestamp, &mut outcome.callbacks);

        let tree = &self.tree;
        let admitted = self
            .sessions
            .admit(raw, || tree.hit_chain(raw.position).iter().collect());
        match admitted {
            Err(rejection) => outcome.rejected = Some(rejection),
            Ok(Admission::Hover(sample)) => self.process_hover(&sample, raw_handler, &mut outcome),
            Ok(Admission::Routed(routed)) => self.process_routed(routed, raw_handler, &mut outcome),
        }
        outcome
    }

    /// Advance event time without a sample, firing any due deadlines.
    pub fn advance_time(&mut self, now: Timestamp) -> FeedOutcome {
        let mut outcome = FeedOutcome::default();
        self.fire_due_timers(now, &mut outcome.callbacks);
        outcome
    }

    /// Cancel one contact's session, for exclusivity conflicts.
    pub fn cancel_pointer(&mut self, id: PointerId, now: Timestamp) -> FeedOutcome {
        let mut outcome = FeedOutcome::default();
        self.fire_due_timers(now, &mut outcome.callbacks);
        if let Some(routed) = self.sessions.cancel(id, now) {
            self.process_routed(routed, &mut |_, _, _| Ok(()), &mut outcome);
        }
        outcome
    }

    /// Cancel every live session, for focus or visibility loss. Hover
    /// state is forgotten silently.
    pub fn cancel_all(&mut self, now: Timestamp) -> FeedOutcome {
        let mut outcome = FeedOutcome::default();
        self.fire_due_timers(now, &mut outcome.callbacks);
        for routed in self.sessions.cancel_all(now) {
            self.process_routed(routed, &mut |_, _, _| Ok(()), &mut outcome);
        }
        self.hover.clear();
        outcome
    }

    /// Route one session event and step the detectors along its chain.
    fn process_routed(
        &mut self,
        routed: Routed<NodeId>,
        raw_handler: RawHandler<'_>,
        outcome: &mut FeedOutcome,
    ) {
        let Routed {
            mut event,
            changed,
            chain,
        } = routed;
        let terminal = event.kind.is_terminal();
        self.dispatch(&mut event, changed, &chain, raw_handler, outcome);
        if terminal {
            for &node in &chain {
                self.cleanup_node(node);
            }
        }
    }

    /// Hit-test a hover sample fresh and deliver enter/exit transitions.
    fn process_hover(
        &mut self,
        sample: &PointerSample,
        raw_handler: RawHandler<'_>,
        outcome: &mut FeedOutcome,
    ) {
        let target = self.tree.hover_target(sample.position);
        let transition = self.hover.update(target);
        if let Some(node) = transition.exited {
            outcome.callbacks.push(CallbackRecord::Exit { node });
            let mut event = PointerEvent::new(PointerEventKind::Exit, smallvec::smallvec![*sample]);
            self.dispatch(&mut event, sample.id, &[node], raw_handler, outcome);
        }
        if let Some(node) = transition.entered {
            outcome.callbacks.push(CallbackRecord::Enter { node });
            let mut event =
                PointerEvent::new(PointerEventKind::Enter, smallvec::smallvec![*sample]);
            self.dispatch(&mut event, sample.id, &[node], raw_handler, outcome);
        }
    }

    /// Deliver one event across the three passes, running raw handlers and
    /// detector records during each node's visits.
    fn dispatch(
        &mut self,
        event: &mut PointerEvent,
        changed: PointerId,
        chain: &[NodeId],
        raw_handler: RawHandler<'_>,
        outcome: &mut FeedOutcome,
    ) {
        let registry = &self.registry;
        let detectors = &mut self.detectors;
        let timers = &mut self.timers;
        let tokens = &mut self.tokens;
        let callbacks = &mut outcome.callbacks;

        let report = route(
            event,
            chain,
            |node| registry.pass_set(node),
            |node, pass, ev| {
                let changed_sample = ev.sample(changed).copied();
                let mut fault = Ok(());
                for record in registry.records_for(&node) {
                    match record {
                        HandlerRecord::Raw(passes) => {
                            if passes.subscribes(pass) {
                                if let Err(e) = raw_handler(node, pass, ev) {
                                    if fault.is_ok() {
                                        fault = Err(e);
                                    }
                                }
                            }
                        }
                        HandlerRecord::Tap(options) if pass == Pass::Main => {
                            let state = detectors.entry(node).or_default();
                            let timers_available = timers.is_some();
                            let tap = state
                                .tap
                                .get_or_insert_with(|| TapDetector::new(*options, timers_available));
                            let effects = match (ev.kind, changed_sample.as_ref()) {
                                (PointerEventKind::Press, Some(s)) => tap.on_press(s),
                                (PointerEventKind::Move, Some(s)) => tap.on_move(s),
                                (PointerEventKind::Release, Some(s)) => tap.on_release(s),
                                (PointerEventKind::Cancel, _) => tap.on_cancel(),
                                _ => TapEffects::default(),
                            };
                            apply_tap_effects(node, effects, timers, tokens, callbacks);
                        }
                        HandlerRecord::Drag(options) if pass == Pass::Main => {
                            let state = detectors.entry(node).or_default();
                            let drag = state
                                .drag
                                .get_or_insert_with(|| DragDetector::new(*options));
                            let effects = match (ev.kind, changed_sample.as_ref()) {
                                (PointerEventKind::Press, Some(s)) => drag.on_press(s),
                                (PointerEventKind::Move, Some(s)) => drag.on_move(s),
                                (PointerEventKind::Release, Some(s)) => drag.on_release(s),
                                (PointerEventKind::Cancel, _) => drag.on_cancel(),
                                _ => Default::default(),
                            };
                            if effects.consume {
                                ev.consume(changed);
                            }
                            for callback in effects.callbacks {
                                callbacks.push(drag_record(node, callback));
                            }
                        }
                        HandlerRecord::Transform if pass == Pass::Main => {
                            let state = detectors.entry(node).or_default();
                            let transform =
                                state.transform.get_or_insert_with(TransformDetector::new);
                            let emitted: SmallVec<[TransformCallback; 2]> = match ev.kind {
                                PointerEventKind::Press => transform.on_press(ev.samples()),
                                PointerEventKind::Move => transform.on_move(ev.samples()),
                                PointerEventKind::Release => transform.on_release(ev.samples()),
                                PointerEventKind::Cancel => transform.on_cancel(),
                                _ => SmallVec::new(),
                            };
                            for callback in emitted {
                                callbacks.push(transform_record(node, callback));
                            }
                        }
                        _ => {}
                    }
                }
                if pass == Pass::Main && has_detector_records(registry, node) {
                    let state = detectors.entry(node).or_default();
                    match ev.kind {
                        PointerEventKind::Press => state.contacts += 1,
                        PointerEventKind::Release | PointerEventKind::Cancel => {
                            state.contacts = state.contacts.saturating_sub(1);
                        }
                        _ => {}
                    }
                }
                fault
            },
        );
        outcome.faults.extend(report.faults);
    }

    /// Fire every deadline at or before `now`, in deadline order.
    fn fire_due_timers(&mut self, now: Timestamp, callbacks: &mut Vec<CallbackRecord>) {
        let Some(queue) = &mut self.timers else {
            return;
        };
        let due = queue.advance_to(now);
        if due.is_empty() {
            return;
        }
        let mut fired_nodes: SmallVec<[NodeId; 4]> = SmallVec::new();
        for firing in due {
            let TimerPayload { node, kind } = firing.payload;
            self.tokens.remove(&(node, kind));
            let Some(state) = self.detectors.get_mut(&node) else {
                continue;
            };
            let Some(tap) = state.tap.as_mut() else {
                continue;
            };
            let effects = tap.on_timer(kind);
            apply_tap_effects(
                node,
                effects,
                &mut self.timers,
                &mut self.tokens,
                callbacks,
            );
            fired_nodes.push(node);
        }
        for node in fired_nodes {
            self.cleanup_node(node);
        }
    }

    /// Drop a node's detector state once nothing keeps it alive.
    fn cleanup_node(&mut self, node: NodeId) {
        let done = self.detectors.get(&node).is_some_and(DetectorState::is_idle);
        if done {
            self.detectors.remove(&node);
            for kind in [TapTimerKind::LongPress, TapTimerKind::DoubleTapWindow] {
                if let Some(token) = self.tokens.remove(&(node, kind)) {
                    if let Some(queue) = &mut self.timers {
                        queue.cancel(token);
                    }
                }
            }
        }
    }
}

fn has_detector_records(registry: &HandlerRegistry<NodeId>, node: NodeId) -> bool {
    registry.records_for(&node).iter().any(|r| {
        matches!(
            r,
            HandlerRecord::Tap(_) | HandlerRecord::Drag(_) | HandlerRecord::Transform
        )
    })
}

/// Apply one tap-detector step's timer and callback effects.
fn apply_tap_effects(
    node: NodeId,
    effects: TapEffects,
    timers: &mut Option<TimerQueue<TimerPayload>>,
    tokens: &mut HashMap<(NodeId, TapTimerKind), TimerToken>,
    callbacks: &mut Vec<CallbackRecord>,
) {
    if let Some(queue) = timers {
        for kind in effects.disarm {
            if let Some(token) = tokens.remove(&(node, kind)) {
                queue.cancel(token);
            }
        }
        for request in effects.arm {
            if let Some(token) = tokens.remove(&(node, request.kind)) {
                queue.cancel(token);
            }
            let token = queue.schedule(request.deadline, TimerPayload {
                node,
                kind: request.kind,
            });
            tokens.insert((node, request.kind), token);
        }
    }
    for callback in effects.callbacks {
        callbacks.push(match callback {
            TapCallback::Tap(position) => CallbackRecord::Tap { node, position },
            TapCallback::DoubleTap(position) => CallbackRecord::DoubleTap { node, position },
            TapCallback::LongPress(position) => CallbackRecord::LongPress { node, position },
        });
    }
}

fn drag_record(node: NodeId, callback: DragCallback) -> CallbackRecord {
    match callback {
        DragCallback::DragStart(origin) => CallbackRecord::DragStart { node, origin },
        DragCallback::Drag(delta) => CallbackRecord::Drag { node, delta },
        DragCallback::DragEnd(velocity) => CallbackRecord::DragEnd { node, velocity },
        DragCallback::DragCancel => CallbackRecord::DragCancel { node },
    }
}

fn transform_record(node: NodeId, callback: TransformCallback) -> CallbackRecord {
    match callback {
        TransformCallback::Transform {
            centroid,
            pan,
            zoom,
            rotation,
        } => CallbackRecord::Transform {
            node,
            centroid,
            pan,
            zoom,
            rotation,
        },
        TransformCallback::TransformEnd => CallbackRecord::TransformEnd { node },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use thicket_router::{DeviceType, DragOptions, PassSet, RawPhase, TapOptions};
    use thicket_scene::LocalNode;

    fn pid(n: u64) -> PointerId {
        PointerId::new(n).unwrap()
    }

    fn raw(id: u64, phase: RawPhase, x: f64, y: f64, t: Timestamp) -> RawInput {
        RawInput {
            device_id: 0,
            pointer_id: pid(id),
            position: Point::new(x, y),
            device: DeviceType::Touch,
            phase,
            timestamp: t,
        }
    }

    fn node(bounds: Rect) -> LocalNode {
        LocalNode {
            bounds,
            ..LocalNode::default()
        }
    }

    /// Root covering 0..200 square with one button child covering 0..100.
    fn engine_with_button() -> (GestureEngine, NodeId, NodeId) {
        let mut tree = SceneTree::new();
        let root = tree.insert(None, node(Rect::new(0.0, 0.0, 200.0, 200.0)));
        let button = tree.insert(Some(root), node(Rect::new(0.0, 0.0, 100.0, 100.0)));
        tree.commit();
        let engine = GestureEngine::new(tree);
        (engine, root, button)
    }

    fn taps(outcome: &FeedOutcome) -> usize {
        outcome
            .callbacks
            .iter()
            .filter(|c| matches!(c, CallbackRecord::Tap { .. }))
            .count()
    }

    #[test]
    fn quick_press_release_is_one_tap_and_no_drag() {
        let (mut engine, _, button) = engine_with_button();
        engine.register(button, HandlerRecord::Tap(TapOptions::default()));
        engine.register(button, HandlerRecord::Drag(DragOptions::default()));

        assert!(engine.feed(&raw(1, RawPhase::Down, 10.0, 10.0, 0)).is_empty());
        assert!(engine.feed(&raw(1, RawPhase::Up, 10.0, 10.0, 50)).is_empty());

        // The tap confirms when the double-tap window closes.
        let outcome = engine.advance_time(400);
        assert_eq!(
            outcome.callbacks.as_slice(),
            &[CallbackRecord::Tap {
                node: button,
                position: Point::new(10.0, 10.0),
            }]
        );
        assert!(outcome
            .callbacks
            .iter()
            .all(|c| !matches!(c, CallbackRecord::DragStart { .. } | CallbackRecord::Drag { .. })));
    }

    #[test]
    fn motion_past_slop_is_a_drag_and_never_a_tap() {
        let (mut engine, _, button) = engine_with_button();
        engine.register(button, HandlerRecord::Tap(TapOptions::default()));
        engine.register(button, HandlerRecord::Drag(DragOptions::default()));

        engine.feed(&raw(1, RawPhase::Down, 0.0, 0.0, 0));
        let outcome = engine.feed(&raw(1, RawPhase::Move, 30.0, 0.0, 10));
        assert_eq!(
            outcome.callbacks.as_slice(),
            &[
                CallbackRecord::DragStart {
                    node: button,
                    origin: Point::new(0.0, 0.0),
                },
                CallbackRecord::Drag {
                    node: button,
                    delta: Vec2::new(30.0, 0.0),
                },
            ]
        );

        let outcome = engine.feed(&raw(1, RawPhase::Up, 30.0, 0.0, 50));
        assert!(outcome.callbacks.iter().all(|c| matches!(
            c,
            CallbackRecord::DragEnd { .. }
        )));

        // No tap or long press ever fires.
        let outcome = engine.advance_time(2_000);
        assert!(outcome.is_empty());
    }

    #[test]
    fn two_quick_taps_are_one_double_tap() {
        let (mut engine, _, button) = engine_with_button();
        engine.register(button, HandlerRecord::Tap(TapOptions::default()));

        engine.feed(&raw(1, RawPhase::Down, 10.0, 10.0, 0));
        engine.feed(&raw(1, RawPhase::Up, 10.0, 10.0, 40));
        engine.feed(&raw(2, RawPhase::Down, 10.0, 10.0, 100));
        let outcome = engine.feed(&raw(2, RawPhase::Up, 10.0, 10.0, 140));
        assert_eq!(
            outcome.callbacks.as_slice(),
            &[CallbackRecord::DoubleTap {
                node: button,
                position: Point::new(10.0, 10.0),
            }]
        );

        // No standalone tap afterwards.
        assert!(engine.advance_time(2_000).is_empty());
    }

    #[test]
    fn motionless_hold_is_one_long_press_and_no_tap() {
        let (mut engine, _, button) = engine_with_button();
        engine.register(button, HandlerRecord::Tap(TapOptions::default()));

        engine.feed(&raw(1, RawPhase::Down, 10.0, 10.0, 0));
        // The long-press deadline (500) fires before the 600ms release.
        let outcome = engine.feed(&raw(1, RawPhase::Up, 10.0, 10.0, 600));
        assert_eq!(
            outcome.callbacks.as_slice(),
            &[CallbackRecord::LongPress {
                node: button,
                position: Point::new(10.0, 10.0),
            }]
        );
        assert_eq!(taps(&outcome), 0);
        assert!(engine.advance_time(2_000).is_empty());
    }

    #[test]
    fn two_contacts_spreading_report_zoom_two() {
        let (mut engine, root, _) = engine_with_button();
        engine.register(root, HandlerRecord::Transform);

        engine.feed(&raw(1, RawPhase::Down, 100.0, 150.0, 0));
        engine.feed(&raw(2, RawPhase::Down, 110.0, 150.0, 5));
        let outcome = engine.feed(&raw(2, RawPhase::Move, 120.0, 150.0, 10));

        let [CallbackRecord::Transform {
            pan,
            zoom,
            rotation,
            ..
        }] = outcome.callbacks.as_slice()
        else {
            panic!("expected one transform, got {:?}", outcome.callbacks);
        };
        assert!((zoom - 2.0).abs() < 1e-9);
        assert!((pan.x - 5.0).abs() < 1e-9);
        assert!(pan.y.abs() < 1e-9);
        assert!(rotation.abs() < 1e-9);

        // Losing the second contact ends the gesture.
        let outcome = engine.feed(&raw(2, RawPhase::Up, 120.0, 150.0, 20));
        assert_eq!(
            outcome.callbacks.as_slice(),
            &[CallbackRecord::TransformEnd { node: root }]
        );
    }

    #[test]
    fn overlap_routes_only_into_the_topmost_sibling() {
        let mut tree = SceneTree::new();
        let root = tree.insert(None, node(Rect::new(0.0, 0.0, 200.0, 200.0)));
        let under = tree.insert(Some(root), node(Rect::new(0.0, 0.0, 100.0, 100.0)));
        // Painted after `under`, so it wins the overlap.
        let over = tree.insert(Some(root), node(Rect::new(50.0, 0.0, 150.0, 100.0)));
        tree.commit();

        let mut engine = GestureEngine::new(tree);
        engine.register(under, HandlerRecord::Tap(TapOptions::default()));
        engine.register(over, HandlerRecord::Tap(TapOptions::default()));

        engine.feed(&raw(1, RawPhase::Down, 75.0, 50.0, 0));
        engine.feed(&raw(1, RawPhase::Up, 75.0, 50.0, 40));
        let outcome = engine.advance_time(400);
        assert_eq!(
            outcome.callbacks.as_slice(),
            &[CallbackRecord::Tap {
                node: over,
                position: Point::new(75.0, 50.0),
            }]
        );
    }

    #[test]
    fn samples_after_cancel_are_dropped_without_callbacks() {
        let (mut engine, _, button) = engine_with_button();
        engine.register(button, HandlerRecord::Tap(TapOptions::default()));
        engine.register(button, HandlerRecord::Drag(DragOptions::default()));

        engine.feed(&raw(1, RawPhase::Down, 10.0, 10.0, 0));
        engine.cancel_pointer(pid(1), 20);

        let outcome = engine.feed(&raw(1, RawPhase::Move, 50.0, 10.0, 30));
        assert_eq!(outcome.rejected, Some(InputRejection::UnknownPointer));
        assert!(outcome.callbacks.is_empty());

        let outcome = engine.feed(&raw(1, RawPhase::Up, 50.0, 10.0, 40));
        assert_eq!(outcome.rejected, Some(InputRejection::UnknownPointer));
        assert!(outcome.callbacks.is_empty());
        assert!(engine.advance_time(2_000).is_empty());
    }

    #[test]
    fn chain_is_fixed_at_press_even_if_the_scene_changes() {
        let (mut engine, _, button) = engine_with_button();
        engine.register(button, HandlerRecord::Drag(DragOptions::default()));

        engine.feed(&raw(1, RawPhase::Down, 10.0, 10.0, 0));
        // The button moves away; the contact's chain does not.
        engine.scene_mut().set_bounds(button, Rect::new(500.0, 500.0, 600.0, 600.0));
        engine.scene_mut().commit();

        let outcome = engine.feed(&raw(1, RawPhase::Move, 40.0, 10.0, 10));
        assert!(outcome
            .callbacks
            .iter()
            .any(|c| matches!(c, CallbackRecord::DragStart { node, .. } if *node == button)));
    }

    #[test]
    fn raw_handler_faults_are_isolated_and_reported() {
        let (mut engine, root, button) = engine_with_button();
        engine.register(root, HandlerRecord::Raw(PassSet::all()));
        engine.register(button, HandlerRecord::Raw(PassSet::all()));

        let mut visits = 0;
        let outcome = engine.feed_with(&raw(1, RawPhase::Down, 10.0, 10.0, 0), &mut |node,
            _,
            _| {
            visits += 1;
            if node == button {
                Err(HandlerFault::new("boom"))
            } else {
                Ok(())
            }
        });
        // Both nodes visited in all three passes despite the faults.
        assert_eq!(visits, 6);
        assert_eq!(outcome.faults.len(), 3);
        assert!(outcome.faults.iter().all(|f| f.node == button));
    }

    #[test]
    fn consumption_is_advisory_between_sibling_records() {
        let (mut engine, root, button) = engine_with_button();
        // The drag on the child consumes once dragging; the raw handler on
        // the root still sees every event.
        engine.register(button, HandlerRecord::Drag(DragOptions::default()));
        engine.register(root, HandlerRecord::Raw(PassSet::MAIN));

        let mut consumed_seen = false;
        engine.feed_with(&raw(1, RawPhase::Down, 10.0, 10.0, 0), &mut |_, _, _| Ok(()));
        engine.feed_with(&raw(1, RawPhase::Move, 50.0, 10.0, 10), &mut |_, _, ev| {
            consumed_seen = ev.is_consumed(pid(1));
            Ok(())
        });
        // Main runs leaf→root: the drag consumed before the root's visit.
        assert!(consumed_seen);
    }

    #[test]
    fn mouse_hover_produces_enter_and_exit() {
        let (mut engine, root, button) = engine_with_button();
        engine.register(button, HandlerRecord::Raw(PassSet::MAIN));

        let mut hover_move = |x: f64, t: Timestamp| {
            let mut input = raw(1, RawPhase::Move, x, 10.0, t);
            input.device = DeviceType::Mouse;
            engine.feed(&input)
        };

        let outcome = hover_move(10.0, 0);
        assert_eq!(
            outcome.callbacks.as_slice(),
            &[CallbackRecord::Enter { node: button }]
        );

        // Moving within the button changes nothing.
        assert!(hover_move(20.0, 10).is_empty());

        // Moving onto the bare root exits the button, enters the root.
        let outcome = hover_move(150.0, 20);
        assert_eq!(
            outcome.callbacks.as_slice(),
            &[
                CallbackRecord::Exit { node: button },
                CallbackRecord::Enter { node: root },
            ]
        );
        let _ = root;
    }

    mod precedence_properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Tap versus drag intent resolves by slop alone for a press
            // that releases before the long-press deadline: past slop it
            // is exactly a drag, within slop exactly a tap.
            #[test]
            fn slop_resolves_tap_versus_drag_deterministically(
                dx in 0.0_f64..60.0,
                dt in 1_u64..400,
            ) {
                let (mut engine, _, button) = engine_with_button();
                engine.register(button, HandlerRecord::Tap(TapOptions::default()));
                engine.register(button, HandlerRecord::Drag(DragOptions::default()));

                let mut callbacks = Vec::new();
                callbacks.extend(engine.feed(&raw(1, RawPhase::Down, 50.0, 50.0, 0)).callbacks);
                callbacks.extend(
                    engine
                        .feed(&raw(1, RawPhase::Move, 50.0 + dx, 50.0, dt))
                        .callbacks,
                );
                callbacks.extend(
                    engine
                        .feed(&raw(1, RawPhase::Up, 50.0 + dx, 50.0, dt + 10))
                        .callbacks,
                );
                callbacks.extend(engine.advance_time(2_000).callbacks);

                let dragged = callbacks
                    .iter()
                    .any(|c| matches!(c, CallbackRecord::DragStart { .. }));
                let tapped = callbacks
                    .iter()
                    .any(|c| matches!(c, CallbackRecord::Tap { .. }));
                prop_assert_eq!(dragged, dx > 18.0);
                prop_assert_eq!(tapped, dx <= 18.0);
                prop_assert!(!(dragged && tapped));
            }
        }
    }

    #[test]
    fn degraded_engine_still_taps_and_drags() {
        let mut tree = SceneTree::new();
        let root = tree.insert(None, node(Rect::new(0.0, 0.0, 200.0, 200.0)));
        tree.commit();
        let mut engine = GestureEngine::without_timers(tree);
        engine.register(root, HandlerRecord::Tap(TapOptions::default()));
        engine.register(root, HandlerRecord::Drag(DragOptions::default()));

        engine.feed(&raw(1, RawPhase::Down, 10.0, 10.0, 0));
        let outcome = engine.feed(&raw(1, RawPhase::Up, 10.0, 10.0, 50));
        // Taps confirm immediately without a double-tap window.
        assert_eq!(taps(&outcome), 1);

        // Holding forever never long-presses.
        engine.feed(&raw(2, RawPhase::Down, 10.0, 10.0, 100));
        assert!(engine.advance_time(10_000).is_empty());

        // Drags are unaffected.
        let outcome = engine.feed(&raw(2, RawPhase::Move, 80.0, 10.0, 10_010));
        assert!(outcome
            .callbacks
            .iter()
            .any(|c| matches!(c, CallbackRecord::DragStart { .. })));
    }
}
