// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Three-pass event delivery over a hit chain.
//!
//! ## Overview
//!
//! One [`PointerEvent`] is delivered to an entire chain across three fixed
//! passes:
//!
//! 1. **Initial** (root→leaf): ancestors act before descendants.
//! 2. **Main** (leaf→root): the default pass; descendants act first.
//! 3. **Final** (root→leaf): ancestors react to descendant consumption.
//!
//! All three passes operate on the same event instance; only its consumed
//! flags evolve. Consumption set during a handler is visible to every node
//! visited afterward — later nodes in the same pass and all nodes in
//! subsequent passes, including the consuming node itself when it is
//! revisited — but never retroactively. No pass is short-circuited by
//! consumption: delivery always proceeds to every subscribed node of the
//! chain in all three passes.
//!
//! ## Faults
//!
//! A handler fault is isolated to its node: delivery to the rest of the
//! chain continues, and the fault is surfaced on the returned
//! [`RouteReport`] after the event completes.

use alloc::string::String;
use alloc::vec::Vec;

use crate::event::{Pass, PassSet, PointerEvent};

/// Error raised by a raw handler during one pass visit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerFault {
    /// Human-readable description of what went wrong.
    pub reason: String,
}

impl HandlerFault {
    /// Create a fault with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A fault recorded against one node visit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault<K> {
    /// Node whose handler faulted.
    pub node: K,
    /// Pass during which the fault occurred.
    pub pass: Pass,
    /// Fault description.
    pub reason: String,
}

/// Outcome of delivering one event to one chain.
#[derive(Clone, Debug, Default)]
pub struct RouteReport<K> {
    /// Number of handler invocations made.
    pub visits: usize,
    /// Faults raised by handlers, in visit order.
    pub faults: Vec<Fault<K>>,
}

impl<K> RouteReport<K> {
    /// Whether any handler faulted.
    pub fn has_faults(&self) -> bool {
        !self.faults.is_empty()
    }
}

/// The three passes in delivery order.
pub const PASSES: [Pass; 3] = [Pass::Initial, Pass::Main, Pass::Final];

/// Deliver one event to a whole chain across the three ordered passes.
///
/// - `chain` is the root→leaf node sequence bound to the event's contact.
/// - `subscriptions` reports which passes each node subscribed to
///   (typically [`HandlerRegistry::pass_set`](crate::registry::HandlerRegistry::pass_set)).
/// - `handler` is invoked once per (node, subscribed pass); it may call
///   [`PointerEvent::consume`] at any point during its own invocation and
///   may return a [`HandlerFault`] to report an isolated failure.
///
/// Returns after all three passes complete, with any faults collected.
pub fn route<K, S, H>(
    event: &mut PointerEvent,
    chain: &[K],
    subscriptions: S,
    mut handler: H,
) -> RouteReport<K>
where
    K: Copy,
    S: Fn(&K) -> PassSet,
    H: FnMut(K, Pass, &mut PointerEvent) -> Result<(), HandlerFault>,
{
    let mut report = RouteReport {
        visits: 0,
        faults: Vec::new(),
    };

    for pass in PASSES {
        // Initial and Final run root→leaf; Main runs leaf→root.
        let forward = !matches!(pass, Pass::Main);
        let mut visit = |node: K, ev: &mut PointerEvent, report: &mut RouteReport<K>| {
            if !subscriptions(&node).subscribes(pass) {
                return;
            }
            report.visits += 1;
            if let Err(fault) = handler(node, pass, ev) {
                #[cfg(feature = "log")]
                log::warn!("handler fault during {pass:?} pass: {}", fault.reason);
                report.faults.push(Fault {
                    node,
                    pass,
                    reason: fault.reason,
                });
            }
        };
        if forward {
            for &node in chain {
                visit(node, event, &mut report);
            }
        } else {
            for &node in chain.iter().rev() {
                visit(node, event, &mut report);
            }
        }
    }

    report
}
