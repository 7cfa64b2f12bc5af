// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover tracking: enter/exit transitions for the topmost hovered node.
//!
//! Hover has no session and no chain. Each hover sample is hit-tested
//! fresh, and only the single resolved node is tracked; when it changes,
//! the old node receives an exit and the new node an enter, in that order.

/// Enter/exit transitions produced by one hover update.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HoverTransition<K> {
    /// Node the hover left, if any.
    pub exited: Option<K>,
    /// Node the hover entered, if any.
    pub entered: Option<K>,
}

impl<K> HoverTransition<K> {
    /// Whether this update changed nothing.
    pub fn is_empty(&self) -> bool {
        self.exited.is_none() && self.entered.is_none()
    }
}

/// Tracks which node the pointer currently hovers.
#[derive(Clone, Debug, Default)]
pub struct HoverState<K> {
    current: Option<K>,
}

impl<K: Copy + PartialEq> HoverState<K> {
    /// Create a state with nothing hovered.
    pub fn new() -> Self {
        Self { current: None }
    }

    /// The currently hovered node, if any.
    pub fn current(&self) -> Option<K> {
        self.current
    }

    /// Record the freshly resolved hover target and report the resulting
    /// transitions. Exit is delivered before enter.
    pub fn update(&mut self, target: Option<K>) -> HoverTransition<K> {
        if self.current == target {
            return HoverTransition {
                exited: None,
                entered: None,
            };
        }
        let exited = self.current;
        self.current = target;
        HoverTransition {
            exited,
            entered: target,
        }
    }

    /// Forget the hovered node without emitting transitions, for when the
    /// pointer leaves the surface entirely.
    pub fn clear(&mut self) -> Option<K> {
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_then_move_within_then_exit() {
        let mut hover: HoverState<u32> = HoverState::new();

        let t = hover.update(Some(5));
        assert_eq!(t.exited, None);
        assert_eq!(t.entered, Some(5));

        // Moving within the same node produces nothing.
        let t = hover.update(Some(5));
        assert!(t.is_empty());
        assert_eq!(hover.current(), Some(5));

        let t = hover.update(None);
        assert_eq!(t.exited, Some(5));
        assert_eq!(t.entered, None);
        assert_eq!(hover.current(), None);
    }

    #[test]
    fn crossing_nodes_exits_old_before_entering_new() {
        let mut hover: HoverState<u32> = HoverState::new();
        hover.update(Some(1));
        let t = hover.update(Some(2));
        assert_eq!(t.exited, Some(1));
        assert_eq!(t.entered, Some(2));
    }

    #[test]
    fn clear_is_silent() {
        let mut hover: HoverState<u32> = HoverState::new();
        hover.update(Some(3));
        assert_eq!(hover.clear(), Some(3));
        assert_eq!(hover.current(), None);
        // The next target is a plain enter.
        let t = hover.update(Some(4));
        assert_eq!(t.exited, None);
        assert_eq!(t.entered, Some(4));
    }
}
