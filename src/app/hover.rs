use std::collections::HashSet;
use std::time::Duration;

use crate::clock::Timer;
use crate::graph::{GraphData, NodeId, PortalConnection};

pub(in crate::app) const HOVER_CLEAR_GRACE: Duration = Duration::from_millis(150);
pub(in crate::app) const PORTAL_MENU_TIMEOUT: Duration = Duration::from_secs(4);
pub(in crate::app) const PORTAL_LEAVE_GRACE: Duration = Duration::from_millis(300);

/// Hovered node plus the neighbours and links lit up with it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct Highlight {
    pub nodes: HashSet<NodeId>,
    /// Indices into `GraphData::links`.
    pub links: HashSet<usize>,
}

impl Highlight {
    pub(in crate::app) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Default)]
pub(in crate::app) struct HoverState {
    hovered: Option<NodeId>,
    clear_timer: Timer,
}

impl HoverState {
    pub(in crate::app) fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Feeds the node under the pointer this frame. Leaving a node starts the
    /// grace delay; entering any node cancels it.
    pub(in crate::app) fn pointer_over(&mut self, target: Option<NodeId>, now: Duration) {
        match target {
            Some(id) => {
                self.hovered = Some(id);
                self.clear_timer.cancel();
            }
            None if self.hovered.is_some() && !self.clear_timer.is_armed() => {
                self.clear_timer.arm(now, HOVER_CLEAR_GRACE);
            }
            None => {}
        }
    }

    /// Returns true when the hover was cleared by this poll.
    pub(in crate::app) fn poll(&mut self, now: Duration) -> bool {
        if self.clear_timer.fire(now) {
            self.hovered = None;
            return true;
        }
        false
    }

    pub(in crate::app) fn is_pending(&self) -> bool {
        self.clear_timer.is_armed()
    }

    pub(in crate::app) fn clear(&mut self) {
        self.hovered = None;
        self.clear_timer.cancel();
    }

    pub(in crate::app) fn highlight(&self, graph: &GraphData) -> Highlight {
        let Some(id) = self.hovered else {
            return Highlight::default();
        };
        let Some(node) = graph.node(id) else {
            return Highlight::default();
        };

        let mut nodes = HashSet::from([id]);
        nodes.extend(node.join.iter().copied());
        let links = graph
            .links
            .iter()
            .enumerate()
            .filter(|(_, link)| link.touches(id))
            .map(|(index, _)| index)
            .collect();
        Highlight { nodes, links }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) struct OpenPortalMenu {
    pub origin: NodeId,
    pub connections: Vec<PortalConnection>,
}

/// Menu of same-named nodes shown for a portal. Closes on its own after a
/// timeout unless the pointer is inside it.
#[derive(Debug, Default)]
pub(in crate::app) struct PortalMenu {
    open: Option<OpenPortalMenu>,
    pointer_inside: bool,
    close_timer: Timer,
}

impl PortalMenu {
    pub(in crate::app) fn current(&self) -> Option<&OpenPortalMenu> {
        self.open.as_ref()
    }

    #[cfg(test)]
    pub(in crate::app) fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub(in crate::app) fn open(
        &mut self,
        origin: NodeId,
        connections: Vec<PortalConnection>,
        now: Duration,
    ) {
        if connections.is_empty() {
            self.close();
            return;
        }
        self.open = Some(OpenPortalMenu {
            origin,
            connections,
        });
        self.pointer_inside = false;
        self.close_timer.arm(now, PORTAL_MENU_TIMEOUT);
    }

    /// Tracks the pointer against the menu area.
    pub(in crate::app) fn pointer_inside(&mut self, inside: bool, now: Duration) {
        if self.open.is_none() || inside == self.pointer_inside {
            return;
        }
        self.pointer_inside = inside;
        if inside {
            self.close_timer.cancel();
        } else {
            self.close_timer.arm(now, PORTAL_LEAVE_GRACE);
        }
    }

    /// Closes the menu and returns the chosen destination, if it was listed.
    pub(in crate::app) fn navigate(&mut self, target: NodeId) -> Option<NodeId> {
        let listed = self
            .open
            .as_ref()
            .is_some_and(|menu| menu.connections.iter().any(|entry| entry.node == target));
        self.close();
        listed.then_some(target)
    }

    pub(in crate::app) fn close(&mut self) {
        self.open = None;
        self.pointer_inside = false;
        self.close_timer.cancel();
    }

    /// Returns true when the menu closed on its own during this poll.
    pub(in crate::app) fn poll(&mut self, now: Duration) -> bool {
        if self.close_timer.fire(now) && self.open.is_some() {
            self.close();
            return true;
        }
        false
    }

    pub(in crate::app) fn is_pending(&self) -> bool {
        self.close_timer.is_armed()
    }
}
