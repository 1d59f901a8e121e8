use tracing::debug;

use crate::ui::state::Route;

/// How far back the stack is cut before a new destination is pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopUpTo {
    /// Pop entries above `route`, and `route` itself when `inclusive`.
    Route { route: Route, inclusive: bool },
    /// Drop the whole back stack.
    All,
}

/// Back stack of mounted screens. Entries dropped from the stack are dropped
/// as values, so screen teardown runs through their `Drop` impls.
pub struct Router<V> {
    stack: Vec<(Route, V)>,
}

impl<V> Router<V> {
    pub fn new(route: Route, view: V) -> Self {
        Self {
            stack: vec![(route, view)],
        }
    }

    pub fn current_route(&self) -> Option<Route> {
        self.stack.last().map(|(route, _)| *route)
    }

    #[cfg(test)]
    pub fn routes(&self) -> Vec<Route> {
        self.stack.iter().map(|(route, _)| *route).collect()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn active_view(&mut self) -> Option<&mut V> {
        self.stack.last_mut().map(|(_, view)| view)
    }

    pub fn push(&mut self, route: Route, view: V) {
        debug!(route = route.as_str(), "router_push");
        self.stack.push((route, view));
    }

    /// Pops entries until `route` is on top, removing it too when
    /// `inclusive`. Returns false and leaves the stack alone when `route` is
    /// not on it.
    pub fn pop_back_stack(&mut self, route: Route, inclusive: bool) -> bool {
        let Some(index) = self.stack.iter().rposition(|(r, _)| *r == route) else {
            return false;
        };
        let keep = if inclusive { index } else { index + 1 };
        self.stack.truncate(keep);
        debug!(route = route.as_str(), inclusive, depth = self.stack.len(), "router_pop_back_stack");
        true
    }

    pub fn navigate(&mut self, route: Route, view: V, pop_up_to: Option<PopUpTo>) {
        match pop_up_to {
            Some(PopUpTo::Route { route: target, inclusive }) => {
                self.pop_back_stack(target, inclusive);
            }
            Some(PopUpTo::All) => self.stack.clear(),
            None => {}
        }
        self.push(route, view);
    }

    /// Back navigation never empties the stack.
    pub fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }
}
