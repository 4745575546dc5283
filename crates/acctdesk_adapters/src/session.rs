//! In-process session and navigation state for the console.

use std::sync::atomic::{AtomicBool, Ordering};

use acctdesk_core::ports::{AuthSession, Navigator};
use tokio::sync::watch;
use tracing::info;

/// Logged-in flag shared between the gateway and the console front end
#[derive(Debug)]
pub struct SharedAuthSession {
    logged_in: AtomicBool,
}

impl SharedAuthSession {
    pub fn new(logged_in: bool) -> Self {
        Self {
            logged_in: AtomicBool::new(logged_in),
        }
    }
}

impl Default for SharedAuthSession {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AuthSession for SharedAuthSession {
    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    fn set_logged_in(&self, logged_in: bool) {
        let was = self.logged_in.swap(logged_in, Ordering::SeqCst);
        if was != logged_in {
            info!(logged_in, "session state changed");
        }
    }
}

/// Routes kept in [`RouteHistory`], current route included
pub const MAX_ROUTE_HISTORY: usize = 32;

/// Bounded route history; the last entry is the current route
pub struct RouteHistory {
    routes: watch::Sender<Vec<String>>,
}

impl RouteHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        let (routes, _) = watch::channel(vec![initial.into()]);
        Self { routes }
    }

    pub fn current(&self) -> String {
        self.routes.borrow().last().cloned().unwrap_or_default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.routes.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.routes.subscribe()
    }
}

impl Navigator for RouteHistory {
    fn navigate(&self, route: &str) {
        info!(route, "navigating");
        self.routes.send_modify(|routes| {
            routes.push(route.to_string());
            if routes.len() > MAX_ROUTE_HISTORY {
                let excess = routes.len() - MAX_ROUTE_HISTORY;
                routes.drain(..excess);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_flag() {
        let session = SharedAuthSession::default();
        assert!(session.is_logged_in());

        session.set_logged_in(false);
        assert!(!session.is_logged_in());

        session.set_logged_in(false);
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_route_history() {
        let history = RouteHistory::new("/");
        let mut rx = history.subscribe();
        assert!(!rx.has_changed().unwrap());

        history.navigate("/accounts");
        history.navigate("/login");

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().last().map(String::as_str), Some("/login"));
        assert_eq!(history.current(), "/login");
        assert_eq!(history.visited(), vec!["/", "/accounts", "/login"]);
    }

    #[test]
    fn test_route_history_is_bounded() {
        let history = RouteHistory::new("/");

        for i in 0..100 {
            history.navigate(&format!("/page/{}", i));
        }

        let visited = history.visited();
        assert_eq!(visited.len(), MAX_ROUTE_HISTORY);
        assert_eq!(visited[0], format!("/page/{}", 100 - MAX_ROUTE_HISTORY));
        assert_eq!(history.current(), "/page/99");
    }
}
