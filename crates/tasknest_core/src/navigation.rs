//! Navigation boundary between core flows and the hosting router.

use std::sync::{Mutex, MutexGuard};

/// Views the core can ask the host to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Unauthenticated sign-in / sign-up view.
    SignIn,
    /// Authenticated task dashboard for `subject`.
    Dashboard { subject: String },
}

/// Host router capability.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that records every request in order.
///
/// Useful for headless shells and tests that assert on redirects.
#[derive(Debug, Default)]
pub struct RouteHistory {
    routes: Mutex<Vec<Route>>,
}

impl RouteHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Route>> {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for RouteHistory {
    fn navigate(&self, route: Route) {
        self.lock().push(route);
    }
}

#[cfg(test)]
mod tests {
    use super::{Navigator, Route, RouteHistory};
    use std::sync::Arc;

    #[test]
    fn records_routes_in_order() {
        let history = RouteHistory::new();
        assert_eq!(history.last(), None);

        history.navigate(Route::SignIn);
        history.navigate(Route::Dashboard {
            subject: "s-1".to_string(),
        });
        assert_eq!(history.routes().len(), 2);
        assert_eq!(
            history.last(),
            Some(Route::Dashboard {
                subject: "s-1".to_string()
            })
        );
    }

    #[test]
    fn keeps_recording_after_a_panicking_holder() {
        let history = Arc::new(RouteHistory::new());
        history.navigate(Route::SignIn);

        let poisoner = Arc::clone(&history);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.routes.lock().unwrap();
            panic!("poison the route log");
        })
        .join();
        assert!(joined.is_err());

        history.navigate(Route::SignIn);
        assert_eq!(history.routes(), vec![Route::SignIn, Route::SignIn]);
    }
}
