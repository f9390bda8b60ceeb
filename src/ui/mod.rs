//! Presentation seams: navigation, notices, confirmation prompts and the
//! loading indicator.
//!
//! Controllers only talk to these traits, so the console front end and the
//! test doubles are interchangeable.

mod console;
mod loading;
pub mod render;

pub use console::{ConsoleConfirmer, ConsoleNotifier, ConsoleView};
pub use loading::{InFlight, LoadingGuard, LoadingIndicator, SingleFlight};

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Pages of the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Suppliers,
    Users,
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Suppliers => "Suppliers",
            Route::Users => "Users",
        }
    }
}

/// Tracks the page the client is on. Redirects replace it.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Arc<RwLock<Route>>,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: Arc::new(RwLock::new(start)),
        }
    }

    pub fn current(&self) -> Route {
        *self.current.read()
    }

    pub fn redirect(&self, route: Route) {
        let mut current = self.current.write();
        if *current != route {
            info!(from = current.title(), to = route.title(), "Redirecting");
        }
        *current = route;
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Login)
    }
}

/// Transient success notices and dismissible error notices.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Asks the user to confirm a destructive action.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, title: &str, text: &str) -> bool;
}

/// Confirms everything. Used for `--yes`.
pub struct AlwaysConfirm;

impl Confirmer for AlwaysConfirm {
    fn confirm(&self, _title: &str, _text: &str) -> bool {
        true
    }
}

/// Receives the projected rows of a list page.
pub trait ListView<E>: Send + Sync {
    fn render(&self, rows: &[E]);
}
