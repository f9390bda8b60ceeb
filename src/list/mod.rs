//! List pages: the cached collection, its view state, and reconciliation
//! with the server.
//!
//! The cache is only ever replaced wholesale by [`ListController::load`].
//! What the user sees is always `apply_view(cache, search, sort)`.

mod debounce;
mod view;

pub use debounce::Debouncer;
pub use view::{apply_view, collate, compare_values, matches_search, ViewState};

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::api::ApiError;
use crate::models::Entity;
use crate::ui::{InFlight, ListView, SingleFlight};
use crate::AppState;

/// How a `load()` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    Failed(String),
    SessionExpired,
    /// Another load was still running
    Busy,
}

pub struct ListController<E: Entity> {
    app: Arc<AppState>,
    view: Arc<dyn ListView<E>>,
    collection: ArcSwap<Vec<E>>,
    state: RwLock<ViewState<E::Field>>,
    debouncer: Debouncer,
    in_flight: SingleFlight,
}

impl<E: Entity> ListController<E> {
    pub fn new(app: Arc<AppState>, view: Arc<dyn ListView<E>>, sort_field: E::Field) -> Arc<Self> {
        let window = Duration::from_millis(app.config.view.search_debounce_ms);
        Arc::new(Self {
            app,
            view,
            collection: ArcSwap::from_pointee(Vec::new()),
            state: RwLock::new(ViewState::new(sort_field)),
            debouncer: Debouncer::new(window),
            in_flight: SingleFlight::new(),
        })
    }

    /// Fetch the collection and replace the cache. Failures leave an empty
    /// list on screen, never the previous rows.
    pub async fn load(&self) -> LoadOutcome {
        let Some(flight) = self.in_flight.try_begin("load") else {
            return LoadOutcome::Busy;
        };
        self.fetch(flight).await
    }

    /// Reload after a mutation. A load already running may have been answered
    /// before the change landed, so wait for it and fetch again.
    pub async fn resync(&self) -> LoadOutcome {
        let flight = self.in_flight.begin("resync").await;
        self.fetch(flight).await
    }

    async fn fetch(&self, _flight: InFlight<'_>) -> LoadOutcome {
        let _loading = self.app.loading.show();

        match self.app.api.fetch_collection::<E>().await {
            Ok(items) => {
                let count = items.len();
                info!(count, entity = E::PLURAL, "Loaded collection");
                self.collection.store(Arc::new(items));
                self.refresh();
                LoadOutcome::Loaded(count)
            }
            Err(ApiError::SessionExpired { .. }) => {
                self.clear();
                LoadOutcome::SessionExpired
            }
            Err(e) => {
                error!(entity = E::PLURAL, error = %e, "Failed to load collection");
                self.clear();
                let message = format!("Failed to load {}: {}", E::PLURAL, e);
                self.app.notifier.error(&message);
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Current filtered and sorted projection.
    pub fn apply_view(&self) -> Vec<E> {
        let collection = self.collection.load();
        apply_view(&collection, &self.state.read())
    }

    /// Re-apply the view and redraw.
    pub fn refresh(&self) -> Vec<E> {
        let rows = self.apply_view();
        self.view.render(&rows);
        rows
    }

    /// Apply a search term right away.
    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        debug!(term = %term, "Search term changed");
        self.state.write().search_term = term;
        self.refresh();
    }

    /// Search box keystroke: re-render once typing pauses for the debounce window.
    pub fn on_search_input(self: &Arc<Self>, term: impl Into<String>) {
        let term = term.into();
        let weak: Weak<Self> = Arc::downgrade(self);
        self.debouncer.call(move || {
            if let Some(controller) = weak.upgrade() {
                controller.set_search_term(term);
            }
        });
    }

    /// Sort changes apply immediately.
    pub fn set_sort_field(&self, field: E::Field) {
        debug!(?field, "Sort field changed");
        self.state.write().sort_field = field;
        self.refresh();
    }

    /// Replace search and sort without redrawing, ahead of the first `load()`.
    pub fn preset(&self, state: ViewState<E::Field>) {
        *self.state.write() = state;
    }

    pub fn view_state(&self) -> ViewState<E::Field> {
        self.state.read().clone()
    }

    /// Snapshot of the cache as last loaded.
    pub fn collection(&self) -> Arc<Vec<E>> {
        self.collection.load_full()
    }

    pub fn find(&self, id: &str) -> Option<E> {
        self.collection.load().iter().find(|e| e.id() == id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_pending()
    }

    fn clear(&self) {
        self.collection.store(Arc::new(Vec::new()));
        self.refresh();
    }
}
