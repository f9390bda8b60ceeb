//! Create/edit/delete workflows for the list pages.
//!
//! Every successful mutation is followed by a full resync of the owning
//! list; nothing is patched into the cache locally.

mod supplier;
mod user;
pub mod validation;

pub use supplier::{SupplierForm, SupplierFormController};
pub use user::{UserForm, UserFormController};
pub use validation::ValidationError;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::api::payload::Envelope;
use crate::api::{ApiError, Method};
use crate::list::ListController;
use crate::models::Entity;
use crate::ui::SingleFlight;
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
    /// Blocked before any request; the message is on the edit surface
    Invalid(ValidationError),
    Failed(String),
    SessionExpired,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user said no; nothing was sent
    Declined,
    Failed(String),
    SessionExpired,
    Busy,
}

/// The open edit dialog: the draft being edited and its inline error line.
pub struct FormSurface<F> {
    draft: Mutex<Option<F>>,
    inline_error: Mutex<Option<ValidationError>>,
}

impl<F: Clone> FormSurface<F> {
    pub fn new() -> Self {
        Self {
            draft: Mutex::new(None),
            inline_error: Mutex::new(None),
        }
    }

    pub fn open(&self, draft: F) {
        *self.draft.lock() = Some(draft);
        *self.inline_error.lock() = None;
    }

    pub fn close(&self) {
        *self.draft.lock() = None;
        *self.inline_error.lock() = None;
    }

    pub fn is_open(&self) -> bool {
        self.draft.lock().is_some()
    }

    pub fn draft(&self) -> Option<F> {
        self.draft.lock().clone()
    }

    pub fn inline_error(&self) -> Option<ValidationError> {
        *self.inline_error.lock()
    }

    fn reject(&self, err: ValidationError) {
        *self.inline_error.lock() = Some(err);
    }
}

impl<F: Clone> Default for FormSurface<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Authenticated mutation whose body must be a successful envelope.
async fn send_mutation(
    app: &AppState,
    path: &str,
    method: Method,
    body: Option<Value>,
    fallback: &str,
) -> Result<Envelope<Value>, ApiError> {
    app.api.call(path, method, body).await?.envelope(fallback)
}

/// Map a failed request to its outcome message. Session expiry is already
/// handled by the gateway and stays silent here.
fn report_failure(app: &AppState, err: &ApiError, fallback: &str) -> Option<String> {
    if err.is_session_expired() {
        return None;
    }
    let message = err.user_message(fallback);
    error!(error = %err, "{}", fallback);
    app.notifier.error(&message);
    Some(message)
}

/// Confirm, DELETE and resync. Shared by both list pages.
async fn delete_entity<E: Entity>(
    app: &AppState,
    list: &ListController<E>,
    in_flight: &SingleFlight,
    id: &str,
    label: &str,
) -> DeleteOutcome {
    let Some(_flight) = in_flight.try_begin("delete") else {
        return DeleteOutcome::Busy;
    };

    let title = format!("Delete {}", E::SINGULAR);
    let text = format!("Delete {}? This cannot be undone.", label);
    // Console confirmers block on stdin
    let confirmer = app.confirmer.clone();
    let confirmed = tokio::task::spawn_blocking(move || confirmer.confirm(&title, &text))
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Confirmation prompt failed");
            false
        });
    if !confirmed {
        info!(entity = E::SINGULAR, id, "Delete declined");
        return DeleteOutcome::Declined;
    }

    let fallback = format!("Failed to delete {}", E::SINGULAR);
    let result = {
        let _loading = app.loading.show();
        send_mutation(app, &E::endpoint_for(id), Method::Delete, None, &fallback).await
    };

    match result {
        Ok(_) => {
            info!(entity = E::SINGULAR, id, "Deleted");
            app.notifier
                .success(&format!("{} deleted successfully", capitalize(E::SINGULAR)));
            resync(list).await;
            DeleteOutcome::Deleted
        }
        Err(e) => match report_failure(app, &e, &fallback) {
            Some(message) => DeleteOutcome::Failed(message),
            None => DeleteOutcome::SessionExpired,
        },
    }
}

/// Refetch the owning list after a mutation, waiting out any load in flight.
async fn resync<E: Entity>(list: &ListController<E>) {
    let outcome = list.resync().await;
    debug!(entity = E::PLURAL, ?outcome, "List resynced");
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
