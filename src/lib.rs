pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod form;
pub mod format;
pub mod list;
pub mod models;
pub mod session;
pub mod ui;

#[cfg(test)]
mod testing;

use config::Config;
use std::sync::Arc;

use crate::api::{ApiGateway, Transport};
use crate::session::SessionStore;
use crate::ui::{Confirmer, LoadingIndicator, Navigator, Notifier};

/// Everything the page controllers share.
pub struct AppState {
    pub config: Config,
    pub session: SessionStore,
    pub api: ApiGateway,
    pub navigator: Navigator,
    pub notifier: Arc<dyn Notifier>,
    pub confirmer: Arc<dyn Confirmer>,
    pub loading: LoadingIndicator,
}

impl AppState {
    pub fn new(
        config: Config,
        session: SessionStore,
        transport: Arc<dyn Transport>,
        navigator: Navigator,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
        loading: LoadingIndicator,
    ) -> Self {
        let api = ApiGateway::new(transport, session.clone(), navigator.clone());
        Self {
            config,
            session,
            api,
            navigator,
            notifier,
            confirmer,
            loading,
        }
    }
}
