//! Pseudogate — pseudonymization gateway for Mainzelliste-compatible record
//! linkage services.
//!
//! Callers never see pseudonyms while callback mode is on; they hold
//! short-lived tokens issued by the linkage service, and this crate keeps
//! the token→pseudonym mapping plus the protocol client that drives the
//! service's session/token lifecycle.

use std::sync::Arc;

pub mod api;
pub mod backend;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod linkage;
pub mod mediator;
pub mod models;
pub mod store;

use backend::PatientBackend;
use config::Config;
use linkage::{HttpTransport, LinkageConnection};
use mediator::PatientMediator;
use store::TokenStore;

/// Shared state behind every handler. The store handle is the same one the
/// mediator translates through and the background sweeper evicts from.
pub struct AppState {
    pub config: Config,
    pub transport: HttpTransport,
    pub connection: LinkageConnection,
    pub store: TokenStore,
    pub mediator: PatientMediator,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn PatientBackend>) -> Self {
        let store = TokenStore::new();
        let mediator = PatientMediator::new(store.clone(), backend, config.use_callback);
        Self {
            transport: HttpTransport::new(),
            connection: LinkageConnection::from_config(&config),
            store,
            mediator,
            config,
        }
    }
}
