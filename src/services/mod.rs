//! Business logic services

pub mod accounts;
pub mod catalog;
pub mod loans;
pub mod redis;
pub mod sessions;

use std::sync::Arc;

use crate::repository::Repository;

use sessions::SessionStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountsService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub sessions: sessions::SessionsService,
}

impl Services {
    /// Create all services over the given repository and session store
    pub fn new(repository: Repository, session_store: Arc<dyn SessionStore>) -> Self {
        let sessions = sessions::SessionsService::new(session_store);
        Self {
            accounts: accounts::AccountsService::new(repository.clone(), sessions.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository),
            sessions,
        }
    }
}
