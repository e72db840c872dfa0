pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::services::orchestrator_service::InterviewHandle;
use crate::services::store_service::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub interview: InterviewHandle,
    pub store: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(interview: InterviewHandle, store: Arc<dyn SessionStore>) -> Self {
        Self { interview, store }
    }
}
