use std::sync::Arc;

use parking_lot::Mutex;

use crate::studio::{Orchestrator, Session};

/// Shared by every request. The session lock is only ever held for
/// synchronous reads and writes, never across a model call.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub session: Arc<Mutex<Session>>,
    pub download_prefix: Arc<str>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, download_prefix: &str) -> Self {
        AppState {
            orchestrator: Arc::new(orchestrator),
            session: Arc::new(Mutex::new(Session::new())),
            download_prefix: Arc::from(download_prefix),
        }
    }
}
