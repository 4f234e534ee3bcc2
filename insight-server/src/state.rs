//! Shared application state

use std::sync::Arc;

use rand::rngs::StdRng;
use tokio::sync::Mutex;

use crate::repository::LogStore;
use crate::service::generator::LogGenerator;

/// State shared by the HTTP handlers and the generation loop
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LogStore>,
    pub generator: Arc<Mutex<LogGenerator<StdRng>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn LogStore>, generator: LogGenerator<StdRng>) -> Self {
        Self {
            store,
            generator: Arc::new(Mutex::new(generator)),
        }
    }
}
