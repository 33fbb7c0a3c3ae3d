pub mod athena;
pub mod changes;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod named_queries;
pub mod types;
pub mod work_groups;

use athena::AthenaApi;
use config::Config;
use std::sync::Arc;

pub use dispatch::{dispatch, respond};
pub use error::{ResourceError, Result};

/// Shared application state
pub struct AppState {
    pub athena: Box<dyn AthenaApi>,
    pub config: Config,
}

impl AppState {
    pub fn new(athena: impl AthenaApi + 'static, config: Config) -> Arc<Self> {
        Arc::new(Self {
            athena: Box::new(athena),
            config,
        })
    }
}
