use crate::config::AppConfig;
use crate::users::repo::{MemoryUserStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn init(config: AppConfig) -> Self {
        let users = Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>;
        Self::from_parts(Arc::new(config), users)
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserStore>) -> Self {
        Self { config, users }
    }

    /// Fresh state with an empty store, for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::LogConfig;

        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            log: LogConfig {
                filter: "signup=debug".into(),
                json: false,
            },
        };
        Self::init(config)
    }
}
