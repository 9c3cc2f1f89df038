use std::sync::Arc;

use serde_json::Value;

use crate::cache::QueryCache;
use crate::client::CmsClient;
use crate::config::AppConfig;
use crate::error::ContentResult;
use crate::retry::RetryPolicy;

/// Estado compartido por los handlers del gateway.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub client: CmsClient,
    // Las respuestas se guardan ya serializadas: un único tipo de caché para todas las entidades.
    pub cache: Arc<QueryCache<Value>>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> ContentResult<Self> {
        let client = CmsClient::from_config(&config)?;
        let cache = QueryCache::new(RetryPolicy::with_max_attempts(config.retry_max_attempts));
        Ok(Self {
            config,
            client,
            cache: Arc::new(cache),
        })
    }
}
