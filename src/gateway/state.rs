use std::sync::Arc;

use tokio::sync::Semaphore;

use super::connection::ConnectionHandler;
use crate::cache::CacheBackend;
use crate::embedding::EmbeddingClient;
use crate::query::QueryProcessor;

/// Shared router state.
pub struct AppState<E, C>
where
    E: EmbeddingClient + 'static,
    C: CacheBackend + 'static,
{
    pub processor: Arc<QueryProcessor<E, C>>,

    /// Global in-flight query limit, `None` when unlimited.
    pub limiter: Option<Arc<Semaphore>>,
}

impl<E, C> Clone for AppState<E, C>
where
    E: EmbeddingClient + 'static,
    C: CacheBackend + 'static,
{
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            limiter: self.limiter.clone(),
        }
    }
}

impl<E, C> AppState<E, C>
where
    E: EmbeddingClient + 'static,
    C: CacheBackend + 'static,
{
    /// `max_in_flight == 0` disables the limit.
    pub fn new(processor: QueryProcessor<E, C>, max_in_flight: usize) -> Self {
        let limiter = (max_in_flight > 0).then(|| Arc::new(Semaphore::new(max_in_flight)));
        Self {
            processor: Arc::new(processor),
            limiter,
        }
    }

    pub fn connection_handler(&self) -> ConnectionHandler<E, C> {
        ConnectionHandler::new(Arc::clone(&self.processor), self.limiter.clone())
    }
}
