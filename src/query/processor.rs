use tracing::{Instrument, debug, info, info_span, warn};

use super::error::{QueryError, ValidationError};
use super::request::{QueryMode, QueryRequest};
use super::state::{QueryState, StateTrace};
use crate::cache::{CacheBackend, CacheEntry, ResultSource, SemanticCache};
use crate::constants::DEFAULT_MIN_SCORE;
use crate::corpus::VectorStore;
use crate::embedding::EmbeddingClient;
use crate::ranking::{ExactRanker, Ranker, ScoredResult};

/// Orchestrator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryConfig {
    /// Score below which the reserved LLM fallback would trigger. Not acted upon.
    pub min_score: f32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// Successful reply payload.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub source: ResultSource,
    pub data: Vec<ScoredResult>,
}

impl From<CacheEntry> for QueryResponse {
    fn from(entry: CacheEntry) -> Self {
        Self {
            source: entry.source,
            data: entry.data,
        }
    }
}

/// A query's result together with the states it passed through.
#[derive(Debug)]
pub struct QueryOutcome {
    pub result: Result<QueryResponse, QueryError>,
    pub trace: StateTrace,
    /// `true` when the reply was served from the cache.
    pub cache_hit: bool,
}

/// Runs one query through validation, embedding, caching and ranking.
pub struct QueryProcessor<E, C, R = ExactRanker>
where
    E: EmbeddingClient,
    C: CacheBackend,
    R: Ranker,
{
    embedder: E,
    cache: SemanticCache<C>,
    store: VectorStore,
    ranker: R,
    config: QueryConfig,
}

impl<E, C> QueryProcessor<E, C, ExactRanker>
where
    E: EmbeddingClient,
    C: CacheBackend,
{
    pub fn new(embedder: E, cache: SemanticCache<C>, store: VectorStore, config: QueryConfig) -> Self {
        Self::with_ranker(embedder, cache, store, ExactRanker::new(), config)
    }
}

impl<E, C, R> QueryProcessor<E, C, R>
where
    E: EmbeddingClient,
    C: CacheBackend,
    R: Ranker,
{
    pub fn with_ranker(
        embedder: E,
        cache: SemanticCache<C>,
        store: VectorStore,
        ranker: R,
        config: QueryConfig,
    ) -> Self {
        if !ranker.is_exact() {
            warn!("Ranker is approximate; results may differ from exact cosine top-k");
        }
        Self {
            embedder,
            cache,
            store,
            ranker,
            config,
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn cache(&self) -> &SemanticCache<C> {
        &self.cache
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Parses, validates and answers one raw client message.
    pub async fn process_raw(&self, raw: &str) -> QueryOutcome {
        let span = info_span!("query", text_len = tracing::field::Empty, k = tracing::field::Empty);
        async {
            match QueryRequest::parse(raw) {
                Ok(request) => self.run(request).await,
                Err(e) => Self::rejected(e),
            }
        }
        .instrument(span)
        .await
    }

    /// Answers an already-built request.
    pub async fn process(&self, request: QueryRequest) -> QueryOutcome {
        let span = info_span!("query", text_len = tracing::field::Empty, k = tracing::field::Empty);
        self.run(request).instrument(span).await
    }

    /// Convenience wrapper returning only the result.
    pub async fn handle(&self, request: QueryRequest) -> Result<QueryResponse, QueryError> {
        self.process(request).await.result
    }

    fn rejected(error: ValidationError) -> QueryOutcome {
        let mut trace = StateTrace::new();
        trace.advance(QueryState::Failed);
        info!(code = %QueryError::from(error.clone()).code(), "Query rejected");
        QueryOutcome {
            result: Err(error.into()),
            trace,
            cache_hit: false,
        }
    }

    async fn run(&self, request: QueryRequest) -> QueryOutcome {
        let span = tracing::Span::current();
        span.record("text_len", request.text().chars().count());
        span.record("k", request.k());

        let mut trace = StateTrace::new();
        let mut cache_hit = false;
        let result = self.execute(&request, &mut trace, &mut cache_hit).await;

        match &result {
            Ok(response) => info!(
                source = %response.source,
                results = response.data.len(),
                cache_hit,
                "Query answered"
            ),
            Err(e) => info!(code = %e.code(), error = %e, "Query failed"),
        }

        QueryOutcome {
            result,
            trace,
            cache_hit,
        }
    }

    async fn execute(
        &self,
        request: &QueryRequest,
        trace: &mut StateTrace,
        cache_hit: &mut bool,
    ) -> Result<QueryResponse, QueryError> {
        if request.mode() == QueryMode::LlmFallback {
            trace.advance(QueryState::Failed);
            return Err(QueryError::NotImplemented);
        }

        trace.advance(QueryState::Embedding);
        let vector = match self.embedder.embed(request.text()).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, backend = self.embedder.backend_name(), "Embedding failed");
                trace.advance(QueryState::Failed);
                return Err(e.into());
            }
        };

        let expected = self.store.dimension();
        if vector.len() != expected {
            trace.advance(QueryState::Failed);
            return Err(QueryError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        trace.advance(QueryState::CacheLookup);
        let key = self.cache.quantize(&vector);
        let wanted = request.k().min(self.store.len());
        match self.cache.get(&key).await {
            Some(entry) if entry.source == ResultSource::Search && entry.data.len() < wanted => {
                debug!(
                    stored = entry.data.len(),
                    wanted, "Cached entry holds fewer results than requested, re-ranking"
                );
            }
            Some(entry) => {
                *cache_hit = true;
                trace.advance(QueryState::Responding);
                let mut response = QueryResponse::from(entry);
                response.data.truncate(request.k());
                trace.advance(QueryState::Done);
                return Ok(response);
            }
            None => {}
        }

        trace.advance(QueryState::Ranking);
        let data = match self.ranker.top_k(&vector, &self.store, request.k()) {
            Ok(data) => data,
            Err(e) => {
                trace.advance(QueryState::Failed);
                return Err(e.into());
            }
        };

        if let Some(best) = data.first()
            && best.score < self.config.min_score
        {
            debug!(
                best_score = best.score,
                min_score = self.config.min_score,
                "Best match below min_score"
            );
        }

        trace.advance(QueryState::Caching);
        let entry = CacheEntry::search(data);
        self.cache.put(&key, &entry).await;

        trace.advance(QueryState::Responding);
        let response = QueryResponse::from(entry);
        trace.advance(QueryState::Done);
        Ok(response)
    }
}

impl<E, C, R> std::fmt::Debug for QueryProcessor<E, C, R>
where
    E: EmbeddingClient,
    C: CacheBackend,
    R: Ranker,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryProcessor")
            .field("embedder", &self.embedder.backend_name())
            .field("cache", &self.cache)
            .field("corpus_len", &self.store.len())
            .field("exact_ranker", &self.ranker.is_exact())
            .field("config", &self.config)
            .finish()
    }
}
