use std::fmt;

use tracing::debug;

/// Steps of a single query's lifecycle.
///
/// ```text
/// Validating → Embedding → CacheLookup ─hit──────────────────→ Responding → Done
///                                      └miss→ Ranking → Caching ↗
/// Validating | Embedding | Ranking → Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryState {
    Validating,
    Embedding,
    CacheLookup,
    Ranking,
    Caching,
    Responding,
    Done,
    Failed,
}

impl QueryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryState::Validating => "validating",
            QueryState::Embedding => "embedding",
            QueryState::CacheLookup => "cache_lookup",
            QueryState::Ranking => "ranking",
            QueryState::Caching => "caching",
            QueryState::Responding => "responding",
            QueryState::Done => "done",
            QueryState::Failed => "failed",
        }
    }

    /// `true` for `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryState::Done | QueryState::Failed)
    }

    /// Whether `self → next` is an edge of the lifecycle.
    pub fn can_transition_to(&self, next: QueryState) -> bool {
        use QueryState::*;
        matches!(
            (self, next),
            (Validating, Embedding)
                | (Validating, Failed)
                | (Embedding, CacheLookup)
                | (Embedding, Failed)
                | (CacheLookup, Responding)
                | (CacheLookup, Ranking)
                | (Ranking, Caching)
                | (Ranking, Failed)
                | (Caching, Responding)
                | (Responding, Done)
        )
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the path a query takes and logs each step.
#[derive(Debug, Clone)]
pub struct StateTrace {
    states: Vec<QueryState>,
}

impl Default for StateTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTrace {
    /// Starts in [`QueryState::Validating`].
    pub fn new() -> Self {
        Self {
            states: vec![QueryState::Validating],
        }
    }

    pub fn current(&self) -> QueryState {
        self.states
            .last()
            .copied()
            .unwrap_or(QueryState::Validating)
    }

    pub(crate) fn advance(&mut self, next: QueryState) {
        let from = self.current();
        debug_assert!(
            from.can_transition_to(next),
            "illegal query transition {from} -> {next}"
        );
        debug!(from = %from, to = %next, "Query state transition");
        self.states.push(next);
    }

    /// Every state visited, in order.
    pub fn states(&self) -> &[QueryState] {
        &self.states
    }
}
