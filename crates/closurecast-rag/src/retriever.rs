//! Retrieval trait

use async_trait::async_trait;
use closurecast_core::{Result, ScoredDocument};

/// Number of documents used as grounding context
pub const DEFAULT_TOP_K: usize = 3;

/// Trait for all retrieval backends.
///
/// Implementations rank the corpus against a free-text query and return at
/// most their configured top-k documents, every one with a positive score,
/// in descending score order. An empty result means nothing matched.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Rank the corpus against `query`
    async fn rank(&self, query: &str) -> Result<Vec<ScoredDocument>>;

    /// Get the retriever name
    fn name(&self) -> &str;
}
