//! Retrieval API for the Truyện Kiều QA assistant.
//!
//! A [`Retriever`] pairs the embedding model with the chunk store, both
//! constructed exactly once and shared by reference afterwards. It exposes
//! two operations: [`Retriever::retrieve_context`] (plain top-k vector
//! search, optionally type-filtered) and [`Retriever::smart_retrieve`]
//! (category-weighted multi-query blend with dedupe and re-sort).

use tracing::debug;

use kieubot_core::config::Settings;
use kieubot_core::error::{Error, Result};
use kieubot_core::traits::Embedder;
use kieubot_core::types::{SearchHit, TypeFilter};
use kieubot_embed::{load_embedder, QUERY_PREFIX};
use kieubot_store::ChunkStore;

pub mod blend;
pub mod plan;

pub use plan::RetrievalPlan;

/// Defaults for [`Retriever::retrieve_context`].
pub const DEFAULT_K: usize = 5;
pub const DEFAULT_NUM_CANDIDATES: usize = 100;

/// Defaults for [`Retriever::smart_retrieve`].
pub const SMART_DEFAULT_K: usize = 4;
pub const SMART_NUM_CANDIDATES: usize = 90;

/// Embedder + store pair. Explicitly constructed and dependency-injected
/// instead of a process-global memoized singleton; all methods take
/// `&self` and are safe for concurrent use.
pub struct Retriever {
    embedder: Box<dyn Embedder>,
    store: ChunkStore,
}

impl Retriever {
    /// One-time construction from settings: loads the embedding model and
    /// opens the database/table. Either failure is fatal; no retry, no
    /// fallback.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let embedder = load_embedder(&settings.model_id, settings.model_dir.as_deref())
            .map_err(|e| Error::Embedding(e.to_string()))?;
        let store = ChunkStore::open(settings).await?;
        Ok(Self::new(embedder, store))
    }

    /// Assemble from already-built parts.
    pub fn new(embedder: Box<dyn Embedder>, store: ChunkStore) -> Self {
        Self { embedder, store }
    }

    /// Plain vector search: top-`k` chunks by cosine similarity, optionally
    /// restricted to one category.
    ///
    /// `num_candidates` is the ANN breadth/accuracy knob and must be
    /// `>= k`; a smaller value is rejected rather than clamped, since the
    /// backend's behavior for that case is undefined.
    pub async fn retrieve_context(
        &self,
        query: &str,
        k: usize,
        filter: TypeFilter,
        num_candidates: usize,
    ) -> Result<Vec<SearchHit>> {
        validate_query(query, k)?;
        if num_candidates < k {
            return Err(Error::InvalidArgument(format!(
                "num_candidates ({num_candidates}) must be >= k ({k})"
            )));
        }

        let qvec = self.encode_query(query)?;
        self.store.ann_search(qvec, k, num_candidates, filter).await
    }

    /// Category-weighted blend: pick a weighting plan from the query text,
    /// run one filtered sub-query per category in plan order, then dedupe
    /// by `(source, line_range)`, sort by descending score, and truncate
    /// to `k`.
    pub async fn smart_retrieve(
        &self,
        query: &str,
        k: usize,
        num_candidates: usize,
    ) -> Result<Vec<SearchHit>> {
        validate_query(query, k)?;

        let plan = RetrievalPlan::for_query(query);
        debug!(?plan, k, num_candidates, "selected weighting plan");

        let mut pool = Vec::new();
        for &(doc_type, sub_k) in plan.weights() {
            let hits = self
                .retrieve_context(query, sub_k, TypeFilter::Equals(doc_type), num_candidates)
                .await?;
            debug!(doc_type = %doc_type, sub_k, hits = hits.len(), "sub-query done");
            pool.extend(hits);
        }

        Ok(blend::dedupe_and_rank(pool, k))
    }

    fn encode_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed_batch(&[format!("{QUERY_PREFIX}{query}")])
            .map_err(|e| Error::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("embedder returned no vectors".to_string()))
    }
}

fn validate_query(query: &str, k: usize) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::InvalidArgument("query must be non-empty".to_string()));
    }
    if k == 0 {
        return Err(Error::InvalidArgument("k must be >= 1".to_string()));
    }
    Ok(())
}
