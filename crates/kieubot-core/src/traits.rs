/// Text-to-vector model. Implementations must return L2-normalized vectors
/// of a fixed dimensionality so that cosine similarity reduces to a dot
/// product. Must be safe for concurrent read-only use.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
