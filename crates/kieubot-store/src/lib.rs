//! LanceDB-backed chunk store.
//!
//! Read side of the retrieval stack: opens the configured database/table
//! and runs ANN queries over the `vector` column (cosine distance). The
//! index and documents are populated by an external ingestion pipeline;
//! nothing here mutates stored data apart from the test/tooling append
//! helper in [`writer`].

use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType};
use tracing::{debug, info, warn};

use kieubot_core::config::Settings;
use kieubot_core::error::{Error, Result};
use kieubot_core::types::{ChunkMeta, DocType, SearchHit, TypeFilter};

pub mod schema;
pub mod table;
pub mod writer;

pub use writer::ChunkRecord;

/// Handle to the chunks table. Construct once and share; all methods are
/// read-only and take `&self`.
pub struct ChunkStore {
    db: Connection,
    table_name: String,
    index_name: String,
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("table_name", &self.table_name)
            .field("index_name", &self.index_name)
            .finish_non_exhaustive()
    }
}

impl ChunkStore {
    /// Open the configured database and verify the chunks table exists.
    /// Connection failures are fatal; there is no retry.
    pub async fn open(settings: &Settings) -> Result<Self> {
        let path = settings.database_path();
        let db = table::open_db(path.to_string_lossy().as_ref()).await.map_err(backend)?;
        let names = db.table_names().execute().await.map_err(backend)?;
        if !names.contains(&settings.table) {
            return Err(Error::Backend(format!(
                "table '{}' not found under {}",
                settings.table,
                path.display()
            )));
        }
        let store = Self {
            db,
            table_name: settings.table.clone(),
            index_name: settings.index_name.clone(),
        };
        store.check_vector_index().await;
        info!(table = %store.table_name, db = %path.display(), "chunk store ready");
        Ok(store)
    }

    /// The index is maintained elsewhere; a missing one is not an error
    /// (fresh tables fall back to a flat scan) but is worth surfacing.
    async fn check_vector_index(&self) {
        let Ok(table) = self.db.open_table(&self.table_name).execute().await else {
            return;
        };
        match table.list_indices().await {
            Ok(indices) => {
                if !indices.iter().any(|ix| ix.name == self.index_name) {
                    warn!(
                        index = %self.index_name,
                        "named vector index not found; queries will run as a flat scan"
                    );
                }
            }
            Err(e) => warn!(error = %e, "could not list indices"),
        }
    }

    /// Nearest-neighbor search over the `vector` column.
    ///
    /// `num_candidates` widens the candidate pool the index examines before
    /// truncating to `k` (expressed to Lance as a refine factor). Results
    /// are projected to `{text, meta, score}` with `score = 1 - distance`,
    /// ordered by the backend (descending score). Zero matches is an empty
    /// Vec, not an error.
    pub async fn ann_search(
        &self,
        query_vec: Vec<f32>,
        k: usize,
        num_candidates: usize,
        filter: TypeFilter,
    ) -> Result<Vec<SearchHit>> {
        let table = self.db.open_table(&self.table_name).execute().await.map_err(backend)?;
        let refine = num_candidates.div_ceil(k.max(1)).max(1) as u32;
        let mut query = table
            .vector_search(query_vec)
            .map_err(backend)?
            .distance_type(DistanceType::Cosine)
            .refine_factor(refine)
            .select(Select::columns(&["text", "type", "source", "line_range"]))
            .limit(k);
        if let TypeFilter::Equals(t) = filter {
            query = query.only_if(format!("type = '{}'", t.as_str()));
        }

        let mut stream = query.execute().await.map_err(backend)?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(backend)? {
            collect_hits(&batch, &mut hits)?;
        }
        debug!(k, num_candidates, hits = hits.len(), "ann search done");
        Ok(hits)
    }
}

fn collect_hits(batch: &RecordBatch, hits: &mut Vec<SearchHit>) -> Result<()> {
    let text = string_col(batch, "text")?;
    let doc_type = string_col(batch, "type")?;
    let source = string_col(batch, "source")?;
    let line_range = string_col(batch, "line_range")?;
    let distance = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| Error::Backend("_distance column missing".to_string()))?;

    for i in 0..batch.num_rows() {
        let doc_type: DocType = doc_type.value(i).parse()?;
        let meta = ChunkMeta {
            doc_type,
            source: opt_value(source, i),
            line_range: opt_value(line_range, i),
        };
        // Cosine distance -> similarity; higher is better.
        hits.push(SearchHit {
            text: text.value(i).to_string(),
            meta,
            score: 1.0 - distance.value(i),
        });
    }
    Ok(())
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::Backend(format!("{name} column missing")))
}

fn opt_value(col: &StringArray, i: usize) -> Option<String> {
    if col.is_null(i) {
        None
    } else {
        Some(col.value(i).to_string())
    }
}

fn backend<E: std::fmt::Display>(e: E) -> Error {
    Error::Backend(e.to_string())
}
