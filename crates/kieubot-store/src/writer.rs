//! Append helper for the chunks table.
//!
//! Real corpus ingestion lives in an external pipeline; this exists so
//! tests and small tooling can seed a table without reimplementing the
//! arrow plumbing.
use anyhow::Result;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::Connection;
use std::sync::Arc;

use kieubot_core::types::ChunkMeta;

use crate::schema::{build_chunks_schema, EMBEDDING_DIM};
use crate::table::ensure_chunks_table;

/// One row of the chunks table, vector included.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    pub meta: ChunkMeta,
    pub vector: Vec<f32>,
}

pub async fn append_chunks(conn: &Connection, table: &str, records: &[ChunkRecord]) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    ensure_chunks_table(conn, table).await?;
    let t = conn.open_table(table).execute().await?;

    let mut ids = Vec::new();
    let mut texts = Vec::new();
    let mut types = Vec::new();
    let mut sources: Vec<Option<String>> = Vec::new();
    let mut line_ranges: Vec<Option<String>> = Vec::new();
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
    for r in records {
        ids.push(r.id.clone());
        texts.push(r.text.clone());
        types.push(r.meta.doc_type.as_str().to_string());
        sources.push(r.meta.source.clone());
        line_ranges.push(r.meta.line_range.clone());
        vectors.push(Some(r.vector.iter().map(|&x| Some(x)).collect()));
    }
    let batch = RecordBatch::try_new(
        build_chunks_schema(),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(texts)),
            Arc::new(StringArray::from(types)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(line_ranges)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                vectors.into_iter(),
                EMBEDDING_DIM,
            )),
        ],
    )?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), build_chunks_schema()));
    t.add(reader).execute().await?;
    Ok(())
}
