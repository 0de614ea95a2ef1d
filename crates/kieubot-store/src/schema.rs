//! Arrow schema of the `chunks` table.
//!
//! Rows are produced by the external ingestion pipeline; this crate only
//! needs the schema to open/seed tables and to project search results.
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Dimensionality of multilingual-e5-base vectors.
pub const EMBEDDING_DIM: i32 = 768;

pub fn build_chunks_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("type", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, true),
        Field::new("line_range", DataType::Utf8, true),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), EMBEDDING_DIM),
            true,
        ),
    ]))
}
