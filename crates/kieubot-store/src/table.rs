use anyhow::Result;
use arrow_array::RecordBatchIterator;
use lancedb::{connect, Connection};

use crate::schema::build_chunks_schema;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

/// Create the chunks table with an empty batch if it does not exist yet.
pub async fn ensure_chunks_table(conn: &Connection, name: &str) -> Result<()> {
    let names = conn.table_names().execute().await?;
    if names.contains(&name.to_string()) {
        return Ok(());
    }
    let schema = build_chunks_schema();
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema);
    conn.create_table(name, Box::new(iter)).execute().await?;
    Ok(())
}
