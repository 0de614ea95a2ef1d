//! Domain types shared by the embedder, the store, and the retrieval API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four document categories of the indexed corpus. Closed set: the
/// ingestion pipeline writes exactly these strings into the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Term,
    Summary,
    Analysis,
    Bio,
}

impl DocType {
    pub const ALL: [DocType; 4] = [DocType::Term, DocType::Summary, DocType::Analysis, DocType::Bio];

    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Term => "term",
            DocType::Summary => "summary",
            DocType::Analysis => "analysis",
            DocType::Bio => "bio",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "term" => Ok(DocType::Term),
            "summary" => Ok(DocType::Summary),
            "analysis" => Ok(DocType::Analysis),
            "bio" => Ok(DocType::Bio),
            other => Err(crate::error::Error::Backend(format!("unknown doc type in store: {other}"))),
        }
    }
}

/// Metadata stored next to each chunk. `source` and `line_range` may both
/// be absent; together they form the dedupe key for blended retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub source: Option<String>,
    pub line_range: Option<String>,
}

impl ChunkMeta {
    /// Composite identity of the underlying source span. `(None, None)` is
    /// itself a single key, so at most one fully-anonymous hit survives a
    /// dedupe pass.
    pub fn dedupe_key(&self) -> (Option<&str>, Option<&str>) {
        (self.source.as_deref(), self.line_range.as_deref())
    }
}

/// One retrieved chunk. `score` comes from the search backend; higher is
/// always more similar. The raw vector and internal row id are never
/// surfaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    pub meta: ChunkMeta,
    pub score: f32,
}

/// Eligibility restriction for a retrieval call. Closed on purpose: the
/// only filter the QA assistant needs is equality on the chunk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    None,
    Equals(DocType),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_type_round_trips_through_store_strings() {
        for t in DocType::ALL {
            assert_eq!(t.as_str().parse::<DocType>().ok(), Some(t));
        }
        assert!("poem".parse::<DocType>().is_err());
    }

    #[test]
    fn dedupe_key_treats_double_none_as_one_key() {
        let a = ChunkMeta { doc_type: DocType::Term, source: None, line_range: None };
        let b = ChunkMeta { doc_type: DocType::Bio, source: None, line_range: None };
        assert_eq!(a.dedupe_key(), b.dedupe_key());

        let c = ChunkMeta {
            doc_type: DocType::Term,
            source: Some("kieu.txt".into()),
            line_range: None,
        };
        assert_ne!(a.dedupe_key(), c.dedupe_key());
    }
}
