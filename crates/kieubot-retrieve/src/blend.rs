//! Dedupe and rank pass applied to the pooled sub-query results.

use std::cmp::Ordering;
use std::collections::HashSet;

use kieubot_core::types::SearchHit;

/// Collapse duplicates by `(source, line_range)` keeping the first
/// occurrence in pool order, stable-sort by descending score, and truncate
/// to `k`.
///
/// `(None, None)` is one dedupe key, so at most one fully-anonymous hit
/// survives. The stable sort means score ties keep pool order: plan order
/// first, then each sub-query's own ranking.
pub fn dedupe_and_rank(pool: Vec<SearchHit>, k: usize) -> Vec<SearchHit> {
    let mut seen: HashSet<(Option<String>, Option<String>)> = HashSet::new();
    let mut uniq: Vec<SearchHit> = Vec::with_capacity(pool.len());
    for hit in pool {
        let key = (hit.meta.source.clone(), hit.meta.line_range.clone());
        if seen.insert(key) {
            uniq.push(hit);
        }
    }

    uniq.sort_by(|a, b| sort_score(b).partial_cmp(&sort_score(a)).unwrap_or(Ordering::Equal));
    uniq.truncate(k);
    uniq
}

// NaN scores sort as 0.0 rather than poisoning the comparator.
fn sort_score(hit: &SearchHit) -> f32 {
    if hit.score.is_nan() {
        0.0
    } else {
        hit.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieubot_core::types::{ChunkMeta, DocType};

    fn hit(text: &str, doc_type: DocType, source: Option<&str>, line_range: Option<&str>, score: f32) -> SearchHit {
        SearchHit {
            text: text.to_string(),
            meta: ChunkMeta {
                doc_type,
                source: source.map(str::to_string),
                line_range: line_range.map(str::to_string),
            },
            score,
        }
    }

    #[test]
    fn duplicates_collapse_keeping_first_occurrence() {
        let pool = vec![
            hit("first", DocType::Bio, Some("kieu.txt"), Some("1-10"), 0.4),
            hit("second", DocType::Summary, Some("kieu.txt"), Some("1-10"), 0.9),
        ];
        let out = dedupe_and_rank(pool, 4);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "first");
    }

    #[test]
    fn at_most_one_anonymous_hit_survives() {
        let pool = vec![
            hit("a", DocType::Term, None, None, 0.2),
            hit("b", DocType::Bio, None, None, 0.8),
            hit("c", DocType::Analysis, Some("notes.txt"), None, 0.5),
        ];
        let out = dedupe_and_rank(pool, 4);
        assert_eq!(out.len(), 2);
        assert!(out.iter().any(|h| h.text == "a"));
        assert!(out.iter().any(|h| h.text == "c"));
    }

    #[test]
    fn sorted_descending_with_stable_ties_and_truncation() {
        let pool = vec![
            hit("low", DocType::Term, Some("a"), Some("1"), 0.1),
            hit("tie-first", DocType::Summary, Some("b"), Some("2"), 0.5),
            hit("tie-second", DocType::Analysis, Some("c"), Some("3"), 0.5),
            hit("high", DocType::Bio, Some("d"), Some("4"), 0.9),
        ];
        let out = dedupe_and_rank(pool, 3);
        let texts: Vec<_> = out.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, ["high", "tie-first", "tie-second"]);
    }

    #[test]
    fn nan_scores_sort_as_zero() {
        let pool = vec![
            hit("nan", DocType::Term, Some("a"), Some("1"), f32::NAN),
            hit("small", DocType::Term, Some("b"), Some("2"), 0.01),
        ];
        let out = dedupe_and_rank(pool, 2);
        assert_eq!(out[0].text, "small");
    }

    #[test]
    fn fewer_survivors_than_k_returns_all() {
        let pool = vec![hit("only", DocType::Bio, Some("a"), Some("1"), 0.3)];
        let out = dedupe_and_rank(pool, 4);
        assert_eq!(out.len(), 1);
    }
}
