//! Keyword-heuristic weighting plans for blended retrieval.
//!
//! Plan selection is a pure function of the lowercased query text so it can
//! be tested without touching the embedder or the store. The four plans are
//! mutually exclusive and exhaustive; each covers all four categories and
//! differs only in which one leads and how many chunks it requests.

use kieubot_core::types::DocType;

const TERM_CUES: &[&str] = &["định nghĩa", "là gì", "khái niệm", "thuật ngữ"];
const SUMMARY_CUES: &[&str] = &["tóm tắt", "bao nhiêu", "bố cục", "thể thơ", "số câu"];
const BIO_CUES: &[&str] =
    &["nguyễn du", "nguyen du", "tiểu sử", "quê quán", "năm sinh", "bối cảnh"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalPlan {
    Terminology,
    Summary,
    Biography,
    Analysis,
}

impl RetrievalPlan {
    /// Pick the plan whose cue set matches first; `Analysis` is the
    /// default when nothing matches.
    pub fn for_query(query: &str) -> Self {
        let q = query.to_lowercase();
        if TERM_CUES.iter().any(|w| q.contains(w)) {
            return RetrievalPlan::Terminology;
        }
        if SUMMARY_CUES.iter().any(|w| q.contains(w)) {
            return RetrievalPlan::Summary;
        }
        if BIO_CUES.iter().any(|w| q.contains(w)) {
            return RetrievalPlan::Biography;
        }
        RetrievalPlan::Analysis
    }

    /// Ordered `(category, sub-k)` pairs; the leading category gets the
    /// largest request.
    pub fn weights(self) -> &'static [(DocType, usize); 4] {
        match self {
            RetrievalPlan::Terminology => &[
                (DocType::Term, 4),
                (DocType::Summary, 3),
                (DocType::Analysis, 4),
                (DocType::Bio, 2),
            ],
            RetrievalPlan::Summary => &[
                (DocType::Summary, 4),
                (DocType::Term, 3),
                (DocType::Analysis, 4),
                (DocType::Bio, 2),
            ],
            RetrievalPlan::Biography => &[
                (DocType::Bio, 4),
                (DocType::Summary, 3),
                (DocType::Analysis, 4),
                (DocType::Term, 2),
            ],
            RetrievalPlan::Analysis => &[
                (DocType::Analysis, 4),
                (DocType::Summary, 3),
                (DocType::Term, 2),
                (DocType::Bio, 2),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_words_select_the_matching_plan() {
        assert_eq!(RetrievalPlan::for_query("đoạn trường tân thanh là gì?"), RetrievalPlan::Terminology);
        assert_eq!(RetrievalPlan::for_query("tóm tắt Truyện Kiều"), RetrievalPlan::Summary);
        assert_eq!(RetrievalPlan::for_query("tiểu sử tác giả"), RetrievalPlan::Biography);
        assert_eq!(RetrievalPlan::for_query("phân tích nhân vật Thúy Kiều"), RetrievalPlan::Analysis);
    }

    #[test]
    fn selection_is_case_insensitive() {
        assert_eq!(RetrievalPlan::for_query("NGUYỄN DU sinh năm nào?"), RetrievalPlan::Biography);
        assert_eq!(RetrievalPlan::for_query("Thể Thơ của Truyện Kiều"), RetrievalPlan::Summary);
    }

    #[test]
    fn first_matching_cue_set_wins() {
        // Contains both a terminology cue and a bio cue; terminology is
        // checked first.
        assert_eq!(
            RetrievalPlan::for_query("khái niệm bối cảnh sáng tác"),
            RetrievalPlan::Terminology
        );
    }

    #[test]
    fn every_plan_covers_all_four_categories() {
        use std::collections::HashSet;
        for plan in [
            RetrievalPlan::Terminology,
            RetrievalPlan::Summary,
            RetrievalPlan::Biography,
            RetrievalPlan::Analysis,
        ] {
            let types: HashSet<_> = plan.weights().iter().map(|(t, _)| *t).collect();
            assert_eq!(types.len(), 4, "{plan:?} must cover all categories");
            for (_, sub_k) in plan.weights() {
                assert!((2..=4).contains(sub_k));
            }
        }
    }
}
