//! Lexical Matcher: word-overlap scoring, reference-vocabulary skill detection, and the
//! best-effort identity heuristics that ride along with it.
//!
//! Nothing here touches the embedding model; every function is pure and deterministic.

pub mod identity;
pub mod lexical;
pub mod skills;

pub use identity::extract_identity;
pub use lexical::keyword_overlap_score;
pub use skills::{matched_skills, SkillMatchMode, SkillVocabulary};
