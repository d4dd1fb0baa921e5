//! Score Fuser & Ranker: convex blend of semantic and lexical scores, then a stable
//! descending sort and shortlist truncation.

pub mod fusion;
pub mod rank;

pub use fusion::{fuse, FusionWeights, InvalidWeights};
pub use rank::rank;
