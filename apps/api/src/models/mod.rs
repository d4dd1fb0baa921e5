pub mod candidate;
pub mod document;

pub use candidate::{CandidateRecord, CandidateResult, Identity};
pub use document::Document;
