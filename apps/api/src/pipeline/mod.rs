//! Pipeline Orchestrator: drives one batch end to end:
//! validate → extract → score (semantic + lexical) → fuse → rank.
//!
//! Per-document trouble (bad file type, unreadable PDF, model failure) becomes a
//! `Diagnostic` on the outcome, never a failed batch. Only precondition violations,
//! and an invalid file under the strict policy, abort the batch.

pub mod orchestrator;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::CandidateResult;
use crate::ranking::{FusionWeights, InvalidWeights};

pub use orchestrator::Pipeline;

/// What to do with uploads that are not PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidFilePolicy {
    /// Skip the file, record a diagnostic, score the rest.
    #[default]
    Lenient,
    /// Reject the whole batch before any document is processed.
    Strict,
}

impl FromStr for InvalidFilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown invalid-file policy '{other}' (expected 'lenient' or 'strict')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    InvalidFileType,
    ExtractionFailure,
    EncodingFailure,
    ScratchIo,
    /// The scoring task for a document crashed outside extraction.
    ScoringFailure,
}

/// A non-fatal problem encountered while processing a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// `None` for batch-level problems (e.g. the job description failed to encode).
    pub filename: Option<String>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn for_file(filename: &str, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.to_string()),
            kind,
            message: message.into(),
        }
    }

    pub fn for_batch(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            filename: None,
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("At least one resume is required")]
    EmptyBatch,

    #[error("Job description is required")]
    MissingJobDescription,

    #[error("Invalid file type: {filename}. Only PDF files are allowed.")]
    InvalidFileType { filename: String },

    #[error(transparent)]
    InvalidWeights(#[from] InvalidWeights),
}

/// Per-batch knobs. Defaults come from `Config`; requests may override them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    /// Shortlist size; `<= 0` returns every candidate.
    pub limit: i64,
    pub weights: FusionWeights,
    pub policy: InvalidFilePolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            limit: 0,
            weights: FusionWeights::BLENDED,
            policy: InvalidFilePolicy::Lenient,
        }
    }
}

/// Result of one `Pipeline::process_batch` call.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub batch_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub documents_received: usize,
    /// Documents that made it through scoring, before the shortlist limit is applied.
    pub documents_scored: usize,
    /// Ranked, highest final score first, truncated to the requested limit.
    pub candidates: Vec<CandidateResult>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!("strict".parse::<InvalidFilePolicy>(), Ok(InvalidFilePolicy::Strict));
        assert_eq!(" Lenient ".parse::<InvalidFilePolicy>(), Ok(InvalidFilePolicy::Lenient));
        assert!("sometimes".parse::<InvalidFilePolicy>().is_err());
    }

    #[test]
    fn test_diagnostic_serializes_snake_case_kind() {
        let diag = Diagnostic::for_file("cv.docx", DiagnosticKind::InvalidFileType, "not a PDF");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["kind"], "invalid_file_type");
        assert_eq!(json["filename"], "cv.docx");

        let batch = Diagnostic::for_batch(DiagnosticKind::ScratchIo, "disk full");
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["kind"], "scratch_io");
        assert!(json["filename"].is_null());

        let crashed = Diagnostic::for_file("cv.pdf", DiagnosticKind::ScoringFailure, "panicked");
        assert_eq!(serde_json::to_value(&crashed).unwrap()["kind"], "scoring_failure");
    }
}
