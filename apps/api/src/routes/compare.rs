use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CandidateRecord, Document};
use crate::pipeline::{BatchOptions, BatchOutcome, Diagnostic, InvalidFilePolicy, PipelineError};
use crate::ranking::FusionWeights;
use crate::routes::export::render_csv;
use crate::state::AppState;

/// Parsed `multipart/form-data` body shared by `/compare` and `/compare/export`.
#[derive(Debug, Default)]
pub struct CompareForm {
    pub documents: Vec<Document>,
    pub job_description: String,
    pub limit: i64,
    pub semantic_weight: Option<f64>,
    pub lexical_weight: Option<f64>,
    pub policy: Option<InvalidFilePolicy>,
    pub include_text: bool,
}

impl CompareForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = CompareForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "resumes[]" | "resumes" => {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let bytes = field.bytes().await?;
                    form.documents.push(Document::new(filename, bytes));
                }
                "jobDesc" => form.job_description = field.text().await?,
                "numShortlist" => {
                    let raw = field.text().await?;
                    form.limit = parse_field(&name, &raw)?.unwrap_or(0);
                }
                "semanticWeight" => {
                    form.semantic_weight = parse_field(&name, &field.text().await?)?;
                }
                "lexicalWeight" => {
                    form.lexical_weight = parse_field(&name, &field.text().await?)?;
                }
                "policy" => form.policy = parse_field(&name, &field.text().await?)?,
                "includeText" => {
                    let raw = field.text().await?;
                    form.include_text = matches!(
                        raw.trim().to_ascii_lowercase().as_str(),
                        "true" | "1" | "yes" | "on"
                    );
                }
                _ => {
                    // Ignore unknown fields
                    let _ = field.bytes().await?;
                }
            }
        }

        Ok(form)
    }

    /// Applies the per-request overrides on top of the configured defaults.
    pub fn batch_options(&self, defaults: BatchOptions) -> Result<BatchOptions, PipelineError> {
        let weights = match (self.semantic_weight, self.lexical_weight) {
            (None, None) => defaults.weights,
            (Some(s), Some(l)) => FusionWeights::new(s, l)?,
            (Some(s), None) => FusionWeights::new(s, (1.0 - s).max(0.0))?,
            (None, Some(l)) => FusionWeights::new((1.0 - l).max(0.0), l)?,
        };

        Ok(BatchOptions {
            limit: self.limit,
            weights,
            policy: self.policy.unwrap_or(defaults.policy),
        })
    }
}

/// Blank values count as "not supplied".
fn parse_field<T>(name: &str, raw: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
{
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{name} has an invalid value '{raw}'")))
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub batch_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub documents_received: usize,
    pub documents_scored: usize,
    pub scores: Vec<CandidateRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompareResponse {
    fn from_outcome(outcome: BatchOutcome, include_text: bool) -> Self {
        Self {
            batch_id: outcome.batch_id,
            completed_at: outcome.completed_at,
            documents_received: outcome.documents_received,
            documents_scored: outcome.documents_scored,
            scores: outcome
                .candidates
                .iter()
                .map(|c| CandidateRecord::from_result(c, include_text))
                .collect(),
            diagnostics: outcome.diagnostics,
        }
    }
}

async fn run_batch(state: &AppState, multipart: Multipart) -> Result<CompareResponse, AppError> {
    let form = CompareForm::from_multipart(multipart).await?;
    let options = form.batch_options(state.default_options())?;

    info!(
        "Compare request: {} file(s), limit={}, include_text={}",
        form.documents.len(),
        options.limit,
        form.include_text
    );

    let outcome = state
        .pipeline
        .process_batch(form.documents, &form.job_description, &options)
        .await?;

    Ok(CompareResponse::from_outcome(outcome, form.include_text))
}

/// POST /compare
/// Scores the uploaded resumes against the job description and returns the ranked shortlist.
pub async fn handle_compare(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CompareResponse>, AppError> {
    Ok(Json(run_batch(&state, multipart).await?))
}

/// POST /compare/export
/// Same batch as `/compare`, rendered as a CSV download.
pub async fn handle_export(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let response = run_batch(&state, multipart).await?;
    let csv = render_csv(&response.scores)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shortlisted_candidates.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(semantic: Option<f64>, lexical: Option<f64>) -> CompareForm {
        CompareForm {
            semantic_weight: semantic,
            lexical_weight: lexical,
            ..CompareForm::default()
        }
    }

    #[test]
    fn test_no_overrides_uses_defaults() {
        let defaults = BatchOptions {
            limit: 0,
            weights: FusionWeights::SEMANTIC_ONLY,
            policy: InvalidFilePolicy::Strict,
        };
        let options = form(None, None).batch_options(defaults).unwrap();
        assert_eq!(options.weights, FusionWeights::SEMANTIC_ONLY);
        assert_eq!(options.policy, InvalidFilePolicy::Strict);
    }

    #[test]
    fn test_single_weight_takes_complement() {
        let options = form(Some(1.0), None)
            .batch_options(BatchOptions::default())
            .unwrap();
        assert_eq!(options.weights, FusionWeights::SEMANTIC_ONLY);

        let options = form(None, Some(0.25))
            .batch_options(BatchOptions::default())
            .unwrap();
        assert!((options.weights.semantic() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_weights_are_rejected() {
        let err = form(Some(0.0), Some(0.0))
            .batch_options(BatchOptions::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidWeights(_)));
    }

    #[test]
    fn test_parse_field_treats_blank_as_absent() {
        assert_eq!(parse_field::<i64>("numShortlist", "  ").unwrap(), None);
        assert_eq!(parse_field::<i64>("numShortlist", "3").unwrap(), Some(3));
        assert!(parse_field::<i64>("numShortlist", "three").is_err());
    }
}
