use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::embedding::{EmbeddingVector, SemanticScorer};
use crate::extraction::{ExtractionError, TextExtractor};
use crate::matching::{extract_identity, keyword_overlap_score, matched_skills, SkillVocabulary};
use crate::models::{CandidateResult, Document, Identity};
use crate::pipeline::{
    BatchOptions, BatchOutcome, Diagnostic, DiagnosticKind, InvalidFilePolicy, PipelineError,
};
use crate::ranking::{fuse, rank, FusionWeights};

/// Shared, cheaply cloneable batch processor. One instance lives in `AppState`.
#[derive(Clone)]
pub struct Pipeline {
    extractor: Arc<dyn TextExtractor>,
    scorer: SemanticScorer,
    vocabulary: Arc<SkillVocabulary>,
    max_concurrency: usize,
}

/// Per-task output: upload index (for order restoration), the scored candidate,
/// and whatever went wrong along the way.
struct Scored {
    index: usize,
    candidate: CandidateResult,
    diagnostics: Vec<Diagnostic>,
}

impl Scored {
    /// Zero-score placeholder for a document whose scoring task crashed.
    fn failed(index: usize, filename: String, fallback_name: String, message: String) -> Self {
        let diagnostic = Diagnostic::for_file(&filename, DiagnosticKind::ScoringFailure, message);
        Self {
            index,
            candidate: CandidateResult {
                filename,
                fallback_name,
                identity: Identity::default(),
                skills: Vec::new(),
                matched_skills: Vec::new(),
                semantic_score: 0.0,
                lexical_score: 0.0,
                final_score: 0.0,
                text: String::new(),
            },
            diagnostics: vec![diagnostic],
        }
    }
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        scorer: SemanticScorer,
        vocabulary: SkillVocabulary,
        max_concurrency: usize,
    ) -> Self {
        Self {
            extractor,
            scorer,
            vocabulary: Arc::new(vocabulary),
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn model_name(&self) -> &str {
        self.scorer.model_name()
    }

    /// Scores every document against `job_description` and returns the ranked shortlist.
    ///
    /// Documents are processed concurrently (bounded by `max_concurrency`), but results
    /// are put back in upload order before the stable sort, so ties rank the same way
    /// regardless of scheduling.
    pub async fn process_batch(
        &self,
        documents: Vec<Document>,
        job_description: &str,
        options: &BatchOptions,
    ) -> Result<BatchOutcome, PipelineError> {
        if documents.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }
        if job_description.trim().is_empty() {
            return Err(PipelineError::MissingJobDescription);
        }

        let batch_id = Uuid::new_v4();
        let documents_received = documents.len();
        info!(
            "Batch {}: {} document(s) received, policy={:?}, weights={:.2}/{:.2}",
            batch_id,
            documents_received,
            options.policy,
            options.weights.semantic(),
            options.weights.lexical()
        );

        // ── File-type validation (strict aborts before any work) ─────────
        if options.policy == InvalidFilePolicy::Strict {
            if let Some(bad) = documents.iter().find(|d| !d.is_pdf()) {
                warn!("Batch {}: rejecting batch, {} is not a PDF", batch_id, bad.name);
                return Err(PipelineError::InvalidFileType {
                    filename: bad.name.clone(),
                });
            }
        }

        let mut per_document: Vec<(usize, Diagnostic)> = Vec::new();
        let mut accepted: Vec<(usize, Document)> = Vec::with_capacity(documents.len());
        for (index, document) in documents.into_iter().enumerate() {
            if document.is_pdf() {
                accepted.push((index, document));
            } else {
                warn!("Batch {}: skipping {} (not a PDF)", batch_id, document.name);
                per_document.push((
                    index,
                    Diagnostic::for_file(
                        &document.name,
                        DiagnosticKind::InvalidFileType,
                        "Only PDF files are allowed",
                    ),
                ));
            }
        }

        // ── Job description is encoded once per batch ────────────────────
        let mut batch_level: Vec<Diagnostic> = Vec::new();
        let job_vector = if accepted.is_empty() {
            None
        } else {
            match self.scorer.encode(job_description).await {
                Ok(vector) => vector.map(Arc::new),
                Err(e) => {
                    error!("Batch {}: job description encoding failed: {}", batch_id, e);
                    batch_level.push(Diagnostic::for_batch(
                        DiagnosticKind::EncodingFailure,
                        format!("Job description could not be encoded; semantic scores are 0: {e}"),
                    ));
                    None
                }
            }
        };

        // ── Score documents concurrently ─────────────────────────────────
        let job_text: Arc<str> = Arc::from(job_description);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, document) in accepted {
            let pipeline = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let job_text = Arc::clone(&job_text);
            let job_vector = job_vector.clone();
            let weights = options.weights;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let filename = document.name.clone();
                let fallback_name = document.stem().to_string();

                let scoring = tokio::spawn(async move {
                    pipeline
                        .score_document(index, document, &job_text, job_vector.as_deref(), &weights)
                        .await
                });
                match scoring.await {
                    Ok(scored) => scored,
                    Err(e) => {
                        error!("Scoring {} failed: {}", filename, e);
                        Scored::failed(index, filename, fallback_name, format!("Scoring crashed: {e}"))
                    }
                }
            });
        }

        let mut scored: Vec<Scored> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => scored.push(result),
                Err(e) => {
                    error!("Batch {}: scoring task failed: {}", batch_id, e);
                    batch_level.push(Diagnostic::for_batch(
                        DiagnosticKind::ScoringFailure,
                        format!("A document could not be processed: {e}"),
                    ));
                }
            }
        }

        scored.sort_by_key(|s| s.index);
        for s in &mut scored {
            let index = s.index;
            per_document.extend(s.diagnostics.drain(..).map(|d| (index, d)));
        }
        per_document.sort_by_key(|(index, _)| *index);

        let documents_scored = scored.len();
        let candidates = rank(
            scored.into_iter().map(|s| s.candidate).collect(),
            options.limit,
        );

        let diagnostics: Vec<Diagnostic> = batch_level
            .into_iter()
            .chain(per_document.into_iter().map(|(_, d)| d))
            .collect();

        info!(
            "Batch {} complete: {} scored, {} returned, {} diagnostic(s)",
            batch_id,
            documents_scored,
            candidates.len(),
            diagnostics.len()
        );

        Ok(BatchOutcome {
            batch_id,
            completed_at: Utc::now(),
            documents_received,
            documents_scored,
            candidates,
            diagnostics,
        })
    }

    async fn score_document(
        &self,
        index: usize,
        document: Document,
        job_text: &str,
        job_vector: Option<&EmbeddingVector>,
        weights: &FusionWeights,
    ) -> Scored {
        let mut diagnostics = Vec::new();
        let filename = document.name.clone();
        let fallback_name = document.stem().to_string();

        // pdf-extract is CPU-bound; keep it off the async workers.
        let extractor = Arc::clone(&self.extractor);
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&document)).await;

        let text = match extracted {
            Ok(Ok(text)) => {
                if text.trim().is_empty() {
                    warn!("No extractable text in {}", filename);
                    diagnostics.push(Diagnostic::for_file(
                        &filename,
                        DiagnosticKind::ExtractionFailure,
                        "No text content found in document",
                    ));
                }
                text
            }
            Ok(Err(e)) => {
                warn!("Text extraction failed for {}: {}", filename, e);
                let kind = match e {
                    ExtractionError::Scratch(_) => DiagnosticKind::ScratchIo,
                    ExtractionError::Empty | ExtractionError::Parse(_) => {
                        DiagnosticKind::ExtractionFailure
                    }
                };
                diagnostics.push(Diagnostic::for_file(&filename, kind, e.to_string()));
                String::new()
            }
            Err(e) => {
                error!("Extractor panicked on {}: {}", filename, e);
                diagnostics.push(Diagnostic::for_file(
                    &filename,
                    DiagnosticKind::ExtractionFailure,
                    format!("Extractor crashed: {e}"),
                ));
                String::new()
            }
        };

        let semantic_score = match job_vector {
            Some(reference) => match self.scorer.score_against(&text, reference).await {
                Ok(score) => score,
                Err(e) => {
                    warn!("Embedding failed for {}: {}", filename, e);
                    diagnostics.push(Diagnostic::for_file(
                        &filename,
                        DiagnosticKind::EncodingFailure,
                        e.to_string(),
                    ));
                    0.0
                }
            },
            None => 0.0,
        };

        let lexical_score = keyword_overlap_score(&text, job_text);
        let skills = self.vocabulary.extract_skills(&text);
        let matched = matched_skills(&skills, job_text);
        let identity = extract_identity(&text);
        let final_score = fuse(semantic_score, lexical_score, weights);

        debug!(
            "{}: semantic={:.4} lexical={:.4} final={:.4} skills={}",
            filename,
            semantic_score,
            lexical_score,
            final_score,
            skills.len()
        );

        Scored {
            index,
            candidate: CandidateResult {
                filename,
                fallback_name,
                identity,
                skills,
                matched_skills: matched,
                semantic_score,
                lexical_score,
                final_score,
                text,
            },
            diagnostics,
        }
    }
}
