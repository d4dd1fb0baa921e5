use serde::{Deserialize, Serialize};

/// Placeholder rendered for identity fields the heuristics could not find.
pub const NOT_AVAILABLE: &str = "Not available";

/// Maximum characters of resume text echoed back when a preview is requested.
pub const TEXT_PREVIEW_CHARS: usize = 3000;

/// Best-effort identity fields pulled from resume text by regex.
/// Low confidence: never used for scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

/// Everything the pipeline knows about one scored resume. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub filename: String,
    /// File name without extension; the display name when no name line was found.
    pub fallback_name: String,
    pub identity: Identity,
    pub skills: Vec<String>,
    pub matched_skills: Vec<String>,
    /// Cosine similarity between resume and job description embeddings.
    pub semantic_score: f64,
    /// Job-token overlap ratio, 0.0 – 1.0.
    pub lexical_score: f64,
    /// Convex blend of the two scores; the ranking key.
    pub final_score: f64,
    pub text: String,
}

/// Flat, serializable view of a `CandidateResult` returned to HTTP callers.
///
/// Scores are rounded to 4 decimal places; ranking always uses full precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub filename: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub skills: Vec<String>,
    pub matched_skills: Vec<String>,
    pub score: f64,
    pub ai_score: f64,
    pub keyword_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CandidateRecord {
    pub fn from_result(result: &CandidateResult, include_text: bool) -> Self {
        let text = include_text.then(|| result.text.chars().take(TEXT_PREVIEW_CHARS).collect());

        Self {
            filename: result.filename.clone(),
            name: result
                .identity
                .name
                .clone()
                .unwrap_or_else(|| result.fallback_name.clone()),
            email: result
                .identity
                .email
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            mobile: result
                .identity
                .mobile
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            skills: result.skills.clone(),
            matched_skills: result.matched_skills.clone(),
            score: round4(result.final_score),
            ai_score: round4(result.semantic_score),
            keyword_score: round4(result.lexical_score),
            text,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
