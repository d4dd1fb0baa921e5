use std::collections::HashSet;

/// Whitespace-tokenized, lower-cased word set. No stemming, no stopword removal.
pub fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Fraction of distinct job-description words that also occur in the resume.
///
/// `|resume ∩ job| / |job|`, and 0.0 when the job description has no words.
pub fn keyword_overlap_score(resume_text: &str, job_text: &str) -> f64 {
    let job_tokens = token_set(job_text);
    if job_tokens.is_empty() {
        return 0.0;
    }
    let resume_tokens = token_set(resume_text);
    let shared = job_tokens.intersection(&resume_tokens).count();
    shared as f64 / job_tokens.len() as f64
}
