use crate::models::CandidateResult;

/// Sorts candidates by final score, highest first, and keeps the top `limit`.
///
/// The sort is stable: equal scores keep their insertion order. `limit <= 0` keeps
/// everything, and a limit past the end is not an error.
pub fn rank(results: Vec<CandidateResult>, limit: i64) -> Vec<CandidateResult> {
    rank_by(results, limit, |c| c.final_score)
}

pub fn rank_by<T, F>(mut items: Vec<T>, limit: i64, score: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
    if limit > 0 {
        items.truncate(limit as usize);
    }
    items
}
