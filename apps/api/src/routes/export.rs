use anyhow::Context;

use crate::models::CandidateRecord;

pub const CSV_HEADER: [&str; 9] = [
    "Name",
    "Email",
    "Mobile",
    "Filename",
    "Final Score",
    "AI Score",
    "Keyword Score",
    "Matched Skills",
    "All Skills",
];

/// Renders shortlisted candidates as CSV, one row per record, in ranked order.
/// List-valued cells are joined with `", "`.
pub fn render_csv(records: &[CandidateRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;

    for record in records {
        wtr.write_record([
            record.name.clone(),
            record.email.clone(),
            record.mobile.clone(),
            record.filename.clone(),
            record.score.to_string(),
            record.ai_score.to_string(),
            record.keyword_score.to_string(),
            record.matched_skills.join(", "),
            record.skills.join(", "),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CandidateRecord {
        CandidateRecord {
            filename: "jane.pdf".to_string(),
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            mobile: "Not available".to_string(),
            skills: vec!["Python".to_string(), "Sql".to_string(), "Docker".to_string()],
            matched_skills: vec!["Python".to_string(), "Sql".to_string()],
            score: 0.8123,
            ai_score: 0.9,
            keyword_score: 0.6,
            text: None,
        }
    }

    #[test]
    fn test_header_row() {
        let csv = render_csv(&[]).unwrap();
        assert_eq!(
            csv.trim_end(),
            "Name,Email,Mobile,Filename,Final Score,AI Score,Keyword Score,Matched Skills,All Skills"
        );
    }

    #[test]
    fn test_list_cells_are_quoted_and_joined() {
        let csv = render_csv(&[record()]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "Jane Doe,jane@example.com,Not available,jane.pdf,0.8123,0.9,0.6,\"Python, Sql\",\"Python, Sql, Docker\""
        );
    }
}
