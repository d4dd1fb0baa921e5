pub mod compare;
pub mod export;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/compare", post(compare::handle_compare))
        .route("/compare/export", post(compare::handle_export))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::embedding::testing::HashingEmbedder;
    use crate::embedding::SemanticScorer;
    use crate::extraction::pdf::minimal_pdf;
    use crate::extraction::PdfTextExtractor;
    use crate::matching::SkillVocabulary;
    use crate::pipeline::Pipeline;

    const BOUNDARY: &str = "shortlist-test-boundary";
    const JOB: &str = "Python Flask SQL developer";

    fn app_with(env: &[(&str, &str)]) -> Router {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_lookup(|key| env.get(key).cloned()).unwrap();
        let pipeline = Pipeline::new(
            Arc::new(PdfTextExtractor::default()),
            SemanticScorer::new(Arc::new(HashingEmbedder::new())),
            SkillVocabulary::with_mode(config.skill_match),
            config.max_concurrent_documents,
        );
        build_router(AppState::new(config, pipeline))
    }

    fn app() -> Router {
        app_with(&[])
    }

    fn multipart_body(fields: &[(&str, &str)], files: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (filename, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resumes[]\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn resumes() -> Vec<(&'static str, Vec<u8>)> {
        vec![
            ("jane.pdf", minimal_pdf(&["Jane Doe", "Python developer with Flask and SQL"])),
            ("john.PDF", minimal_pdf(&["John Roe", "Java engineer"])),
        ]
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["embedding_model"], "hashing-test");
    }

    #[tokio::test]
    async fn test_compare_returns_flat_records() {
        let body = multipart_body(&[("jobDesc", JOB)], &resumes());
        let response = app().oneshot(post("/compare", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["documents_received"], 2);
        assert_eq!(json["documents_scored"], 2);
        assert!(json["batch_id"].is_string());

        let scores = json["scores"].as_array().unwrap();
        assert_eq!(scores.len(), 2);
        for record in scores {
            for key in [
                "filename",
                "name",
                "email",
                "mobile",
                "skills",
                "matched_skills",
                "score",
                "ai_score",
                "keyword_score",
            ] {
                assert!(record.get(key).is_some(), "missing {key} in {record}");
            }
            assert!(record.get("text").is_none());
        }
        let first = scores[0]["score"].as_f64().unwrap();
        let second = scores[1]["score"].as_f64().unwrap();
        assert!(first >= second);
    }

    #[tokio::test]
    async fn test_num_shortlist_and_text_preview() {
        let body = multipart_body(
            &[("jobDesc", JOB), ("numShortlist", "1"), ("includeText", "true")],
            &resumes(),
        );
        let response = app().oneshot(post("/compare", body)).await.unwrap();
        let json = json_body(response).await;

        let scores = json["scores"].as_array().unwrap();
        assert_eq!(scores.len(), 1);
        assert!(scores[0]["text"].is_string());
        assert_eq!(json["documents_scored"], 2);
    }

    #[tokio::test]
    async fn test_lenient_policy_reports_invalid_file() {
        let mut files = resumes();
        files.push(("notes.txt", b"Python".to_vec()));
        let body = multipart_body(&[("jobDesc", JOB)], &files);
        let response = app().oneshot(post("/compare", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["scores"].as_array().unwrap().len(), 2);
        let diagnostics = json["diagnostics"].as_array().unwrap();
        assert!(diagnostics
            .iter()
            .any(|d| d["filename"] == "notes.txt" && d["kind"] == "invalid_file_type"));
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_batch() {
        let mut files = resumes();
        files.push(("notes.txt", b"Python".to_vec()));
        let body = multipart_body(&[("jobDesc", JOB), ("policy", "strict")], &files);
        let response = app().oneshot(post("/compare", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "INVALID_FILE_TYPE");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_strict_policy_from_config() {
        let body = multipart_body(&[("jobDesc", JOB)], &[("cv.docx", b"x".to_vec())]);
        let response = app_with(&[("INVALID_FILE_POLICY", "strict")])
            .oneshot(post("/compare", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_job_description() {
        let body = multipart_body(&[("jobDesc", "   ")], &resumes());
        let response = app().oneshot(post("/compare", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_no_resumes() {
        let body = multipart_body(&[("jobDesc", JOB)], &[]);
        let response = app().oneshot(post("/compare", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_numeric_field() {
        let body = multipart_body(&[("jobDesc", JOB), ("numShortlist", "top-five")], &resumes());
        let response = app().oneshot(post("/compare", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("numShortlist"));
    }

    #[tokio::test]
    async fn test_negative_weight_is_rejected() {
        let body = multipart_body(&[("jobDesc", JOB), ("semanticWeight", "-0.5")], &resumes());
        let response = app().oneshot(post("/compare", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let body = multipart_body(&[("jobDesc", JOB)], &resumes());
        let response = app_with(&[("MAX_UPLOAD_BYTES", "128")])
            .oneshot(post("/compare", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_export_returns_csv() {
        let body = multipart_body(&[("jobDesc", JOB)], &resumes());
        let response = app().oneshot(post("/compare/export", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Name,Email,Mobile,Filename,Final Score,AI Score,Keyword Score,Matched Skills,All Skills")
        );
        assert_eq!(lines.count(), 2);
    }
}
