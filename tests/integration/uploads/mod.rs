//! Upload and analysis integration tests

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use medchat_uploads::{DocumentExtractor, PdfTextExtractor};

use crate::common::{
    json_request, multipart_request, parse_body, pdf_bytes, png_bytes, ScriptedLlm, TestApp,
};

/// Helper: open a session and return its id
async fn open_session(app: &TestApp) -> String {
    let resp = app
        .test_router()
        .oneshot(json_request(Method::POST, "/v1/sessions", None))
        .await
        .unwrap();
    parse_body(resp).await["session_id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Helper: upload one file under the `file` part
async fn upload(
    app: &TestApp,
    sid: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> (StatusCode, Value) {
    let resp = app
        .test_router()
        .oneshot(multipart_request(
            &format!("/v1/sessions/{}/uploads", sid),
            "file",
            file_name,
            content_type,
            bytes,
        ))
        .await
        .unwrap();
    let status = resp.status();
    (status, parse_body(resp).await)
}

async fn analyze(app: &TestApp, sid: &str) -> (StatusCode, Value) {
    let resp = app
        .test_router()
        .oneshot(json_request(
            Method::POST,
            &format!("/v1/sessions/{}/uploads/analyze", sid),
            None,
        ))
        .await
        .unwrap();
    let status = resp.status();
    (status, parse_body(resp).await)
}

mod test_attach {
    use super::*;

    #[tokio::test]
    async fn test_upload_is_held_until_analyzed() {
        let app = TestApp::new().await.unwrap();
        let sid = open_session(&app).await;
        let png = png_bytes();

        let (status, body) = upload(&app, &sid, "rash.png", "image/png", &png).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pending_upload"]["name"], "rash.png");
        assert_eq!(body["pending_upload"]["kind"], "image");
        assert_eq!(body["pending_upload"]["size_bytes"], png.len());
        assert!(body["messages"].as_array().unwrap().is_empty());
        assert_eq!(app.logged_rows().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_generic_content_type_falls_back_to_extension() {
        let app = TestApp::new().await.unwrap();
        let sid = open_session(&app).await;

        let (status, body) = upload(
            &app,
            &sid,
            "lab-results.pdf",
            "application/octet-stream",
            b"%PDF-1.4",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pending_upload"]["kind"], "pdf");
    }

    #[tokio::test]
    async fn test_unsupported_type_returns_415() {
        let app = TestApp::new().await.unwrap();
        let sid = open_session(&app).await;

        let (status, body) = upload(&app, &sid, "notes.txt", "text/plain", b"hello").await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn test_missing_file_part_returns_400() {
        let app = TestApp::new().await.unwrap();
        let sid = open_session(&app).await;

        let resp = app
            .test_router()
            .oneshot(multipart_request(
                &format!("/v1/sessions/{}/uploads", sid),
                "attachment",
                "rash.png",
                "image/png",
                &png_bytes(),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_upload_returns_413() {
        let app = TestApp::new().await.unwrap();
        let sid = open_session(&app).await;
        let big = vec![0u8; 2 * 1024 * 1024];

        let (status, body) = upload(&app, &sid, "scan.png", "image/png", &big).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_new_thread_discards_pending_upload() {
        let app = TestApp::new().await.unwrap();
        let sid = open_session(&app).await;
        upload(&app, &sid, "rash.png", "image/png", &png_bytes()).await;

        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::POST,
                &format!("/v1/sessions/{}/threads", sid),
                None,
            ))
            .await
            .unwrap();
        let body = parse_body(resp).await;
        assert!(body["pending_upload"].is_null());

        let (status, _) = analyze(&app, &sid).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod test_analyze {
    use super::*;

    #[tokio::test]
    async fn test_analyze_image_sends_fixed_prompt() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok("Looks like mild eczema.".to_string())]));
        let app = TestApp::with_llm(llm.clone()).await.unwrap();
        let sid = open_session(&app).await;
        upload(&app, &sid, "rash.png", "image/png", &png_bytes()).await;

        let (status, body) = analyze(&app, &sid).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].is_null());
        let appended = body["appended"].as_array().unwrap();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0]["role"], "user");
        assert_eq!(appended[0]["text"], "Uploaded an image");
        assert_eq!(appended[1]["text"], "Looks like mild eczema.");
        assert!(body["session"]["pending_upload"].is_null());

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("Question: Analyze this image.\n"));
        assert_eq!(app.logged_rows().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_analyze_pdf_sends_first_1000_chars() {
        let text = format!(
            "Patient chart {}END-OF-CHART",
            "systolic reading stable ".repeat(60)
        );
        let pdf = pdf_bytes(&text);
        let extracted = PdfTextExtractor.extract(&pdf).unwrap();
        assert!(extracted.chars().count() > 1000);
        let head: String = extracted.chars().take(1000).collect();

        let llm = Arc::new(ScriptedLlm::new(vec![Ok("Blood pressure is steady.".to_string())]));
        let app = TestApp::with_llm(llm.clone()).await.unwrap();
        let sid = open_session(&app).await;
        let (status, _) = upload(&app, &sid, "chart.pdf", "application/pdf", &pdf).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = analyze(&app, &sid).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].is_null());
        let appended = body["appended"].as_array().unwrap();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0]["role"], "user");
        assert_eq!(appended[0]["text"], "Uploaded a PDF");
        assert_eq!(appended[1]["text"], "Blood pressure is steady.");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        let expected_tail = format!("Question: Analyze this document: {}\n", head);
        assert!(prompts[0].ends_with(&expected_tail));
        assert!(prompts[0].contains("Patient chart"));
        assert!(!prompts[0].contains("END-OF-CHART"));

        let thread_id = body["session"]["active_thread_id"].as_str().unwrap().to_string();
        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::GET,
                &format!("/v1/threads/{}/messages", thread_id),
                None,
            ))
            .await
            .unwrap();
        let log = parse_body(resp).await;
        assert_eq!(log[0]["role"], "user");
        assert_eq!(log[0]["text"], "Uploaded a PDF");
        assert_eq!(app.logged_rows().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_reported_in_band() {
        let llm = Arc::new(ScriptedLlm::default());
        let app = TestApp::with_llm(llm.clone()).await.unwrap();
        let sid = open_session(&app).await;
        upload(&app, &sid, "report.pdf", "application/pdf", b"not a pdf at all").await;

        let (status, body) = analyze(&app, &sid).await;

        assert_eq!(status, StatusCode::OK);
        let appended = body["appended"].as_array().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0]["role"], "assistant");
        assert!(appended[0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Error processing file"));
        assert_eq!(body["error"], appended[0]["text"]);
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_image_is_reported_in_band() {
        let app = TestApp::new().await.unwrap();
        let sid = open_session(&app).await;
        upload(&app, &sid, "scan.jpg", "image/jpeg", b"\xff\xd8garbage").await;

        let (status, body) = analyze(&app, &sid).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appended"].as_array().unwrap().len(), 1);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Error processing file"));

        // The thread still takes questions afterwards
        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::POST,
                &format!("/v1/sessions/{}/messages", sid),
                Some(serde_json::json!({ "text": "What does a rash mean?" })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analyze_without_upload_returns_400() {
        let app = TestApp::new().await.unwrap();
        let sid = open_session(&app).await;

        let (status, body) = analyze(&app, &sid).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
