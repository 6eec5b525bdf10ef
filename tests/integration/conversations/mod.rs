//! Session, thread and text submission integration tests

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use medchat_llm::LlmError;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{json_request, parse_body, ScriptedLlm, TestApp};

/// Helper: open a session and return its view
async fn open_session(app: &TestApp) -> Value {
    let resp = app
        .test_router()
        .oneshot(json_request(Method::POST, "/v1/sessions", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    parse_body(resp).await
}

/// Helper: ask a question on the active thread
async fn ask(app: &TestApp, session_id: &str, text: &str) -> (StatusCode, Value) {
    let resp = app
        .test_router()
        .oneshot(json_request(
            Method::POST,
            &format!("/v1/sessions/{}/messages", session_id),
            Some(json!({ "text": text })),
        ))
        .await
        .unwrap();
    let status = resp.status();
    (status, parse_body(resp).await)
}

mod test_infrastructure {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let app = TestApp::new().await.unwrap();
        let resp = app
            .test_router()
            .oneshot(json_request(Method::GET, "/health", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_session_returns_404() {
        let app = TestApp::new().await.unwrap();
        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::GET,
                &format!("/v1/sessions/{}", Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = parse_body(resp).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}

mod test_sessions {
    use super::*;

    #[tokio::test]
    async fn test_new_session_has_one_empty_active_chat() {
        let app = TestApp::new().await.unwrap();
        let body = open_session(&app).await;

        let tabs = body["tabs"].as_array().unwrap();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0]["label"], "Chat 1");
        assert_eq!(tabs[0]["active"], true);
        assert_eq!(tabs[0]["thread_id"], body["active_thread_id"]);
        assert!(body["messages"].as_array().unwrap().is_empty());
        assert!(body["pending_upload"].is_null());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let app = TestApp::new().await.unwrap();
        let first = open_session(&app).await;
        let second = open_session(&app).await;

        assert_ne!(first["session_id"], second["session_id"]);
        assert_ne!(first["active_thread_id"], second["active_thread_id"]);

        ask(&app, first["session_id"].as_str().unwrap(), "What is a fever?").await;

        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::GET,
                &format!("/v1/sessions/{}", second["session_id"].as_str().unwrap()),
                None,
            ))
            .await
            .unwrap();
        let body = parse_body(resp).await;
        assert!(body["messages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_session_drops_cache_but_keeps_log() {
        let app = TestApp::new().await.unwrap();
        let session = open_session(&app).await;
        let sid = session["session_id"].as_str().unwrap();
        let thread_id = session["active_thread_id"].as_str().unwrap();

        ask(&app, sid, "Is aspirin safe daily?").await;

        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::DELETE,
                &format!("/v1/sessions/{}", sid),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app
            .test_router()
            .oneshot(json_request(Method::GET, &format!("/v1/sessions/{}", sid), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

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
        assert_eq!(log.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_unknown_session_returns_404() {
        let app = TestApp::new().await.unwrap();
        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::DELETE,
                &format!("/v1/sessions/{}", Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

mod test_threads {
    use super::*;

    #[tokio::test]
    async fn test_new_thread_becomes_active_tab() {
        let app = TestApp::new().await.unwrap();
        let session = open_session(&app).await;
        let sid = session["session_id"].as_str().unwrap();

        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::POST,
                &format!("/v1/sessions/{}/threads", sid),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = parse_body(resp).await;

        let tabs = body["tabs"].as_array().unwrap();
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[1]["label"], "Chat 2");
        assert_eq!(tabs[1]["active"], true);
        assert_eq!(tabs[0]["active"], false);
        assert_eq!(body["active_thread_id"], tabs[1]["thread_id"]);
        assert!(body["messages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_switch_shows_that_threads_messages() {
        let app = TestApp::new().await.unwrap();
        let session = open_session(&app).await;
        let sid = session["session_id"].as_str().unwrap();
        let first = session["active_thread_id"].clone();

        ask(&app, sid, "What lowers blood pressure?").await;

        app.test_router()
            .oneshot(json_request(
                Method::POST,
                &format!("/v1/sessions/{}/threads", sid),
                None,
            ))
            .await
            .unwrap();

        let switch = || {
            json_request(
                Method::PUT,
                &format!("/v1/sessions/{}/active", sid),
                Some(json!({ "thread_id": first })),
            )
        };

        let resp = app.test_router().oneshot(switch()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let once = parse_body(resp).await;
        assert_eq!(once["active_thread_id"], first);
        assert_eq!(once["messages"].as_array().unwrap().len(), 2);
        assert_eq!(once["messages"][0]["role"], "user");
        assert_eq!(once["messages"][0]["text"], "What lowers blood pressure?");

        // Switching again changes nothing
        let twice = parse_body(app.test_router().oneshot(switch()).await.unwrap()).await;
        assert_eq!(twice["tabs"], once["tabs"]);
        assert_eq!(twice["messages"], once["messages"]);
    }

    #[tokio::test]
    async fn test_switch_to_unknown_thread_returns_404() {
        let app = TestApp::new().await.unwrap();
        let session = open_session(&app).await;
        let sid = session["session_id"].as_str().unwrap();

        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::PUT,
                &format!("/v1/sessions/{}/active", sid),
                Some(json!({ "thread_id": Uuid::new_v4() })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_switch_with_malformed_id_returns_400() {
        let app = TestApp::new().await.unwrap();
        let session = open_session(&app).await;
        let sid = session["session_id"].as_str().unwrap();

        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::PUT,
                &format!("/v1/sessions/{}/active", sid),
                Some(json!({ "thread_id": "chat-1" })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

mod test_submissions {
    use super::*;

    #[tokio::test]
    async fn test_submit_text_appends_question_and_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok("Rest and fluids.".to_string())]));
        let app = TestApp::with_llm(llm.clone()).await.unwrap();
        let session = open_session(&app).await;
        let sid = session["session_id"].as_str().unwrap();

        let (status, body) = ask(&app, sid, "How do I treat a cold?").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].is_null());
        let appended = body["appended"].as_array().unwrap();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0], json!({"role": "user", "text": "How do I treat a cold?"}));
        assert_eq!(appended[1], json!({"role": "assistant", "text": "Rest and fluids."}));
        assert_eq!(body["session"]["messages"].as_array().unwrap().len(), 2);

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("You are Doctor AI"));
        assert!(prompts[0].ends_with("Question: How do I treat a cold?\n"));

        assert_eq!(app.logged_rows().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_reported_in_band() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Err(LlmError::Request("connection refused".to_string())),
            Ok("Drink water.".to_string()),
        ]));
        let app = TestApp::with_llm(llm).await.unwrap();
        let session = open_session(&app).await;
        let sid = session["session_id"].as_str().unwrap();

        let (status, body) = ask(&app, sid, "Why am I dizzy?").await;
        assert_eq!(status, StatusCode::OK);

        let appended = body["appended"].as_array().unwrap();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[1]["role"], "assistant");
        let reply = appended[1]["text"].as_str().unwrap();
        assert!(reply.starts_with("Error generating response"));
        assert!(reply.contains("connection refused"));
        assert_eq!(body["error"], appended[1]["text"]);

        // The thread keeps accepting input
        let (status, body) = ask(&app, sid, "And now?").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].is_null());
        assert_eq!(body["session"]["messages"].as_array().unwrap().len(), 4);
        assert_eq!(body["session"]["messages"][3]["text"], "Drink water.");
    }

    #[tokio::test]
    async fn test_blank_text_returns_400_and_appends_nothing() {
        let app = TestApp::new().await.unwrap();
        let session = open_session(&app).await;
        let sid = session["session_id"].as_str().unwrap();

        for text in ["", "   "] {
            let (status, body) = ask(&app, sid, text).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }

        assert_eq!(app.logged_rows().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_threads_are_isolated_in_the_log() {
        let app = TestApp::new().await.unwrap();
        let session = open_session(&app).await;
        let sid = session["session_id"].as_str().unwrap();
        let first = session["active_thread_id"].as_str().unwrap().to_string();

        ask(&app, sid, "first thread question").await;

        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::POST,
                &format!("/v1/sessions/{}/threads", sid),
                None,
            ))
            .await
            .unwrap();
        let second = parse_body(resp).await["active_thread_id"]
            .as_str()
            .unwrap()
            .to_string();

        ask(&app, sid, "second thread question").await;

        for (thread_id, question) in [
            (&first, "first thread question"),
            (&second, "second thread question"),
        ] {
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
            let log = log.as_array().unwrap();
            assert_eq!(log.len(), 2);
            assert_eq!(log[0]["text"], question);
        }

        let resp = app
            .test_router()
            .oneshot(json_request(Method::GET, "/v1/threads", None))
            .await
            .unwrap();
        let ids = parse_body(resp).await;
        assert_eq!(ids, json!([first, second]));
    }

    #[tokio::test]
    async fn test_unknown_thread_log_is_empty() {
        let app = TestApp::new().await.unwrap();
        let resp = app
            .test_router()
            .oneshot(json_request(
                Method::GET,
                &format!("/v1/threads/{}/messages", Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(parse_body(resp).await, json!([]));
    }

    #[tokio::test]
    async fn test_storage_fault_returns_500_with_generic_body() {
        let app = TestApp::new().await.unwrap();
        let session = open_session(&app).await;
        let sid = session["session_id"].as_str().unwrap();

        sqlx::query("DROP TABLE chats")
            .execute(&app.pool)
            .await
            .unwrap();

        let (status, body) = ask(&app, sid, "Is this stored?").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Something went wrong. Please try again.");

        // Nothing was cached, and once storage is back the thread takes input again
        medchat_common::init_schema(&app.pool).await.unwrap();
        let (status, body) = ask(&app, sid, "Is this stored now?").await;
        assert_eq!(status, StatusCode::OK);
        let messages = body["session"]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["text"], "Is this stored now?");
    }
}
