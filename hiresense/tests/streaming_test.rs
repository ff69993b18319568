//! End-to-end tests against a canned HTTP server on localhost.

#![allow(clippy::unwrap_used, clippy::panic, clippy::float_cmp)]

use std::time::Duration;

use hiresense::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Canned response the test server writes back.
enum Reply {
    /// Status line plus a fixed body.
    Fixed {
        status: &'static str,
        body: &'static str,
    },
    /// `200 OK` with a chunked body, one HTTP chunk per part.
    Streamed(Vec<Vec<u8>>),
    /// Complete response written as-is.
    Raw(&'static str),
}

impl Reply {
    const fn fixed(status: &'static str, body: &'static str) -> Self {
        Self::Fixed { status, body }
    }

    fn streamed(parts: &[&[u8]]) -> Self {
        Self::Streamed(parts.iter().map(|p| p.to_vec()).collect())
    }
}

/// Accept one connection, answer it with `reply`, and hand back the raw request.
async fn serve(reply: Reply) -> (ClientConfig, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        write_reply(&mut socket, reply).await;
        request
    });

    let config = ClientConfig::new(format!("http://{addr}"), "test-key").with_timeout(5);
    (config, handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        raw.extend_from_slice(&buf[..n]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .map_or(0, |v| v.trim().parse::<usize>().unwrap());

    while raw.len() < header_end + content_length {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
    }

    String::from_utf8(raw).unwrap()
}

async fn write_reply(socket: &mut TcpStream, reply: Reply) {
    // The client may hang up early (cancellation, protocol errors), so
    // write failures are not test failures.
    match reply {
        Reply::Fixed { status, body } => {
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
        Reply::Raw(response) => {
            let _ = socket.write_all(response.as_bytes()).await;
        }
        Reply::Streamed(parts) => {
            let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            for part in parts {
                let mut frame = format!("{:x}\r\n", part.len()).into_bytes();
                frame.extend_from_slice(&part);
                frame.extend_from_slice(b"\r\n");
                if socket.write_all(&frame).await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        }
    }
    let _ = socket.shutdown().await;
}

fn delta(text: &str) -> String {
    format!("data: {}\n", serde_json::json!({ "choices": [{ "delta": { "content": text } }] }))
}

mod chat {
    use super::*;

    #[tokio::test]
    async fn streamed_reply_lands_in_history() {
        let first = delta("Héllo");
        let (head, tail) = first.as_bytes().split_at(first.find('é').unwrap() + 1);
        let second = delta(" wörld");

        let (config, server) = serve(Reply::streamed(&[
            b": keep-alive\n\n",
            head,
            tail,
            second.as_bytes(),
            b"data: [DONE]\n",
        ]))
        .await;

        let client = Client::new(config).unwrap();
        let mut history = vec![Message::user("Hi")];
        let reply = client.stream_chat(&mut history).await.unwrap();

        assert_eq!(reply, "Héllo wörld");
        assert_eq!(
            history,
            vec![Message::user("Hi"), Message::assistant("Héllo wörld")]
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /functions/v1/chat-assistant HTTP/1.1"));
        assert!(request.to_lowercase().contains("authorization: bearer test-key"));
        assert!(request.contains(r#"{"messages":[{"role":"user","content":"Hi"}]}"#));
    }

    #[tokio::test]
    async fn json_split_across_chunks() {
        let (config, _server) = serve(Reply::streamed(&[
            b"data: {\"choices\":",
            b"[{\"delta\":{\"content\":\"hi\"}}]}\n",
            b"data: [DONE]\n",
        ]))
        .await;

        let client = Client::new(config).unwrap();
        let mut history = vec![Message::user("Hello")];
        assert_eq!(client.stream_chat(&mut history).await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn existing_assistant_message_is_replaced() {
        let body = format!("{}{}data: [DONE]\n", delta("He"), delta("llo"));
        let (config, _server) = serve(Reply::streamed(&[body.as_bytes()])).await;

        let client = Client::new(config).unwrap();
        let mut history = vec![Message::user("Hi"), Message::assistant("stale")];
        client.stream_chat(&mut history).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[1], Message::assistant("Hello"));
    }

    #[tokio::test]
    async fn oversized_pending_frame_is_a_protocol_error() {
        let filler = "x\n".repeat(600);
        let (config, _server) = serve(Reply::streamed(&[
            b"data: {\"choices\":\n",
            filler.as_bytes(),
        ]))
        .await;

        let client = Client::new(config.with_max_pending_bytes(512)).unwrap();
        let mut history = vec![Message::user("Hi")];
        let err = client.stream_chat(&mut history).await.unwrap_err();

        assert!(matches!(err.as_service(), Some(ServiceError::Protocol(_))));
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn channel_delivers_deltas_then_completion() {
        let body = format!("{}{}data: [DONE]\n", delta("a"), delta("b"));
        let (config, _server) = serve(Reply::streamed(&[body.as_bytes()])).await;

        let client = Client::new(config).unwrap();
        let (mut events, task) =
            client.stream_chat_channel(vec![Message::user("Hi")], CancellationToken::new());

        let mut received = Vec::new();
        while let Some(event) = events.recv().await {
            received.push(event);
        }

        assert_eq!(task.await.unwrap().unwrap(), "ab");
        assert_eq!(
            received,
            vec![
                ChatEvent::Delta {
                    text: "a".into(),
                    accumulated: "a".into(),
                },
                ChatEvent::Delta {
                    text: "b".into(),
                    accumulated: "ab".into(),
                },
                ChatEvent::Completed {
                    content: "ab".into(),
                },
            ]
        );
    }
}

mod status {
    use super::*;

    async fn chat_error(reply: Reply) -> Error {
        let (config, _server) = serve(reply).await;
        let client = Client::new(config).unwrap();
        let mut history = vec![Message::user("Hi")];
        let err = client.stream_chat(&mut history).await.unwrap_err();
        assert_eq!(history, vec![Message::user("Hi")]);
        err
    }

    #[tokio::test]
    async fn rate_limited() {
        let err = chat_error(Reply::fixed("429 Too Many Requests", "")).await;
        assert!(matches!(err.as_service(), Some(ServiceError::RateLimited(_))));
        assert!(err.to_string().contains("Rate limit"));
    }

    #[tokio::test]
    async fn quota_exceeded() {
        let err = chat_error(Reply::fixed("402 Payment Required", "")).await;
        assert!(err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn server_error_text_is_surfaced() {
        let err = chat_error(Reply::fixed(
            "500 Internal Server Error",
            r#"{"error":"AI gateway error"}"#,
        ))
        .await;
        assert_eq!(err.to_string(), "AI gateway error");
    }

    #[tokio::test]
    async fn server_error_without_body_uses_fallback() {
        let err = chat_error(Reply::fixed("500 Internal Server Error", "")).await;
        assert_eq!(err.to_string(), "Failed to get response");
    }

    #[tokio::test]
    async fn no_content_status_means_no_body() {
        let err = chat_error(Reply::Raw(
            "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n",
        ))
        .await;
        assert!(matches!(err.as_service(), Some(ServiceError::Protocol(_))));
        assert_eq!(err.to_string(), "No response body");
    }

    #[tokio::test]
    async fn empty_ok_body_is_an_empty_reply() {
        let (config, _server) = serve(Reply::fixed("200 OK", "")).await;
        let client = Client::new(config).unwrap();
        let mut history = vec![Message::user("Hi")];

        let reply = client.stream_chat(&mut history).await.unwrap();

        assert_eq!(reply, "");
        assert_eq!(history, vec![Message::user("Hi")]);
    }
}

mod analyze {
    use super::*;

    #[tokio::test]
    async fn scores_are_clamped() {
        let (config, server) = serve(Reply::fixed(
            "200 OK",
            r#"{"overallScore":300,"jobMatchScore":64.5,"matchedSkills":["Rust"],"summary":"Strong."}"#,
        ))
        .await;

        let client = Client::new(config).unwrap();
        let analysis = client
            .analyze_resume(&AnalysisRequest::new("Rust dev").with_job_description("Backend"))
            .await
            .unwrap();

        assert_eq!(analysis.overall_score, 100.0);
        assert_eq!(analysis.job_match_score, Some(64.5));
        assert_eq!(analysis.matched_skills, ["Rust"]);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /functions/v1/analyze-resume HTTP/1.1"));
        assert!(request.contains(r#""resumeText":"Rust dev""#));
        assert!(request.contains(r#""jobDescription":"Backend""#));
    }

    #[tokio::test]
    async fn failure_uses_fallback() {
        let (config, _server) = serve(Reply::fixed("500 Internal Server Error", "")).await;
        let client = Client::new(config).unwrap();
        let err = client
            .analyze_resume(&AnalysisRequest::new("Rust dev"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Analysis failed");
    }

    #[tokio::test]
    async fn limits_use_analysis_wording() {
        let (config, _server) = serve(Reply::fixed("429 Too Many Requests", "")).await;
        let client = Client::new(config).unwrap();
        let err = client
            .analyze_resume(&AnalysisRequest::new("Rust dev"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Rate limit exceeded. Please try again later.");

        let (config, _server) = serve(Reply::fixed("402 Payment Required", "")).await;
        let client = Client::new(config).unwrap();
        let err = client
            .analyze_resume(&AnalysisRequest::new("Rust dev"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_service(), Some(ServiceError::QuotaExceeded(_))));
        assert_eq!(err.to_string(), "AI credits exhausted. Please add funds.");
    }

    #[tokio::test]
    async fn undecodable_body_is_a_protocol_error() {
        let (config, _server) = serve(Reply::fixed("200 OK", "not json")).await;
        let client = Client::new(config).unwrap();
        let err = client
            .analyze_resume(&AnalysisRequest::new("Rust dev"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_service(), Some(ServiceError::Protocol(_))));
    }
}

mod notify {
    use super::*;

    #[tokio::test]
    async fn sends_typed_request() {
        let (config, server) =
            serve(Reply::fixed("200 OK", r#"{"success":true,"id":"email_1"}"#)).await;

        let client = Client::new(config).unwrap();
        let request = NotificationRequest::new(NotificationKind::Shortlisted, "ada@example.com")
            .with_data(NotificationData {
                candidate_name: Some("Ada".into()),
                job_title: Some("Engineer".into()),
                ..NotificationData::default()
            });
        let receipt = client.send_notification(&request).await.unwrap();

        assert_eq!(receipt.id.as_deref(), Some("email_1"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /functions/v1/send-notification HTTP/1.1"));
        assert!(request.contains(r#""type":"shortlisted""#));
        assert!(request.contains(r#""recipientEmail":"ada@example.com""#));
        assert!(request.contains(r#""candidateName":"Ada""#));
    }

    #[tokio::test]
    async fn rate_limit_applies_to_notifications() {
        let (config, _server) = serve(Reply::fixed("429 Too Many Requests", "")).await;
        let client = Client::new(config).unwrap();
        let request = NotificationRequest::new(NotificationKind::StatusUpdate, "ada@example.com");
        let err = client.send_notification(&request).await.unwrap_err();
        assert!(matches!(err.as_service(), Some(ServiceError::RateLimited(_))));
    }
}
