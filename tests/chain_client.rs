//! HTTP chain client tests against a mock node

use assert_matches::assert_matches;
use chainhead_miner::{
    BlockTemplate, ChainClient, Error, HeadSource, Nonce, Submission, SubmissionSink, TargetMode,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;

const HEAD_JSON: &str = r#"{
    "PrevHash": "0000006ad92f7cd7a0bc20523d3a9252a8d49accdb24ce084128d8fe5a6dc101",
    "Contents": "32",
    "Nonce": 1234567890123,
    "Length": 132
}"#;

fn client(server: &Server, mode: TargetMode) -> ChainClient {
    ChainClient::new(server.url(), Duration::from_secs(5), mode).unwrap()
}

fn template() -> BlockTemplate {
    BlockTemplate::new([0xab; 32], "32", 133).unwrap()
}

#[tokio::test]
async fn test_head_is_parsed() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/head")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(HEAD_JSON)
        .expect(2)
        .create_async()
        .await;

    let client = client(&server, TargetMode::Head);
    let head = client.poll(&template()).await.unwrap().unwrap();

    assert_eq!(head.length, 132);
    assert_eq!(head.nonce, 1_234_567_890_123);
    assert_eq!(head.contents, "32");
    assert_eq!(client.current_head().await.unwrap(), head);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_next_mode_asks_for_successor_of_current_template() {
    let mut server = Server::new_async().await;
    let path = format!("/next/{}", "ab".repeat(32));
    let mock = server
        .mock("GET", path.as_str())
        .with_status(200)
        .with_body(HEAD_JSON)
        .create_async()
        .await;

    let mode = TargetMode::NextAfter {
        hash: [0xab; 32],
        length: 132,
    };
    let head = client(&server, mode).poll(&template()).await.unwrap();

    assert!(head.is_some());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_next_block_means_no_update() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", Matcher::Regex(r"^/next/[0-9a-f]{64}$".to_string()))
        .with_status(404)
        .with_body("no next block")
        .create_async()
        .await;

    let mode = TargetMode::NextAfter {
        hash: [0xab; 32],
        length: 132,
    };
    let head = client(&server, mode).poll(&template()).await.unwrap();
    assert!(head.is_none());
}

#[tokio::test]
async fn test_block_mentioning_no_next_block_is_still_a_block() {
    let body = json!({
        "PrevHash": "00".repeat(32),
        "Contents": "no next block",
        "Nonce": 5,
        "Length": 40
    })
    .to_string();

    let mut server = Server::new_async().await;
    let _head = server
        .mock("GET", "/head")
        .with_status(200)
        .with_body(body.as_str())
        .create_async()
        .await;
    let _next = server
        .mock("GET", Matcher::Regex(r"^/next/[0-9a-f]{64}$".to_string()))
        .with_status(200)
        .with_body(body.as_str())
        .create_async()
        .await;

    let head = client(&server, TargetMode::Head).current_head().await.unwrap();
    assert_eq!(head.contents, "no next block");
    assert_eq!(head.length, 40);

    let mode = TargetMode::NextAfter {
        hash: [0xab; 32],
        length: 132,
    };
    let next = client(&server, mode).poll(&template()).await.unwrap();
    assert_eq!(next, Some(head));
}

#[tokio::test]
async fn test_malformed_head() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/head")
        .with_status(200)
        .with_body(r#"{"PrevHash": "00", "Length": "many"}"#)
        .create_async()
        .await;

    let result = client(&server, TargetMode::Head).poll(&template()).await;
    assert_matches!(result, Err(Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/head")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let result = client(&server, TargetMode::Head).current_head().await;
    assert_matches!(result, Err(Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_submit_posts_json() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/add")
        .match_header("content-type", "application/json")
        .match_header("accept", "application/json")
        .match_body(Matcher::Json(json!({
            "PrevHash": "ab".repeat(32),
            "Contents": "32",
            "Nonce": 77,
            "Length": 133
        })))
        .with_status(200)
        .create_async()
        .await;

    let submission = Submission::new(&template(), Nonce::new(77));
    client(&server, TargetMode::Head)
        .submit(&submission)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejected_submission() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/add")
        .with_status(400)
        .with_body("invalid block")
        .create_async()
        .await;

    let submission = Submission::new(&template(), Nonce::new(1));
    let result = client(&server, TargetMode::Head).submit(&submission).await;
    assert_matches!(result, Err(Error::Submission { message }) if message.contains("invalid block"));
}

#[tokio::test]
async fn test_unreachable_node() {
    // Port 9 (discard) is not expected to be listening
    let client = ChainClient::new("http://127.0.0.1:9", Duration::from_millis(500), TargetMode::Head)
        .unwrap();
    let result = client.current_head().await;
    assert_matches!(result, Err(Error::Http(_)));
}
