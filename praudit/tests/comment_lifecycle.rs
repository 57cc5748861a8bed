//! Comment replacement against a mocked GitHub API.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use praudit::{AuditError, BOT_LOGIN, GitHubClient, PrHandle, replace_bot_comment};

fn pr() -> PrHandle {
    PrHandle {
        owner: "acme".to_string(),
        repo: "widgets".to_string(),
        number: 12,
    }
}

fn comments_payload() -> serde_json::Value {
    json!([
        {"id": 101, "body": "old report", "user": {"login": BOT_LOGIN, "type": "Bot"}},
        {"id": 102, "body": "lgtm", "user": {"login": "octocat", "type": "User"}},
        {"id": 103, "body": "coverage: 80%", "user": {"login": "coveralls[bot]", "type": "Bot"}}
    ])
}

#[tokio::test]
async fn deletes_only_own_bot_comments_then_posts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comments_payload()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/repos/acme/widgets/issues/comments/101"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/repos/acme/widgets/issues/comments/102"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/repos/acme/widgets/issues/comments/103"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .and(body_partial_json(json!({"body": "fresh report"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 200})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base(server.uri(), Some("token".to_string()));
    replace_bot_comment(&client, &pr(), "fresh report")
        .await
        .expect("replace succeeds");
}

#[tokio::test]
async fn failed_deletion_does_not_block_posting() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comments_payload()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/repos/acme/widgets/issues/comments/101"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 200})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base(server.uri(), None);
    replace_bot_comment(&client, &pr(), "fresh report")
        .await
        .expect("deletion failures are best-effort");
}

#[tokio::test]
async fn failed_listing_still_posts_the_report() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 200})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base(server.uri(), None);
    replace_bot_comment(&client, &pr(), "fresh report")
        .await
        .expect("listing failures are best-effort");
}

#[tokio::test]
async fn failed_create_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base(server.uri(), None);
    let result = replace_bot_comment(&client, &pr(), "fresh report").await;
    assert!(matches!(result, Err(AuditError::Comment(_))));
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .and(wiremock::matchers::header("Authorization", "Bearer sekrit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .and(wiremock::matchers::header("Authorization", "Bearer sekrit"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base(server.uri(), Some("sekrit".to_string()));
    replace_bot_comment(&client, &pr(), "body")
        .await
        .expect("authenticated replace succeeds");
}
