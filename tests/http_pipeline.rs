//! End-to-end run against mock Bitbucket and completion HTTP servers.

use mockito::Matcher;
use serde_json::{Map, json};

use review_pipe::bitbucket::{BitbucketAuth, BitbucketClient};
use review_pipe::config::{AiConfig, BitbucketConfig, ClientOptions, Config};
use review_pipe::models::FileAllowlist;
use review_pipe::orchestrator::{PipelineError, ReviewPipeline, RunOutcome};
use review_pipe::providers::OpenAiClient;

const DIFF: &str = "diff --git a/app/views.py b/app/views.py\n\
--- a/app/views.py\n\
+++ b/app/views.py\n\
@@ -40,2 +40,3 @@\n\
+    data = request.GET['q']\n";

const PR_PATH: &str = "/repositories/acme/shop/pullrequests/7";

/// Client that ignores proxy settings so requests reach the mock server.
fn http() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn config(ai_base_url: String) -> Config {
    Config {
        bitbucket: BitbucketConfig {
            auth: BitbucketAuth::Basic {
                username: "bot".to_string(),
                app_password: "pw".to_string(),
            },
            workspace: "acme".to_string(),
            repo_slug: "shop".to_string(),
            pull_request_id: 7,
        },
        ai: AiConfig {
            base_url: ai_base_url,
            api_key: "sk-test".to_string(),
            organization: None,
            model: "gpt-4o".to_string(),
            extra_instruction: Some("Focus on input validation.".to_string()),
            max_prompt_tokens: 0,
            completion_params: Map::new(),
            client: ClientOptions::default(),
        },
        files_to_review: FileAllowlist::default(),
    }
}

fn completion_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
    })
    .to_string()
}

#[tokio::test]
async fn reviews_pull_request_over_http() {
    let mut bitbucket = mockito::Server::new_async().await;
    let mut ai = mockito::Server::new_async().await;

    let diff_mock = bitbucket
        .mock("GET", format!("{PR_PATH}/diff").as_str())
        .match_header("authorization", "Basic Ym90OnB3")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body(DIFF)
        .create_async()
        .await;

    let completion_mock = ai
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system"},
                {"role": "system", "content": "Focus on input validation."},
                {"role": "user", "content": DIFF}
            ]
        })))
        .with_status(200)
        .with_body(completion_body(
            r#"{"summary": "Adds a search view.", "suggestions": {"app/views.py:42": "Validate `q` before use."}}"#,
        ))
        .create_async()
        .await;

    let summary_mock = bitbucket
        .mock("POST", format!("{PR_PATH}/comments").as_str())
        .match_body(Matcher::Json(json!({"content": {"raw": "Adds a search view."}})))
        .with_status(201)
        .with_body("{}")
        .create_async()
        .await;

    let inline_mock = bitbucket
        .mock("POST", format!("{PR_PATH}/comments").as_str())
        .match_body(Matcher::Json(json!({
            "inline": {"to": 42, "path": "app/views.py"},
            "content": {"raw": "Validate `q` before use."}
        })))
        .with_status(201)
        .with_body("{}")
        .create_async()
        .await;

    let config = config(ai.url());
    let bitbucket_client =
        BitbucketClient::with_http(http(), &bitbucket.url(), &config.bitbucket);
    let completion_client = OpenAiClient::with_http(http(), &config.ai);

    let outcome = ReviewPipeline::new(&config, &bitbucket_client, &completion_client, &bitbucket_client)
        .run()
        .await
        .unwrap();

    let RunOutcome::Published(report) = outcome else {
        panic!("expected a published review");
    };
    assert_eq!(report.comments_published, 1);
    assert!(report.summary_posted);

    diff_mock.assert_async().await;
    completion_mock.assert_async().await;
    summary_mock.assert_async().await;
    inline_mock.assert_async().await;
}

#[tokio::test]
async fn diff_fetch_failure_aborts_run() {
    let mut bitbucket = mockito::Server::new_async().await;
    let ai = mockito::Server::new_async().await;

    let _diff_mock = bitbucket
        .mock("GET", format!("{PR_PATH}/diff").as_str())
        .with_status(401)
        .with_body(r#"{"type": "error", "error": {"message": "Unauthorized"}}"#)
        .create_async()
        .await;

    let config = config(ai.url());
    let bitbucket_client =
        BitbucketClient::with_http(http(), &bitbucket.url(), &config.bitbucket);
    let completion_client = OpenAiClient::with_http(http(), &config.ai);

    let err = ReviewPipeline::new(&config, &bitbucket_client, &completion_client, &bitbucket_client)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Bitbucket(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn comment_failure_aborts_run() {
    let mut bitbucket = mockito::Server::new_async().await;
    let mut ai = mockito::Server::new_async().await;

    let _diff_mock = bitbucket
        .mock("GET", format!("{PR_PATH}/diff").as_str())
        .with_status(200)
        .with_body(DIFF)
        .create_async()
        .await;
    let _completion_mock = ai
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(
            r#"{"suggestions": {"app/views.py:42": "a", "app/views.py:43": "b"}}"#,
        ))
        .create_async()
        .await;
    let comment_mock = bitbucket
        .mock("POST", format!("{PR_PATH}/comments").as_str())
        .with_status(403)
        .with_body("forbidden")
        .expect(1)
        .create_async()
        .await;

    let config = config(ai.url());
    let bitbucket_client =
        BitbucketClient::with_http(http(), &bitbucket.url(), &config.bitbucket);
    let completion_client = OpenAiClient::with_http(http(), &config.ai);

    let err = ReviewPipeline::new(&config, &bitbucket_client, &completion_client, &bitbucket_client)
        .run()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("forbidden"));
    comment_mock.assert_async().await;
}
