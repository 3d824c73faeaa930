use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docllm::providers::{build_adapter, MistralAdapter, XaiAdapter};
use docllm::{
  Adapter, Error, FailureKind, LlmService, Operation, OperationOptions,
  Provider, ProviderConfig, TypedResponse,
};

fn completion(content: &str, model: &str) -> serde_json::Value
{   json!({
      "choices": [{ "message": { "role": "assistant", "content": content } }],
      "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 },
      "model": model
    })
}

fn xai(server: &MockServer) -> XaiAdapter
{   XaiAdapter::new(
      &ProviderConfig::new(Provider::Xai)
        .with_api_key("xai-test-key")
        .with_api_base(server.uri())
    ).unwrap()
}

fn mistral(server: &MockServer) -> MistralAdapter
{   MistralAdapter::new(
      &ProviderConfig::new(Provider::Mistral)
        .with_api_key("mistral-test-key")
        .with_api_base(server.uri())
    ).unwrap()
}

#[tokio::test]
async fn test_sends_two_message_request_with_bearer_auth()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .and(header("authorization", "Bearer xai-test-key"))
      .and(body_partial_json(json!({
        "model": "grok-4-fast",
        "messages": [
          { "role": "system", "content": "classify please" },
          { "role": "user", "content": "Jane Doe, engineer" }
        ],
        "max_tokens": 500
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(
        completion(r#"{"type":"resume","confidence":0.8}"#, "grok-4-fast")
      ))
      .expect(1)
      .mount(&server)
      .await;

    let adapter = xai(&server);
    let response = assert_ok!(
      adapter.classify(
        "Jane Doe, engineer",
        &OperationOptions::new("classify please")
      ).await
    );
    assert_eq!(response.classification.doc_type, "resume");
    assert_eq!(response.response.model, "grok-4-fast");
    assert_eq!(response.response.provider, Provider::Xai);
}

#[tokio::test]
async fn test_token_total_is_input_plus_output()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "{}" } }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 999 },
        "model": "grok-4-fast"
      })))
      .mount(&server)
      .await;

    let adapter = xai(&server);
    let request = OperationOptions::new("s")
      .resolve(Operation::Classify, "t")
      .unwrap();
    let response = assert_ok!(adapter.complete(&request).await);
    let usage = response.tokens_used;
    assert_eq!(usage.total, usage.input + usage.output);
    assert_eq!(usage.total, 150);
}

#[tokio::test]
async fn test_missing_model_falls_back_to_configured_id()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "{}" } }]
      })))
      .mount(&server)
      .await;

    let adapter = mistral(&server);
    let request = OperationOptions::new("s")
      .resolve(Operation::Analyze, "t")
      .unwrap();
    let response = assert_ok!(adapter.complete(&request).await);
    assert_eq!(response.model, "mistral-small-latest");
    assert_eq!(response.tokens_used.total, 0);
}

#[tokio::test]
async fn test_http_statuses_map_to_failure_kinds()
{   for (status, kind) in [
      (429, FailureKind::RateLimited)
    , (503, FailureKind::Unavailable)
    , (400, FailureKind::Status)
    , (500, FailureKind::Status)
    ]
    {   let server = MockServer::start().await;
        Mock::given(method("POST"))
          .respond_with(
            ResponseTemplate::new(status).set_body_string("upstream says no")
          )
          .expect(1)
          .mount(&server)
          .await;

        let err = assert_err!(
          xai(&server).classify("t", &OperationOptions::new("s")).await
        );
        match err
        {   Error::ProviderRequestFailed { kind: k, status: s, body, provider } => {
              assert_eq!(k, kind);
              assert_eq!(s, Some(status));
              assert_eq!(body, "upstream says no");
              assert_eq!(provider, Provider::Xai);
            }
          , other => panic!("unexpected error: {other:?}")
        }
    }
}

#[tokio::test]
async fn test_body_without_choices_is_malformed()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": []
      })))
      .mount(&server)
      .await;

    let err = assert_err!(
      xai(&server).classify("t", &OperationOptions::new("s")).await
    );
    assert_eq!(err.failure_kind(), Some(FailureKind::MalformedBody));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_not_json_content_is_response_format_invalid()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(
        completion("not json", "grok-4-fast")
      ))
      .expect(1)
      .mount(&server)
      .await;

    let err = assert_err!(
      xai(&server).classify("t", &OperationOptions::new("s")).await
    );
    match err
    {   Error::ResponseFormatInvalid { expected, content, .. } => {
          assert_eq!(expected, "classify");
          assert_eq!(content, "not json");
        }
      , other => panic!("unexpected error: {other:?}")
    }
}

#[tokio::test]
async fn test_slow_vendor_times_out()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(completion("{}", "grok-4-fast"))
          .set_delay(Duration::from_secs(3))
      )
      .mount(&server)
      .await;

    let adapter = XaiAdapter::new(
      &ProviderConfig::new(Provider::Xai)
        .with_api_key("k")
        .with_api_base(server.uri())
        .with_timeout_secs(1)
    ).unwrap();
    let err = assert_err!(
      adapter.classify("t", &OperationOptions::new("s")).await
    );
    assert_eq!(err.failure_kind(), Some(FailureKind::Timeout));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unreachable_vendor_is_connection_refused()
{   let adapter = XaiAdapter::new(
      &ProviderConfig::new(Provider::Xai)
        .with_api_key("k")
        .with_api_base("http://127.0.0.1:1")
    ).unwrap();
    let err = assert_err!(
      adapter.classify("t", &OperationOptions::new("s")).await
    );
    assert_eq!(err.failure_kind(), Some(FailureKind::ConnectionRefused));
}

#[tokio::test]
async fn test_overloaded_primary_is_served_by_fallback()
{   let primary_server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(
        ResponseTemplate::new(503).set_body_string(r#"{"error":"overloaded"}"#)
      )
      .expect(1)
      .mount(&primary_server)
      .await;

    let fallback_server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .and(header("authorization", "Bearer mistral-test-key"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "content": "{\"type\":\"resume\",\"confidence\":0.9}" } }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 },
        "model": "fallback-model"
      })))
      .expect(1)
      .mount(&fallback_server)
      .await;

    let service = LlmService::new(
      Arc::new(xai(&primary_server))
    , Some(Arc::new(mistral(&fallback_server)))
    );
    let response = assert_ok!(
      service.execute(
        Operation::Classify,
        "Jane Doe, engineer",
        &OperationOptions::new("classify")
      ).await
    );

    let TypedResponse::Classify(classified) = response else
    {   panic!("expected a classify response");
    };
    assert_eq!(classified.classification.doc_type, "resume");
    assert_eq!(classified.classification.confidence, 0.9);
    assert_eq!(classified.response.content, r#"{"type":"resume","confidence":0.9}"#);
    assert_eq!(classified.response.tokens_used.input, 10);
    assert_eq!(classified.response.tokens_used.output, 5);
    assert_eq!(classified.response.tokens_used.total, 15);
    assert_eq!(classified.response.model, "fallback-model");
    assert_eq!(classified.response.provider, Provider::Mistral);
    assert!(classified.response.used_fallback);
}

#[test]
fn test_missing_key_is_rejected_at_construction()
{   let err = XaiAdapter::new(&ProviderConfig::new(Provider::Xai))
      .unwrap_err();
    assert_eq!(err, Error::MissingApiKey("xai".to_string()));

    let err = MistralAdapter::new(
      &ProviderConfig::new(Provider::Mistral).with_api_key("   ")
    ).unwrap_err();
    assert_eq!(err, Error::MissingApiKey("mistral".to_string()));
}

#[tokio::test]
async fn test_overflowing_token_usage_is_malformed()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "{}" } }],
        "usage": { "prompt_tokens": u64::MAX, "completion_tokens": 1 },
        "model": "grok-4-fast"
      })))
      .expect(1)
      .mount(&server)
      .await;

    let request = OperationOptions::new("s")
      .resolve(Operation::Classify, "t")
      .unwrap();
    let err = assert_err!(xai(&server).complete(&request).await);
    assert_eq!(err.failure_kind(), Some(FailureKind::MalformedBody));
    assert!(!err.is_transient());
}

#[test]
fn test_build_adapter_validates_config()
{   let zero_timeout = ProviderConfig::new(Provider::Xai)
      .with_api_key("k")
      .with_timeout_secs(0);
    assert!(matches!(
      build_adapter(&zero_timeout).err(),
      Some(Error::InvalidConfiguration(_))
    ));

    let bad_base = ProviderConfig::new(Provider::Mistral)
      .with_api_key("k")
      .with_api_base("ftp://example.com");
    assert!(matches!(
      build_adapter(&bad_base).err(),
      Some(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
      MistralAdapter::new(&bad_base),
      Err(Error::InvalidConfiguration(_))
    ));

    let ok = ProviderConfig::new(Provider::Mistral).with_api_key("k");
    let adapter = build_adapter(&ok).unwrap();
    assert_eq!(adapter.provider(), Provider::Mistral);
}
