//! Wire types and transport shared by OpenAI-compatible chat APIs

use std::time::Duration;

use log::{debug, error, trace};
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{Error, FailureKind};
use crate::request::CompletionRequest;
use crate::Provider;

// ===== Message Types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage
{   #[serde(default)]
    pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub temperature: f32
  , pub max_tokens: u32
}

impl ChatCompletionRequest
{   /// System instruction plus user text
    pub fn from_completion(
      model: &str
    , request: &CompletionRequest
    ) -> Self
    {   ChatCompletionRequest
        {   model: model.to_string()
          , messages: vec![
              ChatMessage
              {   role: "system".to_string()
                , content: request.system_prompt().to_string()
              }
            , ChatMessage
              {   role: "user".to_string()
                , content: request.user_prompt().to_string()
              }
            ]
          , temperature: request.temperature()
          , max_tokens: request.max_tokens()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   pub choices: Vec<Choice>
  , #[serde(default)]
    pub usage: Option<Usage>
  , #[serde(default)]
    pub model: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChatMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage
{   #[serde(default)]
    pub prompt_tokens: u64
  , #[serde(default)]
    pub completion_tokens: u64
  , #[serde(default)]
    pub total_tokens: Option<u64>
}

// ===== Endpoint =====

/// Authenticated `/chat/completions` endpoint for one provider
#[derive(Debug, Clone)]
pub struct ChatEndpoint
{   provider: Provider
  , api_base: String
  , api_key: String
  , http_client: reqwest::Client
}

impl ChatEndpoint
{   pub fn new(
      config: &ProviderConfig
    , default_base: &str
    ) -> Result<Self, Error>
    {   config.validate()?;
        let api_key = config.api_key.clone()
          .filter(|k| !k.trim().is_empty())
          .ok_or_else(|| {
            error!("No API key for {}", config.provider);
            Error::MissingApiKey(config.provider.to_string())
          })?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs
        {   builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().map_err(|e| {
          Error::InvalidConfiguration(format!(
            "{} HTTP client: {}", config.provider, e
          ))
        })?;

        let api_base = config.api_base.as_deref()
          .unwrap_or(default_base)
          .trim_end_matches('/')
          .to_string();
        debug!("{} endpoint: {}", config.provider, api_base);

        Ok(ChatEndpoint
        {   provider: config.provider
          , api_base
          , api_key
          , http_client
        })
    }

    pub fn api_base(&self) -> &str
    {   &self.api_base
    }

    /// POST one chat completion and decode the payload
    pub async fn send(
      &self
    , request: &ChatCompletionRequest
    ) -> Result<ChatCompletionResponse, Error>
    {   trace!("{} request: {:?}", self.provider, request);

        let response = self.http_client
          .post(format!("{}/chat/completions", self.api_base))
          .bearer_auth(&self.api_key)
          .json(request)
          .send()
          .await
          .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        trace!("{} response status: {}", self.provider, status);

        let body = response.text().await
          .map_err(|e| self.transport_error(e))?;

        if !status.is_success()
        {   error!("{} API error {}: {}", self.provider, status, body);
            return Err(Error::ProviderRequestFailed
            {   provider: self.provider
              , kind: FailureKind::from_status(status.as_u16())
              , status: Some(status.as_u16())
              , body
            });
        }

        trace!("{} response body: {}", self.provider, body);
        let payload: ChatCompletionResponse
          = serde_json::from_str(&body).map_err(|e| {
            error!("{} parse error: {}", self.provider, e);
            Error::ProviderRequestFailed
            {   provider: self.provider
              , kind: FailureKind::MalformedBody
              , status: Some(status.as_u16())
              , body: body.clone()
            }
          })?;

        if payload.choices.is_empty()
        {   error!("{} returned no choices", self.provider);
            return Err(Error::ProviderRequestFailed
            {   provider: self.provider
              , kind: FailureKind::MalformedBody
              , status: Some(status.as_u16())
              , body
            });
        }

        Ok(payload)
    }

    fn transport_error(&self, e: reqwest::Error) -> Error
    {   let kind = if e.is_timeout()
        {   FailureKind::Timeout
        } else if e.is_connect()
        {   FailureKind::ConnectionRefused
        } else
        {   FailureKind::Network
        };
        error!("{} HTTP error ({}): {}", self.provider, kind, e);
        Error::ProviderRequestFailed
        {   provider: self.provider
          , kind
          , status: e.status().map(|s| s.as_u16())
          , body: e.to_string()
        }
    }
}
