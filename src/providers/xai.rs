use async_trait::async_trait;
use log::debug;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::request::{CompletionRequest, StandardResponse};
use crate::Provider;

use super::openai_compat::{ChatCompletionRequest, ChatEndpoint};
use super::Adapter;

pub const XAI_API_BASE: &str = "https://api.x.ai/v1";
pub const XAI_DEFAULT_MODEL: &str = "grok-4-fast";

/// xAI chat completions (Grok)
#[derive(Debug, Clone)]
pub struct XaiAdapter
{   endpoint: ChatEndpoint
  , model: String
}

impl XaiAdapter
{   pub fn new(config: &ProviderConfig) -> Result<Self, Error>
    {   let endpoint = ChatEndpoint::new(config, XAI_API_BASE)?;
        let model = config.model.clone()
          .unwrap_or_else(|| XAI_DEFAULT_MODEL.to_string());
        debug!("Creating XaiAdapter for model {}", model);
        Ok(XaiAdapter { endpoint, model })
    }
}

#[async_trait]
impl Adapter for XaiAdapter
{   fn provider(&self) -> Provider
    {   Provider::Xai
    }

    fn model(&self) -> &str
    {   &self.model
    }

    async fn complete(
      &self
    , request: &CompletionRequest
    ) -> Result<StandardResponse, Error>
    {   let body = ChatCompletionRequest::from_completion(
          &self.model, request
        );
        let payload = self.endpoint.send(&body).await?;
        self.normalize_response(payload)
    }
}
