use async_trait::async_trait;
use log::debug;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::request::{CompletionRequest, StandardResponse};
use crate::Provider;

use super::openai_compat::{ChatCompletionRequest, ChatEndpoint};
use super::Adapter;

pub const MISTRAL_API_BASE: &str
  = "https://api.mistral.ai/v1";
pub const MISTRAL_DEFAULT_MODEL: &str = "mistral-small-latest";

/// Mistral AI chat completions
#[derive(Debug, Clone)]
pub struct MistralAdapter
{   endpoint: ChatEndpoint
  , model: String
}

impl MistralAdapter
{   pub fn new(config: &ProviderConfig) -> Result<Self, Error>
    {   let endpoint = ChatEndpoint::new(config, MISTRAL_API_BASE)?;
        let model = config.model.clone()
          .unwrap_or_else(|| MISTRAL_DEFAULT_MODEL.to_string());
        debug!("Creating MistralAdapter for model {}", model);
        Ok(MistralAdapter { endpoint, model })
    }
}

#[async_trait]
impl Adapter for MistralAdapter
{   fn provider(&self) -> Provider
    {   Provider::Mistral
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
