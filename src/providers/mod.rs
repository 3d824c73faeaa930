//! LLM provider adapters

pub mod openai_compat;
pub mod xai;
pub mod mistral;

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, trace};

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::request::{
  AnalyzeResponse, ClassifyResponse, CompletionRequest, EnhanceResponse,
  OperationOptions, StandardResponse, TokenUsage,
};
use crate::{Operation, Pricing, Provider};

pub use mistral::MistralAdapter;
pub use openai_compat::{ChatCompletionResponse, ChatEndpoint};
pub use xai::XaiAdapter;

/// One vendor's request shape, auth and pricing.
///
/// Implementors supply the transport call in [`Adapter::complete`];
/// the typed operations, normalization and costing are shared.
/// New vendors are added as new implementations.
#[async_trait]
pub trait Adapter: Send + Sync
{   fn provider(&self) -> Provider;

    /// Model identifier sent with every request
    fn model(&self) -> &str;

    fn pricing(&self) -> Pricing
    {   self.provider().pricing()
    }

    /// Issue one non-streamed completion call
    async fn complete(
      &self
    , request: &CompletionRequest
    ) -> Result<StandardResponse, Error>;

    /// Turn a vendor payload into a `StandardResponse`
    fn normalize_response(
      &self
    , payload: ChatCompletionResponse
    ) -> Result<StandardResponse, Error>
    {   let ChatCompletionResponse { choices, usage, model } = payload;
        let content = choices.into_iter()
          .next()
          .map(|c| c.message.content)
          .ok_or_else(|| Error::ProviderRequestFailed
          {   provider: self.provider()
            , kind: crate::FailureKind::MalformedBody
            , status: None
            , body: "response contained no choices".to_string()
          })?;

        let usage = usage.unwrap_or_default();
        if usage.prompt_tokens.checked_add(usage.completion_tokens).is_none()
        {   return Err(Error::ProviderRequestFailed
            {   provider: self.provider()
              , kind: crate::FailureKind::MalformedBody
              , status: None
              , body: format!(
                  "token usage overflows: prompt_tokens {} + completion_tokens {}",
                  usage.prompt_tokens, usage.completion_tokens
                )
            });
        }
        let tokens_used = TokenUsage::new(
          usage.prompt_tokens
        , usage.completion_tokens
        );
        if usage.total_tokens.is_some_and(|t| t != tokens_used.total)
        {   debug!(
              "{} reported total_tokens {:?}, using {}",
              self.provider(), usage.total_tokens, tokens_used.total
            );
        }

        Ok(StandardResponse
        {   content
          , tokens_used
          , model: model.unwrap_or_else(|| self.model().to_string())
          , provider: self.provider()
          , used_fallback: false
        })
    }

    async fn classify(
      &self
    , text: &str
    , options: &OperationOptions
    ) -> Result<ClassifyResponse, Error>
    {   let request = options.resolve(Operation::Classify, text)?;
        let response = self.complete(&request).await?;
        trace!("{} classify content: {}", self.provider(), response.content);
        ClassifyResponse::from_standard(response)
    }

    async fn analyze(
      &self
    , text: &str
    , options: &OperationOptions
    ) -> Result<AnalyzeResponse, Error>
    {   let request = options.resolve(Operation::Analyze, text)?;
        let response = self.complete(&request).await?;
        trace!("{} analyze content: {}", self.provider(), response.content);
        AnalyzeResponse::from_standard(response)
    }

    async fn enhance(
      &self
    , text: &str
    , options: &OperationOptions
    ) -> Result<EnhanceResponse, Error>
    {   let request = options.resolve(Operation::Enhance, text)?;
        let response = self.complete(&request).await?;
        trace!("{} enhance content: {}", self.provider(), response.content);
        EnhanceResponse::from_standard(response)
    }

    fn calculate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64
    {   self.pricing().cost(input_tokens, output_tokens)
    }
}

/// Build the adapter for a configured provider
pub fn build_adapter(
  config: &ProviderConfig
) -> Result<Arc<dyn Adapter>, Error>
{   debug!("Building adapter for {}", config.provider);
    config.validate()?;
    match config.provider
    {   Provider::Xai => Ok(Arc::new(XaiAdapter::new(config)?))
      , Provider::Mistral => Ok(Arc::new(MistralAdapter::new(config)?))
    }
}
