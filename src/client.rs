//! Provider-agnostic facade over a primary and optional fallback adapter

use std::sync::Arc;

use futures::future::BoxFuture;
use log::{debug, info, warn};

use crate::config::LlmConfig;
use crate::error::Error;
use crate::failover::FallbackPolicy;
use crate::providers::{build_adapter, Adapter};
use crate::request::{
  AnalyzeResponse, ClassifyResponse, Completion, EnhanceResponse,
  OperationOptions, StandardResponse, TypedResponse,
};
use crate::{Operation, Provider};

/// Routes every operation to the primary adapter and, on a
/// transient failure, makes one attempt on the fallback.
///
/// Holds no per-call state; share it by reference or `Arc`.
#[derive(Clone)]
pub struct LlmService
{   primary: Arc<dyn Adapter>
  , fallback: Option<Arc<dyn Adapter>>
  , policy: FallbackPolicy
}

impl LlmService
{   pub fn new(
      primary: Arc<dyn Adapter>
    , fallback: Option<Arc<dyn Adapter>>
    ) -> Self
    {   LlmService
        {   primary
          , fallback
          , policy: FallbackPolicy::default()
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self
    {   self.policy = policy;
        self
    }

    /// Validate configuration and build both adapters.
    /// Any failure here is fatal for the process.
    pub fn from_config(config: &LlmConfig) -> Result<Self, Error>
    {   config.validate()?;
        let primary = build_adapter(&config.primary)?;
        let fallback = config.fallback.as_ref()
          .map(build_adapter)
          .transpose()?;
        info!(
          "LlmService ready: primary {} ({}), fallback {}",
          primary.provider(),
          primary.model(),
          fallback.as_ref()
            .map(|f| format!("{} ({})", f.provider(), f.model()))
            .unwrap_or_else(|| "none".to_string())
        );
        Ok(LlmService::new(primary, fallback))
    }

    pub fn primary_provider(&self) -> Provider
    {   self.primary.provider()
    }

    pub fn fallback_provider(&self) -> Option<Provider>
    {   self.fallback.as_ref().map(|f| f.provider())
    }

    pub fn policy(&self) -> &FallbackPolicy
    {   &self.policy
    }

    /// Run any operation and return its typed response
    pub async fn execute(
      &self
    , operation: Operation
    , text: &str
    , options: &OperationOptions
    ) -> Result<TypedResponse, Error>
    {   match operation
        {   Operation::Classify => self.classify(text, options).await
              .map(TypedResponse::Classify)
          , Operation::Analyze => self.analyze(text, options).await
              .map(TypedResponse::Analyze)
          , Operation::Enhance => self.enhance(text, options).await
              .map(TypedResponse::Enhance)
        }
    }

    pub async fn classify(
      &self
    , text: &str
    , options: &OperationOptions
    ) -> Result<ClassifyResponse, Error>
    {   self.route(Operation::Classify, |adapter| {
          adapter.classify(text, options)
        }).await
    }

    pub async fn analyze(
      &self
    , text: &str
    , options: &OperationOptions
    ) -> Result<AnalyzeResponse, Error>
    {   self.route(Operation::Analyze, |adapter| {
          adapter.analyze(text, options)
        }).await
    }

    pub async fn enhance(
      &self
    , text: &str
    , options: &OperationOptions
    ) -> Result<EnhanceResponse, Error>
    {   self.route(Operation::Enhance, |adapter| {
          adapter.enhance(text, options)
        }).await
    }

    /// Price a response with the adapter that produced it
    pub fn estimate_cost(&self, response: &StandardResponse) -> Option<f64>
    {   self.adapter_for(response.provider).map(|adapter| {
          adapter.calculate_cost(
            response.tokens_used.input
          , response.tokens_used.output
          )
        })
    }

    fn adapter_for(&self, provider: Provider) -> Option<&Arc<dyn Adapter>>
    {   std::iter::once(&self.primary)
          .chain(self.fallback.iter())
          .find(|a| a.provider() == provider)
    }

    async fn route<'a, T, F>(
      &'a self
    , operation: Operation
    , call: F
    ) -> Result<T, Error>
    where
      T: Completion,
      F: Fn(&'a dyn Adapter) -> BoxFuture<'a, Result<T, Error>>,
    {   debug!("{} via primary {}", operation, self.primary.provider());
        let primary_error = match call(self.primary.as_ref()).await
        {   Ok(response) => return Ok(response)
          , Err(err) => err
        };

        let fallback = match &self.fallback
        {   Some(fallback) if self.policy.should_fall_back(&primary_error)
              => fallback
          , _ => return Err(primary_error)
        };

        warn!(
          "{} failed on {} ({}), falling back to {}",
          operation,
          self.primary.provider(),
          primary_error,
          fallback.provider()
        );
        let mut response = call(fallback.as_ref()).await?;
        response.standard_mut().used_fallback = true;
        Ok(response)
    }
}
