pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod failover;
pub mod client;
pub mod prompts;
pub mod usage;

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/*

docllm is the LLM layer behind the document editor backend: one
async facade that classifies, analyzes and enhances document text
against a primary provider, with a single fallback attempt on a
second provider when the first one is rate limited or down.

docllm/
├── src/
│   ├── lib.rs          # Provider, Operation, Pricing and re-exports
│   ├── error.rs        # Error and FailureKind
│   ├── config.rs       # Provider and service configuration
│   ├── client.rs       # LlmService facade
│   ├── failover.rs     # FallbackPolicy
│   ├── request.rs      # Request/response and typed payloads
│   ├── prompts.rs      # Default system prompts
│   ├── usage.rs        # Cost ledger with budget alerts
│   ├── main.rs         # CLI
│   └── providers/
│       ├── mod.rs      # Adapter trait and build_adapter
│       ├── openai_compat.rs
│       ├── xai.rs
│       └── mistral.rs
└── tests/

*/

pub use client::LlmService;
pub use config::{LlmConfig, ProviderConfig};
pub use error::{Error, FailureKind};
pub use failover::FallbackPolicy;
pub use providers::Adapter;
pub use request::{
  AnalyzeResponse, ClassifyResponse, CompletionRequest, EnhanceResponse,
  OperationOptions, StandardResponse, TokenUsage, TypedResponse,
};
pub use usage::UsageLedger;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// LLM vendors with an adapter implementation
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize
)]
pub enum Provider
{   /// xAI (Grok models)
    #[serde(rename = "xai")]
    Xai
  , /// Mistral AI
    #[serde(rename = "mistral")]
    Mistral
}

impl Provider
{   /// Stable identifier used in config and responses
    pub fn id(self) -> &'static str
    {   match self
        {   Provider::Xai => "xai"
          , Provider::Mistral => "mistral"
        }
    }

    /// Environment variable prefix for this provider's settings
    pub fn env_prefix(self) -> &'static str
    {   match self
        {   Provider::Xai => "XAI"
          , Provider::Mistral => "MISTRAL"
        }
    }

    /// Fixed per-million-token prices
    pub fn pricing(self) -> Pricing
    {   match self
        {   Provider::Xai => Pricing::per_million(0.20, 0.50)
          , Provider::Mistral => Pricing::per_million(0.14, 0.42)
        }
    }
}

impl fmt::Display for Provider
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.id())
    }
}

impl FromStr for Provider
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "xai" | "x-ai" | "grok" => Ok(Provider::Xai)
          , "mistral" | "mistralai" => Ok(Provider::Mistral)
          , other => Err(Error::UnknownProvider(other.to_string()))
        }
    }
}

/// The three logical operations an adapter serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation
{   Classify
  , Analyze
  , Enhance
}

impl Operation
{   /// Temperature used when the caller supplies none
    pub fn default_temperature(self) -> Option<f32>
    {   match self
        {   Operation::Classify | Operation::Analyze => Some(0.3)
          , Operation::Enhance => None
        }
    }

    /// Token budget used when the caller supplies none
    pub fn default_max_tokens(self) -> Option<u32>
    {   match self
        {   Operation::Classify => Some(500)
          , Operation::Analyze => Some(1000)
          , Operation::Enhance => None
        }
    }

    pub fn name(self) -> &'static str
    {   match self
        {   Operation::Classify => "classify"
          , Operation::Analyze => "analyze"
          , Operation::Enhance => "enhance"
        }
    }
}

impl fmt::Display for Operation
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.name())
    }
}

/// Token prices for one provider, in USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing
{   /// Cost per single input token
    pub input_per_token: f64
  , /// Cost per single output token
    pub output_per_token: f64
}

impl Pricing
{   pub fn per_million(input: f64, output: f64) -> Self
    {   Pricing
        {   input_per_token: input / 1_000_000.0
          , output_per_token: output / 1_000_000.0
        }
    }

    /// Cost of a call; pure and non-decreasing in both arguments
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64
    {   input_tokens as f64 * self.input_per_token
          + output_tokens as f64 * self.output_per_token
    }
}
