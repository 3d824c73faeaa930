use std::fmt;

use serde::{Deserialize, Serialize};

/// How a provider call failed, decided where the failure is observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind
{   /// HTTP 429
    RateLimited
  , /// HTTP 503
    Unavailable
  , /// Transport gave up waiting for the vendor
    Timeout
  , /// No connection could be established
    ConnectionRefused
  , /// Any other transport failure
    Network
  , /// Any other non-2xx status
    Status
  , /// 2xx body without `choices[0].message.content`
    MalformedBody
}

impl FailureKind
{   /// Map a non-success HTTP status to a failure kind
    pub fn from_status(status: u16) -> Self
    {   match status
        {   429 => FailureKind::RateLimited
          , 503 => FailureKind::Unavailable
          , _ => FailureKind::Status
        }
    }

    /// Whether an alternate provider is likely to succeed
    pub fn is_transient(self) -> bool
    {   matches!(
          self,
          FailureKind::RateLimited
            | FailureKind::Unavailable
            | FailureKind::Timeout
            | FailureKind::ConnectionRefused
        )
    }
}

impl fmt::Display for FailureKind
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   let label = match self
        {   FailureKind::RateLimited => "rate limited"
          , FailureKind::Unavailable => "service unavailable"
          , FailureKind::Timeout => "timeout"
          , FailureKind::ConnectionRefused => "connection refused"
          , FailureKind::Network => "network error"
          , FailureKind::Status => "HTTP error"
          , FailureKind::MalformedBody => "malformed response body"
        };
        f.write_str(label)
    }
}

/// Error type for every docllm operation
/// Implements Clone so callers can keep it alongside results
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error
{   /// Startup configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Provider name not in the known set
    #[error("Unknown provider: {0}")]
    UnknownProvider(String)
  , /// API key is missing for a provider
    #[error("Missing API key for: {0}")]
    MissingApiKey(String)
  , /// Options cannot form a valid completion request
    #[error("Invalid request: {0}")]
    InvalidRequest(String)
  , /// Transport failure, non-2xx status or unreadable body
    #[error(
      "{provider} request failed ({kind}, status {}): {body}",
      display_status(.status)
    )]
    ProviderRequestFailed
    {   provider: crate::Provider
      , kind: FailureKind
      , status: Option<u16>
      , body: String
    }
  , /// Model content does not match the expected JSON shape
    #[error(
      "{provider} returned an invalid {expected} response: {reason}"
    )]
    ResponseFormatInvalid
    {   provider: crate::Provider
      , expected: &'static str
      , reason: String
      , content: String
    }
}

fn display_status(status: &Option<u16>) -> String
{   status
      .map(|s| s.to_string())
      .unwrap_or_else(|| "none".to_string())
}

impl Error
{   /// Failure kind of a provider request error
    pub fn failure_kind(&self) -> Option<FailureKind>
    {   match self
        {   Error::ProviderRequestFailed { kind, .. } => Some(*kind)
          , _ => None
        }
    }

    /// Whether the fallback provider may be tried
    pub fn is_transient(&self) -> bool
    {   self.failure_kind()
          .map(FailureKind::is_transient)
          .unwrap_or(false)
    }

    /// Whether the error is fatal at construction time
    pub fn is_configuration(&self) -> bool
    {   matches!(
          self,
          Error::InvalidConfiguration(_)
            | Error::UnknownProvider(_)
            | Error::MissingApiKey(_)
        )
    }
}
