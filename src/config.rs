//! Configuration for providers and the fallback pair

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Provider;

pub const PROVIDER_VAR: &str = "LLM_PROVIDER";
pub const FALLBACK_PROVIDER_VAR: &str = "LLM_FALLBACK_PROVIDER";

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// Which adapter to build
    pub provider: Provider
  , /// Bearer token
    #[serde(default)]
    pub api_key: Option<String>
  , /// API base URL (if custom)
    #[serde(default)]
    pub api_base: Option<String>
  , /// Model identifier (adapter default if unset)
    #[serde(default)]
    pub model: Option<String>
  , /// Request timeout in seconds, enforced by the HTTP client
    #[serde(default)]
    pub timeout_secs: Option<u64>
}

impl ProviderConfig
{   pub fn new(provider: Provider) -> Self
    {   ProviderConfig
        {   provider
          , api_key: None
          , api_base: None
          , model: None
          , timeout_secs: None
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self
    {   self.api_key = Some(key.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self
    {   self.api_base = Some(base.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.model = Some(model.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self
    {   self.timeout_secs = Some(secs);
        self
    }

    /// Read `<PREFIX>_API_KEY`, `_API_BASE`, `_MODEL`, `_TIMEOUT_SECS`
    pub fn from_vars<F>(provider: Provider, lookup: &F) -> Result<Self, Error>
    where
      F: Fn(&str) -> Option<String>,
    {   let prefix = provider.env_prefix();
        let var = |suffix: &str| {
          lookup(&format!("{}_{}", prefix, suffix))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        };

        let timeout_secs = match var("TIMEOUT_SECS")
        {   Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
              Error::InvalidConfiguration(format!(
                "{}_TIMEOUT_SECS is not a number: {}", prefix, raw
              ))
            })?)
          , None => None
        };

        Ok(ProviderConfig
        {   provider
          , api_key: var("API_KEY")
          , api_base: var("API_BASE")
          , model: var("MODEL")
          , timeout_secs
        })
    }

    pub fn validate(&self) -> Result<(), Error>
    {   if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {   return Err(Error::MissingApiKey(self.provider.to_string()));
        }
        if self.timeout_secs == Some(0)
        {   return Err(Error::InvalidConfiguration(format!(
              "{} timeout must be positive", self.provider
            )));
        }
        if let Some(base) = &self.api_base
        {   if !base.starts_with("http://") && !base.starts_with("https://")
            {   return Err(Error::InvalidConfiguration(format!(
                  "{} api_base must be an http(s) URL: {}",
                  self.provider, base
                )));
            }
        }
        Ok(())
    }
}

/// Primary provider plus optional fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig
{   pub primary: ProviderConfig
  , #[serde(default)]
    pub fallback: Option<ProviderConfig>
}

impl LlmConfig
{   pub fn new(primary: ProviderConfig) -> Self
    {   LlmConfig
        {   primary
          , fallback: None
        }
    }

    pub fn with_fallback(mut self, fallback: ProviderConfig) -> Self
    {   self.fallback = Some(fallback);
        self
    }

    /// Load from process environment
    pub fn from_env() -> Result<Self, Error>
    {   Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load from any variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self, Error>
    where
      F: Fn(&str) -> Option<String>,
    {   let primary: Provider = lookup(PROVIDER_VAR)
          .filter(|v| !v.trim().is_empty())
          .unwrap_or_else(|| Provider::Xai.id().to_string())
          .parse()?;
        debug!("Primary provider: {}", primary);

        let fallback = match lookup(FALLBACK_PROVIDER_VAR)
          .filter(|v| !v.trim().is_empty())
        {   Some(name) => {
              let provider: Provider = name.parse()?;
              debug!("Fallback provider: {}", provider);
              Some(ProviderConfig::from_vars(provider, &lookup)?)
            }
          , None => None
        };

        let config = LlmConfig
        {   primary: ProviderConfig::from_vars(primary, &lookup)?
          , fallback
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error>
    {   let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
          Error::InvalidConfiguration(format!(
            "cannot read {}: {}", path.display(), e
          ))
        })?;
        let config: LlmConfig = serde_json::from_str(&raw).map_err(|e| {
          Error::InvalidConfiguration(format!(
            "cannot parse {}: {}", path.display(), e
          ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error>
    {   self.primary.validate()?;
        if let Some(fallback) = &self.fallback
        {   if fallback.provider == self.primary.provider
            {   return Err(Error::InvalidConfiguration(format!(
                  "fallback provider must differ from primary ({})",
                  fallback.provider
                )));
            }
            fallback.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String>
    {   pairs.iter()
          .map(|(k, v)| (k.to_string(), v.to_string()))
          .collect()
    }

    #[test]
    fn defaults_to_xai_without_fallback()
    {   let env = vars(&[("XAI_API_KEY", "xai-key")]);
        let config = LlmConfig::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.primary.provider, Provider::Xai);
        assert_eq!(config.primary.api_key.as_deref(), Some("xai-key"));
        assert!(config.fallback.is_none());
    }

    #[test]
    fn reads_fallback_settings()
    {   let env = vars(&[
          ("LLM_PROVIDER", "xai")
        , ("LLM_FALLBACK_PROVIDER", "mistral")
        , ("XAI_API_KEY", "a")
        , ("XAI_TIMEOUT_SECS", "30")
        , ("MISTRAL_API_KEY", "b")
        , ("MISTRAL_MODEL", "mistral-large-latest")
        ]);
        let config = LlmConfig::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.primary.timeout_secs, Some(30));
        let fallback = config.fallback.unwrap();
        assert_eq!(fallback.provider, Provider::Mistral);
        assert_eq!(fallback.model.as_deref(), Some("mistral-large-latest"));
    }

    #[test]
    fn unknown_provider_fails_at_startup()
    {   let env = vars(&[("LLM_PROVIDER", "openai")]);
        let err = LlmConfig::from_vars(|k| env.get(k).cloned()).unwrap_err();
        assert_eq!(err, Error::UnknownProvider("openai".to_string()));
    }

    #[test]
    fn missing_fallback_key_fails_at_startup()
    {   let env = vars(&[
          ("XAI_API_KEY", "a")
        , ("LLM_FALLBACK_PROVIDER", "mistral")
        ]);
        let err = LlmConfig::from_vars(|k| env.get(k).cloned()).unwrap_err();
        assert_eq!(err, Error::MissingApiKey("mistral".to_string()));
    }

    #[test]
    fn fallback_must_differ_from_primary()
    {   let config = LlmConfig::new(
          ProviderConfig::new(Provider::Xai).with_api_key("a")
        ).with_fallback(
          ProviderConfig::new(Provider::Xai).with_api_key("b")
        );
        assert!(matches!(
          config.validate(),
          Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn bad_timeout_is_rejected()
    {   let env = vars(&[
          ("XAI_API_KEY", "a")
        , ("XAI_TIMEOUT_SECS", "soon")
        ]);
        assert!(LlmConfig::from_vars(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn json_config_round_trips_through_serde()
    {   let raw = r#"{
          "primary": { "provider": "xai", "api_key": "k", "timeout_secs": 20 },
          "fallback": { "provider": "mistral", "api_key": "m" }
        }"#;
        let config: LlmConfig = serde_json::from_str(raw).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
          config.fallback.map(|f| f.provider),
          Some(Provider::Mistral)
        );
    }
}
