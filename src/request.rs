//! Request, normalized response and typed payload shapes

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::{Operation, Provider};

/// Caller-supplied options for one operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationOptions
{   /// Instruction describing the JSON the model must return
    pub system_prompt: String
  , /// Sampling temperature, 0.0 to 2.0
    pub temperature: Option<f32>
  , /// Token budget for the reply
    pub max_tokens: Option<u32>
}

impl OperationOptions
{   pub fn new(system_prompt: impl Into<String>) -> Self
    {   OperationOptions
        {   system_prompt: system_prompt.into()
          , temperature: None
          , max_tokens: None
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self
    {   self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = Some(max_tokens);
        self
    }

    /// Fill operation defaults and build the completion request
    pub fn resolve(
      &self
    , operation: Operation
    , text: &str
    ) -> Result<CompletionRequest, Error>
    {   let temperature = self.temperature
          .or(operation.default_temperature())
          .ok_or_else(|| Error::InvalidRequest(
            format!("{} requires a temperature", operation)
          ))?;
        let max_tokens = self.max_tokens
          .or(operation.default_max_tokens())
          .ok_or_else(|| Error::InvalidRequest(
            format!("{} requires max_tokens", operation)
          ))?;

        CompletionRequest::new(
          self.system_prompt.clone()
        , text.to_string()
        , temperature
        , max_tokens
        )
    }
}

/// One validated two-message completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest
{   system_prompt: String
  , user_prompt: String
  , temperature: f32
  , max_tokens: u32
}

impl CompletionRequest
{   pub fn new(
      system_prompt: String
    , user_prompt: String
    , temperature: f32
    , max_tokens: u32
    ) -> Result<Self, Error>
    {   if !(0.0..=2.0).contains(&temperature)
        {   return Err(Error::InvalidRequest(format!(
              "temperature {} outside 0.0..=2.0", temperature
            )));
        }
        if max_tokens == 0
        {   return Err(Error::InvalidRequest(
              "max_tokens must be positive".to_string()
            ));
        }
        Ok(CompletionRequest
        {   system_prompt
          , user_prompt
          , temperature
          , max_tokens
        })
    }

    pub fn system_prompt(&self) -> &str
    {   &self.system_prompt
    }

    pub fn user_prompt(&self) -> &str
    {   &self.user_prompt
    }

    pub fn temperature(&self) -> f32
    {   self.temperature
    }

    pub fn max_tokens(&self) -> u32
    {   self.max_tokens
    }
}

/// Token counts for one call; `total` is always `input + output`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage
{   pub input: u64
  , pub output: u64
  , pub total: u64
}

impl TokenUsage
{   pub fn new(input: u64, output: u64) -> Self
    {   TokenUsage
        {   input
          , output
          , total: input.saturating_add(output)
        }
    }
}

/// Normalized output every adapter produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardResponse
{   /// Raw model output
    pub content: String
  , pub tokens_used: TokenUsage
  , pub model: String
  , /// Provider that actually serviced the call
    pub provider: Provider
  , /// Set by the service when the fallback provider answered
    #[serde(default)]
    pub used_fallback: bool
}

impl StandardResponse
{   /// Parse `content` as JSON of the given shape
    pub fn parse_content<T: DeserializeOwned>(
      &self
    , expected: &'static str
    ) -> Result<T, Error>
    {   serde_json::from_str(self.content.trim()).map_err(|e| {
          self.format_error(expected, e.to_string())
        })
    }

    pub(crate) fn format_error(
      &self
    , expected: &'static str
    , reason: String
    ) -> Error
    {   Error::ResponseFormatInvalid
        {   provider: self.provider
          , expected
          , reason
          , content: self.content.clone()
        }
    }
}

/// Access to the normalized part of any typed response
pub trait Completion
{   fn standard(&self) -> &StandardResponse;
    fn standard_mut(&mut self) -> &mut StandardResponse;
}

// ===== Classify =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification
{   #[serde(rename = "type")]
    pub doc_type: String
  , pub confidence: f64
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse
{   #[serde(flatten)]
    pub classification: Classification
  , #[serde(flatten)]
    pub response: StandardResponse
}

impl ClassifyResponse
{   pub fn from_standard(response: StandardResponse) -> Result<Self, Error>
    {   let classification: Classification
          = response.parse_content("classify")?;
        if !(0.0..=1.0).contains(&classification.confidence)
        {   return Err(response.format_error(
              "classify",
              format!(
                "confidence {} outside 0..=1",
                classification.confidence
              )
            ));
        }
        Ok(ClassifyResponse { classification, response })
    }
}

// ===== Analyze =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis
{   pub readability_score: f64
  , pub clarity_score: f64
  , pub overall_score: f64
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_score: Option<f64>
  , #[serde(default)]
    pub issues: Vec<String>
  , #[serde(default)]
    pub strengths: Vec<String>
  , #[serde(default)]
    pub suggestions: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse
{   #[serde(flatten)]
    pub analysis: Analysis
  , #[serde(flatten)]
    pub response: StandardResponse
}

impl AnalyzeResponse
{   pub fn from_standard(response: StandardResponse) -> Result<Self, Error>
    {   let analysis: Analysis = response.parse_content("analyze")?;
        let scores = [
          analysis.readability_score
        , analysis.clarity_score
        , analysis.overall_score
        ];
        if scores.iter()
          .chain(analysis.structure_score.iter())
          .any(|s| !s.is_finite())
        {   return Err(response.format_error(
              "analyze",
              "scores must be finite numbers".to_string()
            ));
        }
        Ok(AnalyzeResponse { analysis, response })
    }
}

// ===== Enhance =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span
{   pub start: usize
  , pub end: usize
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change
{   #[serde(rename = "type")]
    pub kind: String
  , pub original: String
  , pub enhanced: String
  , pub reason: String
  , pub location: Span
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceSummary
{   pub total_changes: usize
  , pub improvement_score: f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enhancement
{   pub enhanced_text: String
  , pub changes: Vec<Change>
  , pub summary: EnhanceSummary
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhanceResponse
{   #[serde(flatten)]
    pub enhancement: Enhancement
  , #[serde(flatten)]
    pub response: StandardResponse
}

impl EnhanceResponse
{   pub fn from_standard(response: StandardResponse) -> Result<Self, Error>
    {   let enhancement: Enhancement = response.parse_content("enhance")?;
        if let Some(change) = enhancement.changes.iter()
          .find(|c| c.location.start > c.location.end)
        {   return Err(response.format_error(
              "enhance",
              format!(
                "change location {}..{} is reversed",
                change.location.start, change.location.end
              )
            ));
        }
        Ok(EnhanceResponse { enhancement, response })
    }
}

macro_rules! impl_completion
{   ($($ty:ty),*) => {
      $(impl Completion for $ty
        {   fn standard(&self) -> &StandardResponse
            {   &self.response
            }

            fn standard_mut(&mut self) -> &mut StandardResponse
            {   &mut self.response
            }
        })*
    };
}

impl_completion!(ClassifyResponse, AnalyzeResponse, EnhanceResponse);

/// Result of `LlmService::execute`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum TypedResponse
{   Classify(ClassifyResponse)
  , Analyze(AnalyzeResponse)
  , Enhance(EnhanceResponse)
}

impl TypedResponse
{   pub fn operation(&self) -> Operation
    {   match self
        {   TypedResponse::Classify(_) => Operation::Classify
          , TypedResponse::Analyze(_) => Operation::Analyze
          , TypedResponse::Enhance(_) => Operation::Enhance
        }
    }
}

impl Completion for TypedResponse
{   fn standard(&self) -> &StandardResponse
    {   match self
        {   TypedResponse::Classify(r) => r.standard()
          , TypedResponse::Analyze(r) => r.standard()
          , TypedResponse::Enhance(r) => r.standard()
        }
    }

    fn standard_mut(&mut self) -> &mut StandardResponse
    {   match self
        {   TypedResponse::Classify(r) => r.standard_mut()
          , TypedResponse::Analyze(r) => r.standard_mut()
          , TypedResponse::Enhance(r) => r.standard_mut()
        }
    }
}
