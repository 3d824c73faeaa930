//! Default system prompts describing the JSON each operation expects

use crate::request::OperationOptions;
use crate::Operation;

/// Characters of document text sent for classification
pub const CLASSIFY_MAX_CHARS: usize = 4_000;
/// Characters of document text sent for analysis
pub const ANALYZE_MAX_CHARS: usize = 12_000;

pub fn classify_prompt() -> String
{   concat!(
      "You classify documents. Reply with a single JSON object and ",
      "nothing else, shaped as: ",
      "{\"type\": string, \"confidence\": number between 0 and 1, ",
      "\"subtype\": string?, \"industry\": string?, \"audience\": string?, ",
      "\"tone\": string?, \"language\": string?}. ",
      "Use lowercase document types such as \"resume\", \"cover_letter\", ",
      "\"report\", \"proposal\", \"article\" or \"other\"."
    ).to_string()
}

pub fn analyze_prompt() -> String
{   concat!(
      "You review document quality. Reply with a single JSON object and ",
      "nothing else, shaped as: ",
      "{\"readabilityScore\": number 0-100, \"clarityScore\": number 0-100, ",
      "\"overallScore\": number 0-100, \"structureScore\": number 0-100?, ",
      "\"issues\": string[], \"strengths\": string[], ",
      "\"suggestions\": string[]}."
    ).to_string()
}

/// Prompt for rewriting text toward `goal`
pub fn enhance_prompt(goal: &str) -> String
{   format!(
      concat!(
        "You improve documents. Goal: {}. Reply with a single JSON ",
        "object and nothing else, shaped as: ",
        "{{\"enhancedText\": string, \"changes\": [{{\"type\": string, ",
        "\"original\": string, \"enhanced\": string, \"reason\": string, ",
        "\"location\": {{\"start\": integer, \"end\": integer}}}}], ",
        "\"summary\": {{\"totalChanges\": integer, ",
        "\"improvementScore\": number}}}}. ",
        "Locations are character offsets into the original text."
      ),
      goal.trim()
    )
}

/// Options carrying the default prompt for `operation`
pub fn default_options(operation: Operation, goal: &str) -> OperationOptions
{   match operation
    {   Operation::Classify => OperationOptions::new(classify_prompt())
      , Operation::Analyze => OperationOptions::new(analyze_prompt())
      , Operation::Enhance => OperationOptions::new(enhance_prompt(goal))
          .with_temperature(0.7)
          .with_max_tokens(4_000)
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary
pub fn truncate_for_prompt(text: &str, max_chars: usize) -> &str
{   match text.char_indices().nth(max_chars)
    {   Some((byte_index, _)) => &text[..byte_index]
      , None => text
    }
}

/// Truncation limit applied by callers before each operation
pub fn max_chars(operation: Operation) -> Option<usize>
{   match operation
    {   Operation::Classify => Some(CLASSIFY_MAX_CHARS)
      , Operation::Analyze => Some(ANALYZE_MAX_CHARS)
      , Operation::Enhance => None
    }
}
