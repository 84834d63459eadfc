//! Parsing the tool loop's final, tool-call-free assistant text (§4.4 step 3).

use agentex_core::error::ToolLoopError;

/// Parses the final assistant text into a caller-defined output type, once
/// the model stops calling tools.
pub trait OutputParser: Send + Sync {
    /// The parsed output type.
    type Output;

    /// Parse `text`, the concatenated text content of the final message.
    fn parse(&self, text: &str) -> Result<Self::Output, ToolLoopError>;
}

/// An output parser that returns the raw text unchanged.
pub struct TextOutputParser;

impl OutputParser for TextOutputParser {
    type Output = String;

    fn parse(&self, text: &str) -> Result<String, ToolLoopError> {
        Ok(text.to_string())
    }
}

/// An output parser that decodes the final text as JSON into `T`.
pub struct JsonOutputParser<T> {
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> JsonOutputParser<T> {
    /// Create a new JSON output parser.
    pub fn new() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> Default for JsonOutputParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: serde::de::DeserializeOwned + Send + Sync> OutputParser for JsonOutputParser<T> {
    type Output = T;

    fn parse(&self, text: &str) -> Result<T, ToolLoopError> {
        serde_json::from_str(text).map_err(|e| {
            ToolLoopError::ValidationFailure(format!("output did not parse as JSON: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_parser_returns_input_unchanged() {
        assert_eq!(TextOutputParser.parse("hello").unwrap(), "hello");
    }

    #[derive(serde::Deserialize, PartialEq, Debug)]
    struct Answer {
        value: u32,
    }

    #[test]
    fn json_parser_decodes_struct() {
        let parser: JsonOutputParser<Answer> = JsonOutputParser::new();
        let parsed = parser.parse(r#"{"value": 42}"#).unwrap();
        assert_eq!(parsed, Answer { value: 42 });
    }

    #[test]
    fn json_parser_reports_validation_failure() {
        let parser: JsonOutputParser<Answer> = JsonOutputParser::new();
        let err = parser.parse("not json").unwrap_err();
        assert!(matches!(err, ToolLoopError::ValidationFailure(_)));
    }
}
