//! Structured (schema-validated) output.
//!
//! The target schema is a Rust type. Its JSON schema is generated with
//! schemars, sent to the provider (embedded in the system prompt and as an
//! `OutputConfig`), and the reply is parsed back into the type. Any mismatch
//! is a `SchemaValidationFailed`, never a provider failure.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use devquest_types::error::OrchestratorError;
use devquest_types::llm::OutputConfig;
use devquest_types::project::{KanbanBoard, ScopeReport};

/// A type that can be requested as structured output.
pub trait StructuredOutput: DeserializeOwned + JsonSchema {
    /// Semantic checks the JSON schema cannot express.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl StructuredOutput for ScopeReport {
    fn validate(&self) -> Result<(), String> {
        self.check()
    }
}

impl StructuredOutput for KanbanBoard {
    fn validate(&self) -> Result<(), String> {
        match self.tasks.iter().position(|t| t.title.trim().is_empty()) {
            Some(index) => Err(format!("task {index} has an empty title")),
            None => Ok(()),
        }
    }
}

pub fn schema_name<T: JsonSchema>() -> String {
    T::schema_name().into_owned()
}

pub fn schema_value<T: JsonSchema>() -> serde_json::Value {
    schemars::schema_for!(T).to_value()
}

/// Output constraint for backends with native JSON-schema support.
pub fn output_config<T: JsonSchema>() -> OutputConfig {
    OutputConfig::json_schema(schema_name::<T>(), schema_value::<T>())
}

/// System prompt instructions asking for JSON matching `T`'s schema.
pub fn schema_instructions<T: JsonSchema>() -> String {
    let schema = serde_json::to_string_pretty(&schema_value::<T>()).unwrap_or_default();
    format!(
        "Respond with a single JSON value that conforms to the following JSON schema. \
         Do not include any prose outside the JSON.\n\n{schema}"
    )
}

/// Locate the JSON payload in a model reply: a bare JSON value, a fenced
/// code block, or the outermost braces of surrounding prose.
///
/// A reply that already parses as JSON is returned whole, so fences inside
/// string values are left alone.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        return trimmed;
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse and validate a reply as `T`.
pub fn parse_structured<T: StructuredOutput>(text: &str) -> Result<T, OrchestratorError> {
    let schema = schema_name::<T>();
    let value: T = serde_json::from_str(extract_json(text)).map_err(|e| {
        OrchestratorError::SchemaValidationFailed {
            schema: schema.clone(),
            message: e.to_string(),
        }
    })?;
    value
        .validate()
        .map_err(|message| OrchestratorError::SchemaValidationFailed { schema, message })?;
    Ok(value)
}
