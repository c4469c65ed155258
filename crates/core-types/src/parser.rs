//! Plan deserializer.
//!
//! Accepts either a bare top-level sequence of steps or a mapping with a
//! `steps` sequence, in YAML or JSON (JSON is valid YAML).

use std::str::FromStr;

use serde_yaml::Value;
use thiserror::Error;

use crate::plan::{Plan, Step};

#[derive(Debug, Error)]
pub enum PlanFormatError {
    #[error("plan text is empty")]
    Empty,

    #[error("plan text is not valid YAML: {0}")]
    Syntax(#[source] serde_yaml::Error),

    #[error("plan must be a sequence of steps or a mapping with a `steps` sequence, found {0}")]
    Shape(&'static str),

    #[error("step {index} is malformed: {source}")]
    Step {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Removes a surrounding Markdown code fence (```yaml ... ```), if any.
///
/// Completion services often wrap the plan in a fenced block; text without a
/// leading fence is returned trimmed but otherwise untouched.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let fence = "```";
    let Some(after_fence) = trimmed.strip_prefix(fence) else {
        return trimmed;
    };
    // Drop the info string (`yaml`, `yml`, `json`, ...) up to the first newline.
    let body = match after_fence.find('\n') {
        Some(newline) => &after_fence[newline + 1..],
        None => after_fence,
    };
    match body.rfind(fence) {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parses plan text into an ordered [`Plan`].
pub fn parse_plan(text: &str) -> Result<Plan, PlanFormatError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(PlanFormatError::Empty);
    }

    let document: Value = serde_yaml::from_str(body).map_err(PlanFormatError::Syntax)?;
    let items = match document {
        Value::Sequence(items) => items,
        Value::Mapping(mut mapping) => match mapping.remove("steps") {
            Some(Value::Sequence(items)) => items,
            Some(Value::Null) => Vec::new(),
            Some(other) => return Err(PlanFormatError::Shape(kind_of(&other))),
            None => return Err(PlanFormatError::Shape("a mapping without `steps`")),
        },
        Value::Null => return Err(PlanFormatError::Empty),
        other => return Err(PlanFormatError::Shape(kind_of(&other))),
    };

    let steps = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_yaml::from_value::<Step>(drop_foreign_keys(item)).map_err(|source| {
                PlanFormatError::Step {
                    index: idx + 1,
                    source,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Plan::new(steps))
}

impl FromStr for Plan {
    type Err = PlanFormatError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_plan(text)
    }
}

/// Step keys that are not strings can never name a field; drop them like any
/// other unknown key.
fn drop_foreign_keys(item: Value) -> Value {
    match item {
        Value::Mapping(mut mapping) => {
            mapping.retain(|key, _| key.is_string());
            Value::Mapping(mapping)
        }
        other => other,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
