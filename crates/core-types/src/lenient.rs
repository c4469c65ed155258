use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Renders any value as a string; `null` and absent fields map to `None`.
///
/// Steps are never rejected for carrying a value of the wrong type; a bogus
/// selector simply fails when the surface tries to use it.
pub(crate) fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(other) => Some(render(&other)),
    })
}

/// Accepts a number or a numeric string. Anything else becomes `NaN`, which
/// the wait dispatch rejects as a step failure.
pub(crate) fn seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(other) => Some(to_seconds(&other)),
    })
}

/// Text form of a YAML value. Tags are dropped, collections are emitted as
/// block YAML.
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Tagged(tagged) => render(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => serde_yaml::to_string(value)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_else(|_| format!("{value:?}")),
    }
}

fn to_seconds(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => text.trim().parse::<f64>().unwrap_or(f64::NAN),
        Value::Tagged(tagged) => to_seconds(&tagged.value),
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_dropped_when_rendering() {
        let value: Value = serde_yaml::from_str("!sel '#go'").unwrap();
        assert_eq!(render(&value), "#go");
        let tagged_number: Value = serde_yaml::from_str("!secs 3").unwrap();
        assert_eq!(to_seconds(&tagged_number), 3.0);
    }

    #[test]
    fn collections_render_as_yaml() {
        let value: Value = serde_yaml::from_str("{1: a}").unwrap();
        assert_eq!(render(&value), "1: a");
        assert!(to_seconds(&value).is_nan());
    }
}
