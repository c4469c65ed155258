use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;

use crate::lenient;

/// Seconds a `wait` step pauses when it does not say otherwise.
pub const DEFAULT_WAIT_SECS: f64 = 1.0;

/// Closed set of actions a step can request.
///
/// Tags are matched case-sensitively against `goto`, `click`, `fill` and
/// `wait`; anything else is kept verbatim in [`StepAction::Unknown`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StepAction {
    Navigate,
    Click,
    Fill,
    Wait,
    Unknown(String),
}

impl StepAction {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "goto" => Self::Navigate,
            "click" => Self::Click,
            "fill" => Self::Fill,
            "wait" => Self::Wait,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Navigate => "goto",
            Self::Click => "click",
            Self::Fill => "fill",
            Self::Wait => "wait",
            Self::Unknown(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl Default for StepAction {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for StepAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for StepAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(match raw {
            Value::String(tag) => Self::from_tag(&tag),
            Value::Null => Self::default(),
            other => Self::Unknown(lenient::render(&other)),
        })
    }
}

/// One automation instruction.
///
/// Fields are private: once deserialized a step is never rewritten.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Step {
    #[serde(default)]
    action: StepAction,
    #[serde(default, deserialize_with = "lenient::string")]
    target: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    value: Option<String>,
    #[serde(default, deserialize_with = "lenient::seconds")]
    duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient::seconds")]
    seconds: Option<f64>,
}

impl Step {
    pub fn new(action: StepAction) -> Self {
        Self {
            action,
            ..Self::default()
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self::new(StepAction::Navigate).with_url(url)
    }

    pub fn click(selector: impl Into<String>) -> Self {
        Self::new(StepAction::Click).with_target(selector)
    }

    pub fn fill(selector: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(StepAction::Fill)
            .with_target(selector)
            .with_value(value)
    }

    pub fn wait(seconds: f64) -> Self {
        Self::new(StepAction::Wait).with_duration(seconds)
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn action(&self) -> &StepAction {
        &self.action
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Destination of a navigate step: `target` first, then `url`.
    pub fn navigation_url(&self) -> Option<&str> {
        self.target().or_else(|| self.url())
    }

    /// Pause length of a wait step in seconds.
    ///
    /// Reads `duration`, then `seconds`, then a numeric `value`, then falls
    /// back to [`DEFAULT_WAIT_SECS`]. The result may be negative or `NaN`;
    /// validating it is the dispatcher's job.
    pub fn wait_seconds(&self) -> f64 {
        if let Some(seconds) = self.duration.or(self.seconds) {
            return seconds;
        }
        self.value
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(DEFAULT_WAIT_SECS)
    }

    /// Selector used to outline the step's element in its snapshot.
    ///
    /// Navigate steps carry a URL in `target`, so they never annotate.
    /// Withholding `target` here is intentional: a URL is not a selector.
    pub fn annotation_selector(&self) -> Option<&str> {
        match self.action {
            StepAction::Navigate => None,
            _ => self.target(),
        }
    }

    /// Single-line rendering for logs.
    pub fn describe(&self) -> String {
        let mut parts = vec![self.action.tag().to_string()];
        match self.action {
            StepAction::Navigate => parts.extend(self.navigation_url().map(str::to_string)),
            StepAction::Wait => parts.push(format!("{}s", self.wait_seconds())),
            _ => {
                parts.extend(self.target().map(str::to_string));
                parts.extend(self.value().map(|value| format!("{value:?}")));
            }
        }
        parts.join(" ")
    }
}

/// Ordered, read-only sequence of steps. Insertion order is execution order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}

impl From<Vec<Step>> for Plan {
    fn from(steps: Vec<Step>) -> Self {
        Self::new(steps)
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
