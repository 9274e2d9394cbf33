//! Step Protocol
//!
//! Every completion is expected to be a single JSON object tagged by `step`:
//!
//! ```text
//! {"step": "plan",   "content": "..."}
//! {"step": "action", "content": "...", "function": "get_weather", "input": "Paris"}
//! {"step": "output", "content": "...", "files": {"index.html": "...", ...}}
//! ```
//!
//! Decoding is two-stage: the body must parse as JSON, then the `step` key
//! must name a known phase. Everything else is read permissively.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::preview::GeneratedFiles;

/// A decoded model reply
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Plan {
        content: String,
    },
    Action {
        content: String,
        function: Option<String>,
        input: Option<String>,
    },
    /// Normally only injected by the loop; a model that emits it is not followed.
    Observe {
        output: String,
    },
    Output {
        content: String,
        files: Option<GeneratedFiles>,
    },
}

/// Why a reply could not be turned into a [`Step`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    #[error("unrecognized step: {}", .0.as_deref().unwrap_or("<missing>"))]
    UnrecognizedStep(Option<String>),
}

impl Step {
    /// Decode a raw completion body
    pub fn decode(raw: &str) -> Result<Self, StepError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| StepError::NotJson(e.to_string()))?;

        let Some(obj) = value.as_object() else {
            return Err(StepError::UnrecognizedStep(None));
        };

        let step = match obj.get("step") {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Null) | None => return Err(StepError::UnrecognizedStep(None)),
            Some(other) => return Err(StepError::UnrecognizedStep(Some(other.to_string()))),
        };

        let content = text_field(obj, "content").unwrap_or_default();

        match step {
            "plan" => Ok(Step::Plan { content }),
            "action" => Ok(Step::Action {
                content,
                function: text_field(obj, "function"),
                input: text_field(obj, "input"),
            }),
            "observe" => Ok(Step::Observe {
                output: text_field(obj, "output").unwrap_or_default(),
            }),
            "output" => Ok(Step::Output {
                content,
                files: obj.get("files").and_then(GeneratedFiles::from_json),
            }),
            other => Err(StepError::UnrecognizedStep(Some(other.to_string()))),
        }
    }

    /// Protocol name of this step
    pub const fn name(&self) -> &'static str {
        match self {
            Step::Plan { .. } => "plan",
            Step::Action { .. } => "action",
            Step::Observe { .. } => "observe",
            Step::Output { .. } => "output",
        }
    }
}

/// Body of the synthetic user turn that reports a tool result
#[derive(Debug, Serialize)]
pub struct Observation<'a> {
    step: &'static str,
    output: &'a str,
}

impl<'a> Observation<'a> {
    pub const fn new(output: &'a str) -> Self {
        Self { step: "observe", output }
    }

    /// JSON text for the conversation
    pub fn to_json(&self) -> String {
        // A struct of two string fields always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Read a field as text: strings verbatim, other non-null values as JSON.
pub(crate) fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(value_as_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plan() {
        let step = Step::decode(r#"{"step": "plan", "content": "make a todo app"}"#).unwrap();
        assert_eq!(step, Step::Plan { content: "make a todo app".into() });
    }

    #[test]
    fn test_decode_action_is_permissive() {
        let step = Step::decode(r#"{"step": "action", "function": "run_command", "input": 42}"#).unwrap();
        assert_eq!(
            step,
            Step::Action {
                content: String::new(),
                function: Some("run_command".into()),
                input: Some("42".into()),
            }
        );

        let step = Step::decode(r#"{"step": "action", "function": null}"#).unwrap();
        assert!(matches!(step, Step::Action { function: None, input: None, .. }));
    }

    #[test]
    fn test_decode_output_files_keep_order() {
        let raw = r#"{"step":"output","content":"done","files":{"index.html":"<h1>Hi</h1>","styles.css":"h1{}","app.js":"1"}}"#;
        let Step::Output { content, files } = Step::decode(raw).unwrap() else {
            panic!("expected output step");
        };
        assert_eq!(content, "done");
        let names: Vec<_> = files.unwrap().iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, ["index.html", "styles.css", "app.js"]);
    }

    #[test]
    fn test_empty_files_are_absent() {
        let step = Step::decode(r#"{"step":"output","content":"x","files":{}}"#).unwrap();
        assert!(matches!(step, Step::Output { files: None, .. }));
    }

    #[test]
    fn test_not_json_is_distinct_from_unknown_step() {
        assert!(matches!(Step::decode("Sure! Here is your app"), Err(StepError::NotJson(_))));
        assert_eq!(
            Step::decode(r#"{"step": "dance"}"#),
            Err(StepError::UnrecognizedStep(Some("dance".into())))
        );
        assert_eq!(Step::decode(r#"{"content": "hi"}"#), Err(StepError::UnrecognizedStep(None)));
        assert_eq!(Step::decode("[1, 2]"), Err(StepError::UnrecognizedStep(None)));
    }

    #[test]
    fn test_observation_json() {
        let json = Observation::new("Sunny +20°C").to_json();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["step"], "observe");
        assert_eq!(value["output"], "Sunny +20°C");
    }
}
