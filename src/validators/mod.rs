//! Attribute validators
//!
//! Validators are attached to schema attributes and run at validate time,
//! before any create or update. Null values are never validated: a missing
//! optional attribute is the decoder's business, not the validator's.

pub mod kubernetes;

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::diagnostics::{AttributePath, Diagnostic, Diagnostics};

const INVALID_VALUE: &str = "Invalid Attribute Value";
const INVALID_COMBINATION: &str = "Invalid Attribute Combination";

/// A reusable predicate over one attribute value
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Validator {
    /// Kubernetes object name
    Name,
    /// Kubernetes namespace name
    Namespace,
    /// Kubernetes label map
    Labels,
    /// Kubernetes annotation map
    Annotations,
    /// Value must equal one of the listed values
    OneOf { values: Vec<Value> },
    /// Inclusive integer bounds
    IntBetween { min: Option<i64>, max: Option<i64> },
    /// Float bounds, optionally exclusive
    #[serde(rename_all = "camelCase")]
    FloatBetween {
        min: Option<f64>,
        max: Option<f64>,
        exclusive_min: bool,
        exclusive_max: bool,
    },
    /// String length bounds (in characters)
    LengthBetween {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Number of list items or map entries
    SizeBetween {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// String must match a regular expression
    Matches {
        #[serde(serialize_with = "serialize_regex")]
        pattern: Regex,
    },
    /// At least one of the named sibling attributes must be set
    AtLeastOneOf { attributes: Vec<String> },
    /// Exactly one of the named sibling attributes must be set
    ExactlyOneOf { attributes: Vec<String> },
}

fn serialize_regex<S: Serializer>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(regex.as_str())
}

impl Validator {
    /// Compile a pattern validator
    pub fn matches(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Validator::Matches {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Human readable description, used in schema output
    pub fn description(&self) -> String {
        match self {
            Validator::Name => "value must be a valid Kubernetes object name".to_string(),
            Validator::Namespace => "value must be a valid Kubernetes namespace".to_string(),
            Validator::Labels => "keys and values must be valid Kubernetes labels".to_string(),
            Validator::Annotations => "keys must be valid Kubernetes annotation keys".to_string(),
            Validator::OneOf { values } => format!("value must be one of: {}", render_values(values)),
            Validator::IntBetween { min, max } => describe_bounds("value", min, max),
            Validator::FloatBetween { min, max, .. } => describe_bounds("value", min, max),
            Validator::LengthBetween { min, max } => describe_bounds("string length", min, max),
            Validator::SizeBetween { min, max } => describe_bounds("number of entries", min, max),
            Validator::Matches { pattern } => {
                format!("value must match regular expression '{}'", pattern.as_str())
            }
            Validator::AtLeastOneOf { attributes } => {
                format!("at least one of [{}] must be configured", attributes.join(", "))
            }
            Validator::ExactlyOneOf { attributes } => {
                format!("exactly one of [{}] must be configured", attributes.join(", "))
            }
        }
    }

    /// Check a value, reporting violations at `path`
    pub fn check(&self, path: &AttributePath, value: &Value) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if value.is_null() {
            return diagnostics;
        }

        let problems: Vec<String> = match self {
            Validator::Name => value
                .as_str()
                .map(kubernetes::validate_name)
                .unwrap_or_default(),
            Validator::Namespace => value
                .as_str()
                .map(kubernetes::validate_namespace)
                .unwrap_or_default(),
            Validator::Labels => kubernetes::validate_labels(&string_map(value)),
            Validator::Annotations => kubernetes::validate_annotations(&string_map(value)),
            Validator::OneOf { values } => {
                if values.iter().any(|candidate| same_value(candidate, value)) {
                    vec![]
                } else {
                    vec![format!(
                        "value must be one of: {}, got: {}",
                        render_values(values),
                        value
                    )]
                }
            }
            Validator::IntBetween { min, max } => match (value.as_i64(), value.as_f64()) {
                (Some(n), _) => int_out_of_bounds(n, *min, *max),
                (None, Some(n)) => out_of_bounds(n, min.map(|m| m as f64), max.map(|m| m as f64), false, false),
                (None, None) => vec![],
            },
            Validator::FloatBetween {
                min,
                max,
                exclusive_min,
                exclusive_max,
            } => match value.as_f64() {
                Some(n) => out_of_bounds(n, *min, *max, *exclusive_min, *exclusive_max),
                None => vec![],
            },
            Validator::LengthBetween { min, max } => match value.as_str() {
                Some(s) => count_out_of_bounds("string length", s.chars().count(), *min, *max),
                None => vec![],
            },
            Validator::SizeBetween { min, max } => {
                let size = match value {
                    Value::Array(items) => Some(items.len()),
                    Value::Object(entries) => Some(entries.len()),
                    _ => None,
                };
                match size {
                    Some(size) => count_out_of_bounds("number of entries", size, *min, *max),
                    None => vec![],
                }
            }
            Validator::Matches { pattern } => match value.as_str() {
                Some(s) if !pattern.is_match(s) => vec![format!(
                    "value must match regular expression '{}', got: {:?}",
                    pattern.as_str(),
                    s
                )],
                _ => vec![],
            },
            Validator::AtLeastOneOf { attributes } => {
                if configured(value, attributes) == 0 {
                    diagnostics.push(
                        Diagnostic::error(
                            INVALID_COMBINATION,
                            format!(
                                "At least one of these attributes must be configured: [{}]",
                                attributes.join(", ")
                            ),
                        )
                        .at(path),
                    );
                }
                return diagnostics;
            }
            Validator::ExactlyOneOf { attributes } => {
                let count = configured(value, attributes);
                if count != 1 {
                    diagnostics.push(
                        Diagnostic::error(
                            INVALID_COMBINATION,
                            format!(
                                "Exactly one of these attributes must be configured: [{}], got {}",
                                attributes.join(", "),
                                count
                            ),
                        )
                        .at(path),
                    );
                }
                return diagnostics;
            }
        };

        for problem in problems {
            diagnostics.push(Diagnostic::error(INVALID_VALUE, problem).at(path));
        }
        diagnostics
    }
}

fn string_map(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn configured(value: &Value, attributes: &[String]) -> usize {
    attributes
        .iter()
        .filter(|name| value.get(name.as_str()).is_some_and(|v| !v.is_null()))
        .count()
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn render_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_bounds<T: std::fmt::Display>(what: &str, min: &Option<T>, max: &Option<T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{} must be between {} and {}", what, min, max),
        (Some(min), None) => format!("{} must be at least {}", what, min),
        (None, Some(max)) => format!("{} must be at most {}", what, max),
        (None, None) => format!("{} is unbounded", what),
    }
}

fn int_out_of_bounds(n: i64, min: Option<i64>, max: Option<i64>) -> Vec<String> {
    let mut problems = Vec::new();
    if let Some(min) = min.filter(|min| n < *min) {
        problems.push(format!("value must be at least {}, got: {}", min, n));
    }
    if let Some(max) = max.filter(|max| n > *max) {
        problems.push(format!("value must be at most {}, got: {}", max, n));
    }
    problems
}

fn out_of_bounds(
    n: f64,
    min: Option<f64>,
    max: Option<f64>,
    exclusive_min: bool,
    exclusive_max: bool,
) -> Vec<String> {
    let mut problems = Vec::new();
    if let Some(min) = min {
        if n < min || (exclusive_min && n == min) {
            let relation = if exclusive_min { "greater than" } else { "at least" };
            problems.push(format!("value must be {} {}, got: {}", relation, min, n));
        }
    }
    if let Some(max) = max {
        if n > max || (exclusive_max && n == max) {
            let relation = if exclusive_max { "less than" } else { "at most" };
            problems.push(format!("value must be {} {}, got: {}", relation, max, n));
        }
    }
    problems
}

fn count_out_of_bounds(what: &str, n: usize, min: Option<usize>, max: Option<usize>) -> Vec<String> {
    let mut problems = Vec::new();
    if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
        problems.push(format!("{}, got: {}", describe_bounds(what, &min, &max), n));
    }
    problems
}
