//! Decoding and validating configuration against a schema
//!
//! Decoding checks structure only: value types, required attributes and
//! unsupported attributes. Validation additionally runs the validators
//! attached to each attribute, which is what happens at plan time.

use serde_json::{Map, Value};
use tracing::debug;

use crate::diagnostics::{AttributePath, Diagnostic, Diagnostics};
use crate::schema::{Attribute, AttributeType, Element, Schema};
use crate::validators::Validator;

/// Decode configuration into its normalized form
///
/// Computed attributes are dropped, integral floats become integers.
pub fn decode(schema: &Schema, config: &Value) -> Result<Value, Diagnostics> {
    let mut walker = Walker {
        run_validators: false,
        diagnostics: Diagnostics::new(),
    };
    let decoded = walker.object(&schema.attributes, config, &AttributePath::root());
    if walker.diagnostics.has_errors() {
        Err(walker.diagnostics)
    } else {
        Ok(decoded)
    }
}

/// Decode configuration and run every attribute validator
pub fn validate(schema: &Schema, config: &Value) -> Diagnostics {
    let mut walker = Walker {
        run_validators: true,
        diagnostics: Diagnostics::new(),
    };
    walker.object(&schema.attributes, config, &AttributePath::root());
    walker.diagnostics
}

struct Walker {
    run_validators: bool,
    diagnostics: Diagnostics,
}

impl Walker {
    fn object(&mut self, attributes: &[Attribute], value: &Value, path: &AttributePath) -> Value {
        let Some(entries) = value.as_object() else {
            self.type_mismatch(path, "object", value);
            return Value::Null;
        };

        for key in entries.keys() {
            if !attributes.iter().any(|a| &a.name == key) {
                self.diagnostics.push(
                    Diagnostic::error(
                        "Unsupported Attribute",
                        format!("An attribute named '{}' is not expected here", key),
                    )
                    .at(&path.attribute(key)),
                );
            }
        }

        let mut decoded = Map::new();
        for attribute in attributes {
            let child_path = path.attribute(&attribute.name);
            let child = entries.get(&attribute.name).unwrap_or(&Value::Null);

            if attribute.is_computed() {
                if !child.is_null() {
                    debug!("Ignoring configured value for computed attribute {}", child_path);
                }
                continue;
            }

            if child.is_null() {
                if attribute.is_required() {
                    self.diagnostics.push(
                        Diagnostic::error(
                            "Missing Required Attribute",
                            format!(
                                "The attribute '{}' is required, but no definition was found",
                                attribute.name
                            ),
                        )
                        .at(&child_path),
                    );
                }
                continue;
            }

            if attribute.deprecated && self.run_validators {
                self.diagnostics.push(
                    Diagnostic::warning("Attribute Deprecated", attribute.description.clone())
                        .at(&child_path),
                );
            }

            let value = self.value(&attribute.attr_type, child, &child_path);
            if value.is_null() {
                continue;
            }
            self.run(&attribute.validators, &value, &child_path);
            decoded.insert(attribute.name.clone(), value);
        }
        Value::Object(decoded)
    }

    fn value(&mut self, attr_type: &AttributeType, value: &Value, path: &AttributePath) -> Value {
        match attr_type {
            AttributeType::String => match value {
                Value::String(_) => value.clone(),
                _ => self.type_mismatch(path, "string", value),
            },
            AttributeType::Bool => match value {
                Value::Bool(_) => value.clone(),
                _ => self.type_mismatch(path, "bool", value),
            },
            AttributeType::Int64 => match integer(value) {
                Some(n) => Value::Number(n.into()),
                None => self.type_mismatch(path, "integer", value),
            },
            AttributeType::Float64 => match value {
                Value::Number(_) => value.clone(),
                _ => self.type_mismatch(path, "number", value),
            },
            AttributeType::IntOrString => match (value, integer(value)) {
                (Value::String(_), _) => value.clone(),
                (_, Some(n)) => Value::Number(n.into()),
                _ => self.type_mismatch(path, "integer or string", value),
            },
            AttributeType::List(element) => match value {
                Value::Array(items) => Value::Array(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| self.element(element, item, &path.index(i)))
                        .collect(),
                ),
                _ => self.type_mismatch(path, "list", value),
            },
            AttributeType::Map(element) => match value {
                Value::Object(entries) => Value::Object(
                    entries
                        .iter()
                        .map(|(k, v)| (k.clone(), self.element(element, v, &path.key(k))))
                        .collect(),
                ),
                _ => self.type_mismatch(path, "map", value),
            },
            AttributeType::Object(attributes) => self.object(attributes, value, path),
            AttributeType::Dynamic => value.clone(),
        }
    }

    fn element(&mut self, element: &Element, value: &Value, path: &AttributePath) -> Value {
        if value.is_null() {
            self.diagnostics.push(
                Diagnostic::error(
                    "Invalid Attribute Value",
                    "Collection elements must not be null",
                )
                .at(path),
            );
            return Value::Null;
        }
        let decoded = self.value(&element.attr_type, value, path);
        if !decoded.is_null() {
            self.run(&element.validators, &decoded, path);
        }
        decoded
    }

    fn run(&mut self, validators: &[Validator], value: &Value, path: &AttributePath) {
        if !self.run_validators {
            return;
        }
        for validator in validators {
            self.diagnostics.extend(validator.check(path, value));
        }
    }

    fn type_mismatch(&mut self, path: &AttributePath, expected: &str, value: &Value) -> Value {
        self.diagnostics.push(
            Diagnostic::error(
                "Incorrect Attribute Type",
                format!("Expected {}, got {}", expected, json_type(value)),
            )
            .at(path),
        );
        Value::Null
    }
}

/// 2^63; `i64::MAX as f64` rounds up to this value
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

fn integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(f))
        .map(|f| f as i64)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> Schema {
        Schema {
            description: String::new(),
            attributes: vec![
                Attribute::new("id", "id", AttributeType::Int64).computed(),
                Attribute::new(
                    "spec",
                    "spec",
                    AttributeType::Object(vec![
                        Attribute::new("team_id", "teamId", AttributeType::String).required(),
                        Attribute::new("instances", "numberOfInstances", AttributeType::Int64)
                            .validated(Validator::IntBetween {
                                min: Some(0),
                                max: None,
                            }),
                        Attribute::new("port", "port", AttributeType::IntOrString),
                        Attribute::new(
                            "users",
                            "users",
                            AttributeType::map(AttributeType::list(AttributeType::String)),
                        ),
                        Attribute::new("extra", "extra", AttributeType::Dynamic),
                    ]),
                )
                .required(),
            ],
        }
    }

    #[test]
    fn decodes_and_normalizes() {
        let config = json!({
            "id": 42,
            "spec": {
                "team_id": "acid",
                "instances": 2.0,
                "port": "http",
                "users": {"alice": ["superuser"]},
                "extra": {"anyKey": [1, "two"]}
            }
        });
        let decoded = decode(&schema(), &config).unwrap();
        assert_eq!(
            decoded,
            json!({
                "spec": {
                    "team_id": "acid",
                    "instances": 2,
                    "port": "http",
                    "users": {"alice": ["superuser"]},
                    "extra": {"anyKey": [1, "two"]}
                }
            })
        );
    }

    #[test]
    fn null_optional_attributes_are_dropped() {
        let config = json!({"spec": {"team_id": "acid", "instances": null}});
        let decoded = decode(&schema(), &config).unwrap();
        assert_eq!(decoded, json!({"spec": {"team_id": "acid"}}));
    }

    #[test]
    fn missing_required_attribute_is_reported() {
        let diagnostics = decode(&schema(), &json!({"spec": {}})).unwrap_err();
        let first = diagnostics.iter().next().unwrap();
        assert_eq!(first.summary, "Missing Required Attribute");
        assert_eq!(first.path.as_ref().unwrap().to_string(), "spec.team_id");
    }

    #[test]
    fn unsupported_attributes_are_reported() {
        let diagnostics =
            decode(&schema(), &json!({"spec": {"team_id": "a", "teamId": "b"}})).unwrap_err();
        assert!(diagnostics.iter().any(|d| d.summary == "Unsupported Attribute"));
    }

    #[test]
    fn type_mismatches_are_reported_with_paths() {
        let config = json!({"spec": {"team_id": 1, "users": {"bob": [true]}, "instances": 1.5}});
        let diagnostics = decode(&schema(), &config).unwrap_err();
        let paths: Vec<String> = diagnostics
            .iter()
            .filter_map(|d| d.path.as_ref().map(|p| p.to_string()))
            .collect();
        assert!(paths.contains(&"spec.team_id".to_string()));
        assert!(paths.contains(&r#"spec.users["bob"][0]"#.to_string()));
        assert!(paths.contains(&"spec.instances".to_string()));
    }

    #[test]
    fn decode_skips_validators_but_validate_runs_them() {
        let config = json!({"spec": {"team_id": "acid", "instances": -1}});
        assert!(decode(&schema(), &config).is_ok());
        let diagnostics = validate(&schema(), &config);
        assert!(diagnostics.has_errors());
        assert_eq!(
            diagnostics.iter().next().unwrap().path.as_ref().unwrap().to_string(),
            "spec.instances"
        );
    }

    #[test]
    fn integers_outside_i64_are_type_errors() {
        let schema = Schema {
            description: String::new(),
            attributes: vec![Attribute::new("n", "n", AttributeType::Int64)],
        };
        assert!(decode(&schema, &json!({"n": 9_223_372_036_854_775_808.0_f64})).is_err());
        assert!(decode(&schema, &json!({"n": 1e300})).is_err());
        assert_eq!(
            decode(&schema, &json!({"n": -9_223_372_036_854_775_808.0_f64})).unwrap(),
            json!({"n": i64::MIN})
        );
        assert_eq!(
            decode(&schema, &json!({"n": i64::MAX})).unwrap(),
            json!({"n": i64::MAX})
        );
    }

    #[test]
    fn null_list_elements_are_rejected() {
        let config = json!({"spec": {"team_id": "acid", "users": {"bob": [null]}}});
        assert!(decode(&schema(), &config).is_err());
    }
}
