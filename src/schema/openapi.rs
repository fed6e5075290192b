//! OpenAPI v3 (CRD structural schema) to schema tree conversion

use heck::ToSnakeCase;
use regex::Regex;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    JSONSchemaProps, JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};
use std::collections::BTreeMap;
use tracing::warn;

use crate::schema::{Attribute, AttributeType, Element, Requirement};
use crate::validators::Validator;
use crate::{Error, Result};

lazy_static::lazy_static! {
    /// "Deprecated" opening the description or one of its sentences
    static ref DEPRECATION_NOTICE: Regex =
        Regex::new(r"(?i)(^\s*|[.!?:;]\s+|\n\s*)deprecated\b").unwrap();
}

/// Configuration name for a manifest key
pub fn config_name(wire_name: &str) -> String {
    wire_name.to_snake_case()
}

/// Convert one named property into an attribute
pub fn attribute(wire_name: &str, props: &JSONSchemaProps, required: bool) -> Result<Attribute> {
    let name = config_name(wire_name);
    if name.is_empty() {
        return Err(Error::CatalogError(format!(
            "property '{}' has no usable attribute name",
            wire_name
        )));
    }

    let attr_type = attribute_type(props, wire_name)?;
    let validators = validators(props, &attr_type, wire_name);
    let description = props.description.clone().unwrap_or_default();
    let deprecated = DEPRECATION_NOTICE.is_match(&description);

    Ok(Attribute {
        name,
        wire_name: wire_name.to_string(),
        description,
        attr_type,
        requirement: if required {
            Requirement::Required
        } else {
            Requirement::Optional
        },
        validators,
        deprecated,
    })
}

/// Convert the properties of an object schema
pub fn object_attributes(
    properties: &BTreeMap<String, JSONSchemaProps>,
    required: &[String],
    context: &str,
) -> Result<Vec<Attribute>> {
    let mut attributes: Vec<Attribute> = Vec::with_capacity(properties.len());
    for (wire_name, props) in properties {
        let attribute = attribute(wire_name, props, required.contains(wire_name))?;
        if let Some(existing) = attributes.iter().find(|a| a.name == attribute.name) {
            return Err(Error::CatalogError(format!(
                "properties '{}' and '{}' of '{}' both map to attribute '{}'",
                existing.wire_name, attribute.wire_name, context, attribute.name
            )));
        }
        attributes.push(attribute);
    }
    Ok(attributes)
}

/// Determine the attribute type of a schema
pub fn attribute_type(props: &JSONSchemaProps, context: &str) -> Result<AttributeType> {
    if props.x_kubernetes_int_or_string == Some(true) {
        return Ok(AttributeType::IntOrString);
    }

    let attr_type = match props.type_.as_deref() {
        Some("string") => AttributeType::String,
        Some("integer") => AttributeType::Int64,
        Some("number") => AttributeType::Float64,
        Some("boolean") => AttributeType::Bool,
        Some("array") => AttributeType::List(Box::new(match &props.items {
            Some(JSONSchemaPropsOrArray::Schema(item)) => element(item, context)?,
            Some(JSONSchemaPropsOrArray::Schemas(items)) if items.len() == 1 => {
                element(&items[0], context)?
            }
            _ => Element::new(AttributeType::Dynamic),
        })),
        Some("object") | None => object_type(props, context)?,
        Some(other) => {
            warn!(
                "Unsupported schema type '{}' for '{}', treating as dynamic",
                other, context
            );
            AttributeType::Dynamic
        }
    };
    Ok(attr_type)
}

fn object_type(props: &JSONSchemaProps, context: &str) -> Result<AttributeType> {
    if let Some(properties) = props.properties.as_ref().filter(|p| !p.is_empty()) {
        let required = props.required.clone().unwrap_or_default();
        return Ok(AttributeType::Object(object_attributes(
            properties, &required, context,
        )?));
    }

    let attr_type = match &props.additional_properties {
        Some(JSONSchemaPropsOrBool::Schema(value)) => {
            AttributeType::Map(Box::new(element(value, context)?))
        }
        Some(JSONSchemaPropsOrBool::Bool(true)) => AttributeType::map(AttributeType::Dynamic),
        _ => AttributeType::Dynamic,
    };
    Ok(attr_type)
}

fn element(props: &JSONSchemaProps, context: &str) -> Result<Element> {
    let attr_type = attribute_type(props, context)?;
    let validators = validators(props, &attr_type, context);
    Ok(Element {
        attr_type,
        validators,
    })
}

/// Collect the validators a schema declares for the given type
pub fn validators(props: &JSONSchemaProps, attr_type: &AttributeType, context: &str) -> Vec<Validator> {
    let mut validators = Vec::new();

    if let Some(values) = props.enum_.as_ref().filter(|v| !v.is_empty()) {
        validators.push(Validator::OneOf {
            values: values.iter().map(|v| v.0.clone()).collect(),
        });
    }

    match attr_type {
        AttributeType::Int64 => {
            if props.minimum.is_some() || props.maximum.is_some() {
                let exclusive_min = props.exclusive_minimum.unwrap_or(false);
                let exclusive_max = props.exclusive_maximum.unwrap_or(false);
                validators.push(Validator::IntBetween {
                    min: props.minimum.map(|m| {
                        if exclusive_min {
                            m.floor() as i64 + 1
                        } else {
                            m.ceil() as i64
                        }
                    }),
                    max: props.maximum.map(|m| {
                        if exclusive_max {
                            m.ceil() as i64 - 1
                        } else {
                            m.floor() as i64
                        }
                    }),
                });
            }
        }
        AttributeType::Float64 => {
            if props.minimum.is_some() || props.maximum.is_some() {
                validators.push(Validator::FloatBetween {
                    min: props.minimum,
                    max: props.maximum,
                    exclusive_min: props.exclusive_minimum.unwrap_or(false),
                    exclusive_max: props.exclusive_maximum.unwrap_or(false),
                });
            }
        }
        AttributeType::String => {
            if props.min_length.is_some() || props.max_length.is_some() {
                validators.push(Validator::LengthBetween {
                    min: props.min_length.and_then(|n| usize::try_from(n).ok()),
                    max: props.max_length.and_then(|n| usize::try_from(n).ok()),
                });
            }
            if let Some(pattern) = &props.pattern {
                match Validator::matches(pattern) {
                    Ok(validator) => validators.push(validator),
                    Err(e) => warn!(
                        "Skipping pattern '{}' for '{}', it does not compile: {}",
                        pattern, context, e
                    ),
                }
            }
        }
        AttributeType::List(_) => {
            if props.min_items.is_some() || props.max_items.is_some() {
                validators.push(Validator::SizeBetween {
                    min: props.min_items.and_then(|n| usize::try_from(n).ok()),
                    max: props.max_items.and_then(|n| usize::try_from(n).ok()),
                });
            }
        }
        AttributeType::Map(_) => {
            if props.min_properties.is_some() || props.max_properties.is_some() {
                validators.push(Validator::SizeBetween {
                    min: props.min_properties.and_then(|n| usize::try_from(n).ok()),
                    max: props.max_properties.and_then(|n| usize::try_from(n).ok()),
                });
            }
        }
        AttributeType::Object(_) => {
            if let Some(attributes) = props.any_of.as_deref().and_then(required_alternatives) {
                validators.push(Validator::AtLeastOneOf { attributes });
            }
            if let Some(attributes) = props.one_of.as_deref().and_then(required_alternatives) {
                validators.push(Validator::ExactlyOneOf { attributes });
            }
        }
        AttributeType::Bool | AttributeType::IntOrString | AttributeType::Dynamic => {}
    }

    validators
}

/// `anyOf`/`oneOf` branches that only list required properties
fn required_alternatives(branches: &[JSONSchemaProps]) -> Option<Vec<String>> {
    if branches.is_empty() {
        return None;
    }
    let mut names = Vec::new();
    for branch in branches {
        let required = branch.required.as_ref().filter(|r| !r.is_empty())?;
        if branch.type_.is_some() || branch.properties.is_some() {
            return None;
        }
        for wire_name in required {
            let name = config_name(wire_name);
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Some(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSON;
    use serde_json::json;

    fn props(value: serde_json::Value) -> JSONSchemaProps {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn camel_case_properties_get_snake_case_names() {
        let spec = props(json!({
            "type": "object",
            "required": ["teamId"],
            "properties": {
                "teamId": {"type": "string"},
                "numberOfInstances": {"type": "integer", "minimum": 0}
            }
        }));
        let attribute = attribute("spec", &spec, true).unwrap();
        let team = attribute.get("team_id").unwrap();
        assert_eq!(team.wire_name, "teamId");
        assert!(team.is_required());
        let instances = attribute.get("number_of_instances").unwrap();
        assert!(!instances.is_required());
        assert!(matches!(
            instances.validators.as_slice(),
            [Validator::IntBetween {
                min: Some(0),
                max: None
            }]
        ));
    }

    #[test]
    fn maps_lists_and_free_form_values() {
        let spec = props(json!({
            "type": "object",
            "properties": {
                "labels": {"type": "object", "additionalProperties": {"type": "string"}},
                "hosts": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                "config": {"type": "object", "x-kubernetes-preserve-unknown-fields": true},
                "port": {"x-kubernetes-int-or-string": true}
            }
        }));
        let attribute = attribute("spec", &spec, false).unwrap();
        assert!(matches!(attribute.get("labels").unwrap().attr_type, AttributeType::Map(_)));
        let hosts = attribute.get("hosts").unwrap();
        assert!(matches!(hosts.attr_type, AttributeType::List(_)));
        assert_eq!(hosts.validators.len(), 1);
        assert!(matches!(attribute.get("config").unwrap().attr_type, AttributeType::Dynamic));
        assert!(matches!(
            attribute.get("port").unwrap().attr_type,
            AttributeType::IntOrString
        ));
    }

    #[test]
    fn enums_become_one_of() {
        let mut version = props(json!({"type": "string"}));
        version.enum_ = Some(vec![JSON(json!("15")), JSON(json!("16"))]);
        let attribute = attribute("version", &version, true).unwrap();
        match attribute.validators.as_slice() {
            [Validator::OneOf { values }] => assert_eq!(values, &vec![json!("15"), json!("16")]),
            other => panic!("unexpected validators: {:?}", other),
        }
    }

    #[test]
    fn exclusive_integer_bounds_are_tightened() {
        let replicas = props(json!({
            "type": "integer",
            "minimum": 0,
            "exclusiveMinimum": true,
            "maximum": 10,
            "exclusiveMaximum": true
        }));
        let attribute = attribute("replicas", &replicas, false).unwrap();
        assert!(matches!(
            attribute.validators.as_slice(),
            [Validator::IntBetween {
                min: Some(1),
                max: Some(9)
            }]
        ));
    }

    #[test]
    fn any_of_required_becomes_at_least_one_of() {
        let spec = props(json!({
            "type": "object",
            "properties": {
                "include": {"type": "string"},
                "whitelist": {"type": "string"}
            },
            "anyOf": [{"required": ["include"]}, {"required": ["whitelist"]}]
        }));
        let attribute = attribute("spec", &spec, true).unwrap();
        match attribute.validators.as_slice() {
            [Validator::AtLeastOneOf { attributes }] => {
                assert_eq!(attributes, &vec!["include".to_string(), "whitelist".to_string()])
            }
            other => panic!("unexpected validators: {:?}", other),
        }
    }

    #[test]
    fn uncompilable_patterns_are_skipped() {
        let field = props(json!({"type": "string", "pattern": "^(?!forbidden).*$"}));
        let attribute = attribute("field", &field, false).unwrap();
        assert!(attribute.validators.is_empty());
    }

    #[test]
    fn colliding_names_are_rejected() {
        let spec = props(json!({
            "type": "object",
            "properties": {
                "fooBar": {"type": "string"},
                "foo_bar": {"type": "string"}
            }
        }));
        let err = attribute("spec", &spec, false).unwrap_err();
        assert!(err.to_string().contains("foo_bar"));
    }

    #[test]
    fn deprecated_descriptions_are_flagged() {
        let field = props(json!({
            "type": "string",
            "description": "List of topics to mirror. Deprecated, use include."
        }));
        assert!(attribute("whitelist", &field, false).unwrap().deprecated);

        for description in ["DEPRECATED: use spec.include", "Deprecated since v1beta2"] {
            let field = props(json!({"type": "string", "description": description}));
            assert!(attribute("old", &field, false).unwrap().deprecated, "{}", description);
        }
    }

    #[test]
    fn passing_mentions_of_deprecation_are_not_flagged() {
        for description in [
            "This field is not deprecated.",
            "Replaces the deprecated whitelist field",
            "Undeprecated alias of include",
        ] {
            let field = props(json!({"type": "string", "description": description}));
            assert!(!attribute("include", &field, false).unwrap().deprecated, "{}", description);
        }
    }
}
