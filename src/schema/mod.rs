//! Schema tree shared by configuration decoding and manifest rendering
//!
//! Every attribute carries two names: the snake_case name used in the
//! caller's configuration and state, and the wire name used in the rendered
//! Kubernetes manifest. Both serialization targets are walked from the same
//! tree, so they can never drift apart.

pub mod decode;
pub mod openapi;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::validators::Validator;

/// Validator together with its human readable description
#[derive(Serialize)]
struct DescribedValidator<'a> {
    #[serde(flatten)]
    validator: &'a Validator,
    description: String,
}

fn serialize_validators<S: Serializer>(
    validators: &[Validator],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(validators.len()))?;
    for validator in validators {
        seq.serialize_element(&DescribedValidator {
            validator,
            description: validator.description(),
        })?;
    }
    seq.end()
}

/// Whether the caller must, may or cannot set an attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Requirement {
    Required,
    Optional,
    Computed,
}

/// Type of a list item or map value
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_validators"
    )]
    pub validators: Vec<Validator>,
}

impl Element {
    pub fn new(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            validators: Vec::new(),
        }
    }
}

/// Shape of an attribute value
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "camelCase")]
pub enum AttributeType {
    String,
    Int64,
    Float64,
    Bool,
    /// Either an integer or a string, passed through as given
    IntOrString,
    List(Box<Element>),
    Map(Box<Element>),
    Object(Vec<Attribute>),
    /// Free-form value, keys passed through unchanged
    Dynamic,
}

impl AttributeType {
    pub fn list(element: AttributeType) -> Self {
        AttributeType::List(Box::new(Element::new(element)))
    }

    pub fn map(element: AttributeType) -> Self {
        AttributeType::Map(Box::new(Element::new(element)))
    }

    /// Short name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Int64 => "integer",
            AttributeType::Float64 => "number",
            AttributeType::Bool => "bool",
            AttributeType::IntOrString => "integer or string",
            AttributeType::List(_) => "list",
            AttributeType::Map(_) => "map",
            AttributeType::Object(_) => "object",
            AttributeType::Dynamic => "dynamic",
        }
    }
}

/// A named attribute
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    /// Name in configuration and state
    pub name: String,
    /// Name in the rendered manifest
    pub wire_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub requirement: Requirement,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_validators"
    )]
    pub validators: Vec<Validator>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl Attribute {
    pub fn new(name: &str, wire_name: &str, attr_type: AttributeType) -> Self {
        Self {
            name: name.to_string(),
            wire_name: wire_name.to_string(),
            description: String::new(),
            attr_type,
            requirement: Requirement::Optional,
            validators: Vec::new(),
            deprecated: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.requirement = Requirement::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.requirement = Requirement::Computed;
        self
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn validated(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }

    pub fn is_computed(&self) -> bool {
        self.requirement == Requirement::Computed
    }

    /// Nested attributes when this attribute is an object
    pub fn attributes(&self) -> &[Attribute] {
        match &self.attr_type {
            AttributeType::Object(attributes) => attributes,
            _ => &[],
        }
    }

    /// Look up a nested attribute by its configuration name
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes().iter().find(|a| a.name == name)
    }
}

/// Root of a resource schema
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Resolve a dotted configuration path such as `spec.volume.size`
    pub fn lookup(&self, dotted: &str) -> Option<&Attribute> {
        let mut parts = dotted.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            current = match &current.attr_type {
                AttributeType::Object(_) => current.get(part)?,
                AttributeType::List(element) | AttributeType::Map(element) => match &element.attr_type {
                    AttributeType::Object(attributes) => attributes.iter().find(|a| a.name == part)?,
                    _ => return None,
                },
                _ => return None,
            };
        }
        Some(current)
    }
}
