//! Configuration and state record shared by every resource type

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::catalog::ResourceDescriptor;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::validators::Validator;

/// State of one resource instance, keyed by configuration names
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ResourceModel {
    /// Nanosecond timestamp of the last create or update
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub kind: Option<String>,

    pub metadata: MetadataModel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,

    /// Rendered manifest
    #[serde(default)]
    pub yaml: Option<String>,
}

/// Object metadata as configured
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MetadataModel {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// Full resource schema for a descriptor
pub fn resource_schema(descriptor: &ResourceDescriptor) -> Schema {
    let mut attributes = vec![
        Attribute::new("id", "id", AttributeType::Int64)
            .computed()
            .described("Time of the last create or update, in nanoseconds"),
        Attribute::new("api_version", "apiVersion", AttributeType::String)
            .computed()
            .described("The API group and version of the rendered manifest"),
        Attribute::new("kind", "kind", AttributeType::String)
            .computed()
            .described("The kind of the rendered manifest"),
        Attribute::new("metadata", "metadata", AttributeType::Object(metadata_attributes(descriptor)))
            .required()
            .described("Data that helps uniquely identify the object"),
    ];
    if let Some(spec) = &descriptor.spec {
        attributes.push(spec.clone());
    }
    attributes.push(
        Attribute::new("yaml", "yaml", AttributeType::String)
            .computed()
            .described("The rendered Kubernetes manifest"),
    );

    Schema {
        description: descriptor.description.clone(),
        attributes,
    }
}

fn metadata_attributes(descriptor: &ResourceDescriptor) -> Vec<Attribute> {
    let mut attributes = vec![Attribute::new("name", "name", AttributeType::String)
        .required()
        .described("Unique name of the object, a lowercase RFC 1123 subdomain")
        .validated(Validator::Name)];

    if descriptor.namespaced {
        attributes.push(
            Attribute::new("namespace", "namespace", AttributeType::String)
                .described("Namespace of the object, a lowercase RFC 1123 label")
                .validated(Validator::Namespace),
        );
    }

    attributes.push(
        Attribute::new("labels", "labels", AttributeType::map(AttributeType::String))
            .described("Key/value pairs used to organize and select objects")
            .validated(Validator::Labels),
    );
    attributes.push(
        Attribute::new("annotations", "annotations", AttributeType::map(AttributeType::String))
            .described("Unstructured key/value data stored with the object")
            .validated(Validator::Annotations),
    );
    attributes
}
