//! Resource state to Kubernetes manifest transformation
//!
//! The configuration tree is walked alongside the schema, renaming every
//! attribute to its wire name. Optional attributes that are unset or empty
//! are left out of the manifest; required ones are always written.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::catalog::ResourceDescriptor;
use crate::resources::model::ResourceModel;
use crate::schema::{Attribute, AttributeType};
use crate::{Error, Result};

/// A rendered Kubernetes object
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_yaml::Value>,
}

/// Build the manifest for a decoded resource model
pub fn build_manifest(descriptor: &ResourceDescriptor, model: &ResourceModel) -> Result<Manifest> {
    let metadata = ObjectMeta {
        name: Some(model.metadata.name.clone()),
        namespace: model
            .metadata
            .namespace
            .clone()
            .filter(|_| descriptor.namespaced),
        labels: non_empty(model.metadata.labels.clone()),
        annotations: non_empty(model.metadata.annotations.clone()),
        ..ObjectMeta::default()
    };

    let spec = match (&descriptor.spec, &model.spec) {
        (Some(attribute), Some(value)) => attribute_to_wire(attribute, value)?,
        (None, Some(_)) => {
            return Err(Error::SerializationError(format!(
                "{} does not accept a spec",
                descriptor.kind
            )))
        }
        (_, None) => None,
    };

    Ok(Manifest {
        api_version: descriptor.api_version(),
        kind: descriptor.kind.clone(),
        metadata,
        spec,
    })
}

/// Serialize a manifest as a YAML document
pub fn render(manifest: &Manifest) -> Result<String> {
    serde_yaml::to_string(manifest)
        .map_err(|e| Error::SerializationError(format!("Failed to serialize manifest: {}", e)))
}

fn non_empty(map: Option<BTreeMap<String, String>>) -> Option<BTreeMap<String, String>> {
    map.filter(|m| !m.is_empty())
}

fn attribute_to_wire(attribute: &Attribute, value: &Value) -> Result<Option<serde_yaml::Value>> {
    if value.is_null() {
        return Ok(None);
    }
    to_wire(&attribute.attr_type, value, attribute.is_required())
}

/// Convert a configuration value to its wire form
///
/// Returns `None` when the value should be omitted. `keep_empty` is set for
/// required attributes and collection elements.
pub fn to_wire(
    attr_type: &AttributeType,
    value: &Value,
    keep_empty: bool,
) -> Result<Option<serde_yaml::Value>> {
    let wire = match (attr_type, value) {
        (AttributeType::Object(attributes), Value::Object(entries)) => {
            let mut mapping = serde_yaml::Mapping::new();
            for attribute in attributes.iter().filter(|a| !a.is_computed()) {
                let Some(child) = entries.get(&attribute.name) else {
                    continue;
                };
                if let Some(wire) = attribute_to_wire(attribute, child)? {
                    mapping.insert(serde_yaml::Value::String(attribute.wire_name.clone()), wire);
                }
            }
            serde_yaml::Value::Mapping(mapping)
        }
        (AttributeType::List(element), Value::Array(items)) => {
            let mut sequence = Vec::with_capacity(items.len());
            for item in items {
                if let Some(wire) = to_wire(&element.attr_type, item, true)? {
                    sequence.push(wire);
                }
            }
            serde_yaml::Value::Sequence(sequence)
        }
        (AttributeType::Map(element), Value::Object(entries)) => {
            let mut mapping = serde_yaml::Mapping::new();
            for (key, item) in entries {
                if let Some(wire) = to_wire(&element.attr_type, item, true)? {
                    mapping.insert(serde_yaml::Value::String(key.clone()), wire);
                }
            }
            serde_yaml::Value::Mapping(mapping)
        }
        (AttributeType::Object(_), _)
        | (AttributeType::List(_), _)
        | (AttributeType::Map(_), _) => {
            return Err(Error::SerializationError(format!(
                "Expected {}, found {}",
                attr_type.type_name(),
                value
            )))
        }
        (_, Value::Null) => return Ok(None),
        _ => serde_yaml::to_value(value).map_err(|e| {
            Error::SerializationError(format!("Failed to convert {}: {}", value, e))
        })?,
    };

    if !keep_empty && is_empty(&wire) {
        return Ok(None);
    }
    Ok(Some(wire))
}

fn is_empty(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Mapping(mapping) => mapping.is_empty(),
        serde_yaml::Value::Sequence(sequence) => sequence.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::model::MetadataModel;
    use crate::schema::Element;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn descriptor(namespaced: bool) -> ResourceDescriptor {
        ResourceDescriptor {
            group: "example.com".to_string(),
            version: "v1".to_string(),
            kind: "Widget".to_string(),
            plural: "widgets".to_string(),
            namespaced,
            description: String::new(),
            deprecated: false,
            spec: Some(
                Attribute::new(
                    "spec",
                    "spec",
                    AttributeType::Object(vec![
                        Attribute::new("team_id", "teamId", AttributeType::String).required(),
                        Attribute::new("replica_count", "replicaCount", AttributeType::Int64),
                        Attribute::new(
                            "selector",
                            "selector",
                            AttributeType::map(AttributeType::String),
                        ),
                        Attribute::new(
                            "ports",
                            "ports",
                            AttributeType::List(Box::new(Element::new(AttributeType::Object(
                                vec![Attribute::new("port_name", "portName", AttributeType::String)],
                            )))),
                        ),
                        Attribute::new("settings", "settings", AttributeType::Dynamic),
                    ]),
                )
                .required(),
            ),
        }
    }

    fn model(spec: Value) -> ResourceModel {
        ResourceModel {
            metadata: MetadataModel {
                name: "demo".to_string(),
                namespace: Some("team-a".to_string()),
                labels: Some(BTreeMap::new()),
                annotations: None,
            },
            spec: Some(spec),
            ..ResourceModel::default()
        }
    }

    #[test]
    fn renames_attributes_to_wire_names() {
        let manifest = build_manifest(
            &descriptor(true),
            &model(json!({
                "team_id": "acid",
                "replica_count": 3,
                "selector": {"app_name": "db"},
                "settings": {"snake_key": true}
            })),
        )
        .unwrap();

        assert_eq!(
            render(&manifest).unwrap(),
            "apiVersion: example.com/v1\n\
             kind: Widget\n\
             metadata:\n  name: demo\n  namespace: team-a\n\
             spec:\n  teamId: acid\n  replicaCount: 3\n  selector:\n    app_name: db\n  settings:\n    snake_key: true\n"
        );
    }

    #[test]
    fn empty_optional_collections_are_omitted() {
        let manifest = build_manifest(
            &descriptor(true),
            &model(json!({"team_id": "acid", "selector": {}, "ports": [], "settings": {}})),
        )
        .unwrap();
        let spec = manifest.spec.unwrap();
        assert_eq!(spec.as_mapping().unwrap().len(), 1);
        assert!(manifest.metadata.labels.is_none());
    }

    #[test]
    fn list_elements_are_kept_even_when_empty() {
        let manifest = build_manifest(
            &descriptor(true),
            &model(json!({"team_id": "acid", "ports": [{}, {"port_name": "http"}]})),
        )
        .unwrap();
        let ports = manifest.spec.unwrap()["ports"].clone();
        assert_eq!(ports.as_sequence().unwrap().len(), 2);
        assert_eq!(ports[1]["portName"], serde_yaml::Value::from("http"));
    }

    #[test]
    fn required_empty_spec_is_rendered() {
        let mut descriptor = descriptor(true);
        descriptor.spec = Some(
            Attribute::new("spec", "spec", AttributeType::Object(Vec::new())).required(),
        );
        let manifest = build_manifest(&descriptor, &model(json!({}))).unwrap();
        assert!(render(&manifest).unwrap().contains("spec: {}"));
    }

    #[test]
    fn cluster_scoped_manifests_drop_the_namespace() {
        let manifest =
            build_manifest(&descriptor(false), &model(json!({"team_id": "acid"}))).unwrap();
        assert!(manifest.metadata.namespace.is_none());
    }

    #[test]
    fn shape_mismatch_is_a_serialization_error() {
        let err = build_manifest(&descriptor(true), &model(json!("not an object"))).unwrap_err();
        assert!(matches!(err, Error::SerializationError(_)));
    }
}
