//! Built-in Custom Resource Definitions
//!
//! These types generate the CRDs that ship with the provider. Their OpenAPI
//! schemas are the single description each resource is built from.

pub mod cluster_installation;
pub mod cluster_issuer;
pub mod kafka_mirror_maker;
pub mod postgresql;

pub use cluster_installation::{ClusterInstallation, ClusterInstallationSpec};
pub use cluster_issuer::{ClusterIssuer, ClusterIssuerSpec};
pub use kafka_mirror_maker::{KafkaMirrorMaker, KafkaMirrorMakerSpec};
pub use postgresql::{Postgresql, PostgresqlSpec};

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, JSONSchemaProps,
};
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};

use crate::Result;

/// All built-in CRDs
pub fn builtin_crds() -> Vec<CustomResourceDefinition> {
    vec![
        postgresql::definition(),
        kafka_mirror_maker::definition(),
        cluster_installation::definition(),
        cluster_issuer::definition(),
    ]
}

/// Generate CRD YAML manifests for all built-in custom resources
pub fn generate_crds() -> Result<Vec<String>> {
    builtin_crds()
        .iter()
        .map(|crd| serde_yaml::to_string(crd).map_err(Into::into))
        .collect()
}

/// Schema for free-form fields: an object whose content is not pruned
pub(crate) fn preserve_unknown_fields(_: &mut SchemaGenerator) -> Schema {
    let mut schema = SchemaObject {
        instance_type: Some(InstanceType::Object.into()),
        ..Default::default()
    };
    schema.extensions.insert(
        "x-kubernetes-preserve-unknown-fields".to_string(),
        serde_json::Value::Bool(true),
    );
    Schema::Object(schema)
}

/// Require at least one of the given spec properties in every version
pub(crate) fn require_any_of(crd: &mut CustomResourceDefinition, properties: &[&str]) {
    for spec in spec_schemas(crd) {
        spec.any_of = Some(required_clauses(properties));
    }
}

/// Require exactly one of the given spec properties in every version
pub(crate) fn require_one_of(crd: &mut CustomResourceDefinition, properties: &[&str]) {
    for spec in spec_schemas(crd) {
        spec.one_of = Some(required_clauses(properties));
    }
}

fn spec_schemas(crd: &mut CustomResourceDefinition) -> impl Iterator<Item = &mut JSONSchemaProps> {
    crd.spec.versions.iter_mut().filter_map(|version| {
        version
            .schema
            .as_mut()
            .and_then(|s| s.open_api_v3_schema.as_mut())
            .and_then(|root| root.properties.as_mut())
            .and_then(|properties| properties.get_mut("spec"))
    })
}

fn required_clauses(properties: &[&str]) -> Vec<JSONSchemaProps> {
    properties
        .iter()
        .map(|property| JSONSchemaProps {
            required: Some(vec![property.to_string()]),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_schema(crd: &CustomResourceDefinition) -> &JSONSchemaProps {
        crd.spec.versions[0]
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .and_then(|root| root.properties.as_ref())
            .and_then(|properties| properties.get("spec"))
            .unwrap()
    }

    #[test]
    fn builtin_crds_have_distinct_kinds() {
        let crds = builtin_crds();
        let mut kinds: Vec<&str> = crds.iter().map(|c| c.spec.names.kind.as_str()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), crds.len());
    }

    #[test]
    fn mirror_maker_requires_a_topic_selection() {
        let crd = kafka_mirror_maker::definition();
        let clauses = spec_schema(&crd).any_of.as_ref().unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].required, Some(vec!["include".to_string()]));
    }

    #[test]
    fn cluster_issuer_is_cluster_scoped() {
        let crd = cluster_issuer::definition();
        assert_eq!(crd.spec.scope, "Cluster");
        assert!(spec_schema(&crd).one_of.is_some());
    }

    #[test]
    fn generated_manifests_are_custom_resource_definitions() {
        for manifest in generate_crds().unwrap() {
            assert!(manifest.contains("kind: CustomResourceDefinition"));
        }
    }
}
