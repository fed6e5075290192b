//! Resource descriptors: one per served version of a CRD

use heck::ToSnakeCase;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionVersion, JSONSchemaProps,
};
use serde::Serialize;

use crate::schema::{openapi, Attribute, AttributeType};
use crate::{Error, Result};

/// Everything needed to expose one CRD version as a resource
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// API group, empty for the core group
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub namespaced: bool,
    pub description: String,
    pub deprecated: bool,
    /// Field tree of the `spec` property, if the CRD declares one
    pub spec: Option<Attribute>,
}

impl ResourceDescriptor {
    /// Build descriptors for every served version of a CRD
    pub fn from_crd(crd: &CustomResourceDefinition) -> Result<Vec<ResourceDescriptor>> {
        crd.spec
            .versions
            .iter()
            .filter(|version| version.served)
            .map(|version| Self::from_version(crd, version))
            .collect()
    }

    fn from_version(
        crd: &CustomResourceDefinition,
        version: &CustomResourceDefinitionVersion,
    ) -> Result<ResourceDescriptor> {
        let names = &crd.spec.names;
        let root = version
            .schema
            .as_ref()
            .and_then(|validation| validation.open_api_v3_schema.as_ref());
        let context = format!("{}/{} {}", crd.spec.group, version.name, names.kind);

        let spec = match root {
            Some(root) => spec_attribute(root, &context)?,
            None => Some(dynamic_spec()),
        };

        let description = root
            .and_then(|root| {
                root.properties
                    .as_ref()
                    .and_then(|p| p.get("spec"))
                    .and_then(|spec| spec.description.clone())
                    .or_else(|| root.description.clone())
            })
            .unwrap_or_else(|| format!("{} ({})", names.kind, context));

        Ok(ResourceDescriptor {
            group: crd.spec.group.clone(),
            version: version.name.clone(),
            kind: names.kind.clone(),
            plural: names.plural.clone(),
            namespaced: crd.spec.scope == "Namespaced",
            description,
            deprecated: version.deprecated.unwrap_or(false),
            spec,
        })
    }

    /// `group/version`, or just `version` for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Resource type name, e.g. `k8s_acid_zalan_do_postgresql_v1`
    pub fn type_name(&self, prefix: &str) -> String {
        let group = self.group.replace(['.', '-'], "_");
        [
            prefix.to_string(),
            group,
            self.kind.to_snake_case(),
            self.version.to_lowercase(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
    }

    /// Same group, version and kind
    pub fn same_gvk(&self, other: &ResourceDescriptor) -> bool {
        self.group == other.group && self.version == other.version && self.kind == other.kind
    }
}

fn spec_attribute(root: &JSONSchemaProps, context: &str) -> Result<Option<Attribute>> {
    let required = root
        .required
        .as_ref()
        .is_some_and(|required| required.iter().any(|r| r == "spec"));

    match root.properties.as_ref().and_then(|p| p.get("spec")) {
        Some(spec) => openapi::attribute("spec", spec, required)
            .map(Some)
            .map_err(|e| match e {
                Error::CatalogError(msg) => Error::CatalogError(format!("{}: {}", context, msg)),
                other => other,
            }),
        None if root.x_kubernetes_preserve_unknown_fields == Some(true) => Ok(Some(dynamic_spec())),
        None => Ok(None),
    }
}

fn dynamic_spec() -> Attribute {
    Attribute::new("spec", "spec", AttributeType::Dynamic)
        .described("Free-form specification of the resource")
}
