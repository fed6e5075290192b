//! Provider: the set of resource types and lifecycle dispatch by type name

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::Configuration;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::metrics::prometheus::REGISTERED_RESOURCES;
use crate::resources::{
    ApplyResponse, Clock, CreateRequest, CrdResource, DeleteRequest, DeleteResponse, ReadRequest,
    ReadResponse, Resource, SystemClock, UpdateRequest,
};
use crate::{Error, Result};

/// Every resource type exposed by the provider
#[derive(Debug)]
pub struct Provider {
    type_prefix: String,
    resources: BTreeMap<String, Arc<CrdResource>>,
}

impl Provider {
    /// Build the catalog described by the configuration and register its resources
    pub fn new(config: Configuration) -> Result<Self> {
        let catalog = Catalog::from_configuration(&config)?;
        Self::from_catalog(&catalog, &config.type_prefix, Arc::new(SystemClock))
    }

    pub fn from_catalog(catalog: &Catalog, type_prefix: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut resources = BTreeMap::new();
        for descriptor in catalog.descriptors() {
            let resource = CrdResource::new(descriptor.clone(), type_prefix, clock.clone());
            let type_name = resource.metadata().to_string();
            if resources.contains_key(&type_name) {
                return Err(Error::CatalogError(format!(
                    "Resource type {} is defined more than once",
                    type_name
                )));
            }
            resources.insert(type_name, Arc::new(resource));
        }

        REGISTERED_RESOURCES.set(resources.len() as f64);
        info!("Registered {} resource types", resources.len());

        Ok(Self {
            type_prefix: type_prefix.to_string(),
            resources,
        })
    }

    /// Provider type name
    pub fn metadata(&self) -> &str {
        &self.type_prefix
    }

    /// Registered type names, sorted
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn resource(&self, type_name: &str) -> Option<Arc<CrdResource>> {
        self.resources.get(type_name).cloned()
    }

    fn lookup(&self, type_name: &str) -> std::result::Result<&CrdResource, Diagnostics> {
        self.resources
            .get(type_name)
            .map(Arc::as_ref)
            .ok_or_else(|| {
                Diagnostics::from(Diagnostic::from(&Error::UnknownResource(
                    type_name.to_string(),
                )))
            })
    }

    pub fn validate_resource_config(&self, type_name: &str, config: &Value) -> Diagnostics {
        match self.lookup(type_name) {
            Ok(resource) => resource.validate_config(config),
            Err(diagnostics) => diagnostics,
        }
    }

    pub fn create(&self, type_name: &str, request: CreateRequest) -> ApplyResponse {
        match self.lookup(type_name) {
            Ok(resource) => resource.create(request),
            Err(diagnostics) => ApplyResponse {
                state: None,
                diagnostics,
            },
        }
    }

    pub fn read(&self, type_name: &str, request: ReadRequest) -> ReadResponse {
        match self.lookup(type_name) {
            Ok(resource) => resource.read(request),
            Err(diagnostics) => ReadResponse {
                state: request.state,
                diagnostics,
            },
        }
    }

    pub fn update(&self, type_name: &str, request: UpdateRequest) -> ApplyResponse {
        match self.lookup(type_name) {
            Ok(resource) => resource.update(request),
            Err(diagnostics) => ApplyResponse {
                state: None,
                diagnostics,
            },
        }
    }

    pub fn delete(&self, type_name: &str, request: DeleteRequest) -> DeleteResponse {
        match self.lookup(type_name) {
            Ok(resource) => resource.delete(request),
            Err(diagnostics) => DeleteResponse { diagnostics },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
    use serde_json::json;

    fn provider() -> Provider {
        Provider::new(Configuration::default()).unwrap()
    }

    #[test]
    fn registers_builtin_resources() {
        let provider = provider();
        assert_eq!(provider.metadata(), "k8s");
        let names: Vec<&str> = provider.resources().collect();
        assert!(names.contains(&"k8s_acid_zalan_do_postgresql_v1"));
        assert!(names.contains(&"k8s_kafka_strimzi_io_kafka_mirror_maker_v1beta2"));
        assert!(names.contains(&"k8s_mattermost_com_cluster_installation_v1alpha1"));
        assert!(names.contains(&"k8s_cert_manager_io_cluster_issuer_v1"));
    }

    #[test]
    fn custom_prefix_is_applied() {
        let config = Configuration {
            type_prefix: "crd".to_string(),
            ..Configuration::default()
        };
        let provider = Provider::new(config).unwrap();
        assert!(provider.resource("crd_acid_zalan_do_postgresql_v1").is_some());
        assert!(provider.resource("k8s_acid_zalan_do_postgresql_v1").is_none());
    }

    #[test]
    fn unknown_type_names_are_diagnostics() {
        let provider = provider();
        let response = provider.create(
            "k8s_nothing_here_v1",
            CreateRequest {
                config: json!({"metadata": {"name": "demo"}}),
            },
        );
        assert!(response.state.is_none());
        assert!(response.diagnostics.has_errors());
        assert!(provider
            .validate_resource_config("k8s_nothing_here_v1", &json!({}))
            .has_errors());
        assert!(provider
            .delete("k8s_nothing_here_v1", DeleteRequest { state: json!({}) })
            .diagnostics
            .has_errors());
    }

    fn widget_crd(group: &str) -> CustomResourceDefinition {
        serde_yaml::from_str(&format!(
            r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.{group}
spec:
  group: {group}
  names:
    kind: Widget
    plural: widgets
  scope: Namespaced
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              x-kubernetes-preserve-unknown-fields: true
"#
        ))
        .unwrap()
    }

    #[test]
    fn colliding_type_names_are_rejected() {
        let mut catalog = Catalog::new();
        catalog.add_crd(&widget_crd("foo.bar")).unwrap();
        catalog.add_crd(&widget_crd("foo-bar")).unwrap();

        let err = Provider::from_catalog(&catalog, "k8s", Arc::new(SystemClock)).unwrap_err();
        assert!(matches!(err, Error::CatalogError(_)));
        assert!(err.to_string().contains("k8s_foo_bar_widget_v1"));
    }

    #[test]
    fn empty_catalog_has_no_resources() {
        let config = Configuration {
            include_builtin: false,
            ..Configuration::default()
        };
        assert_eq!(Provider::new(config).unwrap().resources().count(), 0);
    }
}
