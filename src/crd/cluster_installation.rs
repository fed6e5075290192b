//! Mattermost `ClusterInstallation` Custom Resource Definition

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{CustomResource, CustomResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mattermost installation managed by the mattermost-operator
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "mattermost.com",
    version = "v1alpha1",
    kind = "ClusterInstallation",
    plural = "clusterinstallations",
    singular = "clusterinstallation",
    shortname = "mm",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInstallationSpec {
    /// Mattermost server image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Mattermost server version (image tag)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Number of Mattermost app servers
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0))]
    pub replicas: Option<i32>,

    /// Sizing preset, e.g. 1000users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Host name routed to this installation
    pub ingress_name: String,

    /// Annotations added to the Ingress
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ingress_annotations: BTreeMap<String, String>,

    /// Expose Mattermost through a LoadBalancer Service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_service_load_balancer: Option<bool>,

    /// Secret holding the enterprise license
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mattermost_license_secret: Option<String>,

    /// Database backing the installation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseSpec>,

    /// MinIO file store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minio: Option<MinioSpec>,

    /// Elasticsearch connection for search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_search: Option<ElasticSearchSpec>,

    /// Extra environment variables for the app servers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mattermost_env: Vec<EnvVar>,
}

/// Database settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSpec {
    /// Database engine
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<DatabaseType>,

    /// Secret with an external database connection string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Number of database replicas for an operator-managed database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Volume size for an operator-managed database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_size: Option<String>,
}

/// Supported database engines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Mysql,
    Postgres,
}

/// MinIO settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MinioSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_size: Option<String>,

    /// Secret with external MinIO credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// Elasticsearch connection settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElasticSearchSpec {
    pub host: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Environment variable
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Generated definition for `ClusterInstallation`
pub fn definition() -> CustomResourceDefinition {
    ClusterInstallation::crd()
}
