//! Zalando postgres-operator `postgresql` Custom Resource Definition

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{CustomResource, CustomResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// PostgreSQL cluster managed by the Zalando postgres-operator
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "acid.zalan.do",
    version = "v1",
    kind = "postgresql",
    plural = "postgresqls",
    singular = "postgresql",
    shortname = "pg",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PostgresqlSpec {
    /// Team owning the cluster; cluster names must start with the team id
    #[schemars(length(min = 1))]
    pub team_id: String,

    /// Number of database pods
    #[schemars(range(min = 0))]
    pub number_of_instances: i32,

    /// PostgreSQL version and server parameters
    pub postgresql: PostgresqlParameters,

    /// Persistent volume for the data directory
    pub volume: VolumeSpec,

    /// Roles to create, with their role flags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub users: BTreeMap<String, Vec<UserFlag>>,

    /// Databases to create, mapped to their owner role
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub databases: BTreeMap<String, String>,

    /// CIDR ranges allowed to reach the load balancer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_source_ranges: Vec<String>,

    /// Schedule logical backups with pg_dumpall
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_logical_backup: Option<bool>,

    /// Spilo image override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,

    /// CPU and memory for the database containers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesSpec>,
}

/// PostgreSQL server settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostgresqlParameters {
    /// Major version
    pub version: PostgresVersion,

    /// Server configuration parameters (postgresql.conf)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

/// Supported PostgreSQL major versions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum PostgresVersion {
    #[serde(rename = "13")]
    V13,
    #[serde(rename = "14")]
    V14,
    #[serde(rename = "15")]
    V15,
    #[serde(rename = "16")]
    V16,
    #[serde(rename = "17")]
    V17,
}

/// Persistent volume settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    /// Volume size as a Kubernetes quantity, e.g. 10Gi
    #[schemars(regex(pattern = r"^(\d+(e\d+)?|\d+(\.\d+)?(e\d+)?[EPTGMK]i?)$"))]
    pub size: String,

    /// Storage class of the persistent volume claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

/// Role flags understood by the operator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserFlag {
    Superuser,
    Inherit,
    Login,
    Nologin,
    Createrole,
    Createdb,
    Replication,
    Bypassrls,
}

/// Resource requests and limits
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceDescription>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceDescription>,
}

/// CPU and memory quantities
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// CamelCase alias for the generated `postgresql` resource type
#[allow(non_camel_case_types)]
pub type Postgresql = postgresql;

/// Generated definition for the `postgresql` resource
pub fn definition() -> CustomResourceDefinition {
    Postgresql::crd()
}
