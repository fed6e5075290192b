//! Strimzi `KafkaMirrorMaker` Custom Resource Definition

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{CustomResource, CustomResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{preserve_unknown_fields, require_any_of};

/// Mirror topics from one Kafka cluster into another
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kafka.strimzi.io",
    version = "v1beta2",
    kind = "KafkaMirrorMaker",
    plural = "kafkamirrormakers",
    singular = "kafkamirrormaker",
    shortname = "kmm",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaMirrorMakerSpec {
    /// Number of pods in the Deployment
    #[schemars(range(min = 0))]
    pub replicas: i32,

    /// Kafka MirrorMaker version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Container image override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Source cluster connection
    pub consumer: ConsumerSpec,

    /// Target cluster connection
    pub producer: ProducerSpec,

    /// Java regular expression selecting the topics to mirror, e.g. `A|B`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,

    /// Topics to mirror. Deprecated, use `include` instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<String>,
}

/// Consumer side of the mirror
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerSpec {
    /// Comma separated `host:port` bootstrap addresses of the source cluster
    #[schemars(length(min = 1))]
    pub bootstrap_servers: String,

    /// Consumer group identifier
    pub group_id: String,

    /// Number of consumer stream threads
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub num_streams: Option<i32>,

    /// Offset auto-commit interval in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_commit_interval: Option<i64>,

    /// Raw consumer configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub config: Option<serde_json::Value>,
}

/// Producer side of the mirror
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProducerSpec {
    /// Comma separated `host:port` bootstrap addresses of the target cluster
    #[schemars(length(min = 1))]
    pub bootstrap_servers: String,

    /// Stop MirrorMaker when a send fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_on_send_failure: Option<bool>,

    /// Raw producer configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub config: Option<serde_json::Value>,
}

/// Generated definition for `KafkaMirrorMaker`, requiring a topic selection
pub fn definition() -> CustomResourceDefinition {
    let mut crd = KafkaMirrorMaker::crd();
    require_any_of(&mut crd, &["include", "whitelist"]);
    crd
}
