//! cert-manager `ClusterIssuer` Custom Resource Definition

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{CustomResource, CustomResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{preserve_unknown_fields, require_one_of};

/// Cluster-wide certificate issuer
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "cert-manager.io",
    version = "v1",
    kind = "ClusterIssuer",
    plural = "clusterissuers",
    singular = "clusterissuer",
    shortname = "ciss"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterIssuerSpec {
    /// Obtain certificates from an ACME server such as Let's Encrypt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acme: Option<AcmeIssuer>,

    /// Sign certificates with a CA key pair stored in a Secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<CaIssuer>,
}

/// ACME issuer configuration
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeIssuer {
    /// ACME directory URL
    pub server: String,

    /// Account e-mail address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Secret storing the ACME account private key
    pub private_key_secret_ref: SecretKeySelector,

    /// Skip TLS verification of the ACME server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_tls_verify: Option<bool>,

    /// Challenge solvers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solvers: Vec<AcmeSolver>,
}

/// One ACME challenge solver
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeSolver {
    /// Restrict the solver to matching certificates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub selector: Option<serde_json::Value>,

    /// HTTP-01 challenge configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub http01: Option<serde_json::Value>,

    /// DNS-01 challenge configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub dns01: Option<serde_json::Value>,
}

/// Reference to a key of a Secret
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// CA issuer configuration
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaIssuer {
    /// Secret holding the signing key pair
    pub secret_name: String,

    /// CRL distribution points added to issued certificates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crl_distribution_points: Vec<String>,
}

/// Generated definition for `ClusterIssuer`, requiring exactly one issuer type
pub fn definition() -> CustomResourceDefinition {
    let mut crd = ClusterIssuer::crd();
    require_one_of(&mut crd, &["acme", "ca"]);
    crd
}
