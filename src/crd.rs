use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(
    group = "cert-manager.io",
    version = "v1",
    kind = "Certificate",
    namespaced
)]
#[kube(status = "CertificateStatus")]
pub struct CertificateSpec {
    #[serde(rename = "commonName")]
    pub common_name: String,

    #[serde(rename = "dnsNames", default, skip_serializing_if = "Vec::is_empty")]
    pub dns_names: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(rename = "renewBefore", skip_serializing_if = "Option::is_none")]
    pub renew_before: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,

    #[serde(rename = "privateKey", skip_serializing_if = "Option::is_none")]
    pub private_key: Option<PrivateKey>,

    #[serde(rename = "secretName")]
    pub secret_name: String,

    #[serde(rename = "issuerRef")]
    pub issuer_ref: IssuerRef,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Subject {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct PrivateKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct IssuerRef {
    pub name: String,
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct CertificateStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(rename = "notAfter")]
    pub not_after: Option<String>,

    #[serde(rename = "notBefore")]
    pub not_before: Option<String>,

    #[serde(rename = "renewalTime")]
    pub renewal_time: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Condition {
    #[serde(rename = "lastTransitionTime")]
    pub last_transition_time: Option<String>,
    pub message: Option<String>,
    pub reason: Option<String>,
    pub status: String,
    #[serde(rename = "type")]
    pub condition_type: String,
}
