//! Rendering of certificate requests into cert-manager manifests.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::crd::{Certificate, CertificateSpec, IssuerRef, PrivateKey, Subject};
use crate::error::TemplateError;
use crate::resource::{ResourceKind, GROUP, VERSION};

/// Everything needed to render a Certificate manifest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateRequest {
    pub name: String,
    pub namespace: String,
    pub org: String,
    pub duration: String,
    pub renew_before: String,
    pub common_name: String,
    pub key_size: u32,
    pub issuer_name: String,
    pub issuer_kind: IssuerKind,
    /// Defaults to `<name>-tls`.
    pub secret_name: Option<String>,
}

impl Default for CertificateRequest {
    fn default() -> Self {
        Self {
            name: "test.juju.unit".into(),
            namespace: "default".into(),
            org: "juju".into(),
            duration: "2160h".into(),
            renew_before: "360h".into(),
            common_name: "test.juju.unit".into(),
            key_size: 2048,
            issuer_name: "selfsigned-issuer".into(),
            issuer_kind: IssuerKind::ClusterIssuer,
            secret_name: None,
        }
    }
}

impl CertificateRequest {
    pub fn secret_name(&self) -> String {
        self.secret_name
            .clone()
            .unwrap_or_else(|| format!("{}-tls", self.name))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssuerKind {
    Issuer,
    ClusterIssuer,
}

impl From<IssuerKind> for ResourceKind {
    fn from(kind: IssuerKind) -> Self {
        match kind {
            IssuerKind::Issuer => ResourceKind::Issuer,
            IssuerKind::ClusterIssuer => ResourceKind::ClusterIssuer,
        }
    }
}

pub fn certificate(req: &CertificateRequest) -> Certificate {
    let spec = CertificateSpec {
        common_name: req.common_name.clone(),
        dns_names: vec![req.common_name.clone()],
        duration: Some(req.duration.clone()),
        renew_before: Some(req.renew_before.clone()),
        subject: Some(Subject {
            organizations: vec![req.org.clone()],
        }),
        private_key: Some(PrivateKey {
            algorithm: Some("RSA".into()),
            size: Some(req.key_size),
        }),
        secret_name: req.secret_name(),
        issuer_ref: IssuerRef {
            name: req.issuer_name.clone(),
            kind: ResourceKind::from(req.issuer_kind).kind().into(),
            group: Some(GROUP.into()),
        },
    };

    let mut cert = Certificate::new(&req.name, spec);
    cert.metadata.namespace = Some(req.namespace.clone());
    cert
}

/// Render a single-document Certificate manifest.
pub fn render_certificate(req: &CertificateRequest) -> Result<String, TemplateError> {
    Ok(serde_yaml::to_string(&certificate(req))?)
}

/// Render a self-signed Issuer, or a ClusterIssuer when `namespace` is `None`.
pub fn render_self_signed_issuer(
    name: &str,
    namespace: Option<&str>,
) -> Result<String, TemplateError> {
    let kind = match namespace {
        Some(_) => ResourceKind::Issuer,
        None => ResourceKind::ClusterIssuer,
    };
    let mut metadata = json!({ "name": name });
    if let Some(ns) = namespace {
        metadata["namespace"] = json!(ns);
    }

    let issuer = json!({
        "apiVersion": format!("{}/{}", GROUP, VERSION),
        "kind": kind.kind(),
        "metadata": metadata,
        "spec": {
            "selfSigned": {}
        }
    });
    Ok(serde_yaml::to_string(&issuer)?)
}
