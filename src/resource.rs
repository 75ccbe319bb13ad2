use std::fmt;

use serde_json::Value;

use crate::client::CustomObjectsApi;
use crate::error::ApiError;

pub const GROUP: &str = "cert-manager.io";
pub const VERSION: &str = "v1";

/// cert-manager custom resource kinds this crate knows how to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Issuer,
    ClusterIssuer,
    Certificate,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Issuer,
        ResourceKind::ClusterIssuer,
        ResourceKind::Certificate,
    ];

    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "Issuer" => Some(ResourceKind::Issuer),
            "ClusterIssuer" => Some(ResourceKind::ClusterIssuer),
            "Certificate" => Some(ResourceKind::Certificate),
            _ => None,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            ResourceKind::Issuer => "Issuer",
            ResourceKind::ClusterIssuer => "ClusterIssuer",
            ResourceKind::Certificate => "Certificate",
        }
    }

    pub fn group(self) -> &'static str {
        GROUP
    }

    pub fn version(self) -> &'static str {
        VERSION
    }

    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::Issuer => "issuers",
            ResourceKind::ClusterIssuer => "clusterissuers",
            ResourceKind::Certificate => "certificates",
        }
    }

    /// Whether instances of this kind live inside a namespace.
    pub fn is_namespaced(self) -> bool {
        !matches!(self, ResourceKind::ClusterIssuer)
    }

    /// Name of the backing CustomResourceDefinition, e.g. `issuers.cert-manager.io`.
    pub fn crd_name(self) -> String {
        format!("{}.{}", self.plural(), self.group())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Result of a single create or delete call.
///
/// Failures are reported here instead of through `Err` so that callers which
/// ignore the value keep going, the same as if the call had succeeded.
#[derive(Debug)]
pub enum Outcome {
    Done,
    AlreadyAbsent,
    Failed(ApiError),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// One parsed manifest document, ready to be sent to the cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomResourceInstance {
    kind: ResourceKind,
    name: Option<String>,
    namespace: String,
    data: Value,
}

impl CustomResourceInstance {
    pub fn new(
        kind: ResourceKind,
        data: Value,
        name: Option<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name,
            namespace: namespace.into(),
            data,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Empty for cluster-scoped resources.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// `namespace/name` or just `name` for cluster-scoped resources.
    pub fn full_name(&self) -> String {
        let name = self.name().unwrap_or("<unnamed>");
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.namespace, name)
        }
    }

    /// Submit `data` as a new object of this kind. Never fails the caller.
    pub async fn create<C>(&self, api: &C) -> Outcome
    where
        C: CustomObjectsApi + ?Sized,
    {
        let kind = self.kind;
        info!("Creating custom resource: {}", self.full_name());

        let res = if self.namespace.is_empty() {
            api.create_cluster_custom_object(
                kind.group(),
                kind.version(),
                kind.plural(),
                &self.data,
            )
            .await
        } else {
            api.create_namespaced_custom_object(
                kind.group(),
                kind.version(),
                &self.namespace,
                kind.plural(),
                &self.data,
            )
            .await
        };

        match res {
            Ok(()) => Outcome::Done,
            Err(e) => {
                error!("failed creating {} {}: {}", kind, self.full_name(), e);
                Outcome::Failed(e)
            }
        }
    }

    /// Delete the object by name. A missing object counts as already absent.
    pub async fn delete<C>(&self, api: &C) -> Outcome
    where
        C: CustomObjectsApi + ?Sized,
    {
        let kind = self.kind;
        info!("Attempting to delete custom resource: {}", self.full_name());

        let name = match self.name() {
            Some(name) => name,
            None => {
                error!("cannot delete {} without metadata.name", kind);
                return Outcome::Failed(ApiError::MissingName);
            }
        };

        let res = if self.namespace.is_empty() {
            api.delete_cluster_custom_object(kind.group(), kind.version(), kind.plural(), name)
                .await
        } else {
            api.delete_namespaced_custom_object(
                kind.group(),
                kind.version(),
                &self.namespace,
                kind.plural(),
                name,
            )
            .await
        };

        match res {
            Ok(()) => Outcome::Done,
            Err(e) if e.is_not_found() => {
                info!("Resource already gone: {}", self.full_name());
                Outcome::AlreadyAbsent
            }
            Err(e) => {
                error!("failed deleting {} {}: {}", kind, self.full_name(), e);
                Outcome::Failed(e)
            }
        }
    }
}
