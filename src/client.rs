use async_trait::async_trait;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    api::{
        Api, ApiResource, DeleteParams, DynamicObject, GroupVersionKind, ListParams, PostParams,
    },
    Client,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::resource::ResourceKind;

/// The slice of the Kubernetes custom objects API this crate relies on.
#[async_trait]
pub trait CustomObjectsApi: Send + Sync {
    async fn create_namespaced_custom_object(
        &self,
        group: &str,
        version: &str,
        namespace: &str,
        plural: &str,
        body: &Value,
    ) -> Result<(), ApiError>;

    async fn create_cluster_custom_object(
        &self,
        group: &str,
        version: &str,
        plural: &str,
        body: &Value,
    ) -> Result<(), ApiError>;

    async fn delete_namespaced_custom_object(
        &self,
        group: &str,
        version: &str,
        namespace: &str,
        plural: &str,
        name: &str,
    ) -> Result<(), ApiError>;

    async fn delete_cluster_custom_object(
        &self,
        group: &str,
        version: &str,
        plural: &str,
        name: &str,
    ) -> Result<(), ApiError>;
}

pub struct KubeApi {
    client: Client,
}

impl KubeApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Check if custom resource definition for `kind` is installed on the cluster.
    pub async fn is_crd_installed(&self, kind: ResourceKind) -> bool {
        let crds: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        let field_selector = format!("metadata.name={}", kind.crd_name());
        let lp = ListParams::default().fields(&field_selector).timeout(20);

        match crds.list(&lp).await {
            Ok(found) => {
                debug!("listed crds with field {}", field_selector);
                !found.items.is_empty()
            }
            Err(e) => {
                error!("failed checking crd {}: {}", kind.crd_name(), e);
                false
            }
        }
    }

    /// Kinds whose CRD could not be found.
    pub async fn missing_crds(&self) -> Vec<ResourceKind> {
        let mut missing = Vec::new();
        for kind in ResourceKind::ALL.iter() {
            if !self.is_crd_installed(*kind).await {
                missing.push(*kind);
            }
        }
        missing
    }

    fn dynamic_api(
        &self,
        group: &str,
        version: &str,
        namespace: Option<&str>,
        plural: &str,
        kind: &str,
    ) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(group, version, kind);
        let ar = ApiResource::from_gvk_with_plural(&gvk, plural);
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }

    async fn create(
        &self,
        group: &str,
        version: &str,
        namespace: Option<&str>,
        plural: &str,
        body: &Value,
    ) -> Result<(), ApiError> {
        let obj: DynamicObject = serde_json::from_value(body.clone())?;
        let kind = body.get("kind").and_then(Value::as_str).unwrap_or_default();
        let api = self.dynamic_api(group, version, namespace, plural, kind);
        api.create(&PostParams::default(), &obj).await?;
        Ok(())
    }

    async fn delete(
        &self,
        group: &str,
        version: &str,
        namespace: Option<&str>,
        plural: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        let api = self.dynamic_api(group, version, namespace, plural, "");
        api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }
}

#[async_trait]
impl CustomObjectsApi for KubeApi {
    async fn create_namespaced_custom_object(
        &self,
        group: &str,
        version: &str,
        namespace: &str,
        plural: &str,
        body: &Value,
    ) -> Result<(), ApiError> {
        self.create(group, version, Some(namespace), plural, body).await
    }

    async fn create_cluster_custom_object(
        &self,
        group: &str,
        version: &str,
        plural: &str,
        body: &Value,
    ) -> Result<(), ApiError> {
        self.create(group, version, None, plural, body).await
    }

    async fn delete_namespaced_custom_object(
        &self,
        group: &str,
        version: &str,
        namespace: &str,
        plural: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        self.delete(group, version, Some(namespace), plural, name).await
    }

    async fn delete_cluster_custom_object(
        &self,
        group: &str,
        version: &str,
        plural: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        self.delete(group, version, None, plural, name).await
    }
}
