//! Recording stand-in for the cluster API, used by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::CustomObjectsApi;
use crate::error::ApiError;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateNamespaced {
        group: String,
        version: String,
        namespace: String,
        plural: String,
        body: Value,
    },
    CreateCluster {
        group: String,
        version: String,
        plural: String,
        body: Value,
    },
    DeleteNamespaced {
        group: String,
        version: String,
        namespace: String,
        plural: String,
        name: String,
    },
    DeleteCluster {
        group: String,
        version: String,
        plural: String,
        name: String,
    },
}

#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    fail_with: Option<u16>,
}

impl RecordingApi {
    /// Every call is recorded and then answered with the given HTTP status.
    pub fn failing_with(code: u16) -> Self {
        Self {
            calls: Mutex::default(),
            fail_with: Some(code),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with {
            Some(code) => Err(ApiError::Status {
                code,
                reason: "Mocked".into(),
                message: format!("mocked status {}", code),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CustomObjectsApi for RecordingApi {
    async fn create_namespaced_custom_object(
        &self,
        group: &str,
        version: &str,
        namespace: &str,
        plural: &str,
        body: &Value,
    ) -> Result<(), ApiError> {
        self.record(Call::CreateNamespaced {
            group: group.into(),
            version: version.into(),
            namespace: namespace.into(),
            plural: plural.into(),
            body: body.clone(),
        })
    }

    async fn create_cluster_custom_object(
        &self,
        group: &str,
        version: &str,
        plural: &str,
        body: &Value,
    ) -> Result<(), ApiError> {
        self.record(Call::CreateCluster {
            group: group.into(),
            version: version.into(),
            plural: plural.into(),
            body: body.clone(),
        })
    }

    async fn delete_namespaced_custom_object(
        &self,
        group: &str,
        version: &str,
        namespace: &str,
        plural: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        self.record(Call::DeleteNamespaced {
            group: group.into(),
            version: version.into(),
            namespace: namespace.into(),
            plural: plural.into(),
            name: name.into(),
        })
    }

    async fn delete_cluster_custom_object(
        &self,
        group: &str,
        version: &str,
        plural: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        self.record(Call::DeleteCluster {
            group: group.into(),
            version: version.into(),
            plural: plural.into(),
            name: name.into(),
        })
    }
}
