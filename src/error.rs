use thiserror::Error;

/// Failure to turn manifest text into resources.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("manifest is not representable as JSON: {0}")]
    Convert(#[from] serde_json::Error),

    #[error("document {index} has unrecognized kind {kind:?}")]
    UnknownKind { index: usize, kind: Option<String> },
}

/// Failure reported by the cluster API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{reason} ({code}): {message}")]
    Status {
        code: u16,
        reason: String,
        message: String,
    },

    #[error("transport: {0}")]
    Transport(kube::Error),

    #[error("body is not a kubernetes object: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("resource has no name")]
    MissingName,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { code: 404, .. })
    }
}

impl From<kube::Error> for ApiError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(status) => ApiError::Status {
                code: status.code,
                reason: status.reason.clone(),
                message: status.message.clone(),
            },
            other => ApiError::Transport(other),
        }
    }
}

#[derive(Debug, Error)]
#[error("failed rendering manifest: {0}")]
pub struct TemplateError(#[from] pub serde_yaml::Error);

#[derive(Debug, Error)]
pub enum RelationError {
    #[error("certificates event bus is closed")]
    Closed,

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_only_for_404() {
        let gone = ApiError::Status {
            code: 404,
            reason: "NotFound".into(),
            message: "certificates.cert-manager.io \"x\" not found".into(),
        };
        let conflict = ApiError::Status {
            code: 409,
            reason: "AlreadyExists".into(),
            message: "exists".into(),
        };
        assert!(gone.is_not_found());
        assert!(!conflict.is_not_found());
        assert!(!ApiError::MissingName.is_not_found());
    }

    #[test]
    fn kube_not_found_maps_to_status() {
        let err = kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".into(),
            message: "certificates.cert-manager.io \"web\" not found".into(),
            reason: "NotFound".into(),
            code: 404,
        });

        let api_err = ApiError::from(err);

        assert!(api_err.is_not_found());
        match api_err {
            ApiError::Status { code, reason, .. } => {
                assert_eq!(code, 404);
                assert_eq!(reason, "NotFound");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn other_kube_errors_are_transport() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let api_err = ApiError::from(kube::Error::SerdeError(serde_err));

        assert!(matches!(api_err, ApiError::Transport(_)));
        assert!(!api_err.is_not_found());
    }
}
