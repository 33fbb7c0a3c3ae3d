use thiserror::Error;

/// Everything that can make a lifecycle event fail.
///
/// The `Display` output is what CloudFormation shows as the failure reason.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Unhandled resource type: {0}")]
    UnsupportedResourceType(String),

    #[error("Invalid resource properties: {0}")]
    InvalidProperties(#[from] serde_json::Error),

    #[error("Malformed {request_type} request: {reason}")]
    MalformedRequest {
        request_type: &'static str,
        reason: String,
    },

    #[error("Athena {operation} failed: {message}")]
    Remote {
        operation: &'static str,
        message: String,
    },

    #[error("No matching query found for workgroup={work_group} / name={name}")]
    NamedQueryNotFound { work_group: String, name: String },

    #[error("Failed to send response to CloudFormation: {0}")]
    Response(String),
}

impl ResourceError {
    pub fn remote(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Remote {
            operation,
            message: message.into(),
        }
    }
}

pub type Result<T, E = ResourceError> = std::result::Result<T, E>;
