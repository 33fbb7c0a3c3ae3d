use crate::config::LogLevel;
use crate::error::{ResourceError, Result};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub const WORK_GROUP_RESOURCE_TYPE: &str = "Custom::Athena-WorkGroup";
pub const NAMED_QUERY_RESOURCE_TYPE: &str = "Custom::Athena-NamedQuery";

// ========== LIFECYCLE EVENT ==========
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::Create => "Create",
            RequestType::Update => "Update",
            RequestType::Delete => "Delete",
        }
    }
}

/// Raw CloudFormation custom resource event.
///
/// Properties stay untyped here; they are parsed once the resource kind
/// is known.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceRequest {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL", default)]
    pub response_url: String,
    #[serde(default)]
    pub service_token: Option<String>,
    pub stack_id: String,
    #[serde(default)]
    pub request_id: String,
    pub resource_type: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: serde_json::Value,
    #[serde(default)]
    pub old_resource_properties: Option<serde_json::Value>,
}

impl CustomResourceRequest {
    /// The `LogLevel` property of the desired state, if one was given.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.resource_properties
            .get("LogLevel")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    WorkGroup,
    NamedQuery,
}

impl ResourceKind {
    pub fn from_resource_type(resource_type: &str) -> Result<Self> {
        match resource_type {
            WORK_GROUP_RESOURCE_TYPE => Ok(ResourceKind::WorkGroup),
            NAMED_QUERY_RESOURCE_TYPE => Ok(ResourceKind::NamedQuery),
            other => Err(ResourceError::UnsupportedResourceType(other.to_string())),
        }
    }
}

/// Stack-level facts shared by every handler.
#[derive(Debug, Clone)]
pub struct ResourceContext {
    pub stack_id: String,
    pub logical_resource_id: String,
}

/// A lifecycle event with its properties parsed into `P`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lifecycle<P> {
    Create {
        desired: P,
    },
    Update {
        desired: P,
        previous: P,
        physical_resource_id: String,
    },
    Delete {
        current: P,
        physical_resource_id: String,
    },
}

impl<P: DeserializeOwned> Lifecycle<P> {
    pub fn from_request(request: &CustomResourceRequest) -> Result<Self> {
        let desired: P = serde_json::from_value(request.resource_properties.clone())?;

        match request.request_type {
            RequestType::Create => Ok(Lifecycle::Create { desired }),
            RequestType::Update => {
                let previous = request.old_resource_properties.clone().ok_or_else(|| {
                    ResourceError::MalformedRequest {
                        request_type: "Update",
                        reason: "missing OldResourceProperties".to_string(),
                    }
                })?;
                Ok(Lifecycle::Update {
                    desired,
                    previous: serde_json::from_value(previous)?,
                    physical_resource_id: required_physical_id(request)?,
                })
            }
            RequestType::Delete => Ok(Lifecycle::Delete {
                current: desired,
                physical_resource_id: required_physical_id(request)?,
            }),
        }
    }
}

fn required_physical_id(request: &CustomResourceRequest) -> Result<String> {
    request
        .physical_resource_id
        .clone()
        .ok_or_else(|| ResourceError::MalformedRequest {
            request_type: request.request_type.as_str(),
            reason: "missing PhysicalResourceId".to_string(),
        })
}

// ========== WORKGROUP ==========
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionOption {
    #[serde(rename = "SSE_S3")]
    SseS3,
    #[serde(rename = "SSE_KMS")]
    SseKms,
    #[serde(rename = "CSE_KMS")]
    CseKms,
}

impl EncryptionOption {
    pub fn as_str(self) -> &'static str {
        match self {
            EncryptionOption::SseS3 => "SSE_S3",
            EncryptionOption::SseKms => "SSE_KMS",
            EncryptionOption::CseKms => "CSE_KMS",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct EncryptionConfigurationProperties {
    pub encryption_option: EncryptionOption,
    #[serde(default, deserialize_with = "non_empty")]
    pub kms_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ResultConfigurationProperties {
    #[serde(default, deserialize_with = "non_empty")]
    pub output_location: Option<String>,
    #[serde(default)]
    pub encryption_configuration: Option<EncryptionConfigurationProperties>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct WorkGroupProperties {
    pub name: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub arn: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "flag")]
    pub enforce_work_group_configuration: bool,
    #[serde(default, deserialize_with = "flag")]
    pub publish_cloud_watch_metrics_enabled: bool,
    #[serde(default, deserialize_with = "flag")]
    pub requester_pays_enabled: bool,
    #[serde(default)]
    pub result_configuration: Option<ResultConfigurationProperties>,
    #[serde(default, deserialize_with = "optional_integer")]
    pub bytes_scanned_cutoff_per_query: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub stack_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: BTreeMap<String, String>,
}

impl WorkGroupProperties {
    pub fn output_location(&self) -> Option<&str> {
        self.result_configuration
            .as_ref()
            .and_then(|rc| rc.output_location.as_deref())
    }

    pub fn encryption_configuration(&self) -> Option<&EncryptionConfigurationProperties> {
        self.result_configuration
            .as_ref()
            .and_then(|rc| rc.encryption_configuration.as_ref())
    }
}

// ========== NAMED QUERY ==========
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct NamedQueryProperties {
    pub name: String,
    pub database: String,
    pub query_string: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub work_group: Option<String>,
}

// ========== COMPLETION ==========
/// What a handler reports back on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub physical_resource_id: String,
    pub data: BTreeMap<String, String>,
}

impl Outcome {
    pub fn new(physical_resource_id: impl Into<String>) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Body PUT to the presigned `ResponseURL`.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: BTreeMap<String, String>,
}

impl CustomResourceResponse {
    pub fn success(request: &CustomResourceRequest, outcome: Outcome) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: None,
            physical_resource_id: outcome.physical_resource_id,
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data: outcome.data,
        }
    }

    pub fn failed(request: &CustomResourceRequest, error: &ResourceError) -> Self {
        let physical_resource_id = request
            .physical_resource_id
            .clone()
            .unwrap_or_else(|| request.logical_resource_id.clone());

        Self {
            status: ResponseStatus::Failed,
            reason: Some(error.to_string()),
            physical_resource_id,
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data: BTreeMap::new(),
        }
    }

    pub fn from_result(request: &CustomResourceRequest, result: &Result<Outcome>) -> Self {
        match result {
            Ok(outcome) => Self::success(request, outcome.clone()),
            Err(e) => Self::failed(request, e),
        }
    }
}

// ========== PROPERTY DECODING ==========
// CloudFormation stringifies every scalar it passes to a custom resource.

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Text(String),
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(match Option::<FlagValue>::deserialize(deserializer)? {
        Some(FlagValue::Bool(b)) => b,
        Some(FlagValue::Text(s)) => s == "true",
        None => false,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntegerValue {
    Number(i64),
    Text(String),
}

fn optional_integer<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    match Option::<IntegerValue>::deserialize(deserializer)? {
        Some(IntegerValue::Number(n)) => Ok(Some(n)),
        Some(IntegerValue::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(IntegerValue::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an integer, got '{}'", s))),
        None => Ok(None),
    }
}

fn non_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
