use crate::changes::Setting;
use crate::error::{ResourceError, Result};
use crate::types::{EncryptionConfigurationProperties, ResultConfigurationProperties};
use async_trait::async_trait;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{
    EncryptionConfiguration, EncryptionOption, ResultConfiguration, ResultConfigurationUpdates,
    Tag as SdkTag, WorkGroupConfiguration, WorkGroupConfigurationUpdates,
};
use aws_sdk_athena::Client as AthenaClient;
use serde::Serialize;

// ========== REQUEST / RESPONSE SHAPES ==========
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct WorkGroupConfigurationInput {
    pub enforce_work_group_configuration: bool,
    pub publish_cloud_watch_metrics_enabled: bool,
    pub requester_pays_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_configuration: Option<ResultConfigurationProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_scanned_cutoff_per_query: Option<i64>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateWorkGroupRequest {
    pub name: String,
    pub description: String,
    pub configuration: WorkGroupConfigurationInput,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ResultConfigurationChanges {
    pub output_location: Setting<String>,
    pub encryption_configuration: Setting<EncryptionConfigurationProperties>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigurationChanges {
    pub enforce_work_group_configuration: bool,
    pub publish_cloud_watch_metrics_enabled: bool,
    pub requester_pays_enabled: bool,
    pub bytes_scanned_cutoff_per_query: Setting<i64>,
    pub result_configuration: ResultConfigurationChanges,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateWorkGroupRequest {
    pub work_group: String,
    pub description: String,
    pub configuration_updates: ConfigurationChanges,
}

/// The parts of a live WorkGroup that decide which remove flags to send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentWorkGroup {
    pub bytes_scanned_cutoff_per_query: Option<i64>,
    pub output_location: Option<String>,
    pub has_encryption_configuration: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateNamedQueryRequest {
    pub name: String,
    pub database: String,
    pub query_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedQueryDetails {
    pub named_query_id: String,
    pub name: String,
    pub work_group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedQueryPage {
    pub named_query_ids: Vec<String>,
    pub next_token: Option<String>,
}

/// The Athena control-plane calls the handlers rely on.
///
/// Retries and throttling are left to whatever sits behind the trait.
#[async_trait]
pub trait AthenaApi: Send + Sync {
    async fn create_work_group(&self, request: &CreateWorkGroupRequest) -> Result<()>;

    async fn get_work_group(&self, name: &str) -> Result<CurrentWorkGroup>;

    async fn update_work_group(&self, request: &UpdateWorkGroupRequest) -> Result<()>;

    async fn delete_work_group(&self, name: &str, recursive: bool) -> Result<()>;

    async fn tag_resource(&self, resource_arn: &str, tags: &[Tag]) -> Result<()>;

    async fn untag_resource(&self, resource_arn: &str, tag_keys: &[String]) -> Result<()>;

    /// Returns the id Athena assigned to the new query.
    async fn create_named_query(&self, request: &CreateNamedQueryRequest) -> Result<String>;

    async fn get_named_query(&self, named_query_id: &str) -> Result<NamedQueryDetails>;

    /// One page of query ids. `work_group = None` lists the primary workgroup.
    async fn list_named_queries(
        &self,
        work_group: Option<&str>,
        next_token: Option<&str>,
    ) -> Result<NamedQueryPage>;

    async fn delete_named_query(&self, named_query_id: &str) -> Result<()>;
}

/// Dump a request at debug level.
pub(crate) fn debug_payload<T: Serialize>(payload: &T) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        match serde_json::to_string_pretty(payload) {
            Ok(json) => tracing::debug!("Sending payload {}", json),
            Err(e) => tracing::debug!("Could not render payload: {}", e),
        }
    }
}

// ========== AWS SDK ADAPTER ==========
pub struct SdkAthena {
    client: AthenaClient,
}

impl SdkAthena {
    pub fn new(client: AthenaClient) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &aws_config::SdkConfig, endpoint_url: Option<&str>) -> Self {
        let mut builder = aws_sdk_athena::config::Builder::from(config);
        if let Some(url) = endpoint_url {
            builder = builder.endpoint_url(url);
        }
        Self::new(AthenaClient::from_conf(builder.build()))
    }
}

fn remote<E: std::error::Error>(operation: &'static str, err: E) -> ResourceError {
    ResourceError::remote(operation, DisplayErrorContext(err).to_string())
}

fn encryption_configuration(
    operation: &'static str,
    props: &EncryptionConfigurationProperties,
) -> Result<EncryptionConfiguration> {
    EncryptionConfiguration::builder()
        .encryption_option(EncryptionOption::from(props.encryption_option.as_str()))
        .set_kms_key(props.kms_key.clone())
        .build()
        .map_err(|e| remote(operation, e))
}

fn result_configuration(props: &ResultConfigurationProperties) -> Result<ResultConfiguration> {
    let encryption = props
        .encryption_configuration
        .as_ref()
        .map(|e| encryption_configuration("CreateWorkGroup", e))
        .transpose()?;

    Ok(ResultConfiguration::builder()
        .set_output_location(props.output_location.clone())
        .set_encryption_configuration(encryption)
        .build())
}

fn result_configuration_updates(
    changes: &ResultConfigurationChanges,
) -> Result<ResultConfigurationUpdates> {
    let mut builder = ResultConfigurationUpdates::builder();

    match &changes.output_location {
        Setting::Present(location) => builder = builder.output_location(location),
        Setting::Removed => builder = builder.remove_output_location(true),
        Setting::Unset => {}
    }

    match &changes.encryption_configuration {
        Setting::Present(props) => {
            builder = builder
                .encryption_configuration(encryption_configuration("UpdateWorkGroup", props)?)
        }
        Setting::Removed => builder = builder.remove_encryption_configuration(true),
        Setting::Unset => {}
    }

    Ok(builder.build())
}

fn sdk_tags(tags: &[Tag]) -> Vec<SdkTag> {
    tags.iter()
        .map(|tag| SdkTag::builder().key(&tag.key).value(&tag.value).build())
        .collect()
}

#[async_trait]
impl AthenaApi for SdkAthena {
    async fn create_work_group(&self, request: &CreateWorkGroupRequest) -> Result<()> {
        let config = &request.configuration;
        let result_config = config
            .result_configuration
            .as_ref()
            .map(result_configuration)
            .transpose()?;

        let configuration = WorkGroupConfiguration::builder()
            .enforce_work_group_configuration(config.enforce_work_group_configuration)
            .publish_cloud_watch_metrics_enabled(config.publish_cloud_watch_metrics_enabled)
            .requester_pays_enabled(config.requester_pays_enabled)
            .set_result_configuration(result_config)
            .set_bytes_scanned_cutoff_per_query(config.bytes_scanned_cutoff_per_query)
            .build();

        let output = self
            .client
            .create_work_group()
            .name(&request.name)
            .description(&request.description)
            .configuration(configuration)
            .set_tags(Some(sdk_tags(&request.tags)))
            .send()
            .await
            .map_err(|e| remote("CreateWorkGroup", e))?;

        tracing::debug!("CreateWorkGroup response: {:?}", output);
        Ok(())
    }

    async fn get_work_group(&self, name: &str) -> Result<CurrentWorkGroup> {
        let output = self
            .client
            .get_work_group()
            .work_group(name)
            .send()
            .await
            .map_err(|e| remote("GetWorkGroup", e))?;

        tracing::debug!("Current WorkGroup: {:?}", output.work_group());

        let configuration = output.work_group().and_then(|wg| wg.configuration());
        let result_config = configuration.and_then(|c| c.result_configuration());

        Ok(CurrentWorkGroup {
            bytes_scanned_cutoff_per_query: configuration
                .and_then(|c| c.bytes_scanned_cutoff_per_query()),
            output_location: result_config
                .and_then(|rc| rc.output_location())
                .filter(|location| !location.is_empty())
                .map(|location| location.to_string()),
            has_encryption_configuration: result_config
                .and_then(|rc| rc.encryption_configuration())
                .is_some(),
        })
    }

    async fn update_work_group(&self, request: &UpdateWorkGroupRequest) -> Result<()> {
        let changes = &request.configuration_updates;

        let mut updates = WorkGroupConfigurationUpdates::builder()
            .enforce_work_group_configuration(changes.enforce_work_group_configuration)
            .publish_cloud_watch_metrics_enabled(changes.publish_cloud_watch_metrics_enabled)
            .requester_pays_enabled(changes.requester_pays_enabled)
            .result_configuration_updates(result_configuration_updates(
                &changes.result_configuration,
            )?);

        match changes.bytes_scanned_cutoff_per_query {
            Setting::Present(cutoff) => updates = updates.bytes_scanned_cutoff_per_query(cutoff),
            Setting::Removed => updates = updates.remove_bytes_scanned_cutoff_per_query(true),
            Setting::Unset => {}
        }

        self.client
            .update_work_group()
            .work_group(&request.work_group)
            .description(&request.description)
            .configuration_updates(updates.build())
            .send()
            .await
            .map_err(|e| remote("UpdateWorkGroup", e))?;

        Ok(())
    }

    async fn delete_work_group(&self, name: &str, recursive: bool) -> Result<()> {
        self.client
            .delete_work_group()
            .work_group(name)
            .recursive_delete_option(recursive)
            .send()
            .await
            .map_err(|e| remote("DeleteWorkGroup", e))?;

        Ok(())
    }

    async fn tag_resource(&self, resource_arn: &str, tags: &[Tag]) -> Result<()> {
        self.client
            .tag_resource()
            .resource_arn(resource_arn)
            .set_tags(Some(sdk_tags(tags)))
            .send()
            .await
            .map_err(|e| remote("TagResource", e))?;

        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: &[String]) -> Result<()> {
        self.client
            .untag_resource()
            .resource_arn(resource_arn)
            .set_tag_keys(Some(tag_keys.to_vec()))
            .send()
            .await
            .map_err(|e| remote("UntagResource", e))?;

        Ok(())
    }

    async fn create_named_query(&self, request: &CreateNamedQueryRequest) -> Result<String> {
        let output = self
            .client
            .create_named_query()
            .name(&request.name)
            .database(&request.database)
            .query_string(&request.query_string)
            .set_description(request.description.clone())
            .set_work_group(request.work_group.clone())
            .send()
            .await
            .map_err(|e| remote("CreateNamedQuery", e))?;

        output
            .named_query_id()
            .map(|id| id.to_string())
            .ok_or_else(|| ResourceError::remote("CreateNamedQuery", "response had no NamedQueryId"))
    }

    async fn get_named_query(&self, named_query_id: &str) -> Result<NamedQueryDetails> {
        let output = self
            .client
            .get_named_query()
            .named_query_id(named_query_id)
            .send()
            .await
            .map_err(|e| remote("GetNamedQuery", e))?;

        let query = output.named_query().ok_or_else(|| {
            ResourceError::remote(
                "GetNamedQuery",
                format!("no details returned for {}", named_query_id),
            )
        })?;

        Ok(NamedQueryDetails {
            named_query_id: query
                .named_query_id()
                .unwrap_or(named_query_id)
                .to_string(),
            name: query.name().to_string(),
            work_group: query.work_group().map(|wg| wg.to_string()),
        })
    }

    async fn list_named_queries(
        &self,
        work_group: Option<&str>,
        next_token: Option<&str>,
    ) -> Result<NamedQueryPage> {
        let output = self
            .client
            .list_named_queries()
            .set_work_group(work_group.map(|wg| wg.to_string()))
            .set_next_token(next_token.map(|t| t.to_string()))
            .send()
            .await
            .map_err(|e| remote("ListNamedQueries", e))?;

        Ok(NamedQueryPage {
            named_query_ids: output.named_query_ids().to_vec(),
            next_token: output.next_token().map(|t| t.to_string()),
        })
    }

    async fn delete_named_query(&self, named_query_id: &str) -> Result<()> {
        self.client
            .delete_named_query()
            .named_query_id(named_query_id)
            .send()
            .await
            .map_err(|e| remote("DeleteNamedQuery", e))?;

        Ok(())
    }
}
