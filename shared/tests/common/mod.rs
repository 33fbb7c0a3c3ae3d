#![allow(dead_code)]

use async_trait::async_trait;
use cfn_athena_shared::athena::{
    AthenaApi, CreateNamedQueryRequest, CreateWorkGroupRequest, CurrentWorkGroup,
    NamedQueryDetails, NamedQueryPage, Tag, UpdateWorkGroupRequest,
};
use cfn_athena_shared::types::CustomResourceRequest;
use cfn_athena_shared::{ResourceError, Result};
use serde_json::{json, Value};
use std::sync::Mutex;

pub const STACK_ID: &str =
    "arn:aws:cloudformation:eu-central-1:123456789012:stack/analytics/0f1e2d3c";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateWorkGroup(CreateWorkGroupRequest),
    GetWorkGroup(String),
    UpdateWorkGroup(UpdateWorkGroupRequest),
    DeleteWorkGroup { name: String, recursive: bool },
    TagResource { arn: String, tags: Vec<Tag> },
    UntagResource { arn: String, tag_keys: Vec<String> },
    CreateNamedQuery(CreateNamedQueryRequest),
    GetNamedQuery(String),
    ListNamedQueries { work_group: Option<String>, next_token: Option<String> },
    DeleteNamedQuery(String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Call::GetWorkGroup(_) | Call::GetNamedQuery(_) | Call::ListNamedQueries { .. }
        )
    }

    fn operation(&self) -> &'static str {
        match self {
            Call::CreateWorkGroup(_) => "CreateWorkGroup",
            Call::GetWorkGroup(_) => "GetWorkGroup",
            Call::UpdateWorkGroup(_) => "UpdateWorkGroup",
            Call::DeleteWorkGroup { .. } => "DeleteWorkGroup",
            Call::TagResource { .. } => "TagResource",
            Call::UntagResource { .. } => "UntagResource",
            Call::CreateNamedQuery(_) => "CreateNamedQuery",
            Call::GetNamedQuery(_) => "GetNamedQuery",
            Call::ListNamedQueries { .. } => "ListNamedQueries",
            Call::DeleteNamedQuery(_) => "DeleteNamedQuery",
        }
    }
}

/// In-memory Athena that records every call it receives.
#[derive(Default)]
pub struct FakeAthena {
    calls: Mutex<Vec<Call>>,
    work_group: Mutex<CurrentWorkGroup>,
    queries: Mutex<Vec<NamedQueryDetails>>,
    next_id: Mutex<u32>,
    page_size: usize,
    fail_on: Option<&'static str>,
}

impl FakeAthena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_work_group(self, current: CurrentWorkGroup) -> Self {
        *self.work_group.lock().unwrap() = current;
        self
    }

    pub fn with_query(self, id: &str, name: &str, work_group: &str) -> Self {
        self.queries.lock().unwrap().push(NamedQueryDetails {
            named_query_id: id.to_string(),
            name: name.to_string(),
            work_group: Some(work_group.to_string()),
        });
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn query_ids(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.named_query_id.clone())
            .collect()
    }

    fn record(&self, call: Call) -> Result<()> {
        let operation = call.operation();
        self.calls.lock().unwrap().push(call);
        if self.fail_on == Some(operation) {
            return Err(ResourceError::remote(operation, "simulated failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl AthenaApi for FakeAthena {
    async fn create_work_group(&self, request: &CreateWorkGroupRequest) -> Result<()> {
        self.record(Call::CreateWorkGroup(request.clone()))
    }

    async fn get_work_group(&self, name: &str) -> Result<CurrentWorkGroup> {
        self.record(Call::GetWorkGroup(name.to_string()))?;
        Ok(self.work_group.lock().unwrap().clone())
    }

    async fn update_work_group(&self, request: &UpdateWorkGroupRequest) -> Result<()> {
        self.record(Call::UpdateWorkGroup(request.clone()))
    }

    async fn delete_work_group(&self, name: &str, recursive: bool) -> Result<()> {
        self.record(Call::DeleteWorkGroup {
            name: name.to_string(),
            recursive,
        })
    }

    async fn tag_resource(&self, resource_arn: &str, tags: &[Tag]) -> Result<()> {
        self.record(Call::TagResource {
            arn: resource_arn.to_string(),
            tags: tags.to_vec(),
        })
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: &[String]) -> Result<()> {
        self.record(Call::UntagResource {
            arn: resource_arn.to_string(),
            tag_keys: tag_keys.to_vec(),
        })
    }

    async fn create_named_query(&self, request: &CreateNamedQueryRequest) -> Result<String> {
        self.record(Call::CreateNamedQuery(request.clone()))?;

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let id = format!("new-query-{}", next_id);
        self.queries.lock().unwrap().push(NamedQueryDetails {
            named_query_id: id.clone(),
            name: request.name.clone(),
            work_group: Some(
                request
                    .work_group
                    .clone()
                    .unwrap_or_else(|| "primary".to_string()),
            ),
        });
        Ok(id)
    }

    async fn get_named_query(&self, named_query_id: &str) -> Result<NamedQueryDetails> {
        self.record(Call::GetNamedQuery(named_query_id.to_string()))?;
        self.queries
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.named_query_id == named_query_id)
            .cloned()
            .ok_or_else(|| ResourceError::remote("GetNamedQuery", "no such query"))
    }

    async fn list_named_queries(
        &self,
        work_group: Option<&str>,
        next_token: Option<&str>,
    ) -> Result<NamedQueryPage> {
        self.record(Call::ListNamedQueries {
            work_group: work_group.map(str::to_string),
            next_token: next_token.map(str::to_string),
        })?;

        let target = work_group.unwrap_or("primary");
        let ids: Vec<String> = self
            .queries
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.work_group.as_deref() == Some(target))
            .map(|q| q.named_query_id.clone())
            .collect();

        if self.page_size == 0 {
            return Ok(NamedQueryPage {
                named_query_ids: ids,
                next_token: None,
            });
        }

        let start: usize = next_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(ids.len());
        Ok(NamedQueryPage {
            named_query_ids: ids[start..end].to_vec(),
            next_token: (end < ids.len()).then(|| end.to_string()),
        })
    }

    async fn delete_named_query(&self, named_query_id: &str) -> Result<()> {
        self.record(Call::DeleteNamedQuery(named_query_id.to_string()))?;
        self.queries
            .lock()
            .unwrap()
            .retain(|q| q.named_query_id != named_query_id);
        Ok(())
    }
}

pub fn create_event(resource_type: &str, props: Value) -> CustomResourceRequest {
    serde_json::from_value(json!({
        "RequestType": "Create",
        "ResponseURL": "https://cloudformation-custom-resource-response.example.com/presigned",
        "StackId": STACK_ID,
        "RequestId": "5f2a9c1e",
        "ResourceType": resource_type,
        "LogicalResourceId": "Resource",
        "ResourceProperties": props
    }))
    .unwrap()
}

pub fn update_event(
    resource_type: &str,
    physical_id: &str,
    old: Value,
    new: Value,
) -> CustomResourceRequest {
    serde_json::from_value(json!({
        "RequestType": "Update",
        "ResponseURL": "https://cloudformation-custom-resource-response.example.com/presigned",
        "StackId": STACK_ID,
        "RequestId": "5f2a9c1e",
        "ResourceType": resource_type,
        "LogicalResourceId": "Resource",
        "PhysicalResourceId": physical_id,
        "ResourceProperties": new,
        "OldResourceProperties": old
    }))
    .unwrap()
}

pub fn delete_event(resource_type: &str, physical_id: &str, props: Value) -> CustomResourceRequest {
    serde_json::from_value(json!({
        "RequestType": "Delete",
        "ResponseURL": "https://cloudformation-custom-resource-response.example.com/presigned",
        "StackId": STACK_ID,
        "RequestId": "5f2a9c1e",
        "ResourceType": resource_type,
        "LogicalResourceId": "Resource",
        "PhysicalResourceId": physical_id,
        "ResourceProperties": props
    }))
    .unwrap()
}
