use crate::athena::AthenaApi;
use crate::error::Result;
use crate::types::{
    CustomResourceRequest, CustomResourceResponse, Lifecycle, Outcome, ResourceContext,
    ResourceKind,
};
use crate::{named_queries, work_groups};

/// Route a lifecycle event to the handler for its resource type.
///
/// Unknown resource types fail before any Athena call is made.
pub async fn dispatch(api: &dyn AthenaApi, request: &CustomResourceRequest) -> Result<Outcome> {
    let kind = ResourceKind::from_resource_type(&request.resource_type)?;
    let ctx = ResourceContext {
        stack_id: request.stack_id.clone(),
        logical_resource_id: request.logical_resource_id.clone(),
    };

    tracing::info!(
        "Handling {} of {} ({})",
        request.request_type.as_str(),
        request.resource_type,
        request.logical_resource_id
    );

    match kind {
        ResourceKind::WorkGroup => {
            work_groups::handle(api, &ctx, Lifecycle::from_request(request)?).await
        }
        ResourceKind::NamedQuery => {
            named_queries::handle(api, &ctx, Lifecycle::from_request(request)?).await
        }
    }
}

/// Dispatch and turn the result into the body CloudFormation expects.
pub async fn respond(api: &dyn AthenaApi, request: &CustomResourceRequest) -> CustomResourceResponse {
    let result = dispatch(api, request).await;

    match &result {
        Ok(outcome) => tracing::info!(
            "{} succeeded, physical resource id {}",
            request.request_type.as_str(),
            outcome.physical_resource_id
        ),
        Err(e) => tracing::error!("{} failed: {}", request.request_type.as_str(), e),
    }

    CustomResourceResponse::from_result(request, &result)
}
