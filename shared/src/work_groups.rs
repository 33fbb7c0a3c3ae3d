use crate::athena::{
    debug_payload, AthenaApi, ConfigurationChanges, CreateWorkGroupRequest,
    ResultConfigurationChanges, Tag, UpdateWorkGroupRequest, WorkGroupConfigurationInput,
};
use crate::changes::{Setting, Tracked};
use crate::error::Result;
use crate::types::{Lifecycle, Outcome, ResourceContext, WorkGroupProperties};
use std::collections::BTreeMap;

pub const STACK_ID_TAG: &str = "aws-cloudformation:stack-id";
pub const STACK_NAME_TAG: &str = "aws-cloudformation:stack-name";
pub const LOGICAL_ID_TAG: &str = "aws-cloudformation:logical-id";

/// Run one lifecycle event against a WorkGroup.
///
/// The WorkGroup name is the physical id. A rename on Update creates the
/// new WorkGroup and reports the new name, which makes CloudFormation
/// delete the old one afterwards.
pub async fn handle(
    api: &dyn AthenaApi,
    ctx: &ResourceContext,
    lifecycle: Lifecycle<WorkGroupProperties>,
) -> Result<Outcome> {
    match lifecycle {
        Lifecycle::Create { desired } => {
            create_work_group(api, ctx, &desired).await?;
            Ok(outcome(ctx, &desired, desired.name.clone()))
        }
        Lifecycle::Update {
            desired,
            previous,
            physical_resource_id,
        } => {
            let name = Tracked::new(desired.name.clone(), Some(previous.name.clone()));
            if name.changed {
                tracing::info!(
                    "WorkGroup name changed from {} to {}. Creating a replacement",
                    previous.name,
                    desired.name
                );
                create_work_group(api, ctx, &desired).await?;
                return Ok(outcome(ctx, &desired, desired.name.clone()));
            }

            if desired == previous {
                tracing::info!(
                    "No changes detected for WorkGroup {}. Not attempting any update",
                    desired.name
                );
                return Ok(outcome(ctx, &desired, physical_resource_id));
            }

            update_work_group(api, ctx, &desired, &previous).await?;
            Ok(outcome(ctx, &desired, physical_resource_id))
        }
        Lifecycle::Delete {
            current,
            physical_resource_id,
        } => {
            delete_work_group(api, &current).await?;
            Ok(outcome(ctx, &current, physical_resource_id))
        }
    }
}

fn outcome(ctx: &ResourceContext, props: &WorkGroupProperties, physical_id: String) -> Outcome {
    Outcome::new(physical_id).with_attribute("ARN", work_group_arn(ctx, props))
}

/// The ARN is known before the WorkGroup exists and Athena never returns it.
/// Falls back to the partition, region and account of the stack.
pub fn work_group_arn(ctx: &ResourceContext, props: &WorkGroupProperties) -> String {
    if let Some(arn) = &props.arn {
        return arn.clone();
    }

    // arn:<partition>:cloudformation:<region>:<account>:stack/<name>/<guid>
    let parts: Vec<&str> = ctx.stack_id.splitn(6, ':').collect();
    let partition = parts.get(1).copied().unwrap_or("aws");
    let region = parts.get(3).copied().unwrap_or_default();
    let account = parts.get(4).copied().unwrap_or_default();

    format!(
        "arn:{}:athena:{}:{}:workgroup/{}",
        partition, region, account, props.name
    )
}

/// System tags first, then the user's tags.
pub fn make_tags(
    ctx: &ResourceContext,
    stack_name: &str,
    user_tags: &BTreeMap<String, String>,
) -> Vec<Tag> {
    let mut tags = vec![
        Tag::new(STACK_ID_TAG, &ctx.stack_id),
        Tag::new(STACK_NAME_TAG, stack_name),
        Tag::new(LOGICAL_ID_TAG, &ctx.logical_resource_id),
    ];
    tags.extend(user_tags.iter().map(|(key, value)| Tag::new(key, value)));
    tags
}

/// Keys present in `old_tags` but in none of `new_tags`.
pub fn missing_tag_keys(old_tags: &[Tag], new_tags: &[Tag]) -> Vec<String> {
    old_tags
        .iter()
        .filter(|old| !new_tags.iter().any(|new| new.key == old.key))
        .map(|tag| tag.key.clone())
        .collect()
}

async fn create_work_group(
    api: &dyn AthenaApi,
    ctx: &ResourceContext,
    desired: &WorkGroupProperties,
) -> Result<()> {
    tracing::info!("Attempting to create Athena WorkGroup {}", desired.name);

    let request = CreateWorkGroupRequest {
        name: desired.name.clone(),
        description: desired.description.clone(),
        configuration: WorkGroupConfigurationInput {
            enforce_work_group_configuration: desired.enforce_work_group_configuration,
            publish_cloud_watch_metrics_enabled: desired.publish_cloud_watch_metrics_enabled,
            requester_pays_enabled: desired.requester_pays_enabled,
            result_configuration: desired.result_configuration.clone(),
            bytes_scanned_cutoff_per_query: desired.bytes_scanned_cutoff_per_query,
        },
        tags: make_tags(ctx, &desired.stack_name, &desired.tags),
    };

    debug_payload(&request);
    api.create_work_group(&request).await
}

async fn update_work_group(
    api: &dyn AthenaApi,
    ctx: &ResourceContext,
    desired: &WorkGroupProperties,
    previous: &WorkGroupProperties,
) -> Result<()> {
    update_configuration(api, desired, previous).await?;

    let tags = Tracked::new(desired.tags.clone(), Some(previous.tags.clone()));
    let arn = work_group_arn(ctx, desired);
    add_tags(api, ctx, desired, &arn, &tags).await?;
    remove_tags(api, ctx, desired, &arn, &tags).await
}

async fn update_configuration(
    api: &dyn AthenaApi,
    desired: &WorkGroupProperties,
    previous: &WorkGroupProperties,
) -> Result<()> {
    tracing::info!("Attempting to update Athena WorkGroup {}", desired.name);

    tracing::info!("Fetching details of Athena WorkGroup {}", desired.name);
    let current = api.get_work_group(&desired.name).await?;

    let request = UpdateWorkGroupRequest {
        work_group: desired.name.clone(),
        description: desired.description.clone(),
        configuration_updates: ConfigurationChanges {
            enforce_work_group_configuration: desired.enforce_work_group_configuration,
            publish_cloud_watch_metrics_enabled: desired.publish_cloud_watch_metrics_enabled,
            requester_pays_enabled: desired.requester_pays_enabled,
            bytes_scanned_cutoff_per_query: Setting::resolve(
                desired.bytes_scanned_cutoff_per_query,
                current.bytes_scanned_cutoff_per_query.is_some()
                    || previous.bytes_scanned_cutoff_per_query.is_some(),
            ),
            result_configuration: ResultConfigurationChanges {
                output_location: Setting::resolve(
                    desired.output_location().map(str::to_string),
                    current.output_location.is_some() || previous.output_location().is_some(),
                ),
                encryption_configuration: Setting::resolve(
                    desired.encryption_configuration().cloned(),
                    current.has_encryption_configuration
                        || previous.encryption_configuration().is_some(),
                ),
            },
        },
    };

    debug_payload(&request);
    api.update_work_group(&request).await
}

async fn add_tags(
    api: &dyn AthenaApi,
    ctx: &ResourceContext,
    desired: &WorkGroupProperties,
    arn: &str,
    tags: &Tracked<BTreeMap<String, String>>,
) -> Result<()> {
    tracing::info!("Attempting to update tags for Athena WorkGroup {}", desired.name);

    if !tags.changed {
        tracing::info!(
            "No changes of tags detected for WorkGroup {}. Not attempting any update",
            desired.name
        );
        return Ok(());
    }

    let new_tags = make_tags(ctx, &desired.stack_name, &tags.value);
    debug_payload(&new_tags);
    api.tag_resource(arn, &new_tags).await
}

async fn remove_tags(
    api: &dyn AthenaApi,
    ctx: &ResourceContext,
    desired: &WorkGroupProperties,
    arn: &str,
    tags: &Tracked<BTreeMap<String, String>>,
) -> Result<()> {
    tracing::info!("Attempting to remove some tags for Athena WorkGroup {}", desired.name);

    if !tags.changed {
        tracing::info!(
            "No changes of tags detected for WorkGroup {}. Not attempting any update",
            desired.name
        );
        return Ok(());
    }

    let old_tags = make_tags(
        ctx,
        &desired.stack_name,
        tags.before.as_ref().unwrap_or(&BTreeMap::new()),
    );
    let new_tags = make_tags(ctx, &desired.stack_name, &tags.value);
    let to_remove = missing_tag_keys(&old_tags, &new_tags);
    if to_remove.is_empty() {
        tracing::info!("No tags to remove");
        return Ok(());
    }

    tracing::info!("Will remove the following tags: {:?}", to_remove);
    api.untag_resource(arn, &to_remove).await
}

async fn delete_work_group(api: &dyn AthenaApi, current: &WorkGroupProperties) -> Result<()> {
    tracing::info!("Attempting to delete Athena WorkGroup {}", current.name);
    api.delete_work_group(&current.name, true).await
}
