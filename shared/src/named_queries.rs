use crate::athena::{debug_payload, AthenaApi, CreateNamedQueryRequest, NamedQueryDetails};
use crate::changes::Tracked;
use crate::error::{ResourceError, Result};
use crate::types::{Lifecycle, NamedQueryProperties, Outcome, ResourceContext};

/// Athena files queries without an explicit workgroup under this one.
pub const DEFAULT_WORK_GROUP: &str = "primary";

/// Per-field view of an update, built once from old and new properties.
#[derive(Debug, Clone)]
pub struct NamedQueryChanges {
    pub name: Tracked<String>,
    pub database: Tracked<String>,
    pub query_string: Tracked<String>,
    pub description: Tracked<Option<String>>,
    pub work_group: Tracked<Option<String>>,
}

impl NamedQueryChanges {
    pub fn new(desired: &NamedQueryProperties, previous: &NamedQueryProperties) -> Self {
        Self {
            name: Tracked::new(desired.name.clone(), Some(previous.name.clone())),
            database: Tracked::new(desired.database.clone(), Some(previous.database.clone())),
            query_string: Tracked::new(
                desired.query_string.clone(),
                Some(previous.query_string.clone()),
            ),
            description: Tracked::new(
                desired.description.clone(),
                Some(previous.description.clone()),
            ),
            work_group: Tracked::new(desired.work_group.clone(), Some(previous.work_group.clone())),
        }
    }

    pub fn any_changed(&self) -> bool {
        self.name.changed
            || self.database.changed
            || self.query_string.changed
            || self.description.changed
            || self.work_group.changed
    }
}

/// Run one lifecycle event against a NamedQuery.
///
/// Athena cannot update a named query, so Update creates the new query
/// before deleting the old one. If the invocation dies in between, the
/// old query is left behind.
pub async fn handle(
    api: &dyn AthenaApi,
    ctx: &ResourceContext,
    lifecycle: Lifecycle<NamedQueryProperties>,
) -> Result<Outcome> {
    let outcome = Outcome::new(ctx.logical_resource_id.clone());

    match lifecycle {
        Lifecycle::Create { desired } => {
            let id = create_query(api, &desired).await?;
            Ok(outcome.with_attribute("id", id))
        }
        Lifecycle::Update {
            desired, previous, ..
        } => {
            let changes = NamedQueryChanges::new(&desired, &previous);
            if !changes.any_changed() {
                tracing::info!(
                    "No changes detected for NamedQuery {}. Not attempting any update",
                    desired.name
                );
                return Ok(outcome);
            }

            let old_query = find_named_query(api, &previous).await?;
            let id = create_query(api, &desired).await?;
            delete_query(api, &old_query.named_query_id).await?;
            Ok(outcome.with_attribute("id", id))
        }
        Lifecycle::Delete { current, .. } => {
            let query = find_named_query(api, &current).await?;
            delete_query(api, &query.named_query_id).await?;
            Ok(outcome.with_attribute("id", query.named_query_id))
        }
    }
}

async fn create_query(api: &dyn AthenaApi, desired: &NamedQueryProperties) -> Result<String> {
    tracing::info!("Attempting to create Athena NamedQuery {}", desired.name);

    let request = CreateNamedQueryRequest {
        name: desired.name.clone(),
        database: desired.database.clone(),
        query_string: desired.query_string.clone(),
        description: desired.description.clone(),
        work_group: desired.work_group.clone(),
    };

    debug_payload(&request);
    let id = api.create_named_query(&request).await?;
    tracing::info!("Created Athena NamedQuery {} with ID {}", desired.name, id);
    Ok(id)
}

async fn delete_query(api: &dyn AthenaApi, named_query_id: &str) -> Result<()> {
    tracing::info!("Attempting to delete Athena NamedQuery with ID {}", named_query_id);
    api.delete_named_query(named_query_id).await
}

/// Find a query by name within its workgroup.
///
/// Athena has no lookup by name, so every id in the workgroup is listed
/// (across all pages) and fetched until one matches.
pub async fn find_named_query(
    api: &dyn AthenaApi,
    props: &NamedQueryProperties,
) -> Result<NamedQueryDetails> {
    let search_work_group = props
        .work_group
        .as_deref()
        .unwrap_or(DEFAULT_WORK_GROUP);

    let not_found = || ResourceError::NamedQueryNotFound {
        work_group: search_work_group.to_string(),
        name: props.name.clone(),
    };

    let ids = list_work_group_queries(api, props.work_group.as_deref()).await?;
    if ids.is_empty() {
        tracing::info!("Didn't find any queries in workgroup {}", search_work_group);
        return Err(not_found());
    }

    for id in ids {
        let details = api.get_named_query(&id).await?;
        let work_group = details.work_group.as_deref().unwrap_or(DEFAULT_WORK_GROUP);
        if details.name == props.name && work_group == search_work_group {
            tracing::debug!("Found NamedQuery {} with ID {}", props.name, details.named_query_id);
            return Ok(details);
        }
    }

    Err(not_found())
}

async fn list_work_group_queries(
    api: &dyn AthenaApi,
    work_group: Option<&str>,
) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = api
            .list_named_queries(work_group, next_token.as_deref())
            .await?;
        ids.extend(page.named_query_ids);

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!("Listed {} named queries", ids.len());
    Ok(ids)
}
