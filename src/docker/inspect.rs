use bollard::models::{ContainerInspectResponse, ContainerSummary};
use tracing::debug;

use crate::docker::client::ContainerEngine;
use crate::error::Result;

/// Fetches one configuration record per summary, in order.
///
/// Lookups run one at a time; the first failure aborts the batch.
pub async fn inspect_all<E>(
    engine: &E,
    containers: &[ContainerSummary],
) -> Result<Vec<ContainerInspectResponse>>
where
    E: ContainerEngine + ?Sized,
{
    let mut records = Vec::with_capacity(containers.len());

    for summary in containers {
        let id = summary.id.as_deref().unwrap_or_default();
        debug!(id, "inspecting container");
        records.push(engine.inspect_container(id).await?);
    }

    Ok(records)
}
