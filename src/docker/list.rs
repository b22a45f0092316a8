use bollard::models::ContainerSummary;
use chrono::{Local, TimeZone};
use tracing::debug;

use crate::docker::client::ContainerEngine;
use crate::error::Result;

// ======================================================
// SELECTION
// ======================================================

/// Lists the containers matching `fragments`.
///
/// With no fragments this is a plain listing, honouring `include_stopped`.
/// Otherwise every container (stopped ones included) is considered and kept
/// when its ID starts with a fragment or its first name contains one. A
/// container matching several fragments is returned once, in listing order.
pub async fn select<E>(
    engine: &E,
    fragments: &[String],
    include_stopped: bool,
) -> Result<Vec<ContainerSummary>>
where
    E: ContainerEngine + ?Sized,
{
    if fragments.is_empty() {
        let containers = engine.list_containers(include_stopped).await?;
        debug!(count = containers.len(), include_stopped, "listed containers");
        return Ok(containers);
    }

    let containers = engine.list_containers(true).await?;
    let total = containers.len();

    let selected: Vec<ContainerSummary> = containers
        .into_iter()
        .filter(|c| fragments.iter().any(|f| matches_fragment(c, f)))
        .collect();

    debug!(total, selected = selected.len(), ?fragments, "filtered containers");

    Ok(selected)
}

fn matches_fragment(container: &ContainerSummary, fragment: &str) -> bool {
    let id_match = container
        .id
        .as_deref()
        .is_some_and(|id| id.starts_with(fragment));

    let name_match = primary_name(container).is_some_and(|name| name.contains(fragment));

    id_match || name_match
}

fn primary_name(container: &ContainerSummary) -> Option<&str> {
    container
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(String::as_str)
}

// ======================================================
// TABLE
// ======================================================

/// Formats the container table, header first.
pub fn format_containers(containers: &[ContainerSummary], pretty: bool) -> Vec<String> {
    let id_width = if pretty { 12 } else { 20 };

    let mut lines = vec![format_row(
        id_width,
        "CONTAINER ID",
        "NAMES",
        "CREATED",
        "STATUS",
        "IMAGE",
    )];

    for container in containers {
        let id = container.id.as_deref().unwrap_or_default();
        let id = id.strip_prefix("sha256:").unwrap_or(id);
        let id: String = if pretty {
            id.chars().take(12).collect()
        } else {
            id.to_string()
        };

        let name = primary_name(container).unwrap_or_default();
        let name = name.strip_prefix('/').unwrap_or(name);

        let created = container
            .created
            .map(format_timestamp)
            .unwrap_or_default();

        let state = container.state.as_ref().map(ToString::to_string).unwrap_or_default();
        let image = container.image.as_deref().unwrap_or_default();

        lines.push(format_row(id_width, &id, name, &created, &state, image));
    }

    lines
}

fn format_row(
    id_width: usize,
    id: &str,
    name: &str,
    created: &str,
    status: &str,
    image: &str,
) -> String {
    format!(
        "{:<id_width$} {:<15} {:<20} {:<10} {}",
        id, name, created, status, image
    )
    .trim_end()
    .to_string()
}

/// Unix seconds rendered as local `YYYY-MM-DDTHH:MM:SS`.
pub fn format_timestamp(seconds: i64) -> String {
    Local
        .timestamp_opt(seconds, 0)
        .single()
        .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}
