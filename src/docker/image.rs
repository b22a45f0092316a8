use bollard::models::{ImageInspect, ImageSummary};
use tracing::debug;

use crate::docker::client::ContainerEngine;
use crate::docker::list::format_timestamp;
use crate::error::{ExporterError, Result};

fn primary_tag(image: &ImageSummary) -> Option<&str> {
    image.repo_tags.first().map(String::as_str)
}

/// Images whose first repo tag contains any of `fragments`; all images when
/// no fragment is given. Untagged images only show up in the unfiltered list.
pub async fn find_images<E>(engine: &E, fragments: &[String]) -> Result<Vec<ImageSummary>>
where
    E: ContainerEngine + ?Sized,
{
    let images = engine.list_images().await?;

    if fragments.is_empty() {
        return Ok(images);
    }

    Ok(images
        .into_iter()
        .filter(|image| {
            primary_tag(image).is_some_and(|tag| fragments.iter().any(|f| tag.contains(f.as_str())))
        })
        .collect())
}

/// Resolves `name` to a full image record.
///
/// Direct inspection is tried first; when the engine rejects the reference,
/// the image listing is searched for an exact first-tag match.
pub async fn inspect_image_by_name<E>(engine: &E, name: &str) -> Result<ImageInspect>
where
    E: ContainerEngine + ?Sized,
{
    match engine.inspect_image(name).await {
        Ok(image) => Ok(image),
        Err(err) => {
            debug!(name, error = %err, "direct image inspection failed, searching listing");

            let images = engine.list_images().await?;
            let found = images
                .iter()
                .find(|image| primary_tag(image) == Some(name))
                .ok_or_else(|| ExporterError::ImageNotFound(name.to_string()))?;

            engine.inspect_image(&found.id).await
        }
    }
}

/// Formats the image table, header first.
pub fn format_images(images: &[ImageSummary], pretty: bool) -> Vec<String> {
    let id_width = if pretty { 12 } else { 20 };

    let row = |id: &str, tag: &str, created: &str, size: &str| {
        format!("{:<id_width$} {:<40} {:<20} {}", id, tag, created, size)
            .trim_end()
            .to_string()
    };

    let mut lines = vec![row("IMAGE ID", "REPOSITORY:TAG", "CREATED", "SIZE")];

    for image in images {
        let id = image.id.strip_prefix("sha256:").unwrap_or(&image.id);
        let id: String = if pretty {
            id.chars().take(12).collect()
        } else {
            id.to_string()
        };

        let tag = primary_tag(image).unwrap_or("<none>:<none>");
        let size = if pretty {
            human_size(image.size)
        } else {
            image.size.to_string()
        };

        lines.push(row(&id, tag, &format_timestamp(image.created), &size));
    }

    lines
}

fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "kB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{}{}", bytes, UNITS[0])
    } else {
        format!("{:.1}{}", value, UNITS[unit])
    }
}
