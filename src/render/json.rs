use bollard::models::ContainerInspectResponse;
use serde::Serialize;

use crate::error::Result;

/// Serializes the full records without any field filtering.
pub fn render_all(records: &[ContainerInspectResponse], pretty: bool) -> Result<String> {
    to_json(records, pretty)
}

/// Shared by the container and image inspection commands.
pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    Ok(json)
}
