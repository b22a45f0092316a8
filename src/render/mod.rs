pub mod command;
pub mod compose;
pub mod json;

use std::collections::BTreeMap;

use bollard::models::{ContainerInspectResponse, PortMap};
use clap::ValueEnum;

use crate::error::Result;

// ======================================================
// FORMAT
// ======================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Shell script of `docker run` commands
    #[value(alias = "shell", alias = "sh")]
    Command,
    /// One compose file per container
    #[value(alias = "yaml", alias = "yml")]
    Compose,
    /// Raw inspection records
    Json,
}

impl Format {
    /// Extension of the single dump file written for text formats.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Command => "sh",
            Format::Compose => "yml",
            Format::Json => "json",
        }
    }
}

// ======================================================
// RENDERED OUTPUT
// ======================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// JSON or command form: one blob covering every container.
    Text(String),
    /// Compose form: one document per service, keyed by service name.
    Manifests(BTreeMap<String, String>),
}

/// Renders the records in `format`. Pure: no engine access.
pub fn render(records: &[ContainerInspectResponse], format: Format, pretty: bool) -> Result<Rendered> {
    match format {
        Format::Command => Ok(Rendered::Text(command::render_all(records, pretty))),
        Format::Compose => Ok(Rendered::Manifests(compose::render_all(records)?)),
        Format::Json => Ok(Rendered::Text(json::render_all(records, pretty)?)),
    }
}

// ======================================================
// SHARED FIELD HELPERS
// ======================================================

pub(crate) const DEFAULT_PATH_ENV: &str =
    "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Container name without the engine's leading slash.
pub(crate) fn container_name(record: &ContainerInspectResponse) -> &str {
    let name = record.name.as_deref().unwrap_or_default();
    name.strip_prefix('/').unwrap_or(name)
}

/// Hostname, unless it is the engine-assigned short container ID.
pub(crate) fn custom_hostname(record: &ContainerInspectResponse) -> Option<&str> {
    let hostname = record.config.as_ref()?.hostname.as_deref()?;
    let id = record.id.as_deref().unwrap_or_default();
    let short_id = id.get(..12).unwrap_or(id);

    if hostname.is_empty() || hostname == short_id {
        None
    } else {
        Some(hostname)
    }
}

/// Restart policy name and retry count, `None` for empty or `no`.
fn restart_policy(record: &ContainerInspectResponse) -> Option<(String, i64)> {
    let policy = record.host_config.as_ref()?.restart_policy.as_ref()?;
    let name = policy.name.as_ref()?.to_string();

    if name.is_empty() || name == "no" {
        return None;
    }

    Some((name, policy.maximum_retry_count.unwrap_or(0)))
}

/// Restart value as `docker run --restart` and compose `restart:` accept it.
/// `on-failure` with a retry limit becomes `on-failure:N`.
pub(crate) fn restart_value(record: &ContainerInspectResponse) -> Option<String> {
    let (name, retries) = restart_policy(record)?;

    if name == "on-failure" && retries > 0 {
        Some(format!("{}:{}", name, retries))
    } else {
        Some(name)
    }
}

/// Environment entries, minus the stock PATH every image inherits.
pub(crate) fn user_env(record: &ContainerInspectResponse) -> impl Iterator<Item = &String> {
    record
        .config
        .as_ref()
        .and_then(|c| c.env.as_ref())
        .into_iter()
        .flatten()
        .filter(|env| env.as_str() != DEFAULT_PATH_ENV)
}

/// Published ports as `[hostip:]hostport:containerport[/proto]`.
///
/// Ordered by container port then protocol, duplicates removed. Wildcard
/// host addresses are dropped, which is what collapses the IPv4 and IPv6
/// bindings Docker reports for one published port.
pub(crate) fn port_mappings(record: &ContainerInspectResponse) -> Vec<String> {
    let Some(ports) = record.network_settings.as_ref().and_then(|n| n.ports.as_ref()) else {
        return Vec::new();
    };

    let mut mappings = Vec::new();

    for (port, bindings) in sorted_ports(ports) {
        let (number, protocol) = port.split_once('/').unwrap_or((port, "tcp"));
        let container_port = if protocol == "tcp" {
            number.to_string()
        } else {
            format!("{}/{}", number, protocol)
        };

        for binding in bindings.iter().flatten() {
            let host_port = binding.host_port.as_deref().unwrap_or_default();
            let mapping = match binding.host_ip.as_deref() {
                None | Some("") | Some("0.0.0.0") | Some("::") => {
                    format!("{}:{}", host_port, container_port)
                }
                Some(ip) => format!("{}:{}:{}", ip, host_port, container_port),
            };

            if !mappings.contains(&mapping) {
                mappings.push(mapping);
            }
        }
    }

    mappings
}

fn sorted_ports(ports: &PortMap) -> Vec<(&str, &Option<Vec<bollard::models::PortBinding>>)> {
    let mut entries: Vec<_> = ports.iter().map(|(k, v)| (k.as_str(), v)).collect();

    entries.sort_by_key(|(key, _)| {
        let (number, protocol) = key.split_once('/').unwrap_or((*key, "tcp"));
        (number.parse::<u32>().unwrap_or(u32::MAX), protocol.to_string())
    });

    entries
}

/// Mount type as the engine reports it (`bind`, `volume`, `tmpfs`, ...).
pub(crate) fn mount_type(mount: &bollard::models::MountPoint) -> String {
    mount.typ.as_ref().map(|t| t.to_string()).unwrap_or_default()
}

/// Source to hand back to the engine: named volumes by name, everything
/// else by host path.
pub(crate) fn mount_source(mount: &bollard::models::MountPoint) -> &str {
    let name = mount.name.as_deref().filter(|n| !n.is_empty());

    match name {
        Some(name) if mount_type(mount) != "bind" => name,
        _ => mount.source.as_deref().unwrap_or_default(),
    }
}

pub(crate) fn mount_read_only(mount: &bollard::models::MountPoint) -> bool {
    mount.rw == Some(false)
}
