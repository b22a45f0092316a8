//! In-memory engine used by the unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bollard::models::{ContainerInspectResponse, ContainerSummary, ImageInspect, ImageSummary};
use serde_json::{json, Value};

use crate::docker::client::ContainerEngine;
use crate::error::{ExporterError, Result};

#[derive(Default)]
pub struct FakeEngine {
    pub containers: Vec<ContainerSummary>,
    pub records: Vec<ContainerInspectResponse>,
    pub images: Vec<ImageSummary>,
    pub image_records: Vec<ImageInspect>,
    /// Every `list_containers` call, recorded as its `all` flag.
    pub list_calls: Mutex<Vec<bool>>,
    pub inspect_calls: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn with_containers(containers: Vec<ContainerSummary>) -> Self {
        FakeEngine {
            containers,
            ..Default::default()
        }
    }
}

fn not_found(what: &str) -> ExporterError {
    ExporterError::Engine(bollard::errors::Error::DockerResponseServerError {
        status_code: 404,
        message: format!("No such object: {}", what),
    })
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        self.list_calls.lock().unwrap().push(all);

        Ok(self
            .containers
            .iter()
            .filter(|c| all || c.state.as_deref() == Some("running"))
            .cloned()
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse> {
        self.inspect_calls.lock().unwrap().push(id.to_string());

        self.records
            .iter()
            .find(|r| r.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        Ok(self.images.clone())
    }

    async fn inspect_image(&self, name_or_id: &str) -> Result<ImageInspect> {
        self.image_records
            .iter()
            .find(|i| i.id.as_deref() == Some(name_or_id))
            .cloned()
            .ok_or_else(|| not_found(name_or_id))
    }
}

pub fn summary(id: &str, name: &str, state: &str) -> ContainerSummary {
    serde_json::from_value(json!({
        "Id": id,
        "Names": [format!("/{}", name)],
        "Image": "nginx:latest",
        "Created": 1_700_000_000,
        "State": state,
    }))
    .unwrap()
}

/// Builds an inspection record from Docker API shaped JSON.
///
/// Objects in `overrides` are merged key by key into the matching base
/// section (`Config`, `HostConfig`, ...); anything else replaces it.
pub fn record(id: &str, name: &str, overrides: Value) -> ContainerInspectResponse {
    let mut base = json!({
        "Id": id,
        "Name": format!("/{}", name),
        "Created": "2024-05-01T10:00:00.000000000Z",
        "Config": {
            "Hostname": &id[..12.min(id.len())],
            "Image": "nginx:latest",
            "Env": ["PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"],
        },
        "HostConfig": {},
        "NetworkSettings": {},
        "Mounts": [],
    });

    if let (Some(base_map), Value::Object(extra)) = (base.as_object_mut(), overrides) {
        for (key, value) in extra {
            if let (Some(Value::Object(inner)), Value::Object(patch)) =
                (base_map.get_mut(&key), &value)
            {
                inner.extend(patch.clone());
                continue;
            }
            base_map.insert(key, value);
        }
    }

    serde_json::from_value(base).unwrap()
}

pub fn image_summary(id: &str, tag: &str) -> ImageSummary {
    serde_json::from_value(json!({
        "Id": id,
        "ParentId": "",
        "RepoTags": [tag],
        "RepoDigests": [],
        "Created": 1_700_000_000,
        "Size": 187_000_000,
        "SharedSize": -1,
        "VirtualSize": 187_000_000,
        "Labels": {},
        "Containers": -1,
    }))
    .unwrap()
}

pub fn image_record(id: &str, tag: &str) -> ImageInspect {
    serde_json::from_value(json!({
        "Id": id,
        "RepoTags": [tag],
        "Architecture": "amd64",
        "Os": "linux",
    }))
    .unwrap()
}
