use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::image::ListImagesOptions;
use bollard::models::{ContainerInspectResponse, ContainerSummary, ImageInspect, ImageSummary};
use bollard::{ClientVersion, Docker};
use tracing::debug;

use crate::error::{ExporterError, Result};

/// Seconds bollard waits on a single request before giving up.
const REQUEST_TIMEOUT: u64 = 120;

// ======================================================
// ENGINE TRAIT
// ======================================================

/// The four engine calls the exporter consumes.
///
/// Commands receive the engine by reference instead of reaching for a
/// shared global client, which also lets tests swap in an in-memory fake.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>>;

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse>;

    async fn list_images(&self) -> Result<Vec<ImageSummary>>;

    async fn inspect_image(&self, name_or_id: &str) -> Result<ImageInspect>;
}

// ======================================================
// DOCKER IMPLEMENTATION
// ======================================================

pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Builds a client for `host` speaking API version `client_version`.
    ///
    /// `unix://` addresses and bare paths use the socket connector,
    /// everything else goes through the HTTP connector.
    pub fn connect(host: &str, client_version: &str) -> Result<Self> {
        let version = parse_client_version(client_version)?;

        let docker = if is_unix_host(host) {
            Docker::connect_with_unix(host, REQUEST_TIMEOUT, &version)
        } else {
            Docker::connect_with_http(host, REQUEST_TIMEOUT, &version)
        }
        .map_err(|source| ExporterError::Connect {
            host: host.to_string(),
            source,
        })?;

        debug!(host, client_version, "Docker client ready");

        Ok(DockerEngine { docker })
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        let options = Some(ListContainersOptions::<String> {
            all,
            ..Default::default()
        });

        Ok(self.docker.list_containers(options).await?)
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse> {
        Ok(self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?)
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        let options = Some(ListImagesOptions::<String> {
            all: true,
            ..Default::default()
        });

        Ok(self.docker.list_images(options).await?)
    }

    async fn inspect_image(&self, name_or_id: &str) -> Result<ImageInspect> {
        Ok(self.docker.inspect_image(name_or_id).await?)
    }
}

// ======================================================
// HELPERS
// ======================================================

fn is_unix_host(host: &str) -> bool {
    host.starts_with("unix://") || host.starts_with('/')
}

pub fn parse_client_version(raw: &str) -> Result<ClientVersion> {
    let invalid = || ExporterError::InvalidClientVersion(raw.to_string());

    let (major, minor) = raw.trim().split_once('.').ok_or_else(invalid)?;

    Ok(ClientVersion {
        major_version: major.parse().map_err(|_| invalid())?,
        minor_version: minor.parse().map_err(|_| invalid())?,
    })
}
