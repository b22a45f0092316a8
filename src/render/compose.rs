use std::collections::BTreeMap;

use bollard::models::ContainerInspectResponse;
use serde::Serialize;

use super::{
    container_name, custom_hostname, mount_read_only, mount_source, port_mappings, restart_value,
    user_env,
};
use crate::error::Result;

const COMPOSE_VERSION: &str = "3";

// ======================================================
// DOCUMENT MODEL
// ======================================================

#[derive(Debug, Serialize)]
struct ComposeDocument {
    version: &'static str,
    services: BTreeMap<String, Service>,
}

/// One service block. Field order is the emitted key order.
#[derive(Debug, Default, Serialize)]
struct Service {
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    command: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    environment: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    working_dir: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    entrypoint: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    privileged: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    restart: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    cap_add: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    cap_drop: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    oom_score_adj: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    userns_mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    ipc: Option<String>,
}

// ======================================================
// RENDER
// ======================================================

/// One compose document per record, keyed by container name.
pub fn render_all(records: &[ContainerInspectResponse]) -> Result<BTreeMap<String, String>> {
    let mut manifests = BTreeMap::new();

    for record in records {
        let name = container_name(record).to_string();
        let document = ComposeDocument {
            version: COMPOSE_VERSION,
            services: BTreeMap::from([(name.clone(), build_service(record))]),
        };

        manifests.insert(name, serde_yaml::to_string(&document)?);
    }

    Ok(manifests)
}

fn build_service(record: &ContainerInspectResponse) -> Service {
    let config = record.config.clone().unwrap_or_default();
    let host = record.host_config.clone().unwrap_or_default();

    let volumes = record
        .mounts
        .iter()
        .flatten()
        .map(|m| {
            let entry = format!("{}:{}", mount_source(m), m.destination.as_deref().unwrap_or_default());
            if mount_read_only(m) {
                entry + ":ro"
            } else {
                entry
            }
        })
        .collect();

    Service {
        image: config.image.filter(|i| !i.is_empty()),
        command: config.cmd.unwrap_or_default(),
        environment: user_env(record).cloned().collect(),
        working_dir: config.working_dir.filter(|w| !w.is_empty()),
        entrypoint: config.entrypoint.unwrap_or_default(),
        hostname: custom_hostname(record).map(str::to_string),
        user: config.user.filter(|u| !u.is_empty()),
        privileged: host.privileged.unwrap_or(false),
        restart: restart_value(record),
        ports: port_mappings(record),
        volumes,
        cap_add: host.cap_add.unwrap_or_default(),
        cap_drop: host.cap_drop.unwrap_or_default(),
        oom_score_adj: host.oom_score_adj.filter(|s| *s != 0),
        userns_mode: host.userns_mode.filter(|m| !m.is_empty()),
        ipc: host.ipc_mode.filter(|m| !m.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::fake::record;
    use serde_json::json;

    const ID: &str = "c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00";

    fn parse(doc: &str) -> serde_yaml::Value {
        serde_yaml::from_str(doc).unwrap()
    }

    #[test]
    fn one_document_per_container() {
        let records = vec![
            record(ID, "web", json!({})),
            record("deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef", "db", json!({})),
        ];

        let manifests = render_all(&records).unwrap();

        assert_eq!(manifests.keys().collect::<Vec<_>>(), vec!["db", "web"]);

        let web = parse(&manifests["web"]);
        assert_eq!(web["version"], serde_yaml::Value::from("3"));
        assert_eq!(web["services"]["web"]["image"], serde_yaml::Value::from("nginx:latest"));
        assert!(web["services"].get("db").is_none());
    }

    #[test]
    fn no_mounts_means_no_volumes_key() {
        let manifests = render_all(&[record(ID, "web", json!({ "Mounts": [] }))]).unwrap();

        assert!(!manifests["web"].contains("volumes:"));
    }

    #[test]
    fn mounts_become_volume_entries() {
        let rec = record(
            ID,
            "web",
            json!({ "Mounts": [
                { "Type": "bind", "Source": "/srv/html", "Destination": "/usr/share/nginx/html" },
                { "Type": "volume", "Name": "logs", "Source": "/var/lib/docker/volumes/logs/_data", "Destination": "/var/log/nginx" }
            ] }),
        );

        let manifests = render_all(&[rec]).unwrap();
        let doc = parse(&manifests["web"]);
        let volumes = doc["services"]["web"]["volumes"].as_sequence().unwrap();

        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[0], serde_yaml::Value::from("/srv/html:/usr/share/nginx/html"));
        assert_eq!(
            volumes[1],
            serde_yaml::Value::from("logs:/var/log/nginx")
        );
    }

    #[test]
    fn read_only_mounts_get_ro_suffix() {
        let rec = record(
            ID,
            "web",
            json!({ "Mounts": [
                { "Type": "bind", "Source": "/srv/html", "Destination": "/usr/share/nginx/html", "RW": false },
                { "Type": "volume", "Name": "certs", "Source": "/var/lib/docker/volumes/certs/_data", "Destination": "/etc/ssl", "RW": false },
                { "Type": "bind", "Source": "/srv/logs", "Destination": "/var/log/nginx", "RW": true }
            ] }),
        );

        let manifests = render_all(&[rec]).unwrap();
        let doc = parse(&manifests["web"]);
        let volumes = &doc["services"]["web"]["volumes"];

        assert_eq!(volumes[0], serde_yaml::Value::from("/srv/html:/usr/share/nginx/html:ro"));
        assert_eq!(volumes[1], serde_yaml::Value::from("certs:/etc/ssl:ro"));
        assert_eq!(volumes[2], serde_yaml::Value::from("/srv/logs:/var/log/nginx"));
    }

    #[test]
    fn restart_keeps_retry_limit() {
        let rec = record(
            ID,
            "web",
            json!({ "HostConfig": { "RestartPolicy": { "Name": "on-failure", "MaximumRetryCount": 3 } } }),
        );

        let manifests = render_all(&[rec]).unwrap();
        let doc = parse(&manifests["web"]);

        assert_eq!(doc["services"]["web"]["restart"], serde_yaml::Value::from("on-failure:3"));
    }

    #[test]
    fn keys_follow_fixed_order() {
        let rec = record(
            ID,
            "app",
            json!({
                "Config": {
                    "Hostname": "app-host",
                    "User": "app",
                    "WorkingDir": "/srv",
                    "Entrypoint": ["/entrypoint.sh"],
                    "Env": ["MODE=prod"],
                    "Cmd": ["serve"]
                },
                "HostConfig": {
                    "Privileged": true,
                    "RestartPolicy": { "Name": "unless-stopped" },
                    "CapAdd": ["NET_ADMIN"],
                    "CapDrop": ["MKNOD"],
                    "OomScoreAdj": 100,
                    "UsernsMode": "host",
                    "IpcMode": "shareable"
                },
                "NetworkSettings": { "Ports": { "80/tcp": [{ "HostIp": "0.0.0.0", "HostPort": "8080" }] } },
                "Mounts": [{ "Type": "bind", "Source": "/data", "Destination": "/data" }]
            }),
        );

        let manifests = render_all(&[rec]).unwrap();
        let doc = &manifests["app"];

        let keys = [
            "image:", "command:", "environment:", "working_dir:", "entrypoint:", "hostname:",
            "user:", "privileged:", "restart:", "ports:", "volumes:", "cap_add:", "cap_drop:",
            "oom_score_adj:", "userns_mode:", "ipc:",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| doc.find(&format!("    {}", k)).unwrap_or_else(|| panic!("{k} missing:\n{doc}")))
            .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "out of order:\n{doc}");

        let parsed = parse(doc);
        let app = &parsed["services"]["app"];
        assert_eq!(app["restart"], serde_yaml::Value::from("unless-stopped"));
        assert_eq!(app["ports"][0], serde_yaml::Value::from("8080:80"));
        assert_eq!(app["privileged"], serde_yaml::Value::from(true));
        assert_eq!(app["oom_score_adj"], serde_yaml::Value::from(100));
    }

    #[test]
    fn defaults_are_omitted() {
        let rec = record(
            ID,
            "web",
            json!({ "HostConfig": { "RestartPolicy": { "Name": "no" }, "Privileged": false } }),
        );

        let manifests = render_all(&[rec]).unwrap();
        let doc = &manifests["web"];

        for key in ["restart:", "privileged:", "hostname:", "environment:", "ports:", "ipc:"] {
            assert!(!doc.contains(key), "{key} should be omitted:\n{doc}");
        }
    }
}
