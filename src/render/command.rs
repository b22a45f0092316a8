use std::collections::BTreeMap;

use bollard::models::ContainerInspectResponse;

use super::{
    container_name, custom_hostname, mount_read_only, mount_source, mount_type, port_mappings,
    restart_value, user_env,
};

/// Command form for every record, separated by blank lines.
pub fn render_all(records: &[ContainerInspectResponse], pretty: bool) -> String {
    records
        .iter()
        .map(|record| render_one(record, pretty))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Reconstructs the `docker run` invocation for one container.
///
/// The result is a three-line comment preamble followed by the command,
/// either on one line or split with backslash continuations.
pub fn render_one(record: &ContainerInspectResponse, pretty: bool) -> String {
    let name = container_name(record);
    let created = record
        .created
        .as_ref()
        .map(|c| c.to_string())
        .unwrap_or_default();
    let description = record
        .config
        .as_ref()
        .and_then(|c| c.labels.as_ref())
        .and_then(|labels| labels.get("description"))
        .map(String::as_str)
        .unwrap_or_default();

    let mut out = String::new();
    push_comment(&mut out, "Container name", name);
    push_comment(&mut out, "Created at", &created);
    push_comment(&mut out, "Description", description);

    let separator = if pretty { " \\\n  " } else { " " };
    out.push_str(&run_arguments(record).join(separator));

    out
}

/// Appends `# label: value`. Every line break in the value starts a new
/// `# ` line so label text can never escape the comment.
fn push_comment(out: &mut String, label: &str, value: &str) {
    let mut lines = value.split(['\n', '\r']).filter(|line| !line.is_empty());

    out.push_str(&format!("# {}: {}\n", label, lines.next().unwrap_or_default()));
    for line in lines {
        out.push_str(&format!("#   {}\n", line));
    }
}

// ======================================================
// ARGUMENT BUILDER
// ======================================================

/// Argument list under construction. Each entry is one continuation line
/// in pretty mode, so flags stay next to their values.
struct RunArgs(Vec<String>);

impl RunArgs {
    fn flag(&mut self, name: &str, value: &str) {
        self.0.push(format!("{} {}", name, quote(value)));
    }

    fn assign(&mut self, name: &str, value: impl std::fmt::Display) {
        self.0.push(format!("{}={}", name, value));
    }

    fn switch(&mut self, name: &str) {
        self.0.push(name.to_string());
    }
}

/// `docker run` arguments in their fixed order.
fn run_arguments(record: &ContainerInspectResponse) -> Vec<String> {
    let config = record.config.clone().unwrap_or_default();
    let host = record.host_config.clone().unwrap_or_default();

    let mut args = RunArgs(vec!["docker run -d".to_string()]);

    args.flag("--name", container_name(record));

    if let Some(hostname) = custom_hostname(record) {
        args.flag("--hostname", hostname);
    }

    if let Some(policy) = restart_value(record) {
        args.flag("--restart", &policy);
    }

    if let Some(user) = non_empty(&config.user) {
        args.flag("--user", user);
    }

    if let Some(workdir) = non_empty(&config.working_dir) {
        args.flag("--workdir", workdir);
    }

    // --entrypoint takes a single executable; the remaining entrypoint
    // arguments go in front of the command after the image.
    let entrypoint = config.entrypoint.clone().unwrap_or_default();
    if let Some(executable) = entrypoint.first() {
        args.flag("--entrypoint", executable);
    }

    for env in user_env(record) {
        args.flag("-e", env);
    }

    for extra_host in host.extra_hosts.iter().flatten() {
        args.flag("--add-host", extra_host);
    }

    if host.privileged == Some(true) {
        args.switch("--privileged");
    }

    for cap in host.cap_add.iter().flatten() {
        args.flag("--cap-add", cap);
    }
    for cap in host.cap_drop.iter().flatten() {
        args.flag("--cap-drop", cap);
    }

    if host.readonly_rootfs == Some(true) {
        args.switch("--read-only");
    }

    if let Some(score) = host.oom_score_adj.filter(|s| *s != 0) {
        args.assign("--oom-score-adj", score);
    }

    if let Some(mode) = non_empty(&host.userns_mode) {
        args.assign("--userns", quote(mode));
    }

    if let Some(mode) = non_empty(&host.pid_mode) {
        args.flag("--pid", mode);
    }

    for link in host.links.iter().flatten() {
        args.flag("--link", &format_link(link));
    }

    if let Some(nano) = host.nano_cpus.filter(|n| *n > 0) {
        args.assign("--cpus", format!("{:.2}", nano as f64 / 1e9));
    }

    if let Some(shares) = host.cpu_shares.filter(|s| *s > 0) {
        args.assign("--cpu-shares", shares);
    }

    if let Some(cpus) = non_empty(&host.cpuset_cpus) {
        args.flag("--cpuset-cpus", cpus);
    }

    if let Some(memory) = host.memory.filter(|m| *m > 0) {
        args.assign("--memory", memory);
    }

    if let Some(mode) = non_empty(&host.network_mode).filter(|m| *m != "default") {
        args.flag("--network", mode);
    }

    for dns in host.dns.iter().flatten() {
        args.flag("--dns", dns);
    }

    for mapping in port_mappings(record) {
        args.flag("-p", &mapping);
    }

    for mount in record.mounts.iter().flatten() {
        let source = mount_source(mount);
        let destination = mount.destination.as_deref().unwrap_or_default();
        let kind = mount_type(mount);
        let read_only = mount_read_only(mount);

        if kind == "bind" {
            let suffix = if read_only { ":ro" } else { "" };
            args.flag("-v", &format!("{}:{}{}", source, destination, suffix));
        } else {
            let suffix = if read_only { ",readonly" } else { "" };
            args.flag(
                "--mount",
                &format!("type={},source={},target={}{}", kind, source, destination, suffix),
            );
        }
    }

    for device in host.devices.iter().flatten() {
        let mapping = format!(
            "{}:{}",
            device.path_on_host.as_deref().unwrap_or_default(),
            device.path_in_container.as_deref().unwrap_or_default()
        );
        args.flag("--device", &mapping);
    }

    let labels: BTreeMap<_, _> = config.labels.iter().flatten().collect();
    for (key, value) in labels {
        args.flag("--label", &format!("{}={}", key, value));
    }

    if let Some(log) = &host.log_config {
        if let Some(driver) = non_empty(&log.typ).filter(|d| *d != "json-file") {
            args.flag("--log-driver", driver);
        }

        let options: BTreeMap<_, _> = log.config.iter().flatten().collect();
        for (key, value) in options {
            args.flag("--log-opt", &format!("{}={}", key, value));
        }
    }

    let mut args = args.0;

    args.push(quote(config.image.as_deref().unwrap_or_default()));

    let trailing: Vec<String> = entrypoint
        .iter()
        .skip(1)
        .chain(config.cmd.iter().flatten())
        .map(|arg| quote(arg))
        .collect();
    if !trailing.is_empty() {
        args.push(trailing.join(" "));
    }

    args
}

/// `/source:/self/alias` as stored by the engine becomes `source:alias`.
fn format_link(link: &str) -> String {
    let mut parts = link.splitn(2, ':');
    let source = parts.next().unwrap_or_default().trim_start_matches('/');

    match parts.next() {
        Some(target) => {
            let alias = target.rsplit('/').next().unwrap_or(target);
            format!("{}:{}", source, alias)
        }
        None => source.to_string(),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// ======================================================
// SHELL QUOTING
// ======================================================

/// Quotes `value` for a POSIX shell when it contains anything beyond a
/// conservative set of safe characters.
pub fn quote(value: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "-_=./:,@%+".contains(c);

    if !value.is_empty() && value.chars().all(safe) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
