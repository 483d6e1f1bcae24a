//! Compose document rendering.
//!
//! Rendering is a pure function of the [`ResolvedConfig`]: the same input
//! always yields byte-identical text.

use std::fmt::Write as _;

use crate::resolver::{ResolvedConfig, SERVICE_DATA_PATHS, service_data_dir};

/// Compose file format version written at the top of the document.
pub const COMPOSE_VERSION: &str = "3.7";

/// One service block.
#[derive(Debug, Default)]
struct Service {
    name: &'static str,
    image: String,
    command: Option<&'static str>,
    depends_on: Vec<&'static str>,
    ports: Vec<String>,
    extra_hosts: Vec<String>,
    environment: Vec<String>,
    volumes: Vec<String>,
}

/// Renders the compose document.
#[must_use]
pub fn render_compose_text(config: &ResolvedConfig) -> String {
    tracing::debug!(project = %config.project_name, "rendering compose file");

    let mut out = String::new();
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "# Managed by appstack. Local edits are overwritten.");
    let _ = writeln!(out, "version: {}", quote(COMPOSE_VERSION));
    let _ = writeln!(out, "services:");
    for service in services(config) {
        write_service(&mut out, &service);
    }

    if config.data_dir.is_none() {
        let _ = writeln!(out, "volumes:");
        for (name, _) in SERVICE_DATA_PATHS {
            let _ = writeln!(out, "  {}: {{}}", named_volume(name));
        }
    }
    out
}

fn services(config: &ResolvedConfig) -> Vec<Service> {
    let backend = Service {
        name: "data_entitlement",
        image: config.images.data_entitlement.to_string(),
        depends_on: vec!["redis", "elasticsearch", "minio"],
        ports: config.backend_ports.clone(),
        extra_hosts: config
            .extra_hosts
            .iter()
            .map(|(host, ip)| format!("{host}:{ip}"))
            .collect(),
        environment: config.backend_env.iter().map(|v| v.assignment()).collect(),
        volumes: config.backend_mounts.clone(),
        ..Service::default()
    };
    let ui = Service {
        name: "ui",
        image: config.images.ui.to_string(),
        depends_on: vec!["data_entitlement", "ui_frontend"],
        ports: config.ui_ports.clone(),
        volumes: config.ui_mounts(),
        ..Service::default()
    };
    let frontend = Service {
        name: "ui_frontend",
        image: config.images.frontend.to_string(),
        environment: config.frontend_env.iter().map(|v| v.assignment()).collect(),
        ..Service::default()
    };
    let redis = Service {
        name: "redis",
        image: config.images.redis.to_string(),
        volumes: vec![data_volume(config, "redis")],
        ..Service::default()
    };
    let elasticsearch = Service {
        name: "elasticsearch",
        image: config.images.elasticsearch.to_string(),
        environment: vec!["discovery.type=single-node".into()],
        volumes: vec![data_volume(config, "elasticsearch")],
        ..Service::default()
    };
    let minio = Service {
        name: "minio",
        image: config.images.minio.to_string(),
        command: Some("server /data"),
        volumes: vec![data_volume(config, "minio")],
        ..Service::default()
    };
    vec![backend, ui, frontend, redis, elasticsearch, minio]
}

fn write_service(out: &mut String, service: &Service) {
    let _ = writeln!(out, "  {}:", service.name);
    let _ = writeln!(out, "    image: {}", quote(&service.image));
    let _ = writeln!(out, "    restart: always");
    if let Some(command) = service.command {
        let _ = writeln!(out, "    command: {}", quote(command));
    }
    write_list(out, "depends_on", service.depends_on.iter().copied(), false);
    write_list(out, "ports", service.ports.iter().map(String::as_str), true);
    write_list(out, "extra_hosts", service.extra_hosts.iter().map(String::as_str), true);
    write_list(out, "environment", service.environment.iter().map(String::as_str), true);
    write_list(out, "volumes", service.volumes.iter().map(String::as_str), true);
}

/// Writes `key:` and its items, or nothing at all when there are no items.
fn write_list<'a>(out: &mut String, key: &str, items: impl Iterator<Item = &'a str>, quoted: bool) {
    let mut items = items.peekable();
    if items.peek().is_none() {
        return;
    }
    let _ = writeln!(out, "    {key}:");
    for item in items {
        if quoted {
            let _ = writeln!(out, "      - {}", quote(item));
        } else {
            let _ = writeln!(out, "      - {item}");
        }
    }
}

fn data_volume(config: &ResolvedConfig, service: &str) -> String {
    let container_path = SERVICE_DATA_PATHS
        .iter()
        .find(|(name, _)| *name == service)
        .map_or("/data", |(_, path)| *path);
    match &config.data_dir {
        Some(dir) => format!(
            "{}:{container_path}",
            service_data_dir(dir, service).display()
        ),
        None => format!("{}:{container_path}", named_volume(service)),
    }
}

fn named_volume(service: &str) -> String {
    format!("{service}-data")
}

/// Double-quotes a YAML scalar, escaping backslashes, quotes, and control
/// characters.
#[must_use]
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{:04x}", u32::from(c));
            }
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use appstack_common::config::DeploymentParams;

    use super::*;
    use crate::identity::PuppetIdentity;
    use crate::resolver::resolve;

    fn render(params: &DeploymentParams) -> String {
        let config =
            resolve(params, &PuppetIdentity::new("data_entitlement.example")).expect("resolve");
        render_compose_text(&config)
    }

    #[test]
    fn quote_escapes_specials() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("c:\\d"), "\"c:\\\\d\"");
    }

    #[test]
    fn quote_escapes_control_characters() {
        assert_eq!(quote("a\r\tb"), "\"a\\r\\tb\"");
        assert_eq!(quote("x\u{1}y"), "\"x\\u0001y\"");

        let raw = "evil.example\nx-injected: true\r\u{7}";
        let doc: serde_yaml::Value =
            serde_yaml::from_str(&format!("name: {}\n", quote(raw))).expect("valid yaml");
        assert_eq!(doc["name"].as_str(), Some(raw));
        assert!(doc.get("x-injected").is_none());
    }

    #[test]
    fn header_comment_carries_no_parameters() {
        let text = render(&DeploymentParams::new("data_entitlement.test.com"));
        let comment = text.lines().find(|l| l.starts_with('#')).expect("comment");
        assert!(!comment.contains("data_entitlement.test.com"));
    }

    #[test]
    fn defaults_render_named_volumes() {
        let text = render(&DeploymentParams::new("data_entitlement.test.com"));
        assert!(text.contains("volumes:\n  redis-data: {}\n"), "got:\n{text}");
        assert!(text.contains("- \"redis-data:/data\""));
        assert!(text.contains("- \"80:80\""));
        assert!(!text.contains("443:443"));
        assert!(!text.contains("extra_hosts:"));
    }

    #[test]
    fn data_dir_renders_bind_mounts() {
        let params = DeploymentParams {
            data_dir: Some("/opt/puppetlabs/data_entitlement/volumes".into()),
            ..DeploymentParams::new("data_entitlement.test.com")
        };
        let text = render(&params);
        assert!(text.contains(
            "- \"/opt/puppetlabs/data_entitlement/volumes/elasticsearch:/usr/share/elasticsearch/data\""
        ));
        assert!(!text.contains("redis-data"));
    }

    #[test]
    fn extra_hosts_are_sorted_and_quoted() {
        let mut params = DeploymentParams::new("data_entitlement.test.com");
        let _ = params.extra_hosts.insert("foo".into(), "127.0.0.1".into());
        let _ = params.extra_hosts.insert("bar".into(), "1.1.1.1".into());
        let text = render(&params);
        assert!(text.contains("    extra_hosts:\n      - \"bar:1.1.1.1\"\n      - \"foo:127.0.0.1\"\n"));
    }

    #[test]
    fn frontend_without_env_has_no_environment_key() {
        let text = render(&DeploymentParams::new("data_entitlement.test.com"));
        let frontend = text
            .split("  ui_frontend:\n")
            .nth(1)
            .and_then(|rest| rest.split("\n  redis:").next())
            .expect("frontend block");
        assert!(!frontend.contains("environment:"), "got:\n{frontend}");
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut params = DeploymentParams::new("data_entitlement.test.com");
        let _ = params.extra_hosts.insert("b".into(), "2.2.2.2".into());
        let _ = params.extra_hosts.insert("a".into(), "1.1.1.1".into());
        assert_eq!(render(&params), render(&params));
    }

    #[test]
    fn rendered_document_is_valid_yaml() {
        let params = DeploymentParams {
            ui_use_tls: true,
            ..DeploymentParams::new("data_entitlement.test.com")
        };
        let text = render(&params);
        let doc: serde_yaml::Value = serde_yaml::from_str(&text).expect("valid yaml");
        let services = doc.get("services").expect("services");
        for name in ["data_entitlement", "ui", "ui_frontend", "redis", "elasticsearch", "minio"] {
            assert!(services.get(name).is_some(), "missing service {name}");
        }
        let ports = services
            .get("ui")
            .and_then(|ui| ui.get("ports"))
            .and_then(serde_yaml::Value::as_sequence)
            .expect("ui ports");
        assert_eq!(ports.len(), 2);
    }
}
