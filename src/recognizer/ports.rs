//! Port extraction - deterministic extraction of port numbers from code and config files

use super::language::LanguageDefinition;
use crate::dockerfile::{DOCKERFILE_DIRS, DOCKERFILE_NAMES};
use crate::fs::FileSystem;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

fn push_port(ports: &mut BTreeSet<u16>, raw: &str) {
    if let Ok(port) = raw.parse::<u16>() {
        if port > 0 {
            ports.insert(port);
        }
    }
}

/// All ports declared for the component rooted at `dir`, sorted ascending.
pub fn detect_ports(
    fs: &dyn FileSystem,
    dir: &Path,
    languages: &[&dyn LanguageDefinition],
) -> Vec<u16> {
    let mut ports = BTreeSet::new();

    parse_expose(fs, dir, &mut ports);
    parse_env_ports(fs, dir, &mut ports);
    parse_yaml_ports(fs, dir, &mut ports);
    parse_properties_ports(fs, dir, &mut ports);
    parse_json_ports(fs, dir, &mut ports);
    parse_package_scripts(fs, dir, &mut ports);
    for language in languages {
        parse_code_patterns(fs, dir, *language, &mut ports);
    }

    ports.into_iter().collect()
}

/// `EXPOSE` directives of every Dockerfile/Containerfile the probe would find
pub fn parse_expose(fs: &dyn FileSystem, dir: &Path, ports: &mut BTreeSet<u16>) {
    static EXPOSE: OnceLock<Regex> = OnceLock::new();
    static PORT: OnceLock<Regex> = OnceLock::new();
    let expose_re = regex(&EXPOSE, r"(?mi)^\s*EXPOSE\s+(.+)$");
    let port_re = regex(&PORT, r"^(\d+)(?:/(?:tcp|udp))?$");

    let candidates = DOCKERFILE_NAMES.iter().map(|n| n.to_string()).chain(
        DOCKERFILE_DIRS
            .iter()
            .flat_map(|d| DOCKERFILE_NAMES.iter().map(move |n| format!("{}/{}", d, n))),
    );

    for candidate in candidates {
        let content = match fs.read_to_string(&dir.join(&candidate)) {
            Ok(content) => content,
            Err(_) => continue,
        };
        for cap in expose_re.captures_iter(&content) {
            for token in cap[1].split_whitespace() {
                if let Some(port) = port_re.captures(token) {
                    push_port(ports, &port[1]);
                }
            }
        }
    }
}

/// Port variables from .env files
pub fn parse_env_ports(fs: &dyn FileSystem, dir: &Path, ports: &mut BTreeSet<u16>) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let port_re = regex(&RE, r"(?m)^[A-Z_]*PORT[A-Z_]*=(\d+)");

    for env_file in &[".env", ".env.example", ".env.template", ".env.sample"] {
        if let Ok(content) = fs.read_to_string(&dir.join(env_file)) {
            for cap in port_re.captures_iter(&content) {
                push_port(ports, &cap[1]);
            }
        }
    }
}

/// `port:` keys of Spring/Quarkus/Micronaut style YAML configuration
pub fn parse_yaml_ports(fs: &dyn FileSystem, dir: &Path, ports: &mut BTreeSet<u16>) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let port_re = regex(&RE, r"(?m)^\s*port:\s*(\d+)");

    for config_file in &[
        "application.yml",
        "application.yaml",
        "src/main/resources/application.yml",
        "src/main/resources/application.yaml",
    ] {
        if let Ok(content) = fs.read_to_string(&dir.join(config_file)) {
            for cap in port_re.captures_iter(&content) {
                push_port(ports, &cap[1]);
            }
        }
    }
}

/// `server.port` / `quarkus.http.port` style properties
pub fn parse_properties_ports(fs: &dyn FileSystem, dir: &Path, ports: &mut BTreeSet<u16>) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let port_re = regex(&RE, r"(?m)^\s*[\w.\-]*port\s*[=:]\s*(\d+)\s*$");

    for config_file in &[
        "application.properties",
        "src/main/resources/application.properties",
    ] {
        if let Ok(content) = fs.read_to_string(&dir.join(config_file)) {
            for cap in port_re.captures_iter(&content) {
                push_port(ports, &cap[1]);
            }
        }
    }
}

/// Ports from JSON configuration files
pub fn parse_json_ports(fs: &dyn FileSystem, dir: &Path, ports: &mut BTreeSet<u16>) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let port_re = regex(&RE, r#""[Pp]ort"\s*:\s*(\d+)"#);

    for config_file in &["config.json", "config/default.json", "appsettings.json"] {
        if let Ok(content) = fs.read_to_string(&dir.join(config_file)) {
            for cap in port_re.captures_iter(&content) {
                push_port(ports, &cap[1]);
            }
        }
    }
}

/// `PORT=3000 node app.js` or `--port 8080` in package.json scripts
pub fn parse_package_scripts(fs: &dyn FileSystem, dir: &Path, ports: &mut BTreeSet<u16>) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let port_re = regex(&RE, r"(?:\bPORT=|--port[= ]|-p\s+)(\d+)");

    let content = match fs.read_to_string(&dir.join("package.json")) {
        Ok(content) => content,
        Err(_) => return,
    };
    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(_) => return,
    };
    let scripts = match value.get("scripts").and_then(|s| s.as_object()) {
        Some(scripts) => scripts,
        None => return,
    };

    for script in scripts.values().filter_map(|v| v.as_str()) {
        for cap in port_re.captures_iter(script) {
            push_port(ports, &cap[1]);
        }
    }
}

/// Language-specific patterns in source files at the component root and in `src/`
fn parse_code_patterns(
    fs: &dyn FileSystem,
    dir: &Path,
    language: &dyn LanguageDefinition,
    ports: &mut BTreeSet<u16>,
) {
    let patterns: Vec<Regex> = language
        .port_patterns()
        .iter()
        .filter_map(|(pattern, _)| Regex::new(pattern).ok())
        .collect();
    if patterns.is_empty() {
        return;
    }

    for scan_dir in [dir.to_path_buf(), dir.join("src")] {
        let entries = match fs.read_dir(&scan_dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.iter().filter(|e| e.is_file()) {
            if !language.has_extension(entry.file_name()) {
                continue;
            }
            let content = match fs.read_to_string(entry.path()) {
                Ok(content) => content,
                Err(_) => continue,
            };
            for re in &patterns {
                for cap in re.captures_iter(&content) {
                    // low ports in code are usually unrelated literals
                    if let Ok(port) = cap[1].parse::<u16>() {
                        if port >= 1024 {
                            ports.insert(port);
                        }
                    }
                }
            }
        }
    }
}
