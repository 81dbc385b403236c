//! JavaScript and TypeScript language definitions

use super::{LanguageDefinition, ManifestPattern};

const NODE_MANIFESTS: &[ManifestPattern] = &[ManifestPattern {
    filename: "package.json",
    tool: "npm",
}];

const NODE_EXCLUDED: &[&str] = &["node_modules", "dist", ".next", "coverage"];

const NODE_PORT_PATTERNS: &[(&str, &str)] = &[
    (r"\.listen\(\s*(\d+)", "listen() call"),
    (r"process\.env\.PORT\s*\|\|\s*(\d+)", "PORT fallback"),
    (r"\bport\s*:\s*(\d+)", "port option"),
];

pub struct JavaScriptLanguage;

impl LanguageDefinition for JavaScriptLanguage {
    fn name(&self) -> &str {
        "JavaScript"
    }

    fn aliases(&self) -> &[&str] {
        &["Node.js", "Node"]
    }

    fn extensions(&self) -> &[&str] {
        &["js", "mjs", "cjs", "jsx"]
    }

    fn manifest_files(&self) -> &[ManifestPattern] {
        NODE_MANIFESTS
    }

    fn excluded_dirs(&self) -> &[&str] {
        NODE_EXCLUDED
    }

    fn port_patterns(&self) -> &[(&str, &str)] {
        NODE_PORT_PATTERNS
    }
}

/// TypeScript projects match JavaScript registry samples as well.
pub struct TypeScriptLanguage;

impl LanguageDefinition for TypeScriptLanguage {
    fn name(&self) -> &str {
        "TypeScript"
    }

    fn aliases(&self) -> &[&str] {
        &["JavaScript", "Node.js", "Node"]
    }

    fn extensions(&self) -> &[&str] {
        &["ts", "tsx", "mts"]
    }

    fn manifest_files(&self) -> &[ManifestPattern] {
        NODE_MANIFESTS
    }

    fn excluded_dirs(&self) -> &[&str] {
        NODE_EXCLUDED
    }

    fn port_patterns(&self) -> &[(&str, &str)] {
        NODE_PORT_PATTERNS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typescript_matches_javascript_samples() {
        assert!(TypeScriptLanguage.matches_name("JavaScript"));
        assert!(!JavaScriptLanguage.matches_name("TypeScript"));
    }

    #[test]
    fn test_extensions() {
        assert!(JavaScriptLanguage.has_extension("server.js"));
        assert!(TypeScriptLanguage.has_extension("main.TS"));
        assert!(!TypeScriptLanguage.has_extension("main.js"));
    }
}
