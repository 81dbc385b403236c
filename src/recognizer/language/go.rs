//! Go language definition

use super::{LanguageDefinition, ManifestPattern};

pub struct GoLanguage;

impl LanguageDefinition for GoLanguage {
    fn name(&self) -> &str {
        "Go"
    }

    fn aliases(&self) -> &[&str] {
        &["Golang"]
    }

    fn extensions(&self) -> &[&str] {
        &["go"]
    }

    fn manifest_files(&self) -> &[ManifestPattern] {
        &[ManifestPattern {
            filename: "go.mod",
            tool: "Go Modules",
        }]
    }

    fn port_patterns(&self) -> &[(&str, &str)] {
        &[
            (r#"ListenAndServe\(\s*"[\w.]*:(\d+)""#, "http.ListenAndServe"),
            (r#"\.Run\(\s*"[\w.]*:(\d+)""#, "router Run"),
            (r#"\.Start\(\s*"[\w.]*:(\d+)""#, "echo Start"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert!(GoLanguage.matches_name("golang"));
        assert!(GoLanguage.matches_name("Go"));
    }
}
