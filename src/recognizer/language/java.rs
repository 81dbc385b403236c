//! Java language definition (Maven and Gradle)

use super::{LanguageDefinition, ManifestPattern};

pub struct JavaLanguage;

impl LanguageDefinition for JavaLanguage {
    fn name(&self) -> &str {
        "Java"
    }

    fn extensions(&self) -> &[&str] {
        &["java"]
    }

    fn manifest_files(&self) -> &[ManifestPattern] {
        &[
            ManifestPattern {
                filename: "pom.xml",
                tool: "Maven",
            },
            ManifestPattern {
                filename: "build.gradle",
                tool: "Gradle",
            },
            ManifestPattern {
                filename: "build.gradle.kts",
                tool: "Gradle",
            },
        ]
    }

    fn excluded_dirs(&self) -> &[&str] {
        &["target", ".gradle", ".mvn"]
    }

    fn port_patterns(&self) -> &[(&str, &str)] {
        &[
            (r"server\.port\s*=\s*(\d+)", "Spring server.port"),
            (r"\.listen\(\s*(\d+)", "Vert.x listen"),
        ]
    }
}
