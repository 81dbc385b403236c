//! Framework detection from manifest dependencies

use super::language::{normalize, LanguageDefinition};
use crate::fs::FileSystem;
use roxmltree::Document;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// A framework and the dependency names that reveal it.
#[derive(Debug, Clone, Copy)]
pub struct FrameworkRule {
    pub name: &'static str,
    pub language: &'static str,
    /// Other names registries use for it (project types, tags)
    pub aliases: &'static [&'static str],
    /// Dependency name prefixes, also matched as substrings of unstructured
    /// manifests such as `build.gradle` or `go.mod`
    pub markers: &'static [&'static str],
}

impl FrameworkRule {
    pub fn matches_name(&self, name: &str) -> bool {
        let wanted = normalize(name);
        !wanted.is_empty()
            && std::iter::once(self.name)
                .chain(self.aliases.iter().copied())
                .any(|n| normalize(n) == wanted)
    }
}

pub const FRAMEWORKS: &[FrameworkRule] = &[
    FrameworkRule {
        name: "Spring Boot",
        language: "Java",
        aliases: &["springboot", "Spring"],
        markers: &["spring-boot", "org.springframework.boot"],
    },
    FrameworkRule {
        name: "Quarkus",
        language: "Java",
        aliases: &[],
        markers: &["quarkus", "io.quarkus"],
    },
    FrameworkRule {
        name: "Vert.x",
        language: "Java",
        aliases: &["vertx"],
        markers: &["vertx", "io.vertx"],
    },
    FrameworkRule {
        name: "Micronaut",
        language: "Java",
        aliases: &[],
        markers: &["micronaut", "io.micronaut"],
    },
    FrameworkRule {
        name: "Next.js",
        language: "JavaScript",
        aliases: &["nextjs"],
        markers: &["next"],
    },
    FrameworkRule {
        name: "Nuxt.js",
        language: "JavaScript",
        aliases: &["nuxt"],
        markers: &["nuxt"],
    },
    FrameworkRule {
        name: "Angular",
        language: "JavaScript",
        aliases: &[],
        markers: &["@angular/core"],
    },
    FrameworkRule {
        name: "React",
        language: "JavaScript",
        aliases: &["reactjs"],
        markers: &["react"],
    },
    FrameworkRule {
        name: "Vue",
        language: "JavaScript",
        aliases: &["vuejs"],
        markers: &["vue"],
    },
    FrameworkRule {
        name: "Express",
        language: "JavaScript",
        aliases: &[],
        markers: &["express"],
    },
    FrameworkRule {
        name: "Django",
        language: "Python",
        aliases: &[],
        markers: &["django"],
    },
    FrameworkRule {
        name: "Flask",
        language: "Python",
        aliases: &[],
        markers: &["flask"],
    },
    FrameworkRule {
        name: "FastAPI",
        language: "Python",
        aliases: &[],
        markers: &["fastapi"],
    },
    FrameworkRule {
        name: "Gin",
        language: "Go",
        aliases: &[],
        markers: &["github.com/gin-gonic/gin"],
    },
    FrameworkRule {
        name: "Echo",
        language: "Go",
        aliases: &[],
        markers: &["github.com/labstack/echo"],
    },
    FrameworkRule {
        name: "Fiber",
        language: "Go",
        aliases: &[],
        markers: &["github.com/gofiber/fiber"],
    },
    FrameworkRule {
        name: "ASP.NET",
        language: "C#",
        aliases: &["aspnet", "dotnet"],
        markers: &["Microsoft.NET.Sdk.Web"],
    },
    FrameworkRule {
        name: "Laravel",
        language: "PHP",
        aliases: &[],
        markers: &["laravel/framework"],
    },
];

/// Dependencies declared by the manifests of one directory.
#[derive(Debug, Default)]
pub struct Dependencies {
    /// Package names from structured manifests
    names: BTreeSet<String>,
    /// Text of unstructured manifests
    raw: String,
}

impl Dependencies {
    pub fn collect(
        fs: &dyn FileSystem,
        dir: &Path,
        language: &dyn LanguageDefinition,
    ) -> Self {
        let mut deps = Self::default();
        let entries = match fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return deps,
        };

        for entry in entries.iter().filter(|e| e.is_file()) {
            let name = entry.file_name();
            if !language.manifest_files().iter().any(|m| m.matches(name)) {
                continue;
            }
            let content = match fs.read_to_string(entry.path()) {
                Ok(content) => content,
                Err(_) => continue,
            };
            deps.add_manifest(name, &content);
        }

        deps
    }

    fn add_manifest(&mut self, file_name: &str, content: &str) {
        match file_name {
            "pom.xml" => self.names.extend(pom_dependencies(content)),
            "package.json" => self.names.extend(json_keys(
                content,
                &["dependencies", "devDependencies", "peerDependencies"],
            )),
            "composer.json" => self
                .names
                .extend(json_keys(content, &["require", "require-dev"])),
            "requirements.txt" => self.names.extend(requirement_names(content)),
            _ => {
                self.raw.push_str(content);
                self.raw.push('\n');
            }
        }
    }

    pub fn has(&self, marker: &str) -> bool {
        self.names.iter().any(|n| n.starts_with(marker)) || self.raw.contains(marker)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.raw.is_empty()
    }
}

/// Frameworks of `language` found in the manifests of `dir`, in
/// [`FRAMEWORKS`] order.
pub fn detect_frameworks(
    fs: &dyn FileSystem,
    dir: &Path,
    language: &dyn LanguageDefinition,
) -> Vec<&'static FrameworkRule> {
    let deps = Dependencies::collect(fs, dir, language);
    if deps.is_empty() {
        return Vec::new();
    }

    let found: Vec<&'static FrameworkRule> = FRAMEWORKS
        .iter()
        .filter(|rule| language.matches_name(rule.language))
        .filter(|rule| rule.markers.iter().any(|m| deps.has(m)))
        .collect();

    debug!(
        dir = %dir.display(),
        language = language.name(),
        frameworks = ?found.iter().map(|f| f.name).collect::<Vec<_>>(),
        "Detected frameworks"
    );
    found
}

/// `artifactId`s and `groupId`s of dependencies, plugins and the parent.
fn pom_dependencies(content: &str) -> Vec<String> {
    let doc = match Document::parse(content) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("Unparseable pom.xml: {}", e);
            return Vec::new();
        }
    };

    doc.descendants()
        .filter(|n| n.has_tag_name("artifactId") || n.has_tag_name("groupId"))
        .filter(|n| {
            n.parent_element()
                .map(|p| {
                    p.has_tag_name("dependency")
                        || p.has_tag_name("plugin")
                        || p.has_tag_name("parent")
                })
                .unwrap_or(false)
        })
        .filter_map(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn json_keys(content: &str, sections: &[&str]) -> Vec<String> {
    let value: serde_json::Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(_) => return Vec::new(),
    };

    sections
        .iter()
        .filter_map(|section| value.get(section).and_then(|v| v.as_object()))
        .flat_map(|map| map.keys().cloned())
        .collect()
}

fn requirement_names(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('-'))
        .filter_map(|l| {
            l.split(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
                .next()
        })
        .filter(|name| !name.is_empty())
        .map(|name| name.to_ascii_lowercase())
        .collect()
}
