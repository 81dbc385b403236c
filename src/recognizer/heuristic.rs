use super::framework::{detect_frameworks, FrameworkRule, FRAMEWORKS};
use super::language::{normalize, LanguageDefinition, LanguageRegistry};
use super::ports;
use super::{DetectedComponent, DetectedLanguage, Recognizer, SelectedType};
use crate::fs::{DirEntry, FileSystem};
use crate::registry::DevfileType;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

const MAX_COMPONENT_DEPTH: usize = 5;
const MAX_SCAN_DEPTH: usize = 12;
const MAX_SCANNED_FILES: usize = 20_000;

const LANGUAGE_SCORE: u32 = 10;
const FRAMEWORK_SCORE: u32 = 5;
const TAG_SCORE: u32 = 2;
const BASE_TYPE_SCORE: u32 = 1;

/// Recognizer driven by manifest files, file extensions and manifest
/// dependencies.
pub struct HeuristicRecognizer {
    registry: LanguageRegistry,
}

impl HeuristicRecognizer {
    pub fn new() -> Self {
        Self::with_registry(LanguageRegistry::with_defaults())
    }

    pub fn with_registry(registry: LanguageRegistry) -> Self {
        Self { registry }
    }

    fn skip_dir(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name();
        name.starts_with('.') || self.registry.is_excluded_dir(name)
    }

    fn has_manifest(&self, entries: &[DirEntry]) -> bool {
        entries
            .iter()
            .filter(|e| e.is_file())
            .any(|e| self.registry.is_manifest(e.file_name()))
    }

    fn find_roots(&self, fs: &dyn FileSystem, dir: &Path, depth: usize, roots: &mut Vec<PathBuf>) {
        let entries = match fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                return;
            }
        };

        if self.has_manifest(&entries) {
            roots.push(dir.to_path_buf());
            return;
        }
        if depth >= MAX_COMPONENT_DEPTH {
            return;
        }

        for entry in entries.iter().filter(|e| e.is_dir() && !self.skip_dir(e)) {
            self.find_roots(fs, entry.path(), depth + 1, roots);
        }
    }

    fn count_sources(
        &self,
        fs: &dyn FileSystem,
        dir: &Path,
        depth: usize,
        counts: &mut [usize],
        budget: &mut usize,
    ) {
        let entries = match fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        for entry in &entries {
            if *budget == 0 {
                return;
            }
            if entry.is_file() {
                *budget -= 1;
                for (idx, language) in self.registry.languages().iter().enumerate() {
                    if language.has_extension(entry.file_name()) {
                        counts[idx] += 1;
                    }
                }
            } else if entry.is_dir() && depth < MAX_SCAN_DEPTH && !self.skip_dir(entry) {
                self.count_sources(fs, entry.path(), depth + 1, counts, budget);
            }
        }
    }

    fn analyze(&self, fs: &dyn FileSystem, dir: &Path) -> DetectedComponent {
        let languages = self.registry.languages();
        let root_files: Vec<DirEntry> = fs
            .read_dir(dir)
            .map(|entries| entries.into_iter().filter(|e| e.is_file()).collect())
            .unwrap_or_default();

        let mut counts = vec![0usize; languages.len()];
        let mut budget = MAX_SCANNED_FILES;
        self.count_sources(fs, dir, 0, &mut counts, &mut budget);
        let total: usize = counts.iter().sum();

        let manifests_of = |language: &dyn LanguageDefinition| -> Vec<&DirEntry> {
            root_files
                .iter()
                .filter(|f| language.manifest_files().iter().any(|m| m.matches(f.file_name())))
                .collect()
        };

        let mut detected: Vec<DetectedLanguage> = Vec::new();
        for (idx, language) in languages.iter().enumerate() {
            let manifests = manifests_of(language.as_ref());
            let has_manifest = !manifests.is_empty();

            // a manifest shared with another language (package.json) only
            // counts when that other language has no sources here
            let shared_with_sources = has_manifest
                && languages.iter().enumerate().any(|(other, l)| {
                    other != idx
                        && counts[other] > 0
                        && manifests.iter().any(|m| {
                            l.manifest_files().iter().any(|p| p.matches(m.file_name()))
                        })
                });

            if counts[idx] == 0 && (!has_manifest || shared_with_sources) {
                continue;
            }

            let mut tools: Vec<String> = Vec::new();
            for manifest in &manifests {
                for pattern in language.manifest_files() {
                    if pattern.matches(manifest.file_name())
                        && !pattern.tool.is_empty()
                        && !tools.iter().any(|t| t == pattern.tool)
                    {
                        tools.push(pattern.tool.to_string());
                    }
                }
            }

            let frameworks = if has_manifest {
                detect_frameworks(fs, dir, language.as_ref())
                    .into_iter()
                    .map(|f| f.name.to_string())
                    .collect()
            } else {
                Vec::new()
            };

            detected.push(DetectedLanguage {
                name: language.name().to_string(),
                weight: if total > 0 {
                    counts[idx] as f64 / total as f64
                } else {
                    0.0
                },
                can_be_component: has_manifest,
                frameworks,
                tools,
            });
        }

        detected.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        DetectedComponent {
            path: dir.to_path_buf(),
            languages: detected,
        }
    }

    fn score(
        &self,
        language: &dyn LanguageDefinition,
        detected: &DetectedLanguage,
        candidate: &DevfileType,
    ) -> Option<u32> {
        if !language.matches_name(&candidate.language) {
            return None;
        }

        let frameworks: Vec<&FrameworkRule> = FRAMEWORKS
            .iter()
            .filter(|rule| detected.frameworks.iter().any(|f| f == rule.name))
            .collect();
        let is_tool = |name: &str| {
            let wanted = normalize(name);
            detected.tools.iter().any(|t| normalize(t) == wanted)
        };

        let mut score = LANGUAGE_SCORE;

        if frameworks
            .iter()
            .any(|f| f.matches_name(&candidate.project_type))
        {
            score += FRAMEWORK_SCORE;
        }

        for tag in &candidate.tags {
            if language.matches_name(tag)
                || frameworks.iter().any(|f| f.matches_name(tag))
                || is_tool(tag)
            {
                score += TAG_SCORE;
            }
        }

        if frameworks.is_empty()
            && (language.matches_name(&candidate.project_type) || is_tool(&candidate.project_type))
        {
            score += BASE_TYPE_SCORE;
        }

        Some(score)
    }
}

impl Default for HeuristicRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for HeuristicRecognizer {
    fn detect_components(
        &self,
        fs: &dyn FileSystem,
        path: &Path,
    ) -> Result<Vec<DetectedComponent>> {
        if !fs.is_dir(path) {
            anyhow::bail!("{} is not a directory", path.display());
        }

        let mut roots = Vec::new();
        self.find_roots(fs, path, 0, &mut roots);

        let components: Vec<DetectedComponent> =
            roots.iter().map(|root| self.analyze(fs, root)).collect();

        debug!(
            path = %path.display(),
            components = components.len(),
            "Detected components"
        );
        Ok(components)
    }

    fn select_devfile_type(
        &self,
        fs: &dyn FileSystem,
        path: &Path,
        candidates: &[DevfileType],
    ) -> Result<SelectedType> {
        let components = self
            .detect_components(fs, path)
            .with_context(|| format!("failed to recognize {}", path.display()))?;

        let component = match components.first() {
            Some(component) => component,
            None => return Ok(SelectedType::NoMatch),
        };

        for detected in component.languages.iter().filter(|l| l.can_be_component) {
            let language = match self.registry.get_language(&detected.name) {
                Some(language) => language,
                None => continue,
            };

            let mut best: Option<(u32, &DevfileType)> = None;
            for candidate in candidates {
                if let Some(score) = self.score(language, detected, candidate) {
                    if best.map(|(s, _)| score > s).unwrap_or(true) {
                        best = Some((score, candidate));
                    }
                }
            }

            if let Some((score, candidate)) = best {
                debug!(
                    path = %path.display(),
                    language = %detected.name,
                    sample = %candidate.name,
                    score,
                    "Selected registry sample"
                );
                return Ok(SelectedType::Match(candidate.clone()));
            }
        }

        Ok(SelectedType::NoMatch)
    }

    fn detect_ports(&self, fs: &dyn FileSystem, path: &Path) -> Vec<u16> {
        let component = self.analyze(fs, path);
        let languages: Vec<&dyn LanguageDefinition> = component
            .languages
            .iter()
            .filter_map(|l| self.registry.get_language(&l.name))
            .collect();
        ports::detect_ports(fs, path, &languages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use std::path::PathBuf;

    fn sample(name: &str, language: &str, project_type: &str, tags: &[&str]) -> DevfileType {
        DevfileType {
            name: name.to_string(),
            language: language.to_string(),
            project_type: project_type.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn registry_samples() -> Vec<DevfileType> {
        vec![
            sample("dotnet60-basic", ".NET", "dotnet", &[".NET", ".NET 6.0"]),
            sample("go-basic", "Go", "Go", &["Go"]),
            sample("java-quarkus", "Java", "Quarkus", &["Java", "Quarkus"]),
            sample("java-maven", "Java", "Maven", &["Java", "Maven"]),
            sample("java-springboot-basic", "Java", "springboot", &["Java", "Spring"]),
            sample("nodejs-angular", "TypeScript", "Angular", &["Node.js", "Angular"]),
            sample("nodejs-basic", "JavaScript", "Node.js", &["Node.js", "Express"]),
            sample("python-basic", "Python", "Python", &["Python", "Pip", "Flask"]),
        ]
    }

    const SPRING_POM: &str = "<project><parent><groupId>org.springframework.boot</groupId><artifactId>spring-boot-starter-parent</artifactId></parent></project>";

    fn spring_repo(fs: &MockFileSystem, prefix: &str) {
        fs.add_file(format!("{}pom.xml", prefix), SPRING_POM);
        fs.add_file(
            format!("{}src/main/java/com/example/DemoApplication.java", prefix),
            "class DemoApplication {}",
        );
        fs.add_file(
            format!("{}src/main/resources/application.properties", prefix),
            "server.port=8081\n",
        );
    }

    fn selected_name(selected: SelectedType) -> Option<String> {
        match selected {
            SelectedType::Match(t) => Some(t.name),
            SelectedType::NoMatch => None,
        }
    }

    #[test]
    fn test_single_component_at_root() {
        let fs = MockFileSystem::new();
        spring_repo(&fs, "");
        fs.add_file("frontend/package.json", "{}");

        let recognizer = HeuristicRecognizer::new();
        let components = recognizer.detect_components(&fs, fs.root()).unwrap();

        assert_eq!(components.len(), 1);
        assert_eq!(components[0].path, fs.root());
        let java = components[0].primary_language().unwrap();
        assert_eq!(java.name, "Java");
        assert_eq!(java.frameworks, vec!["Spring Boot"]);
        assert_eq!(java.tools, vec!["Maven"]);
    }

    #[test]
    fn test_multi_component_listing() {
        let fs = MockFileSystem::new();
        fs.add_file("README.md", "# monorepo");
        spring_repo(&fs, "backend/");
        fs.add_file("web/package.json", r#"{"dependencies": {"express": "4"}}"#);
        fs.add_file("web/server.js", "require('express')");
        fs.add_file("web/node_modules/x/package.json", "{}");
        fs.add_file("docs/index.md", "docs");

        let recognizer = HeuristicRecognizer::new();
        let components = recognizer.detect_components(&fs, fs.root()).unwrap();
        let paths: Vec<PathBuf> = components.iter().map(|c| c.path.clone()).collect();

        assert_eq!(
            paths,
            vec![PathBuf::from("/mock/backend"), PathBuf::from("/mock/web")]
        );
        assert_eq!(components[1].languages.len(), 1);
        assert_eq!(components[1].languages[0].name, "JavaScript");
    }

    #[test]
    fn test_source_without_manifest_is_not_a_component() {
        let fs = MockFileSystem::new();
        fs.add_file("scripts/tool.js", "console.log(1)");

        let recognizer = HeuristicRecognizer::new();
        assert!(recognizer
            .detect_components(&fs, fs.root())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_weights() {
        let fs = MockFileSystem::new();
        fs.add_file("package.json", "{}");
        fs.add_file("a.js", "");
        fs.add_file("b.js", "");
        fs.add_file("c.js", "");
        fs.add_file("tool.py", "");

        let recognizer = HeuristicRecognizer::new();
        let component = &recognizer.detect_components(&fs, fs.root()).unwrap()[0];

        assert_eq!(component.languages[0].name, "JavaScript");
        assert!((component.languages[0].weight - 0.75).abs() < f64::EPSILON);
        assert!(component.languages[0].can_be_component);
        assert_eq!(component.languages[1].name, "Python");
        assert!(!component.languages[1].can_be_component);
    }

    #[test]
    fn test_select_spring_boot() {
        let fs = MockFileSystem::new();
        spring_repo(&fs, "");

        let recognizer = HeuristicRecognizer::new();
        let selected = recognizer
            .select_devfile_type(&fs, fs.root(), &registry_samples())
            .unwrap();
        assert_eq!(selected_name(selected).as_deref(), Some("java-springboot-basic"));
    }

    #[test]
    fn test_select_plain_maven() {
        let fs = MockFileSystem::new();
        fs.add_file("pom.xml", "<project><artifactId>tool</artifactId></project>");
        fs.add_file("src/main/java/Tool.java", "class Tool {}");

        let recognizer = HeuristicRecognizer::new();
        let selected = recognizer
            .select_devfile_type(&fs, fs.root(), &registry_samples())
            .unwrap();
        assert_eq!(selected_name(selected).as_deref(), Some("java-maven"));
    }

    #[test]
    fn test_select_node_and_python() {
        let recognizer = HeuristicRecognizer::new();

        let node = MockFileSystem::new();
        node.add_file("package.json", r#"{"dependencies": {"express": "4"}}"#);
        node.add_file("server.js", "");
        assert_eq!(
            selected_name(
                recognizer
                    .select_devfile_type(&node, node.root(), &registry_samples())
                    .unwrap()
            )
            .as_deref(),
            Some("nodejs-basic")
        );

        let python = MockFileSystem::new();
        python.add_file("app.py", "from flask import Flask");
        assert_eq!(
            selected_name(
                recognizer
                    .select_devfile_type(&python, python.root(), &registry_samples())
                    .unwrap()
            )
            .as_deref(),
            Some("python-basic")
        );
    }

    #[test]
    fn test_select_no_match() {
        let fs = MockFileSystem::new();
        fs.add_file("composer.json", "{}");
        fs.add_file("index.php", "<?php");

        let recognizer = HeuristicRecognizer::new();
        assert_eq!(
            recognizer
                .select_devfile_type(&fs, fs.root(), &registry_samples())
                .unwrap(),
            SelectedType::NoMatch
        );
        assert_eq!(
            recognizer
                .select_devfile_type(&fs, fs.root(), &[])
                .unwrap(),
            SelectedType::NoMatch
        );
    }

    #[test]
    fn test_detect_ports() {
        let fs = MockFileSystem::new();
        spring_repo(&fs, "");
        fs.add_file("Dockerfile", "FROM openjdk\nEXPOSE 8080\n");

        let recognizer = HeuristicRecognizer::new();
        assert_eq!(recognizer.detect_ports(&fs, fs.root()), vec![8080, 8081]);
    }

    #[test]
    fn test_missing_path_is_error() {
        let fs = MockFileSystem::new();
        let recognizer = HeuristicRecognizer::new();
        assert!(recognizer
            .detect_components(&fs, Path::new("/mock/nope"))
            .is_err());
    }
}
