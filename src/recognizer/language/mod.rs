//! Language definitions used by the heuristic recognizer

mod dotnet;
mod go;
mod java;
mod javascript;
mod php;
mod python;

pub use dotnet::DotNetLanguage;
pub use go::GoLanguage;
pub use java::JavaLanguage;
pub use javascript::{JavaScriptLanguage, TypeScriptLanguage};
pub use php::PhpLanguage;
pub use python::PythonLanguage;

use std::sync::Arc;

/// Pattern for matching manifest files
#[derive(Debug, Clone, Copy)]
pub struct ManifestPattern {
    /// Exact file name, or `*.ext` for any file with that extension
    pub filename: &'static str,
    /// Build tool implied by the manifest, empty for plain entry points
    pub tool: &'static str,
}

impl ManifestPattern {
    pub fn matches(&self, file_name: &str) -> bool {
        match self.filename.strip_prefix('*') {
            Some(suffix) => file_name.len() > suffix.len() && file_name.ends_with(suffix),
            None => file_name == self.filename,
        }
    }
}

/// Trait describing how a language shows up in a source tree
pub trait LanguageDefinition: Send + Sync {
    /// Language name (e.g., "Java", "JavaScript")
    fn name(&self) -> &str;

    /// Other names registries use for this language or its base project type
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// File extensions associated with this language
    fn extensions(&self) -> &[&str];

    /// Files whose presence makes a directory a buildable component
    fn manifest_files(&self) -> &[ManifestPattern];

    /// Directories never scanned for this language
    fn excluded_dirs(&self) -> &[&str] {
        &[]
    }

    /// Regexes with one capture group yielding a port number in source files
    fn port_patterns(&self) -> &[(&str, &str)] {
        &[]
    }

    fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        let wanted = normalize(name);
        std::iter::once(self.name())
            .chain(self.aliases().iter().copied())
            .any(|n| {
                n.eq_ignore_ascii_case(name) || (wanted.len() > 1 && normalize(n) == wanted)
            })
    }

    fn has_extension(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .map(|(_, ext)| self.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Lowercase and drop everything but letters and digits, so that
/// "Spring Boot", "springboot" and "Node.js" / "nodejs" compare equal.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Clone)]
pub struct LanguageRegistry {
    languages: Vec<Arc<dyn LanguageDefinition>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self {
            languages: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JavaLanguage));
        registry.register(Arc::new(JavaScriptLanguage));
        registry.register(Arc::new(TypeScriptLanguage));
        registry.register(Arc::new(PythonLanguage));
        registry.register(Arc::new(GoLanguage));
        registry.register(Arc::new(DotNetLanguage));
        registry.register(Arc::new(PhpLanguage));
        registry
    }

    pub fn register(&mut self, language: Arc<dyn LanguageDefinition>) {
        self.languages.push(language);
    }

    pub fn languages(&self) -> &[Arc<dyn LanguageDefinition>] {
        &self.languages
    }

    pub fn get_language(&self, name: &str) -> Option<&dyn LanguageDefinition> {
        self.languages
            .iter()
            .find(|l| l.name().eq_ignore_ascii_case(name))
            .map(|l| l.as_ref())
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        const COMMON: &[&str] = &[".git", ".idea", ".vscode", "vendor"];
        COMMON.contains(&name)
            || self
                .languages
                .iter()
                .any(|l| l.excluded_dirs().contains(&name))
    }

    /// Whether any language treats `file_name` as a manifest
    pub fn is_manifest(&self, file_name: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.manifest_files().iter().any(|m| m.matches(file_name)))
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
