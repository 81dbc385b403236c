//! PHP language definition

use super::{LanguageDefinition, ManifestPattern};

pub struct PhpLanguage;

impl LanguageDefinition for PhpLanguage {
    fn name(&self) -> &str {
        "PHP"
    }

    fn extensions(&self) -> &[&str] {
        &["php"]
    }

    fn manifest_files(&self) -> &[ManifestPattern] {
        &[ManifestPattern {
            filename: "composer.json",
            tool: "Composer",
        }]
    }

    fn excluded_dirs(&self) -> &[&str] {
        &["vendor"]
    }
}
