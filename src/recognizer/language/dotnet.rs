//! .NET language definition (C#, F#, VB project files)

use super::{LanguageDefinition, ManifestPattern};

pub struct DotNetLanguage;

impl LanguageDefinition for DotNetLanguage {
    fn name(&self) -> &str {
        "C#"
    }

    fn aliases(&self) -> &[&str] {
        &[".NET", "dotnet", "F#"]
    }

    fn extensions(&self) -> &[&str] {
        &["cs", "fs", "vb"]
    }

    fn manifest_files(&self) -> &[ManifestPattern] {
        &[
            ManifestPattern {
                filename: "*.csproj",
                tool: "dotnet",
            },
            ManifestPattern {
                filename: "*.fsproj",
                tool: "dotnet",
            },
            ManifestPattern {
                filename: "*.vbproj",
                tool: "dotnet",
            },
        ]
    }

    fn excluded_dirs(&self) -> &[&str] {
        &["bin", "obj"]
    }

    fn port_patterns(&self) -> &[(&str, &str)] {
        &[(r"https?://[\w.+*]+:(\d+)", "applicationUrl")]
    }
}
