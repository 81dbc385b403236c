//! Python language definition

use super::{LanguageDefinition, ManifestPattern};

pub struct PythonLanguage;

impl LanguageDefinition for PythonLanguage {
    fn name(&self) -> &str {
        "Python"
    }

    fn extensions(&self) -> &[&str] {
        &["py"]
    }

    fn manifest_files(&self) -> &[ManifestPattern] {
        &[
            ManifestPattern {
                filename: "requirements.txt",
                tool: "Pip",
            },
            ManifestPattern {
                filename: "pyproject.toml",
                tool: "Pip",
            },
            ManifestPattern {
                filename: "setup.py",
                tool: "Pip",
            },
            ManifestPattern {
                filename: "Pipfile",
                tool: "Pipenv",
            },
            // entry points of manifest-less apps
            ManifestPattern {
                filename: "app.py",
                tool: "",
            },
            ManifestPattern {
                filename: "main.py",
                tool: "",
            },
            ManifestPattern {
                filename: "manage.py",
                tool: "",
            },
            ManifestPattern {
                filename: "wsgi.py",
                tool: "",
            },
        ]
    }

    fn excluded_dirs(&self) -> &[&str] {
        &["__pycache__", "venv", ".venv", ".tox", ".pytest_cache"]
    }

    fn port_patterns(&self) -> &[(&str, &str)] {
        &[
            (r"\bport\s*=\s*(\d+)", "port keyword"),
            (r#"--bind[= ]["']?[\w.]*:(\d+)"#, "gunicorn bind"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_point_is_manifest() {
        let manifests = PythonLanguage.manifest_files();
        assert!(manifests.iter().any(|m| m.matches("app.py")));
        assert!(manifests.iter().any(|m| m.matches("requirements.txt") && m.tool == "Pip"));
    }
}
