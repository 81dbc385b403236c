use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of `GET <registry>/index/sample`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub project_type: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub git: Option<GitInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitInfo {
    #[serde(default)]
    pub remotes: BTreeMap<String, String>,
}

impl IndexEntry {
    pub fn origin(&self) -> Option<&str> {
        self.git
            .as_ref()
            .and_then(|git| git.remotes.get("origin"))
            .map(String::as_str)
            .filter(|origin| !origin.trim().is_empty())
    }

    pub fn devfile_type(&self) -> DevfileType {
        DevfileType {
            name: self.name.clone(),
            language: self.language.clone(),
            project_type: self.project_type.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// A registry sample as the recognizer sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevfileType {
    pub name: String,
    pub language: String,
    pub project_type: String,
    pub tags: Vec<String>,
}
