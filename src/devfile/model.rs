//! Serde model of the parts of a devfile detection cares about.
//!
//! Unknown keys are kept in `extra` maps so a devfile re-serialized after
//! Kubernetes content inlining loses nothing.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devfile {
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Parent>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `schemaVersion: 2.2` is a YAML float; accept any scalar as text.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Parent {
    pub fn is_reference(&self) -> bool {
        self.id.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
            || self.uri.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
            || self.extra.contains_key("kubernetes")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<KubernetesLike>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift: Option<KubernetesLike>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Component {
    /// Number of component kinds set. A valid component has exactly one.
    pub fn kind_count(&self) -> usize {
        [
            self.container.is_some(),
            self.image.is_some(),
            self.kubernetes.is_some(),
            self.openshift.is_some(),
            self.extra.contains_key("volume"),
            self.extra.contains_key("plugin"),
            self.extra.contains_key("custom"),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.container
            .iter()
            .flat_map(|c| c.endpoints.iter())
            .chain(self.kubernetes.iter().flat_map(|k| k.endpoints.iter()))
            .chain(self.openshift.iter().flat_map(|k| k.endpoints.iter()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u32>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<DockerfileImage>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerfileImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_context: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `kubernetes` and `openshift` components share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesLike {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlined: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Devfile {
    /// `targetPort` of every endpoint across all components, sorted and
    /// de-duplicated. Out-of-range values are skipped.
    pub fn endpoint_ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self
            .components
            .iter()
            .flat_map(|c| c.endpoints())
            .filter_map(|e| e.target_port)
            .filter_map(|p| u16::try_from(p).ok())
            .filter(|p| *p > 0)
            .collect();
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    pub fn has_commands(&self) -> bool {
        self.extra
            .get("commands")
            .and_then(Value::as_sequence)
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }
}
