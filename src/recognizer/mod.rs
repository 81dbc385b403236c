//! Source tree recognition: which subtrees are components, what languages
//! they are written in, and which registry sample fits them best.

pub mod framework;
mod heuristic;
pub mod language;
pub mod ports;

pub use heuristic::HeuristicRecognizer;

use crate::fs::FileSystem;
use crate::registry::DevfileType;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedLanguage {
    pub name: String,
    /// Share of the component's recognized source files, in `0.0..=1.0`
    pub weight: f64,
    pub can_be_component: bool,
    pub frameworks: Vec<String>,
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedComponent {
    pub path: PathBuf,
    /// Sorted by weight, heaviest first
    pub languages: Vec<DetectedLanguage>,
}

impl DetectedComponent {
    /// Highest-weight language that can be built as a component. Equal
    /// weights keep detection order.
    pub fn primary_language(&self) -> Option<&DetectedLanguage> {
        self.languages
            .iter()
            .filter(|l| l.can_be_component)
            .fold(None, |best: Option<&DetectedLanguage>, l| match best {
                Some(b) if b.weight >= l.weight => Some(b),
                _ => Some(l),
            })
    }

    pub fn can_be_component(&self) -> bool {
        self.languages.iter().any(|l| l.can_be_component)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedType {
    Match(DevfileType),
    NoMatch,
}

/// Filesystem heuristics behind component detection. Implementations only
/// read through `fs`.
pub trait Recognizer: Send + Sync {
    /// Candidate component subtrees under `path`. A component at `path`
    /// itself is listed first.
    fn detect_components(&self, fs: &dyn FileSystem, path: &Path)
        -> Result<Vec<DetectedComponent>>;

    /// Best-fitting registry sample for the component at `path`.
    fn select_devfile_type(
        &self,
        fs: &dyn FileSystem,
        path: &Path,
        candidates: &[DevfileType],
    ) -> Result<SelectedType>;

    /// Ports the component at `path` declares, sorted ascending.
    fn detect_ports(&self, fs: &dyn FileSystem, path: &Path) -> Vec<u16>;
}
