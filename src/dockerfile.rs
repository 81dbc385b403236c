//! Locating the container build recipe of a component.

use crate::devfile::{Devfile, DevfileError};
use crate::fs::FileSystem;
use std::path::Path;

pub const DOCKERFILE_NAMES: [&str; 2] = ["Dockerfile", "Containerfile"];

/// Subdirectories probed after the component root, in order.
pub const DOCKERFILE_DIRS: [&str; 3] = ["docker", ".docker", "build"];

/// `dockerfile.uri` of the first `image` component that names one.
pub fn dockerfile_uri_from_devfile(devfile: &Devfile) -> Option<&str> {
    devfile
        .components
        .iter()
        .filter_map(|c| c.image.as_ref())
        .filter_map(|image| image.dockerfile.as_ref())
        .filter_map(|dockerfile| dockerfile.uri.as_deref())
        .map(str::trim)
        .find(|uri| !uri.is_empty())
}

pub fn dockerfile_uri_from_bytes(bytes: &[u8]) -> Result<Option<String>, DevfileError> {
    let devfile: Devfile =
        serde_yaml::from_slice(bytes).map_err(|e| DevfileError::Parse(e.to_string()))?;
    Ok(dockerfile_uri_from_devfile(&devfile).map(str::to_string))
}

/// Probe `dir` for a Dockerfile or Containerfile. Returns the path relative
/// to `dir`, root-level names first.
pub fn probe_dockerfile(fs: &dyn FileSystem, dir: &Path) -> Option<String> {
    let root_hit = DOCKERFILE_NAMES
        .iter()
        .find(|name| fs.is_file(&dir.join(name)))
        .map(|name| name.to_string());

    root_hit.or_else(|| {
        DOCKERFILE_DIRS.iter().find_map(|sub| {
            DOCKERFILE_NAMES
                .iter()
                .find(|name| fs.is_file(&dir.join(sub).join(name)))
                .map(|name| format!("{}/{}", sub, name))
        })
    })
}
