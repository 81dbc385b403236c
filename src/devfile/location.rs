//! In-tree devfile search.

use super::parser::{DevfileError, DevfileOutcome, DevfileParser, DevfileSource, ParsedDevfile};
use crate::fs::FileSystem;
use std::path::Path;
use tracing::debug;

/// Canonical devfile locations relative to a component root, highest
/// priority first.
pub const DEVFILE_LOCATIONS: [&str; 4] = [
    "devfile.yaml",
    ".devfile.yaml",
    ".devfile/devfile.yaml",
    ".devfile/.devfile.yaml",
];

#[derive(Debug, Clone)]
pub struct FoundDevfile {
    /// Entry of [`DEVFILE_LOCATIONS`] the devfile was read from.
    pub location: &'static str,
    pub parsed: ParsedDevfile,
}

/// Search `dir` for a devfile. The first location holding a valid devfile
/// wins. An ignorable document moves the search to the next location; a
/// rejected one stops it.
///
/// `clone_root` bounds which local files a devfile may inline.
pub async fn find_devfile(
    parser: &DevfileParser,
    fs: &dyn FileSystem,
    dir: &Path,
    clone_root: &Path,
) -> Result<Option<FoundDevfile>, DevfileError> {
    for location in DEVFILE_LOCATIONS {
        let path = dir.join(location);
        if !fs.is_file(&path) {
            continue;
        }

        let bytes = fs
            .read(&path)
            .map_err(|e| DevfileError::Parse(format!("{}: {}", location, e)))?;

        let source = DevfileSource::Local {
            fs,
            dir: path.parent().unwrap_or(dir),
            root: clone_root,
        };
        match parser.parse_bytes(&bytes, source).await?
        {
            DevfileOutcome::Valid(parsed) => {
                debug!(location, dir = %dir.display(), "Found devfile");
                return Ok(Some(FoundDevfile { location, parsed }));
            }
            DevfileOutcome::Ignorable(reason) => {
                debug!(location, reason = %reason, "Skipping ignorable devfile");
            }
        }
    }

    Ok(None)
}
