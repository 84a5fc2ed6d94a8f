//! Dataset identity for cache keys.

use std::fmt;
use std::path::Path;
use std::time::UNIX_EPOCH;

use flood_map_dataset::DatasetManifest;
use sha2::{Digest, Sha256};

/// SHA-256 fingerprint of a manifest and the files it points at.
///
/// Two versions are equal when the manifest is unchanged and every file
/// has the same size and modification time. File contents are not read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetVersion(String);

impl DatasetVersion {
    /// Fingerprints `manifest` and the layer files it lists under
    /// `data_dir`, plus any `extra_files` (typically scenario files).
    ///
    /// Missing files contribute a fixed marker, so a file appearing later
    /// changes the version.
    #[must_use]
    pub fn compute<'a>(
        manifest: &DatasetManifest,
        data_dir: &Path,
        extra_files: impl IntoIterator<Item = &'a Path>,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{manifest:?}").as_bytes());

        let paths = manifest
            .files()
            .into_iter()
            .map(|f| data_dir.join(f))
            .chain(extra_files.into_iter().map(Path::to_path_buf));

        for path in paths {
            hasher.update(path.to_string_lossy().as_bytes());
            hasher.update(fingerprint(&path).as_bytes());
        }

        let version = Self(hex::encode(hasher.finalize()));
        log::debug!("Dataset version {}", version.short());
        version
    }

    /// Full hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for logs.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for DatasetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn fingerprint(path: &Path) -> String {
    std::fs::metadata(path).map_or_else(
        |_| "missing".to_string(),
        |meta| {
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |d| d.as_nanos());
            format!("{}:{modified}", meta.len())
        },
    )
}
