//! Per-run temporary directory tree
//!
//! ```text
//! <base>/republish-npm-XXXXXX/
//!   packs/<n>-<version>/   downloaded archive
//!   work/<n>-<version>/    extracted package
//! ```
//!
//! The tree is left on disk when the run ends.

use crate::core::error::RepublishError;
use std::fs;
use std::path::{Path, PathBuf};

const ROOT_PREFIX: &str = "republish-npm-";

#[derive(Debug, Clone)]
pub struct RunWorkspace {
    root: PathBuf,
    packs: PathBuf,
    work: PathBuf,
}

impl RunWorkspace {
    /// Create a fresh root under `base`, or under the system temp directory
    pub fn create(base: Option<&Path>) -> Result<Self, RepublishError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(ROOT_PREFIX);

        let dir = match base {
            Some(base) => {
                fs::create_dir_all(base)?;
                builder.tempdir_in(base)?
            }
            None => builder.tempdir()?,
        };
        let root = dir.keep();

        let packs = root.join("packs");
        let work = root.join("work");
        fs::create_dir_all(&packs)?;
        fs::create_dir_all(&work)?;

        Ok(Self { root, packs, work })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the pack and work directories of the `index`-th version
    pub fn version_dirs(
        &self,
        index: usize,
        version: &str,
    ) -> Result<(PathBuf, PathBuf), RepublishError> {
        let name = format!("{}-{}", index + 1, safe_segment(version));
        let pack_dir = self.packs.join(&name);
        let work_dir = self.work.join(&name);
        fs::create_dir_all(&pack_dir)?;
        fs::create_dir_all(&work_dir)?;
        Ok((pack_dir, work_dir))
    }
}

/// Replace characters that are not safe in a path segment
fn safe_segment(version: &str) -> String {
    version
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
