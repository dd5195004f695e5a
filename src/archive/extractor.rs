//! Archive Extractor - unpacks npm tarballs
//!
//! Each archive lands in its own directory named after the tarball, and npm
//! tarballs keep their contents under `package/`.

use crate::core::error::RepublishError;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Archive;

/// Directory npm puts package contents under inside a tarball
pub const PACKAGE_ROOT: &str = "package";

/// Extracts npm tarballs (`.tgz`) into a work directory
pub struct PackageExtractor {
    dest_dir: PathBuf,
}

impl PackageExtractor {
    /// Create a new PackageExtractor
    pub fn new(dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
        }
    }

    /// Extract an archive into `<dest_dir>/<archive stem>/`
    /// Returns the path of the `package/` directory inside it
    pub fn extract(&self, archive_path: &Path) -> Result<PathBuf, RepublishError> {
        if !archive_path.is_file() {
            return Err(RepublishError::ArchiveNotFound(archive_path.to_path_buf()));
        }

        let folder_name = archive_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("archive");
        let target = self.dest_dir.join(folder_name);

        // Clean up any leftovers from an earlier attempt
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        fs::create_dir_all(&target)?;

        let file = File::open(archive_path)?;
        let mut archive = Archive::new(GzDecoder::new(file));
        // unpack() refuses entries that would land outside `target`
        archive.unpack(&target)?;

        let package_dir = target.join(PACKAGE_ROOT);
        if !package_dir.is_dir() {
            return Err(RepublishError::ArchiveLayout(package_dir));
        }

        tracing::debug!(
            archive = %archive_path.display(),
            dir = %package_dir.display(),
            "extracted archive"
        );
        Ok(package_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn build_tgz(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_extract_returns_package_dir() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("old-pkg-1.0.0.tgz");
        build_tgz(
            &archive,
            &[
                ("package/package.json", r#"{"name":"old-pkg","version":"1.0.0"}"#),
                ("package/lib/index.js", "module.exports = 1;\n"),
            ],
        );

        let work = temp.path().join("work");
        let extractor = PackageExtractor::new(&work);
        let package_dir = extractor.extract(&archive).unwrap();

        assert_eq!(package_dir, work.join("old-pkg-1.0.0").join(PACKAGE_ROOT));
        assert!(package_dir.join("package.json").is_file());
        assert!(package_dir.join("lib/index.js").is_file());
    }

    #[test]
    fn test_extract_replaces_previous_attempt() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("pkg-1.0.0.tgz");
        build_tgz(&archive, &[("package/package.json", "{}")]);

        let work = temp.path().join("work");
        let stale = work.join("pkg-1.0.0").join("stale.txt");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        PackageExtractor::new(&work).extract(&archive).unwrap();

        assert!(!stale.exists());
    }

    #[test]
    fn test_missing_package_root_is_layout_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("odd-1.0.0.tgz");
        build_tgz(&archive, &[("odd/package.json", "{}")]);

        let result = PackageExtractor::new(temp.path().join("work")).extract(&archive);

        assert!(matches!(result, Err(RepublishError::ArchiveLayout(_))));
    }

    #[test]
    fn test_missing_archive_is_not_found() {
        let temp = TempDir::new().unwrap();
        let result = PackageExtractor::new(temp.path()).extract(&temp.path().join("nope.tgz"));

        assert!(matches!(result, Err(RepublishError::ArchiveNotFound(_))));
    }

    #[test]
    fn test_corrupt_archive_is_io_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken-1.0.0.tgz");
        fs::write(&archive, b"definitely not gzip").unwrap();

        let result = PackageExtractor::new(temp.path().join("work")).extract(&archive);

        assert!(matches!(result, Err(RepublishError::Io(_))));
    }
}
