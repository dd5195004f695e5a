//! Core traits and types for republishing
//!
//! This module defines the boundary to the external package manager: every
//! registry interaction goes through [`PackageManager`].

use crate::core::config::Access;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Parameters of one publish attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest<'a> {
    pub access: Access,
    pub tag: Option<&'a str>,
    /// Target registry; `None` leaves the choice to the package manager
    pub registry: Option<&'a str>,
}

/// External package manager capability
///
/// Implementations shell out to a package manager binary; failures surface
/// as opaque error text.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Currently authenticated user for `registry`
    async fn whoami(&self, registry: Option<&str>) -> anyhow::Result<String>;

    /// All published versions of `package`, in registry order
    async fn list_versions(&self, package: &str, registry: Option<&str>)
    -> anyhow::Result<Vec<String>>;

    /// Download the archive for `package@version` into `dest_dir`
    ///
    /// Returns the path of the downloaded archive.
    async fn fetch_archive(
        &self,
        package: &str,
        version: &str,
        registry: Option<&str>,
        dest_dir: &Path,
    ) -> anyhow::Result<PathBuf>;

    /// Publish the contents of `package_dir`
    async fn publish(&self, package_dir: &Path, request: &PublishRequest<'_>) -> anyhow::Result<()>;

    /// Human-readable form of the publish command, for dry runs
    fn describe_publish(&self, package_dir: &Path, request: &PublishRequest<'_>) -> String;
}
