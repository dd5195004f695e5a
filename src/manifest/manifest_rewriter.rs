//! Manifest Rewriter - prepares an extracted package for republishing
//!
//! Renames the package in `package.json`, strips lifecycle hooks that would
//! run (and usually fail) during `npm publish` of an already-built tarball,
//! and drops any `publishConfig.registry` override so the target registry is
//! decided by the command line alone.
//!
//! Key order of the original document is kept and the file is written back
//! pretty-printed with a trailing newline.

use crate::core::error::RepublishError;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Manifest file inside an extracted package
pub const MANIFEST_FILE: &str = "package.json";

/// Lifecycle scripts removed unless scripts are kept
pub const UNSAFE_SCRIPTS: &[&str] = &["prepublishOnly", "prepublish", "prepare", "prepack"];

/// What a rewrite changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    /// Version declared by the manifest itself
    pub version: String,
    /// Name before the rewrite, if the manifest had one
    pub previous_name: Option<String>,
    /// Lifecycle scripts that were removed, in removal order
    pub removed_scripts: Vec<String>,
    /// Value of the stripped `publishConfig.registry`
    pub removed_registry: Option<String>,
}

/// Rewrites `package.json` documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestRewriter {
    keep_scripts: bool,
}

impl ManifestRewriter {
    pub fn new(keep_scripts: bool) -> Self {
        Self { keep_scripts }
    }

    /// Rewrite `<package_dir>/package.json` in place.
    ///
    /// # Errors
    ///
    /// - `RepublishError::ManifestParse` when the file is not a JSON object
    /// - `RepublishError::ManifestField` when `version` is missing or not a string
    /// - `RepublishError::Io` when the file cannot be read or written
    pub fn rewrite(&self, package_dir: &Path, new_name: &str) -> Result<RewriteReport, RepublishError> {
        let path = package_dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path)?;

        let value: Value =
            serde_json::from_str(&content).map_err(|e| RepublishError::ManifestParse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        let Value::Object(mut document) = value else {
            return Err(RepublishError::ManifestParse {
                path,
                message: "expected a JSON object at the top level".to_string(),
            });
        };

        let report =
            self.rewrite_document(&mut document, new_name)
                .map_err(|(field, message)| RepublishError::ManifestField {
                    path: path.clone(),
                    field,
                    message,
                })?;

        let mut serialized = serde_json::to_string_pretty(&Value::Object(document)).map_err(|e| {
            RepublishError::ManifestParse {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;
        serialized.push('\n');
        fs::write(&path, serialized)?;

        Ok(report)
    }

    /// Apply the rewrite rules to an already parsed document
    fn rewrite_document(
        &self,
        document: &mut Map<String, Value>,
        new_name: &str,
    ) -> Result<RewriteReport, (&'static str, String)> {
        let version = match document.get("version") {
            Some(Value::String(version)) => version.clone(),
            Some(_) => return Err(("version", "must be a string".to_string())),
            None => return Err(("version", "is missing".to_string())),
        };

        let previous_name = document
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        // Existing key keeps its position, a missing one is appended
        document.insert("name".to_string(), Value::String(new_name.to_string()));

        let removed_scripts = if self.keep_scripts {
            Vec::new()
        } else {
            strip_unsafe_scripts(document)
        };

        let removed_registry = strip_registry_override(document);

        Ok(RewriteReport {
            version,
            previous_name,
            removed_scripts,
            removed_registry,
        })
    }
}

/// Remove unsafe lifecycle scripts; drop `scripts` when it ends up empty
fn strip_unsafe_scripts(document: &mut Map<String, Value>) -> Vec<String> {
    let Some(Value::Object(scripts)) = document.get_mut("scripts") else {
        return Vec::new();
    };

    let removed: Vec<String> = UNSAFE_SCRIPTS
        .iter()
        .filter(|name| scripts.shift_remove(**name).is_some())
        .map(|name| name.to_string())
        .collect();

    if scripts.is_empty() {
        document.shift_remove("scripts");
    }

    removed
}

/// Remove `publishConfig.registry`; drop `publishConfig` when it ends up empty
fn strip_registry_override(document: &mut Map<String, Value>) -> Option<String> {
    let Some(Value::Object(publish_config)) = document.get_mut("publishConfig") else {
        return None;
    };

    let removed = publish_config.shift_remove("registry")?;
    if publish_config.is_empty() {
        document.shift_remove("publishConfig");
    }

    Some(match removed {
        Value::String(url) => url,
        other => other.to_string(),
    })
}

/// Rewrite `<package_dir>/package.json` with a one-off rewriter
pub fn rewrite(
    package_dir: &Path,
    new_name: &str,
    keep_scripts: bool,
) -> Result<RewriteReport, RepublishError> {
    ManifestRewriter::new(keep_scripts).rewrite(package_dir, new_name)
}
