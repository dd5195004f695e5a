//! NPM Plugin - npm CLI implementation of [`PackageManager`]
//!
//! Every registry interaction is an `npm` invocation:
//! - `npm whoami` for the advisory identity check
//! - `npm view <pkg> versions --json` for the version list
//! - `npm pack <pkg>@<version>` to download an archive
//! - `npm publish --access <a> [--tag <t>]` from the extracted directory
//!
//! A registry, when given, is passed through as `--registry <url>`; without
//! one npm falls back to its own configuration (.npmrc, environment).

use crate::core::error::RepublishError;
use crate::core::traits::{PackageManager, PublishRequest};
use crate::security::command_executor::SafeCommandExecutor;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

const NPM: &str = "npm";

/// npm CLI backed package manager
pub struct NpmPlugin {
    executor: SafeCommandExecutor,
    /// Directory for commands that do not need a specific one
    working_dir: PathBuf,
}

impl Default for NpmPlugin {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl NpmPlugin {
    /// Create a new npm plugin running directory-independent commands in `working_dir`
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            executor: SafeCommandExecutor::new(),
            working_dir: working_dir.into(),
        }
    }

    async fn npm(&self, args: &[String], cwd: &Path) -> anyhow::Result<String> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Ok(self.executor.run(NPM, &args, cwd).await?)
    }
}

/// Append `--registry <url>` when a registry is given
fn with_registry(mut args: Vec<String>, registry: Option<&str>) -> Vec<String> {
    if let Some(registry) = registry {
        args.push("--registry".to_string());
        args.push(registry.to_string());
    }
    args
}

/// Arguments of `npm publish` for `request`
fn publish_args(request: &PublishRequest<'_>) -> Vec<String> {
    let mut args = vec![
        "publish".to_string(),
        "--access".to_string(),
        request.access.as_str().to_string(),
    ];

    if let Some(tag) = request.tag {
        args.push("--tag".to_string());
        args.push(tag.to_string());
    }

    with_registry(args, request.registry)
}

/// Parse the output of `npm view <pkg> versions --json`.
///
/// npm prints a JSON array, or a bare JSON string when only one version
/// exists. Anything unparsable but non-empty is taken as a single version.
pub fn parse_versions_output(output: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(output) {
        Ok(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Ok(Value::String(version)) => vec![version],
        Ok(_) => Vec::new(),
        Err(_) => {
            let version = output.replace('"', "");
            let version = version.trim();
            if version.is_empty() {
                Vec::new()
            } else {
                vec![version.to_string()]
            }
        }
    }
}

/// Tarball file name printed by `npm pack` (last line of stdout)
pub fn parse_pack_output(output: &str) -> Option<&str> {
    output
        .lines()
        .last()
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

#[async_trait]
impl PackageManager for NpmPlugin {
    async fn whoami(&self, registry: Option<&str>) -> anyhow::Result<String> {
        let args = with_registry(vec!["whoami".to_string()], registry);
        self.npm(&args, &self.working_dir).await
    }

    async fn list_versions(
        &self,
        package: &str,
        registry: Option<&str>,
    ) -> anyhow::Result<Vec<String>> {
        let args = with_registry(
            vec![
                "view".to_string(),
                package.to_string(),
                "versions".to_string(),
                "--json".to_string(),
            ],
            registry,
        );

        let output = self
            .npm(&args, &self.working_dir)
            .await
            .with_context(|| format!("failed to list versions of {}", package))?;

        Ok(parse_versions_output(&output))
    }

    async fn fetch_archive(
        &self,
        package: &str,
        version: &str,
        registry: Option<&str>,
        dest_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        let spec = format!("{}@{}", package, version);
        let args = with_registry(vec!["pack".to_string(), spec], registry);

        let output = self.npm(&args, dest_dir).await?;
        let file_name = parse_pack_output(&output)
            .ok_or_else(|| RepublishError::ArchiveNotFound(dest_dir.to_path_buf()))?;

        let archive = dest_dir.join(file_name);
        if !archive.is_file() {
            return Err(RepublishError::ArchiveNotFound(archive).into());
        }

        Ok(archive)
    }

    async fn publish(&self, package_dir: &Path, request: &PublishRequest<'_>) -> anyhow::Result<()> {
        self.npm(&publish_args(request), package_dir).await?;
        Ok(())
    }

    fn describe_publish(&self, package_dir: &Path, request: &PublishRequest<'_>) -> String {
        format!(
            "{} {} (cwd: {})",
            NPM,
            publish_args(request).join(" "),
            package_dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Access;

    #[test]
    fn test_parse_versions_array() {
        assert_eq!(
            parse_versions_output("[\n  \"1.0.0\",\n  \"1.1.0\",\n  \"2.0.0\"\n]"),
            vec!["1.0.0", "1.1.0", "2.0.0"]
        );
    }

    #[test]
    fn test_parse_versions_single_string() {
        assert_eq!(parse_versions_output("\"0.1.0\""), vec!["0.1.0"]);
    }

    #[test]
    fn test_parse_versions_bare_text_fallback() {
        assert_eq!(parse_versions_output("0.1.0\n"), vec!["0.1.0"]);
    }

    #[test]
    fn test_parse_versions_empty_output() {
        assert!(parse_versions_output("").is_empty());
        assert!(parse_versions_output("{}").is_empty());
    }

    #[test]
    fn test_parse_pack_output_takes_last_line() {
        let output = "npm notice 📦  old-pkg@1.0.0\nnpm notice total files: 3\nold-pkg-1.0.0.tgz";
        assert_eq!(parse_pack_output(output), Some("old-pkg-1.0.0.tgz"));
        assert_eq!(parse_pack_output(""), None);
    }

    #[test]
    fn test_publish_args_minimal() {
        let request = PublishRequest {
            access: Access::Public,
            tag: None,
            registry: None,
        };
        assert_eq!(publish_args(&request), vec!["publish", "--access", "public"]);
    }

    #[test]
    fn test_publish_args_full() {
        let request = PublishRequest {
            access: Access::Restricted,
            tag: Some("legacy"),
            registry: Some("https://npm.example"),
        };
        assert_eq!(
            publish_args(&request),
            vec![
                "publish",
                "--access",
                "restricted",
                "--tag",
                "legacy",
                "--registry",
                "https://npm.example"
            ]
        );
    }

    #[test]
    fn test_describe_publish() {
        let plugin = NpmPlugin::default();
        let request = PublishRequest {
            access: Access::Public,
            tag: Some("next"),
            registry: None,
        };

        assert_eq!(
            plugin.describe_publish(Path::new("/tmp/work/pkg/package"), &request),
            "npm publish --access public --tag next (cwd: /tmp/work/pkg/package)"
        );
    }

    #[tokio::test]
    async fn test_fetch_archive_rejects_missing_dest_dir() {
        let plugin = NpmPlugin::default();
        let result = plugin
            .fetch_archive("pkg", "1.0.0", None, Path::new("/nonexistent/pack/dir"))
            .await;

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Working directory does not exist"));
    }
}
