//! Republisher - drives the per-version pipeline
//!
//! For every selected version: fetch the archive from the source registry,
//! extract it, rewrite the manifest and publish it to each target registry.
//! Versions are processed one at a time; a failure is recorded and the loop
//! moves on, except for network-class failures which end the run.

use crate::archive::extractor::PackageExtractor;
use crate::core::config::{registry_label, Access, RegistrySelection, Settings};
use crate::core::error::RepublishError;
use crate::core::reporter::Reporter;
use crate::core::traits::{PackageManager, PublishRequest};
use crate::manifest::manifest_rewriter::ManifestRewriter;
use crate::orchestration::workspace::RunWorkspace;
use crate::security::network_classifier::NetworkClassifier;
use crate::selection::version_selector::VersionFilter;
use anyhow::Context;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Everything a run needs to know
#[derive(Debug, Clone)]
pub struct RepublishOptions {
    pub from: String,
    pub to: String,
    /// Raw include list (`--versions`)
    pub versions: Option<String>,
    /// Raw exclude list (`--exclude-versions`)
    pub exclude_versions: Option<String>,
    pub dry_run: bool,
    pub registries: RegistrySelection,
    pub access: Access,
    pub tag: Option<String>,
    pub keep_scripts: bool,
    pub temp_dir: Option<PathBuf>,
}

impl RepublishOptions {
    pub fn new(from: impl Into<String>, to: impl Into<String>, settings: Settings) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            versions: None,
            exclude_versions: None,
            dry_run: false,
            registries: settings.registries,
            access: settings.access,
            tag: settings.tag,
            keep_scripts: settings.keep_scripts,
            temp_dir: settings.temp_dir,
        }
    }
}

/// Result of one attempted version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published {
        /// Version that was asked for
        requested: String,
        /// Version the manifest declared, the one actually published
        version: String,
        /// Labels of the registries it went to
        registries: Vec<String>,
        dry_run: bool,
    },
    Failed {
        version: String,
        error: String,
    },
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Published { .. })
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcomes: Vec<PublishOutcome>,
    /// Versions never attempted because the run was aborted
    pub skipped: Vec<String>,
    /// Network error code that aborted the run
    pub aborted: Option<String>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                PublishOutcome::Failed { version, error } => Some((version.as_str(), error.as_str())),
                PublishOutcome::Published { .. } => None,
            })
            .collect()
    }

    pub fn success(&self) -> bool {
        self.failed().is_empty() && self.aborted.is_none()
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { 1 }
    }

    /// Print counts, failures and elapsed time
    pub fn report(&self, reporter: &dyn Reporter) {
        let failed = self.failed();
        reporter.info(&format!(
            "done in {:.1}s: {} succeeded, {} failed",
            self.elapsed.as_secs_f64(),
            self.succeeded(),
            failed.len()
        ));

        for (version, error) in &failed {
            reporter.error(&format!("  {}: {}", version, error));
        }

        if let Some(code) = &self.aborted {
            reporter.warn(&format!(
                "aborted on {}; {} version(s) not attempted: {}",
                code,
                self.skipped.len(),
                self.skipped.join(", ")
            ));
        }
    }
}

pub struct Republisher<'a> {
    manager: &'a dyn PackageManager,
    reporter: &'a dyn Reporter,
}

impl<'a> Republisher<'a> {
    pub fn new(manager: &'a dyn PackageManager, reporter: &'a dyn Reporter) -> Self {
        Self { manager, reporter }
    }

    /// Report the authenticated user of each target registry.
    ///
    /// Advisory only: a failure is a warning.
    pub async fn check_identity(&self, registries: &RegistrySelection) {
        for target in registries.targets() {
            let label = registry_label(target);
            match self.manager.whoami(target).await {
                Ok(user) => self
                    .reporter
                    .info(&format!("logged in as {} on {}", user, label)),
                Err(error) => self.reporter.warn(&format!(
                    "npm whoami failed on {} ({:#}); publishing will likely fail",
                    label, error
                )),
            }
        }
    }

    /// Republish every selected version of `options.from` as `options.to`.
    ///
    /// # Errors
    ///
    /// - `RepublishError::EmptyVersionList` when the registry reports no versions
    /// - `RepublishError::EmptySelection` when the filters leave nothing
    /// - the version listing or workspace setup failing
    ///
    /// Per-version failures are not errors; they are part of the summary.
    pub async fn run(&self, options: &RepublishOptions) -> anyhow::Result<RunSummary> {
        let started = Instant::now();
        let classifier = NetworkClassifier::new()?;

        let workspace = RunWorkspace::create(options.temp_dir.as_deref())?;
        tracing::debug!(root = %workspace.root().display(), "created workspace");
        self.reporter
            .info(&format!("working directory: {}", workspace.root().display()));

        let source = options.registries.source();
        self.reporter.info(&format!(
            "fetching versions of {} from {}",
            options.from,
            registry_label(source)
        ));
        let all = self
            .manager
            .list_versions(&options.from, source)
            .await
            .with_context(|| format!("could not list versions of {}", options.from))?;

        if all.is_empty() {
            return Err(RepublishError::EmptyVersionList {
                package: options.from.clone(),
            }
            .into());
        }

        let filter = VersionFilter::new(
            options.versions.as_deref(),
            options.exclude_versions.as_deref(),
        );
        for token in filter.unmatched_includes(&all) {
            self.reporter
                .warn(&format!("version {} is not published for {}", token, options.from));
        }

        let selected = filter.select(&all);
        let excluded = filter.excluded_count(&all);
        if excluded > 0 {
            self.reporter
                .info(&format!("excluded {} version(s)", excluded));
        }
        if selected.is_empty() {
            return Err(RepublishError::EmptySelection.into());
        }

        self.reporter.info(&format!(
            "{} version(s) to republish as {}: {}",
            selected.len(),
            options.to,
            selected.join(", ")
        ));

        let total = selected.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        let mut aborted = None;

        for (index, version) in selected.iter().enumerate() {
            let progress = format!("[{}/{}]", index + 1, total);

            match self
                .process_version(options, &workspace, index, version, &progress)
                .await
            {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => {
                    let message = format!("{:#}", error);
                    self.reporter
                        .error(&format!("{} {}@{} failed: {}", progress, options.to, version, message));

                    let network = classifier.matched_code(&message);
                    outcomes.push(PublishOutcome::Failed {
                        version: version.clone(),
                        error: message,
                    });

                    if let Some(code) = network {
                        self.reporter
                            .error(&format!("network error ({}), stopping", code));
                        skipped = selected[index + 1..].to_vec();
                        aborted = Some(code.to_string());
                        break;
                    }
                }
            }
        }

        let summary = RunSummary {
            outcomes,
            skipped,
            aborted,
            elapsed: started.elapsed(),
        };
        summary.report(self.reporter);

        Ok(summary)
    }

    async fn process_version(
        &self,
        options: &RepublishOptions,
        workspace: &RunWorkspace,
        index: usize,
        version: &str,
        progress: &str,
    ) -> anyhow::Result<PublishOutcome> {
        let (pack_dir, work_dir) = workspace.version_dirs(index, version)?;
        let source = options.registries.source();

        self.reporter
            .info(&format!("{} packing {}@{}", progress, options.from, version));
        let archive = self
            .manager
            .fetch_archive(&options.from, version, source, &pack_dir)
            .await
            .with_context(|| format!("npm pack {}@{} failed", options.from, version))?;

        let package_dir = PackageExtractor::new(&work_dir).extract(&archive)?;

        let report = ManifestRewriter::new(options.keep_scripts).rewrite(&package_dir, &options.to)?;
        if !report.removed_scripts.is_empty() {
            self.reporter.info(&format!(
                "{} removed scripts: {}",
                progress,
                report.removed_scripts.join(", ")
            ));
        }
        if let Some(registry) = &report.removed_registry {
            self.reporter.info(&format!(
                "{} removed publishConfig.registry ({})",
                progress, registry
            ));
        }
        if report.version != version {
            self.reporter.warn(&format!(
                "{} package.json declares {} for requested {}; publishing {}",
                progress, report.version, version, report.version
            ));
        }

        let targets = options.registries.targets();

        if options.dry_run {
            for target in &targets {
                let request = PublishRequest {
                    access: options.access,
                    tag: options.tag.as_deref(),
                    registry: *target,
                };
                self.reporter.info(&format!(
                    "{} [dry-run] {}",
                    progress,
                    self.manager.describe_publish(&package_dir, &request)
                ));
            }

            return Ok(PublishOutcome::Published {
                requested: version.to_string(),
                version: report.version,
                registries: targets.iter().map(|t| registry_label(*t).to_string()).collect(),
                dry_run: true,
            });
        }

        let mut published = Vec::new();
        let mut failures = Vec::new();

        for target in targets {
            let label = registry_label(target);
            let request = PublishRequest {
                access: options.access,
                tag: options.tag.as_deref(),
                registry: target,
            };

            self.reporter.info(&format!(
                "{} publishing {}@{} to {}",
                progress, options.to, report.version, label
            ));
            match self.manager.publish(&package_dir, &request).await {
                Ok(()) => {
                    self.reporter.success(&format!(
                        "{} published {}@{} to {}",
                        progress, options.to, report.version, label
                    ));
                    published.push(label.to_string());
                }
                Err(error) => failures.push(format!("publish to {} failed: {:#}", label, error)),
            }
        }

        if !failures.is_empty() {
            anyhow::bail!("{}", failures.join("; "));
        }

        Ok(PublishOutcome::Published {
            requested: version.to_string(),
            version: report.version,
            registries: published,
            dry_run: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reporter::{MemoryReporter, ReportLevel};

    fn summary(outcomes: Vec<PublishOutcome>, aborted: Option<&str>) -> RunSummary {
        RunSummary {
            outcomes,
            skipped: Vec::new(),
            aborted: aborted.map(str::to_string),
            elapsed: Duration::from_millis(1500),
        }
    }

    fn published(version: &str) -> PublishOutcome {
        PublishOutcome::Published {
            requested: version.to_string(),
            version: version.to_string(),
            registries: vec!["npm default registry".to_string()],
            dry_run: false,
        }
    }

    fn failed(version: &str, error: &str) -> PublishOutcome {
        PublishOutcome::Failed {
            version: version.to_string(),
            error: error.to_string(),
        }
    }

    #[test]
    fn test_all_published_exits_zero() {
        let summary = summary(vec![published("1.0.0"), published("2.0.0")], None);
        assert_eq!(summary.succeeded(), 2);
        assert!(summary.success());
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_any_failure_exits_one() {
        let summary = summary(
            vec![failed("1.0.0", "npm ERR! 403"), published("2.0.0")],
            None,
        );
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), vec![("1.0.0", "npm ERR! 403")]);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_report_lists_failures_and_abort() {
        let mut summary = summary(vec![failed("1.0.0", "connect ETIMEDOUT")], Some("ETIMEDOUT"));
        summary.skipped = vec!["1.1.0".to_string(), "2.0.0".to_string()];

        let reporter = MemoryReporter::new();
        summary.report(&reporter);

        assert!(reporter.contains(ReportLevel::Info, "done in 1.5s: 0 succeeded, 1 failed"));
        assert!(reporter.contains(ReportLevel::Error, "1.0.0: connect ETIMEDOUT"));
        assert!(reporter.contains(ReportLevel::Warn, "not attempted: 1.1.0, 2.0.0"));
    }

    #[test]
    fn test_options_from_settings() {
        let settings = Settings {
            registries: RegistrySelection::Shared("https://npm.example".to_string()),
            access: Access::Restricted,
            tag: Some("legacy".to_string()),
            keep_scripts: true,
            temp_dir: None,
        };

        let options = RepublishOptions::new("old", "new", settings);
        assert_eq!(options.from, "old");
        assert_eq!(options.access, Access::Restricted);
        assert_eq!(options.tag.as_deref(), Some("legacy"));
        assert!(options.keep_scripts);
        assert!(!options.dry_run);
        assert!(options.versions.is_none());
    }
}
