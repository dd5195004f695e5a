//! Configuration structures and types for republish-npm
//!
//! This module provides the typed settings for a run: the access level, the
//! registry selection, and the optional YAML configuration file.

use crate::core::error::RepublishError;
use crate::selection::version_selector::parse_list;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// npm package access level
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Restricted,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Restricted => "restricted",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Access {
    type Err = RepublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Access::Public),
            "restricted" => Ok(Access::Restricted),
            other => Err(RepublishError::usage(format!(
                "--access only supports public|restricted, got: {}",
                other
            ))),
        }
    }
}

/// Where versions are read from and published to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySelection {
    /// No registry given: npm uses its own configuration (.npmrc, environment)
    Default,

    /// One registry for both the source and the target
    Shared(String),

    /// Separate source registry, one or more target registries
    Split { from: String, to: Vec<String> },
}

impl RegistrySelection {
    /// Build the selection from the three registry flags.
    ///
    /// `--from-registry` and `--to-registry` must be given together and never
    /// alongside `--registry`. Blank values count as absent.
    pub fn from_flags(
        registry: Option<&str>,
        from_registry: Option<&str>,
        to_registry: Option<&str>,
    ) -> Result<Self, RepublishError> {
        let registry = non_blank(registry);
        let from_registry = non_blank(from_registry);
        let to_registry = non_blank(to_registry);

        match (registry, from_registry, to_registry) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(RepublishError::usage(
                "--registry cannot be combined with --from-registry/--to-registry",
            )),
            (None, Some(_), None) | (None, None, Some(_)) => Err(RepublishError::usage(
                "--from-registry and --to-registry must be used together",
            )),
            (None, Some(from), Some(to)) => {
                let targets = parse_list(to);
                if targets.is_empty() {
                    return Err(RepublishError::usage(
                        "--to-registry needs at least one registry url",
                    ));
                }
                Ok(RegistrySelection::Split {
                    from: from.to_string(),
                    to: targets,
                })
            }
            (Some(shared), None, None) => Ok(RegistrySelection::Shared(shared.to_string())),
            (None, None, None) => Ok(RegistrySelection::Default),
        }
    }

    /// Registry the source versions are read from (`None` = npm default)
    pub fn source(&self) -> Option<&str> {
        match self {
            RegistrySelection::Default => None,
            RegistrySelection::Shared(url) => Some(url),
            RegistrySelection::Split { from, .. } => Some(from),
        }
    }

    /// Registries each version is published to, in order
    pub fn targets(&self) -> Vec<Option<&str>> {
        match self {
            RegistrySelection::Default => vec![None],
            RegistrySelection::Shared(url) => vec![Some(url.as_str())],
            RegistrySelection::Split { to, .. } => to.iter().map(|url| Some(url.as_str())).collect(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Label used in log lines for an optional registry
pub fn registry_label(registry: Option<&str>) -> &str {
    registry.unwrap_or("npm default registry")
}

/// Configuration file contents (`.republish.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepublishConfig {
    /// Shared source/target registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Source registry (requires `toRegistries`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_registry: Option<String>,

    /// Target registries (requires `fromRegistry`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_registries: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_scripts: Option<bool>,

    /// Base directory for the per-run temporary tree (default: system temp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

impl RepublishConfig {
    /// Whether any registry field is set
    pub fn has_registry_settings(&self) -> bool {
        self.registry.is_some() || self.from_registry.is_some() || self.to_registries.is_some()
    }

    /// Validate the registry fields with the same rules as the CLI flags
    pub fn registry_selection(&self) -> Result<RegistrySelection, RepublishError> {
        let to = self.to_registries.as_ref().map(|list| list.join(","));
        RegistrySelection::from_flags(
            self.registry.as_deref(),
            self.from_registry.as_deref(),
            to.as_deref(),
        )
        .map_err(|e| RepublishError::Config(e.to_string()))
    }

    /// Combine this configuration with the command line flags (flags win).
    pub fn resolve(self, flags: &CliFlags) -> Result<Settings, RepublishError> {
        let cli_registries = non_blank(flags.registry.as_deref()).is_some()
            || non_blank(flags.from_registry.as_deref()).is_some()
            || non_blank(flags.to_registry.as_deref()).is_some();
        let registries = if cli_registries {
            RegistrySelection::from_flags(
                flags.registry.as_deref(),
                flags.from_registry.as_deref(),
                flags.to_registry.as_deref(),
            )?
        } else {
            self.registry_selection()?
        };

        let access = match flags.access.as_deref() {
            Some(raw) => raw.parse()?,
            None => self.access.unwrap_or_default(),
        };

        Ok(Settings {
            registries,
            access,
            tag: non_blank(flags.tag.as_deref())
                .map(str::to_string)
                .or(self.tag),
            keep_scripts: flags.keep_scripts || self.keep_scripts.unwrap_or(false),
            temp_dir: self.temp_dir,
        })
    }
}

/// Raw command line values that override the configuration file
#[derive(Debug, Clone, Default)]
pub struct CliFlags {
    pub registry: Option<String>,
    pub from_registry: Option<String>,
    pub to_registry: Option<String>,
    pub access: Option<String>,
    pub tag: Option<String>,
    pub keep_scripts: bool,
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub registries: RegistrySelection,
    pub access: Access,
    pub tag: Option<String>,
    pub keep_scripts: bool,
    pub temp_dir: Option<PathBuf>,
}
