//! Configuration file loader for republish-npm
//!
//! Loads `.republish.yaml` from the home and project directories, an optional
//! explicit file and the environment, and merges them by priority.

use super::config::*;
use crate::core::error::RepublishError;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
const CONFIG_FILENAME: &str = ".republish.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Directory holding the project config (usually the current directory)
    pub project_path: PathBuf,

    /// File given with `--config`; must exist when set
    pub explicit_file: Option<PathBuf>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. Environment variables
    /// 2. Explicit `--config` file
    /// 3. Project config (./.republish.yaml)
    /// 4. Global config (~/.republish.yaml)
    /// 5. Default values
    ///
    /// Command line flags are applied afterwards by [`RepublishConfig::resolve`].
    pub async fn load(options: ConfigLoadOptions) -> Result<RepublishConfig, RepublishError> {
        let mut configs: Vec<RepublishConfig> = vec![RepublishConfig::default()];

        if let Some(home) = options.env.get("HOME") {
            let global_path = PathBuf::from(home).join(CONFIG_FILENAME);
            if let Some(global_config) = Self::load_config_file(&global_path).await? {
                configs.push(global_config);
            }
        }

        let project_path = options.project_path.join(CONFIG_FILENAME);
        if let Some(project_config) = Self::load_config_file(&project_path).await? {
            configs.push(project_config);
        }

        if let Some(explicit) = &options.explicit_file {
            match Self::load_config_file(explicit).await? {
                Some(config) => configs.push(config),
                None => {
                    return Err(RepublishError::Config(format!(
                        "config file not found: {}",
                        explicit.display()
                    )));
                }
            }
        }

        if let Some(env_config) = Self::load_env_config(&options.env)? {
            configs.push(env_config);
        }

        let merged = Self::merge_configs(configs);
        Ok(Self::expand_env_vars(merged, &options.env))
    }

    /// Load configuration from a YAML file, `None` if it does not exist
    async fn load_config_file(file_path: &Path) -> Result<Option<RepublishConfig>, RepublishError> {
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(file_path).await.map_err(|e| {
            RepublishError::Config(format!("failed to read {}: {}", file_path.display(), e))
        })?;

        // An empty file is an empty configuration
        if content.trim().is_empty() {
            return Ok(Some(RepublishConfig::default()));
        }

        let config = serde_yaml::from_str(&content).map_err(|e| {
            RepublishError::Config(format!("failed to parse {}: {}", file_path.display(), e))
        })?;

        tracing::debug!(path = %file_path.display(), "loaded configuration file");
        Ok(Some(config))
    }

    /// Load configuration from environment variables
    fn load_env_config(
        env: &HashMap<String, String>,
    ) -> Result<Option<RepublishConfig>, RepublishError> {
        let mut config = RepublishConfig::default();
        let mut has_changes = false;

        // REPUBLISH_REGISTRY -> registry
        if let Some(registry) = env.get("REPUBLISH_REGISTRY").filter(|v| !v.trim().is_empty()) {
            config.registry = Some(registry.clone());
            has_changes = true;
        }

        // REPUBLISH_ACCESS -> access
        if let Some(access) = env.get("REPUBLISH_ACCESS") {
            config.access = Some(access.parse()?);
            has_changes = true;
        }

        // REPUBLISH_TAG -> tag
        if let Some(tag) = env.get("REPUBLISH_TAG").filter(|v| !v.trim().is_empty()) {
            config.tag = Some(tag.clone());
            has_changes = true;
        }

        Ok(if has_changes { Some(config) } else { None })
    }

    /// Merge multiple configurations with priority
    fn merge_configs(configs: Vec<RepublishConfig>) -> RepublishConfig {
        let mut result = RepublishConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target
    fn merge_into(target: &mut RepublishConfig, source: RepublishConfig) {
        // Registry fields travel together so a shared registry from one layer
        // never mixes with a split pair from another.
        if source.has_registry_settings() {
            target.registry = source.registry;
            target.from_registry = source.from_registry;
            target.to_registries = source.to_registries;
        }

        if source.access.is_some() {
            target.access = source.access;
        }
        if source.tag.is_some() {
            target.tag = source.tag;
        }
        if source.keep_scripts.is_some() {
            target.keep_scripts = source.keep_scripts;
        }
        if source.temp_dir.is_some() {
            target.temp_dir = source.temp_dir;
        }
    }

    /// Expand `${VAR}` references in registry urls
    fn expand_env_vars(mut config: RepublishConfig, env: &HashMap<String, String>) -> RepublishConfig {
        let pattern = match Regex::new(ENV_VAR_PATTERN) {
            Ok(pattern) => pattern,
            Err(_) => return config,
        };

        config.registry = config
            .registry
            .map(|url| Self::expand_string(&pattern, &url, env));
        config.from_registry = config
            .from_registry
            .map(|url| Self::expand_string(&pattern, &url, env));
        config.to_registries = config.to_registries.map(|urls| {
            urls.iter()
                .map(|url| Self::expand_string(&pattern, url, env))
                .collect()
        });

        config
    }

    /// Expand environment variables in a single string
    fn expand_string(pattern: &Regex, input: &str, env: &HashMap<String, String>) -> String {
        let mut result = input.to_string();
        for cap in pattern.captures_iter(input) {
            let var_name = &cap[1];

            match env.get(var_name) {
                Some(value) => {
                    result = result.replace(&format!("${{{}}}", var_name), value);
                }
                None => {
                    tracing::warn!(variable = var_name, "environment variable not set, left unexpanded");
                }
            }
        }

        result
    }
}
