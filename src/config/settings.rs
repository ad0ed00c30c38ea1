// src/config/settings.rs
use anyhow::{anyhow, Context, Result};
use ::config::{Config, Environment, File};
use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};

use super::schema::{Format, NamingPolicy};

/// Layered settings used to build a [`NamingPolicy`].
///
/// Sources, lowest priority first: built-in defaults, an optional settings
/// file, then `GENERIC_SAVE_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub app_name: String,
    pub format: Format,
    pub default_base_name: String,
    pub external_base_name: String,
    pub folder_name: String,
    pub default_root: Option<PathBuf>,
    pub external_root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let policy = NamingPolicy::default();
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            format: policy.format,
            default_base_name: policy.default_base_name,
            external_base_name: policy.external_base_name,
            folder_name: policy.folder_name,
            default_root: None,
            external_root: None,
        }
    }
}

impl Settings {
    pub const ENV_PREFIX: &'static str = "GENERIC_SAVE";
    /// Settings file looked up in the working directory when no explicit
    /// path is given. Any extension `config` understands is accepted.
    pub const FILE_STEM: &'static str = "generic-save";

    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, Environment::with_prefix(Self::ENV_PREFIX))
    }

    /// Like [`Settings::load`], with the environment layer supplied by the
    /// caller (for example an `Environment` with an explicit `source` map).
    pub fn load_with(path: Option<&Path>, environment: Environment) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(Self::FILE_STEM).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Failed to parse settings")
    }

    /// Resolve the storage roots and build the policy.
    ///
    /// The default root falls back to an `assets` directory next to the
    /// executable and the external root to the platform's local data
    /// directory.
    pub fn into_policy(self) -> Result<NamingPolicy> {
        let default_root = match self.default_root {
            Some(root) => root,
            None => bundled_root()?,
        };
        let external_root = match self.external_root {
            Some(root) => root,
            None => dirs::data_local_dir()
                .ok_or_else(|| anyhow!("No local data directory available on this platform"))?
                .join(&self.app_name),
        };

        let policy = NamingPolicy {
            format: self.format,
            default_base_name: self.default_base_name,
            external_base_name: self.external_base_name,
            folder_name: self.folder_name,
            default_root,
            external_root,
        };

        if policy.roots_collide() {
            return Err(anyhow!(
                "Default and external roots must differ: {}",
                policy.default_root.display()
            ));
        }

        Ok(policy)
    }
}

fn bundled_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let dir = exe.parent()
        .ok_or_else(|| anyhow!("Invalid executable path: {}", exe.display()))?;
    Ok(dir.join("assets"))
}
