// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration module

use crate::http::HttpConfig;
use crate::org::OrgProfile;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Project-local configuration file, relative to the working directory
pub const LOCAL_CONFIG: &str = ".apireq/config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Alias used when no `--target-org` is given
    #[serde(default)]
    pub default_org: Option<String>,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub orgs: HashMap<String, OrgProfile>,
}

impl Config {
    /// Load the first configuration file found, or the defaults when there is none
    pub fn load() -> Result<Self> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        for profile in config.orgs.values_mut() {
            profile.instance_url = resolve_env_vars(&profile.instance_url)?;
            for value in [
                &mut profile.access_token,
                &mut profile.refresh_token,
                &mut profile.client_id,
            ]
            .into_iter()
            .flatten()
            {
                *value = resolve_env_vars(value)?;
            }
        }

        Ok(config)
    }

    /// `.apireq/config.toml`, then `<config dir>/apireq/config.toml`
    pub fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("apireq").join("config.toml"))
            .filter(|path| path.exists())
    }
}

/// Replace `${VAR}` with the variable's value; unset variables are left as written
fn resolve_env_vars(value: &str) -> Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")?;

    let resolved = re.replace_all(value, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    Ok(resolved.into_owned())
}
