// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Org connections: instance URL, access token and API version discovery

mod connection;

pub use connection::ConfiguredOrg;

use crate::config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Credentials and session handling for one remote org
#[async_trait]
pub trait OrgConnection: Send + Sync {
    /// Make sure the access token is current
    async fn refresh_auth(&mut self) -> Result<(), OrgError>;

    /// Highest API version the instance supports, e.g. `60.0`
    async fn retrieve_max_api_version(&self) -> Result<String, OrgError>;

    fn instance_url(&self) -> &str;

    fn access_token(&self) -> Result<&str, OrgError>;
}

/// Connection settings for one org, as stored under `[orgs.<alias>]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgProfile {
    pub instance_url: String,
    pub access_token: Option<String>,
    /// Pins the API version instead of asking the instance
    pub api_version: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
}

/// How the user picked an org on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct OrgSelector<'a> {
    pub target_org: Option<&'a str>,
    pub instance_url: Option<&'a str>,
    pub access_token: Option<&'a str>,
}

#[derive(Debug, thiserror::Error)]
pub enum OrgError {
    #[error("No target org specified.")]
    NoTargetOrg,

    #[error("No org configuration found for alias \"{0}\".")]
    UnknownOrg(String),

    #[error("No access token available for {0}.")]
    MissingToken(String),

    #[error("Failed to refresh the access token for {alias}: {reason}")]
    Refresh { alias: String, reason: String },

    #[error("Failed to retrieve the API versions of {instance}: {reason}")]
    VersionLookup { instance: String, reason: String },

    #[error("Network error")]
    Network(#[from] reqwest::Error),
}

impl OrgError {
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoTargetOrg | Self::UnknownOrg(_) => Some(
                "Pass --target-org <alias> for an org in .apireq/config.toml, or --instance-url and --access-token",
            ),
            Self::MissingToken(_) => {
                Some("Set access_token for the org, or pass --access-token (APIREQ_ACCESS_TOKEN)")
            }
            _ => None,
        }
    }
}

/// Explicit instance URL, then `--target-org`, then the configured default org
pub fn resolve_profile(
    config: &Config,
    selector: &OrgSelector<'_>,
) -> Result<(String, OrgProfile), OrgError> {
    if let Some(instance_url) = selector.instance_url {
        let profile = OrgProfile {
            instance_url: instance_url.to_string(),
            access_token: selector.access_token.map(str::to_string),
            ..Default::default()
        };
        return Ok((instance_url.to_string(), profile));
    }

    let alias = selector
        .target_org
        .or(config.default_org.as_deref())
        .ok_or(OrgError::NoTargetOrg)?;

    let mut profile = config
        .orgs
        .get(alias)
        .cloned()
        .ok_or_else(|| OrgError::UnknownOrg(alias.to_string()))?;

    if let Some(token) = selector.access_token {
        profile.access_token = Some(token.to_string());
    }

    Ok((alias.to_string(), profile))
}

/// Explicit `--api-version`, otherwise whatever the org reports
pub async fn resolve_api_version(
    flag: Option<&str>,
    org: &dyn OrgConnection,
) -> Result<String, OrgError> {
    match flag {
        Some(version) => Ok(version.trim_start_matches('v').to_string()),
        None => org.retrieve_max_api_version().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config::default();
        config.default_org = Some("dev".into());
        config.orgs.insert(
            "dev".into(),
            OrgProfile {
                instance_url: "https://dev.example.com".into(),
                access_token: Some("dev-token".into()),
                ..Default::default()
            },
        );
        config.orgs.insert(
            "prod".into(),
            OrgProfile {
                instance_url: "https://prod.example.com".into(),
                access_token: Some("prod-token".into()),
                ..Default::default()
            },
        );
        config
    }

    #[test]
    fn test_explicit_instance_wins() {
        let (alias, profile) = resolve_profile(
            &config(),
            &OrgSelector {
                target_org: Some("prod"),
                instance_url: Some("http://127.0.0.1:9999"),
                access_token: Some("t"),
            },
        )
        .unwrap();

        assert_eq!(alias, "http://127.0.0.1:9999");
        assert_eq!(profile.instance_url, "http://127.0.0.1:9999");
        assert_eq!(profile.access_token.as_deref(), Some("t"));
    }

    #[test]
    fn test_target_org_then_default() {
        let config = config();

        let (alias, _) = resolve_profile(
            &config,
            &OrgSelector {
                target_org: Some("prod"),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(alias, "prod");

        let (alias, profile) = resolve_profile(&config, &OrgSelector::default()).unwrap();
        assert_eq!(alias, "dev");
        assert_eq!(profile.access_token.as_deref(), Some("dev-token"));
    }

    #[test]
    fn test_token_flag_overrides_profile_token() {
        let (_, profile) = resolve_profile(
            &config(),
            &OrgSelector {
                target_org: Some("dev"),
                access_token: Some("override"),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(profile.access_token.as_deref(), Some("override"));
    }

    #[test]
    fn test_unknown_and_missing_org() {
        let err = resolve_profile(
            &config(),
            &OrgSelector {
                target_org: Some("qa"),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, OrgError::UnknownOrg(ref a) if a == "qa"));
        assert!(err.hint().is_some());

        let err = resolve_profile(&Config::default(), &OrgSelector::default()).unwrap_err();
        assert!(matches!(err, OrgError::NoTargetOrg));
    }
}
