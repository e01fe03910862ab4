// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Org connection backed by a configured profile

use super::{OrgConnection, OrgError, OrgProfile};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

pub struct ConfiguredOrg {
    alias: String,
    profile: OrgProfile,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ApiVersion {
    version: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    instance_url: Option<String>,
}

impl ConfiguredOrg {
    pub fn new(alias: String, profile: OrgProfile, http: reqwest::Client) -> Self {
        Self {
            alias,
            profile,
            http,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.profile.instance_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl OrgConnection for ConfiguredOrg {
    async fn refresh_auth(&mut self) -> Result<(), OrgError> {
        let (Some(refresh_token), Some(client_id)) =
            (&self.profile.refresh_token, &self.profile.client_id)
        else {
            debug!(org = %self.alias, "no refresh token configured, using stored access token");
            return Ok(());
        };

        let refresh_err = |reason: String| OrgError::Refresh {
            alias: self.alias.clone(),
            reason,
        };

        let response = self
            .http
            .post(self.endpoint("/services/oauth2/token"))
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", client_id.as_str()),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(refresh_err(format!("{} {}", status.as_u16(), body.trim())));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| refresh_err(e.to_string()))?;

        info!(org = %self.alias, "access token refreshed");
        self.profile.access_token = Some(token.access_token);
        if let Some(instance_url) = token.instance_url {
            self.profile.instance_url = instance_url;
        }

        Ok(())
    }

    async fn retrieve_max_api_version(&self) -> Result<String, OrgError> {
        if let Some(version) = &self.profile.api_version {
            return Ok(version.trim_start_matches('v').to_string());
        }

        let lookup_err = |reason: String| OrgError::VersionLookup {
            instance: self.profile.instance_url.clone(),
            reason,
        };

        let mut request = self.http.get(self.endpoint("/services/data"));
        if let Some(token) = &self.profile.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(lookup_err(format!("status {}", response.status().as_u16())));
        }

        let versions: Vec<ApiVersion> = response
            .json()
            .await
            .map_err(|e| lookup_err(e.to_string()))?;

        let newest = newest_version(&versions)
            .ok_or_else(|| lookup_err("no API versions reported".to_string()))?;

        debug!(org = %self.alias, version = newest, "detected max API version");
        Ok(newest.to_string())
    }

    fn instance_url(&self) -> &str {
        &self.profile.instance_url
    }

    fn access_token(&self) -> Result<&str, OrgError> {
        self.profile
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OrgError::MissingToken(self.alias.clone()))
    }
}

/// Numeric comparison, so `100.0` sorts above `99.0`
fn newest_version(versions: &[ApiVersion]) -> Option<&str> {
    versions
        .iter()
        .filter_map(|v| {
            let (major, minor) = v.version.split_once('.').unwrap_or((v.version.as_str(), "0"));
            let key = (major.parse::<u32>().ok()?, minor.parse::<u32>().ok()?);
            Some((key, v.version.as_str()))
        })
        .max_by_key(|(key, _)| *key)
        .map(|(_, version)| version)
}
