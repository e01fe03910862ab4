// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI module - Command line interface definitions and handlers

pub mod completions;
pub mod config;
pub mod graphql;
pub mod rest;

use crate::config::Config;
use crate::http::Client;
use crate::org::{self, ConfiguredOrg, OrgSelector};
use crate::output::{self, Renderer};
use crate::request::{Method, RequestSpec};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// apireq - authenticated REST and GraphQL requests against an org's API
#[derive(Parser, Debug)]
#[command(name = "apireq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub org: OrgArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Which org to talk to
#[derive(Args, Debug, Clone, Default)]
pub struct OrgArgs {
    /// Alias of an org configured in .apireq/config.toml
    #[arg(short = 'o', long, global = true, env = "APIREQ_TARGET_ORG")]
    pub target_org: Option<String>,

    /// Instance URL to use instead of a configured org
    #[arg(long, global = true, env = "APIREQ_INSTANCE_URL")]
    pub instance_url: Option<String>,

    /// Access token to send as the bearer credential
    #[arg(long, global = true, env = "APIREQ_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
}

impl OrgArgs {
    pub fn selector(&self) -> OrgSelector<'_> {
        OrgSelector {
            target_org: self.target_org.as_deref(),
            instance_url: self.instance_url.as_deref(),
            access_token: self.access_token.as_deref(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Make an authenticated HTTP request to the REST API
    Rest {
        /// API endpoint, relative to /services/data/v<version>/ (e.g. "limits")
        endpoint: Option<String>,

        /// HTTP method [default: GET]
        #[arg(short = 'X', long)]
        method: Option<Method>,

        /// HTTP header in "key:value" format
        #[arg(short = 'H', long = "header", value_name = "key:value")]
        headers: Vec<String>,

        /// JSON request file with url, method, header and body defaults
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Request body: a file path, "-" for stdin, or the body itself
        #[arg(long, value_name = "file")]
        body: Option<String>,

        /// Stream the response body to this file
        #[arg(short = 'S', long, value_name = "FILE", conflicts_with = "include")]
        stream_to_file: Option<PathBuf>,

        /// Include the HTTP status line and response headers in the output
        #[arg(short, long)]
        include: bool,

        /// API version to use [default: the org's maximum]
        #[arg(long)]
        api_version: Option<String>,
    },

    /// Execute a GraphQL query
    Graphql {
        /// Query: a file path, "-" for stdin, or the query itself
        #[arg(long, value_name = "file")]
        body: String,

        /// Stream the response body to this file
        #[arg(short = 'S', long, value_name = "FILE", conflicts_with = "include")]
        stream_to_file: Option<PathBuf>,

        /// Include the HTTP status line and response headers in the output
        #[arg(short, long)]
        include: bool,

        /// API version to use [default: the org's maximum]
        #[arg(long)]
        api_version: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a configuration value (e.g. orgs.dev.instance_url)
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration
    List,
}

/// How a completed command should end the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The exchange completed but the server answered with an error status
    HttpError(u16),
}

impl Outcome {
    pub fn from_status(status: u16) -> Self {
        if status >= 400 {
            Self::HttpError(status)
        } else {
            Self::Success
        }
    }

    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::SUCCESS,
            Self::HttpError(_) => ExitCode::from(1),
        }
    }
}

/// Where the response goes
#[derive(Debug, Clone)]
pub struct Delivery {
    pub stream_to_file: Option<PathBuf>,
    pub include: bool,
    pub colorized: bool,
}

pub(crate) fn connect(config: &Config, args: &OrgArgs, client: &Client) -> Result<ConfiguredOrg> {
    let (alias, profile) = org::resolve_profile(config, &args.selector())?;
    tracing::debug!(org = %alias, instance = %profile.instance_url, "using org");
    Ok(ConfiguredOrg::new(alias, profile, client.raw().clone()))
}

/// Send the request and either stream or print the response
pub(crate) async fn deliver(
    client: &Client,
    spec: RequestSpec,
    access_token: &str,
    delivery: &Delivery,
) -> Result<Outcome> {
    if let Some(path) = &delivery.stream_to_file {
        let status = client.stream_to_file(spec, access_token, path).await?;
        println!("{}", output::saved_line(path));
        return Ok(Outcome::from_status(status));
    }

    let response = client.send(spec, access_token).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    Renderer::new(delivery.include, delivery.colorized)
        .render(&mut out, &response)
        .context("Failed to write response")?;
    out.flush().context("Failed to write response")?;

    Ok(Outcome::from_status(response.status))
}
