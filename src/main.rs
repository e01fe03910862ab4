// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! apireq - authenticated REST and GraphQL requests from the command line
//!
//! Resolves a request from flags, a request file and piped input, sends it
//! with an org's credentials and prints or streams the response.

mod cli;
mod config;
mod http;
mod org;
mod output;
mod request;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, Outcome};
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for failures before or during the exchange
const FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli).await {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            report(&err);
            ExitCode::from(FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome> {
    match cli.command {
        Commands::Rest {
            endpoint,
            method,
            headers,
            file,
            body,
            stream_to_file,
            include,
            api_version,
        } => {
            cli::rest::execute(cli::rest::RestOptions {
                endpoint,
                method,
                headers,
                file,
                body,
                stream_to_file,
                include,
                api_version,
                org: cli.org,
                no_color: cli.no_color,
            })
            .await
        }
        Commands::Graphql {
            body,
            stream_to_file,
            include,
            api_version,
        } => {
            cli::graphql::execute(cli::graphql::GraphqlOptions {
                body,
                stream_to_file,
                include,
                api_version,
                org: cli.org,
                no_color: cli.no_color,
            })
            .await
        }
        Commands::Config { action } => cli::config::execute(action).await,
        Commands::Completions { shell } => Ok(cli::completions::execute(shell)),
    }
}

// Logs go to stderr so they never mix with response output
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("apireq=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let hint = err.chain().find_map(|cause| {
        cause
            .downcast_ref::<request::RequestError>()
            .and_then(request::RequestError::hint)
            .or_else(|| cause.downcast_ref::<org::OrgError>().and_then(org::OrgError::hint))
    });

    if let Some(hint) = hint {
        eprintln!("{} {}", "Try this:".yellow(), hint);
    }
}
