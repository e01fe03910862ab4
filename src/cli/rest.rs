// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Make an authenticated REST request

use super::{connect, deliver, Delivery, OrgArgs, Outcome};
use crate::config::Config;
use crate::http::Client;
use crate::org::{self, OrgConnection};
use crate::request::{self, Method, RequestInputs, TemplateFile};
use anyhow::Result;
use std::path::PathBuf;

pub struct RestOptions {
    pub endpoint: Option<String>,
    pub method: Option<Method>,
    pub headers: Vec<String>,
    pub file: Option<PathBuf>,
    pub body: Option<String>,
    pub stream_to_file: Option<PathBuf>,
    pub include: bool,
    pub api_version: Option<String>,
    pub org: OrgArgs,
    pub no_color: bool,
}

pub async fn execute(options: RestOptions) -> Result<Outcome> {
    let template = options
        .file
        .as_deref()
        .map(TemplateFile::load)
        .transpose()?;

    // Everything local is validated before the org is contacted
    let draft = request::assemble(&RequestInputs {
        endpoint: options.endpoint.as_deref(),
        method: options.method,
        headers: &options.headers,
        body: options.body.as_deref(),
        template: template.as_ref(),
    })?;

    let config = Config::load()?;
    let client = Client::new(&config.http)?;
    let mut org = connect(&config, &options.org, &client)?;

    org.refresh_auth().await?;
    let api_version = org::resolve_api_version(options.api_version.as_deref(), &org).await?;
    let spec = draft.into_spec(&request::api_base(org.instance_url(), &api_version)?)?;

    let delivery = Delivery {
        stream_to_file: options.stream_to_file,
        include: options.include,
        colorized: !options.no_color,
    };

    deliver(&client, spec, org.access_token()?, &delivery).await
}
