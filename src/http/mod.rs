// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport module

mod client;

pub use client::{Client, TransportError};

use serde::{Deserialize, Serialize};

/// A buffered HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// Protocol version without the `HTTP/` prefix, e.g. `1.1`
    pub version: String,
    /// Header names in wire order; repeated headers are joined with `,`
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// HTTP configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Proxy for all requests. Without it the `HTTP_PROXY`/`HTTPS_PROXY` variables apply.
    pub proxy: Option<String>,
    #[serde(default)]
    pub insecure: bool,
}
