// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request assembly
//!
//! A request is assembled from up to three sources: explicit flags, a
//! template file and piped input. Assembly happens in two steps so that
//! every validation failure surfaces before anything touches the network:
//!
//! 1. [`assemble`] resolves method, endpoint, headers and body into a
//!    [`RequestDraft`].
//! 2. [`RequestDraft::into_spec`] appends the endpoint to the versioned API
//!    base once the org connection has reported its instance and version.

mod body;
mod headers;
mod template;

pub use body::{load_text_arg, Body};
pub use headers::ResolvedHeaders;
pub use template::TemplateFile;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// HTTP methods the API accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Head,
    Delete,
    Options,
    Trace,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Head,
        Self::Delete,
        Self::Options,
        Self::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }

    fn allowed() -> String {
        Self::ALL
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Method {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| RequestError::InvalidMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Head => reqwest::Method::HEAD,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
            Method::Trace => reqwest::Method::TRACE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("No endpoint to request. Pass an endpoint argument or set \"url\" in the request file.")]
    MissingUrl,

    #[error("Invalid HTTP method: \"{0}\". Allowed values: {}", Method::allowed())]
    InvalidMethod(String),

    #[error("Failed to parse HTTP header: \"{0}\".")]
    InvalidHeader(String),

    #[error("Invalid request URL")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Endpoint \"{0}\" resolves outside the versioned API path.")]
    OutsideApi(String),

    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse request file {}", path.display())]
    Template {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl RequestError {
    /// Remediation shown under the error message
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidHeader(_) => Some(
                r#"Make sure the header is in a "key:value" format, e.g. "Accept: application/json""#,
            ),
            Self::MissingUrl => Some("Example: apireq rest limits"),
            Self::OutsideApi(_) => {
                Some("Pass the path relative to /services/data/v<version>/, e.g. \"sobjects/Account\"")
            }
            _ => None,
        }
    }
}

/// Everything a request needs from the command line
#[derive(Debug, Default)]
pub struct RequestInputs<'a> {
    pub endpoint: Option<&'a str>,
    pub method: Option<Method>,
    pub headers: &'a [String],
    pub body: Option<&'a str>,
    pub template: Option<&'a TemplateFile>,
}

/// A validated request still waiting for its API base URL
#[derive(Debug)]
pub struct RequestDraft {
    pub endpoint: String,
    pub method: Method,
    pub headers: ResolvedHeaders,
    pub body: Option<Body>,
}

/// The fully resolved outbound request
#[derive(Debug)]
pub struct RequestSpec {
    pub method: Method,
    pub url: Url,
    pub headers: ResolvedHeaders,
    pub body: Option<Body>,
}

/// Flag, then template, then GET
pub fn resolve_method(
    flag: Option<Method>,
    template: Option<&TemplateFile>,
) -> Result<Method, RequestError> {
    if let Some(method) = flag {
        return Ok(method);
    }

    match template.and_then(|t| t.method.as_deref()) {
        Some(method) => method.parse(),
        None => Ok(Method::Get),
    }
}

/// Positional endpoint, then template url; one leading `/` is dropped
pub fn resolve_endpoint(
    arg: Option<&str>,
    template: Option<&TemplateFile>,
) -> Result<String, RequestError> {
    let endpoint = arg
        .or_else(|| template.and_then(TemplateFile::url))
        .ok_or(RequestError::MissingUrl)?;

    Ok(endpoint.strip_prefix('/').unwrap_or(endpoint).to_string())
}

/// `<instance>/services/data/v<version>/`
pub fn api_base(instance_url: &str, api_version: &str) -> Result<Url, RequestError> {
    let version = api_version.trim_start_matches('v');
    let base = format!(
        "{}/services/data/v{}/",
        instance_url.trim_end_matches('/'),
        version
    );
    Ok(Url::parse(&base)?)
}

pub fn assemble(inputs: &RequestInputs<'_>) -> Result<RequestDraft, RequestError> {
    let method = resolve_method(inputs.method, inputs.template)?;
    let endpoint = resolve_endpoint(inputs.endpoint, inputs.template)?;
    let mut headers = headers::resolve_headers(inputs.template, inputs.headers)?;
    let body = body::resolve_body(
        method,
        inputs.body,
        inputs.template.and_then(|t| t.body.as_ref()),
        &mut headers,
    )?;

    tracing::debug!(%method, endpoint = %endpoint, headers = headers.len(), "assembled request");

    Ok(RequestDraft {
        endpoint,
        method,
        headers,
        body,
    })
}

impl RequestDraft {
    /// POST to `graphql` with the query wrapped in `{"query": ...}`
    pub fn graphql(query: &str) -> Self {
        let envelope = serde_json::json!({ "query": query });

        Self {
            endpoint: "graphql".to_string(),
            method: Method::Post,
            headers: ResolvedHeaders::new(),
            body: Some(Body::Text(envelope.to_string())),
        }
    }

    /// Append the endpoint to `api_base`. The result always stays under the
    /// versioned API path of the same instance.
    pub fn into_spec(self, api_base: &Url) -> Result<RequestSpec, RequestError> {
        let url = Url::parse(&format!("{}{}", api_base, self.endpoint))?;

        // Dot segments are normalized away by the parser
        if url.origin() != api_base.origin() || !url.path().starts_with(api_base.path()) {
            return Err(RequestError::OutsideApi(self.endpoint));
        }

        Ok(RequestSpec {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
        })
    }
}
