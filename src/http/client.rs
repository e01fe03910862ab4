// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client implementation

use super::{HttpConfig, Response};
use crate::request::{Body, RequestSpec};
use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const DEFAULT_USER_AGENT: &str = concat!("apireq/", env!("CARGO_PKG_VERSION"));

pub struct Client {
    inner: reqwest::Client,
}

impl Client {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        // Redirects are surfaced to the user, never followed
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url).context("Invalid proxy URL")?;
            builder = builder.proxy(proxy);
        }

        if config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let inner = builder.build().context("Failed to create HTTP client")?;

        Ok(Self { inner })
    }

    /// The underlying reqwest client, shared with the org connection
    pub fn raw(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Send the request and buffer the whole response
    pub async fn send(&self, spec: RequestSpec, access_token: &str) -> Result<Response, TransportError> {
        let response = self.prepare(spec, access_token)?.send().await?;

        let status = response.status().as_u16();
        let version = version_label(response.version()).to_string();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await?.to_vec();

        debug!(status, bytes = body.len(), "response received");

        Ok(Response {
            status,
            version,
            headers,
            body,
        })
    }

    /// Send the request and write the body to `path` as it arrives. Returns the status code
    /// once the last chunk is written and flushed.
    pub async fn stream_to_file(
        &self,
        spec: RequestSpec,
        access_token: &str,
        path: &Path,
    ) -> Result<u16, TransportError> {
        let response = self.prepare(spec, access_token)?.send().await?;
        let status = response.status().as_u16();

        let write_err = |source| TransportError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::File::create(path).await.map_err(write_err)?;
        let mut stream = response.bytes_stream();
        let mut written = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len();
        }

        file.flush().await.map_err(write_err)?;
        debug!(status, bytes = written, path = %path.display(), "response streamed to file");

        Ok(status)
    }

    fn prepare(
        &self,
        spec: RequestSpec,
        access_token: &str,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", access_token))
                .map_err(|_| TransportError::InvalidHeader(AUTHORIZATION.to_string()))?,
        );

        for (key, value) in &spec.headers {
            let header_name = HeaderName::from_str(key)
                .map_err(|_| TransportError::InvalidHeader(key.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader(key.clone()))?;
            headers.insert(header_name, header_value);
        }

        debug!(method = %spec.method, url = %spec.url, "sending request");

        let mut request = self.inner.request(spec.method.into(), spec.url);

        if let Some(body) = spec.body {
            request = match body {
                Body::Text(text) => request.body(text),
                Body::Binary(bytes) => request.body(bytes),
                Body::Multipart(form) => request.multipart(form),
            };
        }

        // Applied after the body so the resolved content-type replaces reqwest's
        Ok(request.headers(headers))
    }
}

fn version_label(version: reqwest::Version) -> &'static str {
    if version == reqwest::Version::HTTP_09 {
        "0.9"
    } else if version == reqwest::Version::HTTP_10 {
        "1.0"
    } else if version == reqwest::Version::HTTP_2 {
        "2"
    } else if version == reqwest::Version::HTTP_3 {
        "3"
    } else {
        "1.1"
    }
}

fn collect_headers(map: &HeaderMap) -> Vec<(String, String)> {
    map.keys()
        .map(|name| {
            let joined = map
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(",");
            (name.as_str().to_string(), joined)
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Network error")]
    Network(#[from] reqwest::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Failed to write {}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{api_base, assemble, RequestInputs};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn spec(server: &MockServer, inputs: RequestInputs<'_>) -> RequestSpec {
        let base = api_base(&server.uri(), "56.0").unwrap();
        assemble(&inputs).unwrap().into_spec(&base).unwrap()
    }

    #[tokio::test]
    async fn test_send_layers_auth_and_user_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/data/v56.0/sobjects/Account"))
            .and(header("authorization", "Bearer token123"))
            .and(header("content-type", "text/plain"))
            .and(body_string("hello"))
            .respond_with(ResponseTemplate::new(201).insert_header("x-request-id", "abc"))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(&HttpConfig::default()).unwrap();
        let flags = vec!["Content-Type: text/plain".to_string()];
        let request = spec(
            &server,
            RequestInputs {
                endpoint: Some("sobjects/Account"),
                method: Some(crate::request::Method::Post),
                headers: &flags,
                body: Some("hello"),
                template: None,
            },
        );

        let response = client.send(request, "token123").await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.version, "1.1");
        assert!(response
            .headers
            .iter()
            .any(|(k, v)| k == "x-request-id" && v == "abc"));
    }

    #[tokio::test]
    async fn test_redirects_are_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v56.0/limites"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", "/services/data/v56.0/limits")
                    .set_body_string("moved"),
            )
            .mount(&server)
            .await;

        let client = Client::new(&HttpConfig::default()).unwrap();
        let request = spec(
            &server,
            RequestInputs {
                endpoint: Some("limites"),
                ..Default::default()
            },
        );

        let response = client.send(request, "token123").await.unwrap();
        assert_eq!(response.status, 301);
        assert_eq!(response.body, b"moved");
    }

    #[tokio::test]
    async fn test_stream_to_file_writes_full_body() {
        let server = MockServer::start().await;
        let payload = "x".repeat(256 * 1024);
        Mock::given(method("GET"))
            .and(path("/services/data/v56.0/report"))
            .respond_with(ResponseTemplate::new(200).set_body_string(payload.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.txt");
        let client = Client::new(&HttpConfig::default()).unwrap();
        let request = spec(
            &server,
            RequestInputs {
                endpoint: Some("report"),
                ..Default::default()
            },
        );

        let status = client.stream_to_file(request, "token123", &out).await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_stream_to_unwritable_path_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("data"))
            .mount(&server)
            .await;

        let client = Client::new(&HttpConfig::default()).unwrap();
        let request = spec(
            &server,
            RequestInputs {
                endpoint: Some("limits"),
                ..Default::default()
            },
        );

        let err = client
            .stream_to_file(request, "token123", Path::new("/no/such/dir/out.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Write { .. }));
    }
}
