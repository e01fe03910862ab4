// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request body resolution

use super::headers::ResolvedHeaders;
use super::template::{BodyMode, FieldKind, FormField, TemplateBody};
use super::{Method, RequestError};
use reqwest::multipart::{Form, Part};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outbound request payload
#[derive(Debug)]
pub enum Body {
    Text(String),
    Binary(Vec<u8>),
    Multipart(Form),
}

/// Where a `--body` value points
#[derive(Debug, PartialEq, Eq)]
enum BodyArg<'a> {
    Stdin,
    File(&'a Path),
    Inline(&'a str),
}

impl<'a> BodyArg<'a> {
    fn classify(value: &'a str) -> Self {
        if value == "-" {
            return Self::Stdin;
        }

        let path = Path::new(value);
        if path.is_file() {
            Self::File(path)
        } else {
            Self::Inline(value)
        }
    }
}

fn read_stdin() -> Result<Vec<u8>, RequestError> {
    let mut buf = Vec::new();
    io::stdin()
        .read_to_end(&mut buf)
        .map_err(|source| RequestError::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    Ok(buf)
}

fn read_file(path: &Path) -> Result<Vec<u8>, RequestError> {
    fs::read(path).map_err(|source| RequestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a `--body` value: `-` is stdin, an existing file is read, anything else is the body itself
pub fn load_body_arg(value: &str) -> Result<Body, RequestError> {
    match BodyArg::classify(value) {
        BodyArg::Stdin => {
            let bytes = read_stdin()?;
            Ok(match String::from_utf8(bytes) {
                Ok(text) => Body::Text(text),
                Err(err) => Body::Binary(err.into_bytes()),
            })
        }
        BodyArg::File(path) => {
            debug!(path = %path.display(), "reading request body from file");
            read_file(path).map(Body::Binary)
        }
        BodyArg::Inline(text) => Ok(Body::Text(text.to_string())),
    }
}

/// Same lookup as [`load_body_arg`], decoded as UTF-8 text
pub fn load_text_arg(value: &str) -> Result<String, RequestError> {
    let (origin, bytes) = match BodyArg::classify(value) {
        BodyArg::Stdin => (PathBuf::from("<stdin>"), read_stdin()?),
        BodyArg::File(path) => (path.to_path_buf(), read_file(path)?),
        BodyArg::Inline(text) => return Ok(text.to_string()),
    };

    String::from_utf8(bytes).map_err(|err| RequestError::Io {
        path: origin,
        source: io::Error::new(io::ErrorKind::InvalidData, err),
    })
}

/// `--body` flag, then the template body. GET requests never carry a body.
pub fn resolve_body(
    method: Method,
    flag: Option<&str>,
    template: Option<&TemplateBody>,
    headers: &mut ResolvedHeaders,
) -> Result<Option<Body>, RequestError> {
    if method == Method::Get {
        return Ok(None);
    }

    if let Some(value) = flag {
        return load_body_arg(value).map(Some);
    }

    let Some(template) = template else {
        return Ok(None);
    };

    match template.mode {
        BodyMode::Raw => Ok(template.raw.as_ref().map(|raw| match raw {
            serde_json::Value::String(text) => Body::Text(text.clone()),
            other => Body::Text(other.to_string()),
        })),
        BodyMode::Formdata => {
            let form = build_form(&template.formdata)?;
            headers.insert(
                "content-type".to_string(),
                format!("multipart/form-data; boundary={}", form.boundary()),
            );
            Ok(Some(Body::Multipart(form)))
        }
        BodyMode::Unsupported => {
            warn!("ignoring request file body: only \"raw\" and \"formdata\" modes are supported");
            Ok(None)
        }
    }
}

fn build_form(fields: &[FormField]) -> Result<Form, RequestError> {
    let mut form = Form::new();

    for field in fields.iter().filter(|f| !f.disabled) {
        match field.kind {
            FieldKind::Text => {
                form = form.text(field.key.clone(), field.value.clone().unwrap_or_default());
            }
            FieldKind::File => {
                for path in field.paths() {
                    form = form.part(field.key.clone(), file_part(Path::new(path))?);
                }
            }
        }
    }

    Ok(form)
}

fn file_part(path: &Path) -> Result<Part, RequestError> {
    let io_err = |source| RequestError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = fs::File::open(path).map_err(io_err)?;
    let length = file.metadata().map_err(io_err)?.len();
    let body = reqwest::Body::from(tokio::fs::File::from_std(file));

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(Part::stream_with_length(body, length).file_name(file_name))
}
