// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request template files
//!
//! A template is a JSON document in the shape of a Postman request item:
//!
//! ```json
//! {
//!   "url": { "raw": "sobjects/Account" },
//!   "method": "POST",
//!   "header": [
//!     "Accept: application/json",
//!     { "key": "X-Debug", "value": "1", "disabled": true }
//!   ],
//!   "body": { "mode": "raw", "raw": { "Name": "Acme" } }
//! }
//! ```

use super::RequestError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default request values read from a `--file` template
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFile {
    #[serde(default)]
    pub url: Option<TemplateUrl>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub header: Option<TemplateHeaders>,
    #[serde(default)]
    pub body: Option<TemplateBody>,
}

impl TemplateFile {
    pub fn load(path: &Path) -> Result<Self, RequestError> {
        let content = fs::read_to_string(path).map_err(|source| RequestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, RequestError> {
        serde_json::from_str(content).map_err(|source| RequestError::Template {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_ref().map(TemplateUrl::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TemplateUrl {
    Plain(String),
    Object { raw: String },
}

impl TemplateUrl {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(url) | Self::Object { raw: url } => url,
        }
    }
}

/// `header` is either one `key:value` line or a list of entries
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TemplateHeaders {
    Single(String),
    List(Vec<HeaderEntry>),
}

impl TemplateHeaders {
    pub fn entries(&self) -> Vec<HeaderEntry> {
        match self {
            Self::Single(line) => vec![HeaderEntry::Line(line.clone())],
            Self::List(entries) => entries.clone(),
        }
    }
}

/// One header as it may appear in a template
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HeaderEntry {
    Line(String),
    Structured {
        key: String,
        value: String,
        #[serde(default)]
        disabled: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateBody {
    pub mode: BodyMode,
    #[serde(default)]
    pub raw: Option<serde_json::Value>,
    #[serde(default)]
    pub formdata: Vec<FormField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    Raw,
    Formdata,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormField {
    pub key: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub src: Option<FileSrc>,
    #[serde(default)]
    pub disabled: bool,
}

impl FormField {
    /// Paths of a file field: `src` when present, `value` otherwise
    pub fn paths(&self) -> Vec<&str> {
        match (&self.src, &self.value) {
            (Some(FileSrc::One(path)), _) => vec![path.as_str()],
            (Some(FileSrc::Many(paths)), _) => paths.iter().map(String::as_str).collect(),
            (None, Some(value)) => vec![value.as_str()],
            (None, None) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    File,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FileSrc {
    One(String),
    Many(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> TemplateFile {
        TemplateFile::parse(json, Path::new("request.json")).unwrap()
    }

    #[test]
    fn test_url_accepts_string_and_raw_object() {
        assert_eq!(parse(r#"{"url": "limits"}"#).url(), Some("limits"));
        assert_eq!(parse(r#"{"url": {"raw": "/limits"}}"#).url(), Some("/limits"));
        assert_eq!(parse("{}").url(), None);
    }

    #[test]
    fn test_header_shapes() {
        let single = parse(r#"{"header": "Accept: application/xml"}"#);
        assert_eq!(
            single.header.unwrap().entries(),
            vec![HeaderEntry::Line("Accept: application/xml".into())]
        );

        let list = parse(
            r#"{"header": [
                "Accept: application/json",
                {"key": "X-Trace", "value": "on", "disabled": true},
                {"key": "X-Org", "value": "dev"}
            ]}"#,
        );
        let entries = list.header.unwrap().entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[1],
            HeaderEntry::Structured {
                key: "X-Trace".into(),
                value: "on".into(),
                disabled: true
            }
        );
        assert_eq!(
            entries[2],
            HeaderEntry::Structured {
                key: "X-Org".into(),
                value: "dev".into(),
                disabled: false
            }
        );
    }

    #[test]
    fn test_formdata_fields() {
        let template = parse(
            r#"{"body": {"mode": "formdata", "formdata": [
                {"key": "name", "type": "text", "value": "report"},
                {"key": "doc", "type": "file", "src": "a.txt"},
                {"key": "docs", "type": "file", "src": ["b.txt", "c.txt"]},
                {"key": "legacy", "type": "file", "value": "d.txt"}
            ]}}"#,
        );
        let body = template.body.unwrap();
        assert_eq!(body.mode, BodyMode::Formdata);
        assert_eq!(body.formdata[0].kind, FieldKind::Text);
        assert_eq!(body.formdata[1].paths(), vec!["a.txt"]);
        assert_eq!(body.formdata[2].paths(), vec!["b.txt", "c.txt"]);
        assert_eq!(body.formdata[3].paths(), vec!["d.txt"]);
    }

    #[test]
    fn test_unknown_body_mode_is_tolerated() {
        let template = parse(r#"{"body": {"mode": "urlencoded"}}"#);
        assert_eq!(template.body.unwrap().mode, BodyMode::Unsupported);
    }

    #[test]
    fn test_malformed_template_names_file() {
        let err = TemplateFile::parse("{ nope", Path::new("broken.json")).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
