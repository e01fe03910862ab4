// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Header parsing and merging

use super::template::{HeaderEntry, TemplateFile};
use super::RequestError;
use reqwest::header::HeaderName;
use std::collections::HashMap;

/// Lowercased header name to value
pub type ResolvedHeaders = HashMap<String, String>;

/// Split a `key:value` line on its first colon
pub fn parse_header(token: &str) -> Result<(String, String), RequestError> {
    let invalid = || RequestError::InvalidHeader(token.to_string());

    let (key, value) = token.split_once(':').ok_or_else(invalid)?;
    let (key, value) = (key.trim(), value.trim());

    if key.is_empty() || value.is_empty() {
        return Err(invalid());
    }

    Ok((key.to_ascii_lowercase(), value.to_string()))
}

impl HeaderEntry {
    /// Normalize any header shape to a lowercased pair. Disabled entries yield `None`.
    pub fn normalize(&self) -> Result<Option<(String, String)>, RequestError> {
        match self {
            Self::Line(line) => parse_header(line).map(Some),
            Self::Structured { disabled: true, .. } => Ok(None),
            Self::Structured { key, value, .. } => {
                let (name, trimmed) = (key.trim(), value.trim());
                let valid_name = HeaderName::from_bytes(name.as_bytes()).is_ok();

                if !valid_name || trimmed.is_empty() {
                    let entry = serde_json::json!({ "key": key, "value": value });
                    return Err(RequestError::InvalidHeader(entry.to_string()));
                }

                Ok(Some((name.to_ascii_lowercase(), trimmed.to_string())))
            }
        }
    }
}

/// Template headers first, then `-H` flags; the last writer of a key wins
pub fn resolve_headers(
    template: Option<&TemplateFile>,
    flags: &[String],
) -> Result<ResolvedHeaders, RequestError> {
    let mut headers = ResolvedHeaders::new();

    let template_entries = template
        .and_then(|t| t.header.as_ref())
        .map(|h| h.entries())
        .unwrap_or_default();

    for entry in &template_entries {
        if let Some((key, value)) = entry.normalize()? {
            headers.insert(key, value);
        }
    }

    for flag in flags {
        let (key, value) = parse_header(flag)?;
        headers.insert(key, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn template(json: &str) -> TemplateFile {
        TemplateFile::parse(json, Path::new("request.json")).unwrap()
    }

    #[test]
    fn test_parse_header_splits_on_first_colon() {
        assert_eq!(
            parse_header("Accept: application/json").unwrap(),
            ("accept".to_string(), "application/json".to_string())
        );
        assert_eq!(
            parse_header("X-Callback:  https://example.com:8443/hook ").unwrap(),
            ("x-callback".to_string(), "https://example.com:8443/hook".to_string())
        );
    }

    #[test]
    fn test_parse_header_rejects_malformed_tokens() {
        for token in ["myInvalidHeader", "Accept application/xml", ":value", "key:", "  :  "] {
            match parse_header(token) {
                Err(RequestError::InvalidHeader(bad)) => assert_eq!(bad, token),
                other => panic!("expected InvalidHeader for {token:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_header_message_and_hint() {
        let err = parse_header("myInvalidHeader").unwrap_err();
        assert_eq!(err.to_string(), r#"Failed to parse HTTP header: "myInvalidHeader"."#);
        assert_eq!(
            err.hint(),
            Some(r#"Make sure the header is in a "key:value" format, e.g. "Accept: application/json""#)
        );
    }

    #[test]
    fn test_flag_overrides_template_header() {
        let t = template(r#"{"header": ["Accept: application/json", "X-Org: dev"]}"#);
        let headers =
            resolve_headers(Some(&t), &["accept: application/xml".to_string()]).unwrap();

        assert_eq!(headers.get("accept").map(String::as_str), Some("application/xml"));
        assert_eq!(headers.get("x-org").map(String::as_str), Some("dev"));
    }

    #[test]
    fn test_disabled_template_headers_are_skipped() {
        let t = template(
            r#"{"header": [
                {"key": "X-Trace", "value": "on", "disabled": true},
                {"key": "Accept", "value": "text/csv"}
            ]}"#,
        );
        let headers = resolve_headers(Some(&t), &[]).unwrap();

        assert!(!headers.contains_key("x-trace"));
        assert_eq!(headers.get("accept").map(String::as_str), Some("text/csv"));
    }

    #[test]
    fn test_structured_entry_is_not_resplit() {
        let entry = HeaderEntry::Structured {
            key: " X-Callback ".into(),
            value: " https://example.com:8443/hook ".into(),
            disabled: false,
        };
        assert_eq!(
            entry.normalize().unwrap(),
            Some(("x-callback".to_string(), "https://example.com:8443/hook".to_string()))
        );
    }

    #[test]
    fn test_structured_entry_with_colon_in_key_is_rejected() {
        let entry = HeaderEntry::Structured {
            key: "X-Org:Id".into(),
            value: "dev".into(),
            disabled: false,
        };
        match entry.normalize() {
            Err(RequestError::InvalidHeader(token)) => {
                assert_eq!(token, r#"{"key":"X-Org:Id","value":"dev"}"#)
            }
            other => panic!("expected InvalidHeader, got {other:?}"),
        }

        let empty = HeaderEntry::Structured {
            key: "Accept".into(),
            value: "  ".into(),
            disabled: false,
        };
        assert!(matches!(empty.normalize(), Err(RequestError::InvalidHeader(_))));
    }

    #[test]
    fn test_single_line_template_header() {
        let t = template(r#"{"header": "Accept: application/xml"}"#);
        let headers = resolve_headers(Some(&t), &[]).unwrap();
        assert_eq!(headers.get("accept").map(String::as_str), Some("application/xml"));
    }

    #[test]
    fn test_malformed_flag_fails_merge() {
        let flags = vec!["Accept: text/plain".to_string(), "broken".to_string()];
        let err = resolve_headers(None, &flags).unwrap_err();
        assert!(matches!(err, RequestError::InvalidHeader(token) if token == "broken"));
    }
}
