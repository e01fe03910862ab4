// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response rendering

use crate::http::Response;
use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;

/// Prints a buffered response to a terminal
pub struct Renderer {
    include: bool,
    colorized: bool,
}

impl Renderer {
    pub fn new(include: bool, colorized: bool) -> Self {
        Self { include, colorized }
    }

    pub fn render<W: Write>(&self, out: &mut W, response: &Response) -> io::Result<()> {
        if self.include {
            writeln!(out, "HTTP/{} {}", response.version, response.status)?;

            for (name, value) in &response.headers {
                let name = if self.colorized {
                    name.blue().bold().to_string()
                } else {
                    name.clone()
                };
                writeln!(out, "{}: {}", name, value)?;
            }
        }

        writeln!(out, "{}", format_body(&response.body, response.status))
    }
}

/// Pretty JSON when the body parses, the raw text otherwise
pub fn format_body(body: &[u8], status: u16) -> String {
    if body.is_empty() {
        return format!("Server responded with an empty body, status code {}", status);
    }

    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

/// Confirmation printed after streaming to a file
pub fn saved_line(path: &Path) -> String {
    format!("File saved to {}", path.display())
}
