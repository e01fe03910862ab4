// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration management commands

use super::{ConfigAction, Outcome};
use crate::config::{Config, LOCAL_CONFIG};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

pub async fn execute(action: ConfigAction) -> Result<Outcome> {
    match action {
        ConfigAction::Get { key } => {
            let path = Config::locate().context("No config file found. Set a value first.")?;
            let parsed = read_table(&path)?;

            match get_nested_value(&parsed, &key) {
                Some(toml::Value::String(s)) => println!("{}", s),
                Some(value) => println!("{}", value),
                None => println!("{}", "Key not found".yellow()),
            }
        }
        ConfigAction::Set { key, value } => {
            let path = Config::locate().unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG));

            let mut parsed = if path.exists() {
                read_table(&path)?
            } else {
                toml::Value::Table(toml::map::Map::new())
            };

            set_nested_value(&mut parsed, &key, &value)?;

            // Refuse to write a file the loader would reject
            let output = toml::to_string_pretty(&parsed)?;
            toml::from_str::<Config>(&output)
                .with_context(|| format!("\"{}\" is not a valid value for {}", value, key))?;

            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            fs::write(&path, output)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            println!("{} = {}", key.cyan(), value.green());
        }
        ConfigAction::List => {
            let path = Config::locate().context("No config file found. Set a value first.")?;
            let config = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            println!("{}", config);
        }
    }

    Ok(Outcome::Success)
}

fn read_table(path: &Path) -> Result<toml::Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.').try_fold(value, |current, part| current.get(part))
}

fn set_nested_value(value: &mut toml::Value, key: &str, new_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = parts
        .split_last()
        .context("Configuration key must not be empty")?;

    let mut current = value;
    for part in parents {
        let toml::Value::Table(table) = current else {
            anyhow::bail!("Cannot set {}: {} is not a table", key, part);
        };
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    let toml::Value::Table(table) = current else {
        anyhow::bail!("Cannot set {}: parent is not a table", key);
    };

    // Versions such as "60.0" must stay strings
    let parsed_value = match new_value {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        other => toml::Value::String(other.to_string()),
    };
    table.insert(last.to_string(), parsed_value);

    Ok(())
}
