// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - effective configuration

use anyhow::Result;

use super::Context;

/// Print the whole configuration as TOML, or a single key
pub fn run(ctx: &Context, key: Option<&str>) -> Result<()> {
    let table = toml::Table::try_from(&ctx.config)?;

    match key {
        None => {
            if let Some(path) = tierlist::config::default_path() {
                println!("# {}", path.display());
            }
            print!("{}", toml::to_string_pretty(&table)?);
        }
        Some(key) => match table.get(key) {
            Some(toml::Value::String(s)) => println!("{}", s),
            Some(value) => println!("{}", value),
            None => {
                let valid: Vec<_> = table.keys().map(String::as_str).collect();
                anyhow::bail!("Unknown config key: {}. Valid: {}", key, valid.join(", "));
            }
        },
    }
    Ok(())
}
