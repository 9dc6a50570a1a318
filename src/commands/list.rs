// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! List command - tierlists in the workspace

use anyhow::Result;
use owo_colors::OwoColorize;
use serde_json::json;

use super::Context;

/// Run list command
pub async fn run(ctx: &Context) -> Result<()> {
    let store = ctx.open_workspace().await?;

    if ctx.json {
        let rows: Vec<_> = store
            .tierlists()
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "filename": t.filename,
                    "game": t.game,
                    "entries": t.entries.len(),
                    "visible": t.is_visible(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if store.tierlists().is_empty() {
        println!("No tierlists in {}", store.root_name().unwrap_or("workspace"));
        return Ok(());
    }

    for tierlist in store.tierlists() {
        let name = if ctx.color {
            tierlist.name.bold().to_string()
        } else {
            tierlist.name.clone()
        };
        let hidden = if tierlist.is_visible() { "" } else { " (hidden)" };
        println!(
            "{}  [{}] {} entries, {}{}",
            name,
            tierlist.game,
            tierlist.entries.len(),
            tierlist.filename,
            hidden
        );
    }
    Ok(())
}
