// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Create command - new empty tierlist

use anyhow::{Context as _, Result};

use super::Context;

/// Run create command
pub async fn run(ctx: &Context, name: &str) -> Result<()> {
    let mut store = ctx.open_workspace().await?;
    let index = store
        .create_tierlist(name)
        .await
        .with_context(|| format!("Failed to create tierlist {name:?}"))?;

    println!("Created tierlist: {}", name);
    println!("  file: {}", store.tierlists()[index].filename);
    Ok(())
}
