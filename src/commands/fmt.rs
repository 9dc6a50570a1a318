// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Fmt command - rewrite every tierlist in canonical form

use anyhow::{Context as _, Result};

use super::Context;

/// Run fmt command
pub async fn run(ctx: &Context) -> Result<()> {
    let mut store = ctx.open_workspace().await?;
    store
        .save_workspace()
        .await
        .context("Failed to save workspace")?;

    println!(
        "Formatted {} tierlist(s) in {}",
        store.tierlists().len(),
        store.root_name().unwrap_or("workspace")
    );
    Ok(())
}
