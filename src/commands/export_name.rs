// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export-name command - next image filename in an export folder

use std::path::Path;

use anyhow::{Context as _, Result};
use tierlist::export::plan_export;
use tierlist::fs::{DirectoryFs, FilesystemCapability};

/// Run export-name command
pub async fn run(dir: &Path, prefix: Option<&str>, tierlist: &str) -> Result<()> {
    let name = dir
        .file_name()
        .map_or_else(|| dir.display().to_string(), |n| n.to_string_lossy().into_owned());
    let fs = DirectoryFs::new(dir, name);
    let entries = fs
        .get_dir_entries("/")
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    println!("{}", plan_export(&entries, prefix, tierlist));
    Ok(())
}
