// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

use anyhow::{Context as _, Result};
use tierlist::config::Config;
use tierlist::fs::{FsSelector, StdinPicker};
use tierlist::species::Pokedex;
use tierlist::workspace::WorkspaceStore;

pub mod add;
pub mod completions;
pub mod config;
pub mod create;
pub mod export_name;
pub mod fmt;
pub mod list;
pub mod session;
pub mod show;

/// Settings shared by every command
pub struct Context {
    /// Effective configuration
    pub config: Config,
    /// Emit JSON instead of text
    pub json: bool,
    /// Colorize text output
    pub color: bool,
}

impl Context {
    /// Capability selector for the configured mode
    pub fn selector(&self) -> FsSelector {
        if self.config.picker {
            FsSelector::picker(&self.config.data_dir, Box::new(StdinPicker))
        } else {
            FsSelector::host(&self.config.workspace_dir)
        }
    }

    /// Load the workspace, reporting skipped files on stderr
    pub async fn open_workspace(&self) -> Result<WorkspaceStore> {
        let mut store = WorkspaceStore::new();
        let report = store
            .load_workspace(&self.selector())
            .await
            .context("Failed to load workspace")?;

        if report.seeded {
            eprintln!("Workspace is empty. Created settings.json and pokemon.json.");
        }
        for skipped in &report.skipped {
            eprintln!("warning: skipped {}: {}", skipped.filename, skipped.reason);
        }
        Ok(store)
    }

    /// Species data, if configured
    pub fn species(&self) -> Result<Option<Pokedex>> {
        self.config
            .species_data
            .as_deref()
            .map(|path| {
                Pokedex::load(path)
                    .with_context(|| format!("Failed to load species data {}", path.display()))
            })
            .transpose()
    }
}

/// Resolve a tierlist argument to its index
pub fn find_tierlist(store: &WorkspaceStore, query: &str) -> Result<usize> {
    store.find_tierlist(query).ok_or_else(|| {
        let known: Vec<_> = store.tierlists().iter().map(|t| t.name.as_str()).collect();
        anyhow::anyhow!("Unknown tierlist: {}. Known: {}", query, known.join(", "))
    })
}
