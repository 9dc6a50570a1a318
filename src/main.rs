// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Tierlist CLI - timed-run rankings kept as human-editable JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tierlist::ranking::Category;
use tierlist::types::MetricKey;

mod commands;

#[derive(Parser)]
#[command(name = "tierlist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "TIERLIST_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Workspace directory override (host mode)
    #[arg(short, long, env = "TIERLIST_WORKSPACE", global = true)]
    workspace: Option<PathBuf>,

    /// Pick the workspace directory interactively
    #[arg(long, conflicts_with = "workspace", global = true)]
    picker: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tierlists in the workspace
    List,

    /// Create an empty tierlist
    Create {
        /// Display name; the file name is derived from it
        name: String,
    },

    /// Rank a tierlist's entries into tiers
    Show {
        /// Tierlist name or file name
        tierlist: String,

        /// Attempt category (first, best)
        #[arg(long, default_value = "best")]
        category: Category,

        /// Metric to rank by
        #[arg(long, default_value = "realtime")]
        metric: MetricKey,

        /// Index of the threshold set to use
        #[arg(long, default_value_t = 0)]
        threshold: usize,

        /// Only entries with one of these tags
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Drop entries with these tags (replaces the configured list)
        #[arg(long = "exclude-tag")]
        exclude_tags: Vec<String>,

        /// Drop these entities
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Only species with one of these types
        #[arg(long = "type")]
        types: Vec<String>,

        /// Only species with one of these growth rates
        #[arg(long = "growth-rate")]
        growth_rates: Vec<String>,

        /// Ignore attempts released after this date (YYYY-MM-DD)
        #[arg(long)]
        before: Option<String>,
    },

    /// Record an attempt
    Add {
        /// Tierlist name or file name
        tierlist: String,

        /// Entity name
        entity: String,

        #[command(flatten)]
        attempt: commands::add::AttemptArgs,
    },

    /// Rewrite every workspace file in canonical layout
    Fmt,

    /// Interactive editing session
    Session,

    /// Name of the next image export in a folder
    ExportName {
        /// Export folder
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// File prefix (detected from the folder when omitted)
        #[arg(long)]
        prefix: Option<String>,

        /// Tierlist name used to derive a prefix
        #[arg(long, default_value = "tierlist")]
        tierlist: String,
    },

    /// Show the effective configuration
    Config {
        /// Configuration key (omit to show all)
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = tierlist::config::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(dir) = &cli.workspace {
        config.workspace_dir.clone_from(dir);
        config.picker = false;
    }
    if cli.picker {
        config.picker = true;
    }

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::Context {
        config,
        json: cli.json,
        color: !cli.no_color,
    };

    // Execute command
    match cli.command {
        Commands::List => commands::list::run(&ctx).await,
        Commands::Create { name } => commands::create::run(&ctx, &name).await,
        Commands::Show {
            tierlist,
            category,
            metric,
            threshold,
            tags,
            exclude_tags,
            exclude,
            types,
            growth_rates,
            before,
        } => {
            let options = commands::show::ShowOptions {
                category,
                metric,
                threshold,
                tags,
                exclude_tags,
                exclude,
                types,
                growth_rates,
                before,
            };
            commands::show::run(&ctx, &tierlist, &options).await
        }
        Commands::Add {
            tierlist,
            entity,
            attempt,
        } => commands::add::run(&ctx, &tierlist, &entity, &attempt).await,
        Commands::Fmt => commands::fmt::run(&ctx).await,
        Commands::Session => commands::session::run(&ctx).await,
        Commands::ExportName {
            dir,
            prefix,
            tierlist,
        } => commands::export_name::run(&dir, prefix.as_deref(), &tierlist).await,
        Commands::Config { key } => commands::config::run(&ctx, key.as_deref()),
        Commands::Completions { shell } => {
            commands::completions::run::<Cli>(shell);
            Ok(())
        }
    }
}
