// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Session command - line-oriented editing of an open workspace
//!
//! Changes stay in memory until `save`. Closing or switching away from a
//! tierlist drops its unsaved entries.

use std::io::Write as _;

use anyhow::Result;
use tierlist::species::SpeciesLookup;
use tierlist::types::{MetricKey, NewAttempt};
use tierlist::workspace::WorkspaceStore;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::add::apply_field;
use super::show::{self, ShowOptions};
use super::{find_tierlist, Context};

const HELP: &str = "\
Commands:
  list                          tierlists in the workspace
  open <tierlist>               open a tierlist (unsaved changes elsewhere are dropped)
  close                         close the open tierlist, dropping unsaved changes
  new <name>                    create and save an empty tierlist
  show [metric] [first|best]    tier ranking of the open tierlist
  entries                       entries of the open tierlist
  add <entity> [key=value ...]  record an attempt (realtime=1:02:03 finished=true ...)
  rm <entity>                   remove an entry
  rm-attempt <n> <entity>       remove attempt n (1-based) of an entry
  tag <tag> <entity>            tag an entry
  save                          write every tierlist
  quit                          leave the session";

/// What the loop does after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line
    Continue,
    /// Leave the session
    Quit,
}

/// Run session command
pub async fn run(ctx: &Context) -> Result<()> {
    let mut store = ctx.open_workspace().await?;
    let species = ctx.species()?;
    let lookup = species.as_ref().map(|s| s as &dyn SpeciesLookup);

    println!(
        "Workspace {} ({} tierlists). Type help for commands.",
        store.root_name().unwrap_or("workspace"),
        store.tierlists().len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let prompt = store
            .active_tierlist()
            .map_or("tierlist", |t| t.name.as_str());
        print!("{}> ", prompt);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match execute(ctx, &mut store, lookup, &line).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("error: {:#}", e),
        }
    }
    Ok(())
}

/// Execute one session line
pub async fn execute(
    ctx: &Context,
    store: &mut WorkspaceStore,
    lookup: Option<&dyn SpeciesLookup>,
    line: &str,
) -> Result<Flow> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Flow::Continue);
    };
    let rest: Vec<&str> = words.collect();

    match command {
        "help" | "?" => println!("{}", HELP),
        "quit" | "exit" => return Ok(Flow::Quit),
        "list" => {
            for (i, tierlist) in store.tierlists().iter().enumerate() {
                let marker = if store.active_index() == Some(i) { "*" } else { " " };
                println!(
                    "{} {}  [{}] {} entries",
                    marker,
                    tierlist.name,
                    tierlist.game,
                    tierlist.entries.len()
                );
            }
        }
        "open" => {
            let index = find_tierlist(store, &joined(&rest, "tierlist")?)?;
            store.set_active_tierlist(None);
            store.set_active_tierlist(Some(index));
            println!("Opened {}", store.tierlists()[index].name);
        }
        "close" => store.set_active_tierlist(None),
        "new" => {
            let name = joined(&rest, "name")?;
            store.set_active_tierlist(None);
            let index = store.create_tierlist(&name).await?;
            store.set_active_tierlist(Some(index));
            println!("Created {}", store.tierlists()[index].filename);
        }
        "show" => {
            let tierlist = store
                .active_tierlist()
                .ok_or_else(|| anyhow::anyhow!("No tierlist is open. Use open <tierlist>"))?;
            let mut options = ShowOptions::default();
            for word in &rest {
                if let Ok(category) = word.parse() {
                    options.category = category;
                } else {
                    options.metric = word.parse::<MetricKey>().map_err(anyhow::Error::msg)?;
                }
            }
            let filter = options.filter(&ctx.config.exclude_tags)?;
            let view = show::build(tierlist, &options, &filter, lookup)?;
            show::print(&view, ctx.color);
        }
        "entries" => {
            let tierlist = store
                .active_tierlist()
                .ok_or_else(|| anyhow::anyhow!("No tierlist is open. Use open <tierlist>"))?;
            for (entity, entry) in &tierlist.entries {
                let tags = if entry.tags.is_empty() {
                    String::new()
                } else {
                    format!(" #{}", entry.tags.join(" #"))
                };
                println!("{}  {} attempt(s){}", entity, entry.attempts.len(), tags);
            }
        }
        "add" => {
            let (fields, name): (Vec<&str>, Vec<&str>) =
                rest.iter().copied().partition(|w| w.contains('='));
            let entity = joined(&name, "entity")?;
            let mut attempt = NewAttempt::default();
            for field in fields {
                let (key, value) = field.split_once('=').unwrap_or((field, ""));
                apply_field(&mut attempt, key, value)?;
            }
            store.insert_active_tierlist_entry(&entity, attempt)?;
            println!("Added attempt for {}", entity);
        }
        "rm" => {
            let entity = joined(&rest, "entity")?;
            store.remove_active_entry(&entity)?;
            println!("Removed {}", entity);
        }
        "rm-attempt" => {
            let (number, name) = rest
                .split_first()
                .ok_or_else(|| anyhow::anyhow!("Usage: rm-attempt <n> <entity>"))?;
            let number: usize = number
                .parse()
                .map_err(|_| anyhow::anyhow!("Attempt number must be 1 or more, got {}", number))?;
            let index = number
                .checked_sub(1)
                .ok_or_else(|| anyhow::anyhow!("Attempt number must be 1 or more, got 0"))?;
            let entity = joined(name, "entity")?;
            store.remove_active_attempt(&entity, index)?;
            println!("Removed attempt #{} of {}", number, entity);
        }
        "tag" => {
            let (tag, name) = rest
                .split_first()
                .ok_or_else(|| anyhow::anyhow!("Usage: tag <tag> <entity>"))?;
            let entity = joined(name, "entity")?;
            store.tag_active_entry(&entity, tag)?;
        }
        "save" => {
            store.save_workspace().await?;
            println!("Saved {} tierlist(s)", store.tierlists().len());
        }
        other => anyhow::bail!("Unknown command: {}. Type help for commands", other),
    }
    Ok(Flow::Continue)
}

/// Words joined back into a name that may contain spaces
fn joined(words: &[&str], what: &str) -> Result<String> {
    if words.is_empty() {
        anyhow::bail!("Missing {}", what);
    }
    Ok(words.join(" "))
}
