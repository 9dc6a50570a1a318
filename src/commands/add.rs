// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Add command - record one attempt

use anyhow::{Context as _, Result};
use clap::Args;
use tierlist::time::{parse_date, parse_game_time, parse_time};
use tierlist::types::{MetricKey, MetricUnit, NewAttempt, UNSET};

use super::{find_tierlist, Context};

/// Metric values of a new attempt
#[derive(Debug, Clone, Default, Args)]
pub struct AttemptArgs {
    /// Real time (h:mm:ss.cc, mm:ss, ...)
    #[arg(long)]
    pub realtime: Option<String>,
    /// Game time (h:mm or h:mm:ss)
    #[arg(long)]
    pub gametime: Option<String>,
    /// Final level
    #[arg(long)]
    pub level: Option<i64>,
    /// Resets
    #[arg(long)]
    pub resets: Option<i64>,
    /// Blackouts
    #[arg(long)]
    pub blackouts: Option<i64>,
    /// Mid-split real time
    #[arg(long = "realtime-mid")]
    pub realtime_mid: Option<String>,
    /// Mid-split game time
    #[arg(long = "gametime-mid")]
    pub gametime_mid: Option<String>,
    /// Mid-split level
    #[arg(long = "level-mid")]
    pub level_mid: Option<i64>,
    /// Mid-split resets
    #[arg(long = "resets-mid")]
    pub resets_mid: Option<i64>,
    /// Mid-split blackouts
    #[arg(long = "blackouts-mid")]
    pub blackouts_mid: Option<i64>,
    /// Whether the run was finished (true, false)
    #[arg(long)]
    pub finished: Option<bool>,
    /// Release date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    /// Tags to add to the entry
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

impl AttemptArgs {
    /// Convert to an attempt; absent values stay unset
    pub fn to_attempt(&self) -> Result<NewAttempt> {
        let mut attempt = NewAttempt {
            finished: self.finished,
            ..NewAttempt::default()
        };

        let times = [
            (MetricKey::RealTime, &self.realtime),
            (MetricKey::GameTime, &self.gametime),
            (MetricKey::RealTimeMid, &self.realtime_mid),
            (MetricKey::GameTimeMid, &self.gametime_mid),
        ];
        for (key, value) in times {
            if let Some(value) = value {
                apply_field(&mut attempt, key.as_str(), value)?;
            }
        }

        let counts = [
            (MetricKey::Level, self.level),
            (MetricKey::Resets, self.resets),
            (MetricKey::Blackouts, self.blackouts),
            (MetricKey::LevelMid, self.level_mid),
            (MetricKey::ResetsMid, self.resets_mid),
            (MetricKey::BlackoutsMid, self.blackouts_mid),
        ];
        for (key, value) in counts {
            if let Some(value) = value {
                attempt = attempt.with(key, value);
            }
        }

        if let Some(date) = &self.date {
            apply_field(&mut attempt, "date", date)?;
        }
        Ok(attempt)
    }
}

/// Set one `key=value` field of an attempt as typed by a user
pub fn apply_field(attempt: &mut NewAttempt, key: &str, value: &str) -> Result<()> {
    match key {
        "finished" => {
            attempt.finished = Some(
                value
                    .parse()
                    .with_context(|| format!("finished must be true or false, got {value:?}"))?,
            );
        }
        "date" | "releasedate" => {
            let date = parse_date(value);
            if date == UNSET {
                anyhow::bail!("Invalid date: {}. Expected YYYY-MM-DD", value);
            }
            attempt.values.insert(MetricKey::ReleaseDate, date);
        }
        _ => {
            let metric: MetricKey = key.parse().map_err(anyhow::Error::msg)?;
            let parsed = match metric.unit() {
                MetricUnit::Time if matches!(metric, MetricKey::GameTime | MetricKey::GameTimeMid) => {
                    parse_game_time(value)?
                }
                MetricUnit::Time => parse_time(value)?,
                MetricUnit::Count if !metric.is_calculated() => value
                    .parse()
                    .with_context(|| format!("{metric} must be a whole number, got {value:?}"))?,
                _ => anyhow::bail!("{} cannot be set directly", metric),
            };
            attempt.values.insert(metric, parsed);
        }
    }
    Ok(())
}

/// Run add command
pub async fn run(ctx: &Context, tierlist: &str, entity: &str, args: &AttemptArgs) -> Result<()> {
    let attempt = args.to_attempt()?;
    let mut store = ctx.open_workspace().await?;
    let index = find_tierlist(&store, tierlist)?;

    store.set_active_tierlist(Some(index));
    store.insert_active_tierlist_entry(entity, attempt)?;
    for tag in &args.tags {
        store.tag_active_entry(entity, tag)?;
    }
    store
        .save_workspace()
        .await
        .context("Failed to save workspace")?;

    let name = &store.tierlists()[index].name;
    let count = store.tierlists()[index].entries[entity].attempts.len();
    println!("Added attempt #{} for {} to {}", count, entity, name);
    Ok(())
}
