// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Show command - tier ranking of one tierlist

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use tierlist::ranking::{
    category_attempts, filter_attempts, group_into_tiers, resolve_category, tier_labels, Category,
    RankingFilter, Tier,
};
use tierlist::species::SpeciesLookup;
use tierlist::time::parse_date;
use tierlist::types::{MetricKey, Tierlist, UNSET};

use super::{find_tierlist, Context};

/// What to rank and how to filter it
#[derive(Debug, Clone)]
pub struct ShowOptions {
    /// Requested category
    pub category: Category,
    /// Metric to rank by
    pub metric: MetricKey,
    /// Index of the threshold set
    pub threshold: usize,
    /// Only entries with one of these tags
    pub tags: Vec<String>,
    /// Drop entries with these tags (config default when empty)
    pub exclude_tags: Vec<String>,
    /// Entities to leave out
    pub exclude: Vec<String>,
    /// Only species of these types
    pub types: Vec<String>,
    /// Only species with these growth rates
    pub growth_rates: Vec<String>,
    /// Ignore attempts released after this date
    pub before: Option<String>,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self {
            category: Category::Best,
            metric: MetricKey::RealTime,
            threshold: 0,
            tags: Vec::new(),
            exclude_tags: Vec::new(),
            exclude: Vec::new(),
            types: Vec::new(),
            growth_rates: Vec::new(),
            before: None,
        }
    }
}

impl ShowOptions {
    /// Ranking filter; `default_excludes` applies when no exclude tag is given
    pub fn filter(&self, default_excludes: &[String]) -> Result<RankingFilter> {
        let mut filter = RankingFilter {
            exclude_entities: self.exclude.clone(),
            include_tags: self.tags.clone(),
            exclude_tags: if self.exclude_tags.is_empty() {
                default_excludes.to_vec()
            } else {
                self.exclude_tags.clone()
            },
            include_types: self.types.clone(),
            include_growth_rates: self.growth_rates.clone(),
            ..RankingFilter::default()
        };
        if let Some(before) = &self.before {
            let date = parse_date(before.as_str());
            if date == UNSET {
                anyhow::bail!("Invalid date: {}. Expected YYYY-MM-DD", before);
            }
            filter.release_date_threshold = date;
        }
        Ok(filter)
    }
}

/// One ranked entity
#[derive(Debug, Clone, Serialize)]
pub struct RowView {
    /// Entity name
    pub entity: String,
    /// Formatted metric value
    pub value: String,
    /// Raw metric value
    pub metric: i64,
    /// Entity ranked just before in the same tier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// One tier with its header
#[derive(Debug, Clone, Serialize)]
pub struct TierView {
    /// Tier name, with overrides applied
    pub name: String,
    /// Cut point label
    pub label: String,
    /// Ranked entities, best first
    pub entries: Vec<RowView>,
}

/// A complete ranking
#[derive(Debug, Clone, Serialize)]
pub struct RankingView {
    /// Tierlist name
    pub tierlist: String,
    /// Category actually shown
    pub category: String,
    /// Metric ranked by
    pub metric: String,
    /// Label of the threshold set used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<String>,
    /// The ten tiers
    pub tiers: Vec<TierView>,
}

/// Rank a tierlist
pub fn build(
    tierlist: &Tierlist,
    options: &ShowOptions,
    filter: &RankingFilter,
    lookup: Option<&dyn SpeciesLookup>,
) -> Result<RankingView> {
    if !options.metric.has_thresholds() {
        anyhow::bail!("Cannot rank by {}. Pick a time or count metric", options.metric);
    }

    let ranked = |category| {
        filter_attempts(category_attempts(tierlist, category, filter, lookup), filter)
    };
    let mut attempts = ranked(options.category);
    let category = resolve_category(options.category, attempts.len(), tierlist);
    if category != options.category {
        tracing::debug!("No best attempts in {}, showing first attempts", tierlist.name);
        attempts = ranked(category);
    }

    let set = tierlist
        .thresholds(category == Category::Best)
        .get(&options.metric)
        .and_then(|sets| sets.get(options.threshold));
    let cuts = set.map_or(&[][..], |s| s.data.as_slice());

    let groups = group_into_tiers(&attempts, options.metric, cuts);
    let labels = tier_labels(options.metric, cuts);
    let tiers = Tier::ALL
        .iter()
        .zip(groups)
        .zip(labels)
        .map(|((tier, entries), label)| TierView {
            name: tier.name(&tierlist.display),
            label,
            entries: entries
                .into_iter()
                .map(|e| RowView {
                    entity: e.entity.to_string(),
                    value: e.value,
                    metric: e.metric,
                    prev: e.prev.map(str::to_string),
                })
                .collect(),
        })
        .collect();

    Ok(RankingView {
        tierlist: tierlist.name.clone(),
        category: category.to_string(),
        metric: options.metric.to_string(),
        threshold: set.map(|s| s.label.clone()),
        tiers,
    })
}

/// Print a ranking as text
pub fn print(view: &RankingView, color: bool) {
    let mut header = format!("{} ({}, {})", view.tierlist, view.category, view.metric);
    if let Some(label) = view.threshold.as_deref().filter(|l| !l.is_empty()) {
        header.push_str(&format!(" [{label}]"));
    }
    if color {
        println!("{}", header.bold());
    } else {
        println!("{}", header);
    }

    for tier in &view.tiers {
        let entries = if tier.entries.is_empty() {
            "-".to_string()
        } else {
            tier.entries
                .iter()
                .map(|e| format!("{} {}", e.entity, e.value))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let name = format!("{:<10}", tier.name);
        if color {
            println!("{} {:<12} {}", name.cyan(), tier.label.dimmed(), entries);
        } else {
            println!("{} {:<12} {}", name, tier.label, entries);
        }
    }
}

/// Run show command
pub async fn run(ctx: &Context, tierlist: &str, options: &ShowOptions) -> Result<()> {
    let store = ctx.open_workspace().await?;
    let index = find_tierlist(&store, tierlist)?;
    let species = ctx.species()?;
    let filter = options.filter(&ctx.config.exclude_tags)?;

    let view = build(
        &store.tierlists()[index],
        options,
        &filter,
        species.as_ref().map(|s| s as &dyn SpeciesLookup),
    )?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print(&view, ctx.color);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierlist::types::{Metrics, ThresholdSet, TierlistEntry};

    fn attempt(realtime: i64) -> Metrics {
        Metrics {
            finished: Some(true),
            realtime,
            releasedate: 0,
            ..Metrics::default()
        }
    }

    fn sample() -> Tierlist {
        let mut tierlist = Tierlist::skeleton("Runs");
        tierlist.thresholds_first.insert(
            MetricKey::RealTime,
            vec![ThresholdSet {
                label: "Any%".to_string(),
                data: vec![10, 20, 30, 40, 50, 60, 70, 80],
            }],
        );
        for (name, time) in [("Abra", 5), ("Zubat", 25), ("Onix", 95)] {
            tierlist
                .entries
                .insert(name.to_string(), TierlistEntry::with_attempt(attempt(time)));
        }
        tierlist
    }

    #[test]
    fn test_build_falls_back_to_first() {
        let tierlist = sample();
        let options = ShowOptions::default();
        let filter = options.filter(&[]).unwrap();

        let view = build(&tierlist, &options, &filter, None).unwrap();
        assert_eq!(view.category, "first");
        assert_eq!(view.threshold.as_deref(), Some("Any%"));
        assert_eq!(view.tiers.len(), 10);
        assert_eq!(view.tiers[0].entries[0].entity, "Abra");
        assert_eq!(view.tiers[2].entries[0].entity, "Zubat");
        assert_eq!(view.tiers[8].entries[0].entity, "Onix");
        assert_eq!(view.tiers[9].label, "Can't Finish");
    }

    #[test]
    fn test_build_excludes() {
        let tierlist = sample();
        let options = ShowOptions {
            category: Category::First,
            exclude: vec!["Abra".to_string()],
            ..ShowOptions::default()
        };
        let filter = options.filter(&[]).unwrap();

        let view = build(&tierlist, &options, &filter, None).unwrap();
        let shown: usize = view.tiers.iter().map(|t| t.entries.len()).sum();
        assert_eq!(shown, 2);
    }

    #[test]
    fn test_build_rejects_flag_metric() {
        let options = ShowOptions {
            metric: MetricKey::Finished,
            ..ShowOptions::default()
        };
        let filter = options.filter(&[]).unwrap();
        assert!(build(&sample(), &options, &filter, None).is_err());
    }

    #[test]
    fn test_filter_defaults_and_dates() {
        let options = ShowOptions::default();
        let filter = options.filter(&["backport".to_string()]).unwrap();
        assert_eq!(filter.exclude_tags, vec!["backport".to_string()]);

        let options = ShowOptions {
            before: Some("not a date".to_string()),
            ..ShowOptions::default()
        };
        assert!(options.filter(&[]).is_err());

        let options = ShowOptions {
            before: Some("2024-03-09".to_string()),
            ..ShowOptions::default()
        };
        let filter = options.filter(&[]).unwrap();
        assert_eq!(filter.release_date_threshold, 1_709_942_400_000);
    }
}
