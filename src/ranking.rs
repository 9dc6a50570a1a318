// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Attempt selection and tier grouping
//!
//! A ranking picks one attempt per entity (the first one, or the best one
//! among retries), filters them, and sorts them into ten tiers using one
//! threshold set of the chosen metric.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::species::SpeciesLookup;
use crate::time::{current_date, parse_date};
use crate::types::{MetricKey, Metrics, Tierlist, TierlistDisplay, UNSET};

/// Tags excluded unless the caller says otherwise
pub const DEFAULT_EXCLUDE_TAGS: [&str; 2] = ["backports", "backport"];

/// Which attempt represents an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    /// The first attempt ever recorded
    First,
    /// The fastest retry
    #[default]
    Best,
}

impl Category {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Best => "best",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "best" => Ok(Self::Best),
            _ => Err(format!("unknown category: {s}. Valid: first, best")),
        }
    }
}

/// The ten tiers, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// S
    S,
    /// A
    A,
    /// B
    B,
    /// C
    C,
    /// D
    D,
    /// E
    E,
    /// F
    F,
    /// Just past the F cut
    Surge,
    /// Past every cut point
    Bruno,
    /// Did not finish
    Impossible,
}

impl Tier {
    /// All tiers in order
    pub const ALL: [Self; 10] = [
        Self::S,
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::Surge,
        Self::Bruno,
        Self::Impossible,
    ];

    /// Name shown when the tierlist does not override it
    #[must_use]
    pub fn default_name(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::Surge => "Surge",
            Self::Bruno => "Bruno",
            Self::Impossible => "Impossible",
        }
    }

    /// Name with the tierlist's label overrides applied
    #[must_use]
    pub fn name(self, display: &TierlistDisplay) -> String {
        let custom = match self {
            Self::S => &display.s_tier_label,
            Self::A => &display.a_tier_label,
            Self::B => &display.b_tier_label,
            Self::C => &display.c_tier_label,
            Self::D => &display.d_tier_label,
            Self::E => &display.e_tier_label,
            Self::F => &display.f_tier_label,
            Self::Surge => &display.surge_tier_label,
            Self::Bruno => &display.bruno_tier_label,
            Self::Impossible => &display.final_tier_label,
        };
        custom
            .clone()
            .unwrap_or_else(|| self.default_name().to_string())
    }
}

/// Filters applied while ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingFilter {
    /// Entities never shown
    pub exclude_entities: Vec<String>,
    /// When non-empty, entries need at least one of these tags
    pub include_tags: Vec<String>,
    /// Entries with any of these tags are dropped
    pub exclude_tags: Vec<String>,
    /// When non-empty, species need one of these types
    pub include_types: Vec<String>,
    /// When non-empty, species need one of these growth rates
    pub include_growth_rates: Vec<String>,
    /// Attempts released after this date (epoch ms) are ignored
    pub release_date_threshold: i64,
}

impl Default for RankingFilter {
    fn default() -> Self {
        Self {
            exclude_entities: Vec::new(),
            include_tags: Vec::new(),
            exclude_tags: DEFAULT_EXCLUDE_TAGS.iter().map(|t| (*t).to_string()).collect(),
            include_types: Vec::new(),
            include_growth_rates: Vec::new(),
            release_date_threshold: parse_date(current_date().as_str()),
        }
    }
}

impl RankingFilter {
    fn species_allowed(
        &self,
        game: &str,
        entity: &str,
        lookup: Option<&dyn SpeciesLookup>,
    ) -> bool {
        if self.include_types.is_empty() && self.include_growth_rates.is_empty() {
            return true;
        }
        let Some(info) = lookup.and_then(|l| l.species(game, entity)) else {
            return false;
        };
        (self.include_types.is_empty() || info.has_any_type(&self.include_types))
            && (self.include_growth_rates.is_empty()
                || self.include_growth_rates.contains(&info.growth_rate))
    }

    fn released(&self, attempt: &Metrics) -> bool {
        attempt.releasedate <= self.release_date_threshold
    }
}

/// The attempt chosen to represent one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedAttempt<'a> {
    /// Entity name
    pub entity: &'a str,
    /// Chosen attempt
    pub attempt: &'a Metrics,
    /// Entry tags
    pub tags: &'a [String],
}

/// First attempt of every entity released before the threshold
#[must_use]
pub fn first_attempts<'a>(
    tierlist: &'a Tierlist,
    filter: &RankingFilter,
    lookup: Option<&dyn SpeciesLookup>,
) -> Vec<RankedAttempt<'a>> {
    tierlist
        .entries
        .iter()
        .filter_map(|(entity, entry)| {
            let attempt = entry.first_attempt()?;
            (filter.released(attempt)
                && filter.species_allowed(&tierlist.game, entity, lookup))
            .then_some(RankedAttempt {
                entity,
                attempt,
                tags: &entry.tags,
            })
        })
        .collect()
}

/// Fastest released attempt of every entity that has retries.
///
/// Entities whose only released attempt is the first one are left out.
/// Attempts without a real time rank last.
#[must_use]
pub fn best_attempts<'a>(
    tierlist: &'a Tierlist,
    filter: &RankingFilter,
    lookup: Option<&dyn SpeciesLookup>,
) -> Vec<RankedAttempt<'a>> {
    tierlist
        .entries
        .iter()
        .filter_map(|(entity, entry)| {
            if entry.attempts.len() <= 1 {
                return None;
            }
            let released: Vec<(usize, &Metrics)> = entry
                .attempts
                .iter()
                .enumerate()
                .filter(|(_, a)| filter.released(a))
                .collect();
            match released.as_slice() {
                [] | [(0, _)] => return None,
                _ => {}
            }
            if !filter.species_allowed(&tierlist.game, entity, lookup) {
                return None;
            }
            let (_, attempt) = released
                .into_iter()
                .min_by_key(|(_, a)| if a.realtime == UNSET { i64::MAX } else { a.realtime })?;
            Some(RankedAttempt {
                entity,
                attempt,
                tags: &entry.tags,
            })
        })
        .collect()
}

/// Attempts for a category
#[must_use]
pub fn category_attempts<'a>(
    tierlist: &'a Tierlist,
    category: Category,
    filter: &RankingFilter,
    lookup: Option<&dyn SpeciesLookup>,
) -> Vec<RankedAttempt<'a>> {
    match category {
        Category::First => first_attempts(tierlist, filter, lookup),
        Category::Best => best_attempts(tierlist, filter, lookup),
    }
}

/// Drop excluded entities and apply the tag filters
#[must_use]
pub fn filter_attempts<'a>(
    attempts: Vec<RankedAttempt<'a>>,
    filter: &RankingFilter,
) -> Vec<RankedAttempt<'a>> {
    attempts
        .into_iter()
        .filter(|r| !filter.exclude_entities.iter().any(|e| e == r.entity))
        .filter(|r| !filter.exclude_tags.iter().any(|t| r.tags.contains(t)))
        .filter(|r| {
            filter.include_tags.is_empty() || filter.include_tags.iter().any(|t| r.tags.contains(t))
        })
        .collect()
}

/// Fall back from an empty best ranking to first attempts when any entry
/// has a finished attempt
#[must_use]
pub fn resolve_category(requested: Category, shown: usize, tierlist: &Tierlist) -> Category {
    let any_finished = tierlist
        .entries
        .values()
        .any(|e| e.attempts.iter().any(|a| a.finished == Some(true)));
    if requested == Category::Best && shown == 0 && any_finished {
        Category::First
    } else {
        requested
    }
}

/// One entity placed in a tier
#[derive(Debug, Clone, PartialEq)]
pub struct TierEntry<'a> {
    /// Entity name
    pub entity: &'a str,
    /// The ranked attempt
    pub attempt: &'a Metrics,
    /// Metric value
    pub metric: i64,
    /// Formatted metric value
    pub value: String,
    /// Entity placed just before this one in the same tier
    pub prev: Option<&'a str>,
}

/// Sort attempts by `metric` into the ten tiers.
///
/// Unfinished runs go to [`Tier::Impossible`]; others to the first cut
/// point they are below, or [`Tier::Bruno`] when past all of them. Attempts
/// without a value for the metric are left out.
#[must_use]
pub fn group_into_tiers<'a>(
    attempts: &[RankedAttempt<'a>],
    metric: MetricKey,
    thresholds: &[i64],
) -> [Vec<TierEntry<'a>>; 10] {
    let mut groups: [Vec<TierEntry<'a>>; 10] = Default::default();

    let mut measured: Vec<(i64, &RankedAttempt<'a>)> = attempts
        .iter()
        .map(|r| (r.attempt.get(metric), r))
        .filter(|(value, _)| *value >= 0)
        .collect();
    measured.sort_by_key(|(value, _)| *value);

    for (value, ranked) in measured {
        let tier = if ranked.attempt.is_finished() {
            thresholds
                .iter()
                .position(|&cut| value < cut)
                .map_or(Tier::Bruno as usize, |i| i.min(Tier::Bruno as usize))
        } else {
            Tier::Impossible as usize
        };
        let prev = groups[tier].last().map(|e| e.entity);
        groups[tier].push(TierEntry {
            entity: ranked.entity,
            attempt: ranked.attempt,
            metric: value,
            value: metric.format_value(value),
            prev,
        });
    }

    groups
}

/// Header labels of the ten tiers for a threshold set
#[must_use]
pub fn tier_labels(metric: MetricKey, thresholds: &[i64]) -> [String; 10] {
    let label = |i: usize| {
        thresholds
            .get(i)
            .map_or_else(|| "?".to_string(), |&v| metric.format_label(v))
    };
    std::array::from_fn(|i| match i {
        0..=7 => format!("<{}", label(i)),
        8 => format!(">{}", label(Tier::Surge as usize)),
        _ => "Can't Finish".to_string(),
    })
}

/// Every tag used in the tierlist, first occurrence order
#[must_use]
pub fn tag_list(tierlist: &Tierlist) -> Vec<String> {
    let mut seen = HashSet::new();
    tierlist
        .entries
        .values()
        .flat_map(|e| e.tags.iter())
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TierlistEntry;

    fn attempt(realtime: i64, finished: Option<bool>, releasedate: i64) -> Metrics {
        Metrics {
            finished,
            realtime,
            releasedate,
            ..Metrics::default()
        }
    }

    fn entry(tags: &[&str], attempts: Vec<Metrics>) -> TierlistEntry {
        TierlistEntry {
            num_attempts: 0,
            num_finishes: 0,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            attempts,
        }
    }

    fn sample() -> Tierlist {
        let mut t = Tierlist::skeleton("Sample");
        t.entries.insert(
            "Abra".into(),
            entry(&[], vec![attempt(500, Some(true), 10), attempt(300, Some(true), 20)]),
        );
        t.entries.insert("Bulbasaur".into(), entry(&["backport"], vec![attempt(100, Some(true), 10)]));
        t.entries.insert(
            "Caterpie".into(),
            entry(&["bug"], vec![attempt(400, Some(false), 10), attempt(200, Some(true), 999)]),
        );
        t.entries.insert(
            "Ditto".into(),
            entry(&["bug"], vec![attempt(900, None, 10), attempt(UNSET, Some(true), 10), attempt(700, Some(true), 10)]),
        );
        t
    }

    fn filter() -> RankingFilter {
        RankingFilter {
            release_date_threshold: 100,
            ..RankingFilter::default()
        }
    }

    #[test]
    fn test_first_attempts_respect_release_date() {
        let t = sample();
        let mut f = filter();
        f.release_date_threshold = 5;
        assert!(first_attempts(&t, &f, None).is_empty());
        assert_eq!(first_attempts(&t, &filter(), None).len(), 4);
    }

    #[test]
    fn test_best_attempts() {
        let t = sample();
        let best = best_attempts(&t, &filter(), None);
        let picked: Vec<_> = best.iter().map(|r| (r.entity, r.attempt.realtime)).collect();
        // Caterpie's retry is released after the threshold, leaving only its first attempt
        assert_eq!(picked, vec![("Abra", 300), ("Ditto", 700)]);
    }

    #[test]
    fn test_tag_filters() {
        let t = sample();
        let all = first_attempts(&t, &filter(), None);
        let names = |v: Vec<RankedAttempt>| v.iter().map(|r| r.entity.to_string()).collect::<Vec<_>>();

        assert_eq!(names(filter_attempts(all.clone(), &filter())), vec!["Abra", "Caterpie", "Ditto"]);

        let mut f = filter();
        f.include_tags = vec!["bug".into()];
        f.exclude_entities = vec!["Ditto".into()];
        assert_eq!(names(filter_attempts(all, &f)), vec!["Caterpie"]);
    }

    #[test]
    fn test_group_into_tiers() {
        let t = sample();
        let mut f = filter();
        f.exclude_tags.clear();
        let first = first_attempts(&t, &f, None);
        let cuts = [150, 450, 460, 470, 480, 490, 495, 510, 520];
        let groups = group_into_tiers(&first, MetricKey::RealTime, &cuts);

        assert_eq!(groups[Tier::S as usize][0].entity, "Bulbasaur");
        assert_eq!(groups[Tier::Surge as usize][0].entity, "Abra");
        // unfinished
        assert_eq!(groups[Tier::Impossible as usize][0].entity, "Caterpie");
        // unknown finish state counts as finished, past every cut
        assert_eq!(groups[Tier::Bruno as usize][0].entity, "Ditto");
        assert_eq!(groups[Tier::Bruno as usize][0].value, "0:00:00.90");
    }

    #[test]
    fn test_prev_neighbours() {
        let t = sample();
        let first = first_attempts(&t, &filter(), None);
        let groups = group_into_tiers(&first, MetricKey::RealTime, &[1_000]);
        let s = &groups[Tier::S as usize];
        assert_eq!(s.iter().map(|e| e.entity).collect::<Vec<_>>(), vec!["Bulbasaur", "Abra", "Ditto"]);
        assert_eq!(s[0].prev, None);
        assert_eq!(s[2].prev, Some("Abra"));
    }

    #[test]
    fn test_tier_labels() {
        let cuts: Vec<i64> = (1..=9).map(|h| h * 3_600_000).collect();
        let labels = tier_labels(MetricKey::GameTime, &cuts);
        assert_eq!(labels[0], "<1:00");
        assert_eq!(labels[7], "<8:00");
        assert_eq!(labels[8], ">8:00");
        assert_eq!(labels[9], "Can't Finish");
        assert_eq!(tier_labels(MetricKey::Level, &[5])[0], "<Lv:5");
    }

    #[test]
    fn test_tag_list_and_fallback() {
        let t = sample();
        assert_eq!(tag_list(&t), vec!["backport", "bug"]);
        assert_eq!(resolve_category(Category::Best, 0, &t), Category::First);
        assert_eq!(resolve_category(Category::Best, 2, &t), Category::Best);
        assert_eq!(
            resolve_category(Category::Best, 0, &Tierlist::skeleton("empty")),
            Category::Best
        );
    }

    #[test]
    fn test_tier_names() {
        let mut display = TierlistDisplay::default();
        assert_eq!(Tier::Surge.name(&display), "Surge");
        display.s_tier_label = Some("Godlike".into());
        assert_eq!(Tier::S.name(&display), "Godlike");
    }
}
