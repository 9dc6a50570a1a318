// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Tierlist library - timed-run rankings kept as human-editable JSON
//!
//! This crate loads a workspace directory of tierlist files into a typed
//! model, lets a session edit it, and writes it back with a stable layout.
//! Unsaved entry edits are rolled back from per-tierlist backups when a
//! tierlist is closed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod config;
pub mod export;
pub mod fs;
pub mod pretty;
pub mod ranking;
pub mod species;
pub mod time;
pub mod workspace;

/// Core data types of a tierlist workspace
pub mod types {
    use serde::{Deserialize, Serialize};
    use serde_json::{Map, Value};
    use std::collections::BTreeMap;
    use std::fmt;
    use std::str::FromStr;

    use crate::time::{format_time_full, format_time_hm, format_time_hms};

    /// Sentinel for "unset" metric values, counters and dates
    pub const UNSET: i64 = -1;

    /// Add two metric values treating [`UNSET`] as absent.
    ///
    /// `-1 + -1 = -1`, `-1 + x = x`, otherwise the plain sum.
    #[must_use]
    pub fn add_metrics(a: i64, b: i64) -> i64 {
        match (a == UNSET, b == UNSET) {
            (true, true) => UNSET,
            (true, false) => b,
            (false, true) => a,
            (false, false) => a + b,
        }
    }

    // =========================================================================
    // Metric keys
    // =========================================================================

    /// Unit a metric is measured in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum MetricUnit {
        /// Tri-state flag (`finished`)
        Flag,
        /// Epoch milliseconds (`releasedate`)
        Date,
        /// Duration in milliseconds
        Time,
        /// Plain count
        Count,
    }

    /// Every metric an attempt carries, static and calculated
    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    pub enum MetricKey {
        /// Whether the run was finished
        #[serde(rename = "finished")]
        Finished,
        /// Date the run was published
        #[serde(rename = "releasedate")]
        ReleaseDate,
        /// Real-time duration
        #[serde(rename = "realtime")]
        RealTime,
        /// In-game clock
        #[serde(rename = "gametime")]
        GameTime,
        /// Mid-split real time
        #[serde(rename = "realtime_0")]
        RealTimeMid,
        /// Mid-split game time
        #[serde(rename = "gametime_0")]
        GameTimeMid,
        /// Final level
        #[serde(rename = "level")]
        Level,
        /// Number of resets
        #[serde(rename = "resets")]
        Resets,
        /// Number of blackouts
        #[serde(rename = "blackouts")]
        Blackouts,
        /// Mid-split level
        #[serde(rename = "level_0")]
        LevelMid,
        /// Mid-split resets
        #[serde(rename = "resets_0")]
        ResetsMid,
        /// Mid-split blackouts
        #[serde(rename = "blackouts_0")]
        BlackoutsMid,
        /// Resets plus blackouts (calculated)
        #[serde(rename = "faults")]
        Faults,
        /// Mid-split resets plus blackouts (calculated)
        #[serde(rename = "faults_0")]
        FaultsMid,
    }

    impl MetricKey {
        /// All metric keys in canonical order
        pub const ALL: [Self; 14] = [
            Self::Finished,
            Self::ReleaseDate,
            Self::RealTime,
            Self::GameTime,
            Self::RealTimeMid,
            Self::GameTimeMid,
            Self::Level,
            Self::Resets,
            Self::Blackouts,
            Self::LevelMid,
            Self::ResetsMid,
            Self::BlackoutsMid,
            Self::Faults,
            Self::FaultsMid,
        ];

        /// Time-unit metrics, in on-disk order
        pub const TIME: [Self; 4] = [
            Self::RealTime,
            Self::GameTime,
            Self::RealTimeMid,
            Self::GameTimeMid,
        ];

        /// Stored count metrics, in on-disk order
        pub const COUNT: [Self; 6] = [
            Self::Level,
            Self::Resets,
            Self::Blackouts,
            Self::LevelMid,
            Self::ResetsMid,
            Self::BlackoutsMid,
        ];

        /// On-disk key
        #[must_use]
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Finished => "finished",
                Self::ReleaseDate => "releasedate",
                Self::RealTime => "realtime",
                Self::GameTime => "gametime",
                Self::RealTimeMid => "realtime_0",
                Self::GameTimeMid => "gametime_0",
                Self::Level => "level",
                Self::Resets => "resets",
                Self::Blackouts => "blackouts",
                Self::LevelMid => "level_0",
                Self::ResetsMid => "resets_0",
                Self::BlackoutsMid => "blackouts_0",
                Self::Faults => "faults",
                Self::FaultsMid => "faults_0",
            }
        }

        /// Display title
        #[must_use]
        pub fn title(self) -> &'static str {
            match self {
                Self::Finished => "Finished",
                Self::ReleaseDate => "Release Date",
                Self::RealTime => "Real Time",
                Self::GameTime => "Game Time",
                Self::RealTimeMid => "Real Time (Mid)",
                Self::GameTimeMid => "Game Time (Mid)",
                Self::Level => "Level",
                Self::Resets => "Resets",
                Self::Blackouts => "Blackouts",
                Self::LevelMid => "Level (Mid)",
                Self::ResetsMid => "Resets (Mid)",
                Self::BlackoutsMid => "Blackouts (Mid)",
                Self::Faults => "Faults",
                Self::FaultsMid => "Faults (Mid)",
            }
        }

        /// Unit of the metric
        #[must_use]
        pub fn unit(self) -> MetricUnit {
            match self {
                Self::Finished => MetricUnit::Flag,
                Self::ReleaseDate => MetricUnit::Date,
                Self::RealTime | Self::GameTime | Self::RealTimeMid | Self::GameTimeMid => {
                    MetricUnit::Time
                }
                _ => MetricUnit::Count,
            }
        }

        /// Whether the value is derived rather than stored
        #[must_use]
        pub fn is_calculated(self) -> bool {
            matches!(self, Self::Faults | Self::FaultsMid)
        }

        /// Whether tier thresholds can be defined for this metric
        #[must_use]
        pub fn has_thresholds(self) -> bool {
            matches!(self.unit(), MetricUnit::Time | MetricUnit::Count)
        }

        /// Format a value for tier labels
        #[must_use]
        pub fn format_label(self, value: i64) -> String {
            match self {
                Self::GameTime | Self::GameTimeMid => format_time_hm(value),
                Self::RealTime | Self::RealTimeMid => format_time_hms(value, false),
                Self::Level | Self::LevelMid => format!("Lv:{value}"),
                _ => value.to_string(),
            }
        }

        /// Format a value for display and for the on-disk form of time metrics
        #[must_use]
        pub fn format_value(self, value: i64) -> String {
            match self {
                Self::GameTime | Self::GameTimeMid => format_time_hms(value, false),
                Self::RealTime | Self::RealTimeMid => format_time_full(value, false),
                _ => value.to_string(),
            }
        }
    }

    impl fmt::Display for MetricKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for MetricKey {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Self::ALL
                .into_iter()
                .find(|key| key.as_str() == s)
                .ok_or_else(|| {
                    let valid: Vec<_> = Self::ALL.iter().map(|k| k.as_str()).collect();
                    format!("unknown metric: {s}. Valid: {}", valid.join(", "))
                })
        }
    }

    // =========================================================================
    // Metrics (one attempt)
    // =========================================================================

    /// One timed attempt.
    ///
    /// Every numeric field is non-negative or [`UNSET`]. `finished` is
    /// tri-state: `None` means unknown.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Metrics {
        /// Whether the run reached the end
        pub finished: Option<bool>,
        /// Publication date, epoch milliseconds
        pub releasedate: i64,
        /// Real time in milliseconds
        pub realtime: i64,
        /// Game time in milliseconds
        pub gametime: i64,
        /// Mid-split real time in milliseconds
        pub realtime_0: i64,
        /// Mid-split game time in milliseconds
        pub gametime_0: i64,
        /// Final level
        pub level: i64,
        /// Resets
        pub resets: i64,
        /// Blackouts
        pub blackouts: i64,
        /// Mid-split level
        pub level_0: i64,
        /// Mid-split resets
        pub resets_0: i64,
        /// Mid-split blackouts
        pub blackouts_0: i64,
    }

    impl Default for Metrics {
        fn default() -> Self {
            Self {
                finished: None,
                releasedate: UNSET,
                realtime: UNSET,
                gametime: UNSET,
                realtime_0: UNSET,
                gametime_0: UNSET,
                level: UNSET,
                resets: UNSET,
                blackouts: UNSET,
                level_0: UNSET,
                resets_0: UNSET,
                blackouts_0: UNSET,
            }
        }
    }

    impl Metrics {
        /// Resets plus blackouts
        #[must_use]
        pub fn faults(&self) -> i64 {
            add_metrics(self.resets, self.blackouts)
        }

        /// Mid-split resets plus blackouts
        #[must_use]
        pub fn faults_0(&self) -> i64 {
            add_metrics(self.resets_0, self.blackouts_0)
        }

        /// Read any metric as an integer; `finished` maps to -1 / 0 / 1
        #[must_use]
        pub fn get(&self, key: MetricKey) -> i64 {
            match key {
                MetricKey::Finished => match self.finished {
                    None => UNSET,
                    Some(false) => 0,
                    Some(true) => 1,
                },
                MetricKey::ReleaseDate => self.releasedate,
                MetricKey::RealTime => self.realtime,
                MetricKey::GameTime => self.gametime,
                MetricKey::RealTimeMid => self.realtime_0,
                MetricKey::GameTimeMid => self.gametime_0,
                MetricKey::Level => self.level,
                MetricKey::Resets => self.resets,
                MetricKey::Blackouts => self.blackouts,
                MetricKey::LevelMid => self.level_0,
                MetricKey::ResetsMid => self.resets_0,
                MetricKey::BlackoutsMid => self.blackouts_0,
                MetricKey::Faults => self.faults(),
                MetricKey::FaultsMid => self.faults_0(),
            }
        }

        /// Mutable access to a stored numeric metric; `None` for `finished`
        /// and the calculated metrics
        pub fn slot_mut(&mut self, key: MetricKey) -> Option<&mut i64> {
            match key {
                MetricKey::ReleaseDate => Some(&mut self.releasedate),
                MetricKey::RealTime => Some(&mut self.realtime),
                MetricKey::GameTime => Some(&mut self.gametime),
                MetricKey::RealTimeMid => Some(&mut self.realtime_0),
                MetricKey::GameTimeMid => Some(&mut self.gametime_0),
                MetricKey::Level => Some(&mut self.level),
                MetricKey::Resets => Some(&mut self.resets),
                MetricKey::Blackouts => Some(&mut self.blackouts),
                MetricKey::LevelMid => Some(&mut self.level_0),
                MetricKey::ResetsMid => Some(&mut self.resets_0),
                MetricKey::BlackoutsMid => Some(&mut self.blackouts_0),
                MetricKey::Finished | MetricKey::Faults | MetricKey::FaultsMid => None,
            }
        }

        /// Whether the run counts as finished; unknown counts as finished
        #[must_use]
        pub fn is_finished(&self) -> bool {
            self.finished != Some(false)
        }
    }

    /// A partially specified attempt, as entered by a user.
    ///
    /// Absent fields become [`UNSET`] (or unknown) when inserted.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct NewAttempt {
        /// Whether the run reached the end
        pub finished: Option<bool>,
        /// Stored metric values by key
        pub values: BTreeMap<MetricKey, i64>,
    }

    impl NewAttempt {
        /// Set a stored metric value
        #[must_use]
        pub fn with(mut self, key: MetricKey, value: i64) -> Self {
            self.values.insert(key, value);
            self
        }

        /// Build the full attempt with every missing field defaulted
        #[must_use]
        pub fn into_metrics(self) -> Metrics {
            let mut metrics = Metrics {
                finished: self.finished,
                ..Metrics::default()
            };
            for (key, value) in self.values {
                if let Some(slot) = metrics.slot_mut(key) {
                    *slot = value;
                }
            }
            metrics
        }
    }

    // =========================================================================
    // Entries and tierlists
    // =========================================================================

    /// One entity's full attempt history
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TierlistEntry {
        /// Stored attempt counter, [`UNSET`] when unknown
        pub num_attempts: i64,
        /// Stored finish counter, [`UNSET`] when unknown
        pub num_finishes: i64,
        /// Tags in insertion order
        pub tags: Vec<String>,
        /// Attempts; index 0 is the first attempt
        pub attempts: Vec<Metrics>,
    }

    impl TierlistEntry {
        /// A fresh entry holding a single attempt, counters zeroed
        #[must_use]
        pub fn with_attempt(attempt: Metrics) -> Self {
            Self {
                num_attempts: 0,
                num_finishes: 0,
                tags: Vec::new(),
                attempts: vec![attempt],
            }
        }

        /// The first attempt ever recorded
        #[must_use]
        pub fn first_attempt(&self) -> Option<&Metrics> {
            self.attempts.first()
        }
    }

    /// Entity name to entry
    pub type Entries = BTreeMap<String, TierlistEntry>;

    /// A named ordered set of tier cut points
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ThresholdSet {
        /// Display label
        pub label: String,
        /// Cut points in the metric's unit
        pub data: Vec<i64>,
    }

    /// Metric key to its threshold sets
    pub type Thresholds = BTreeMap<MetricKey, Vec<ThresholdSet>>;

    /// Optional display labels and image references
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TierlistDisplay {
        /// Source image reference
        #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub image_source: Option<String>,
        /// Platform label
        #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub platform: Option<String>,
        /// Cartridge image reference
        #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub cartridge_image: Option<String>,
        /// Whether the tierlist is listed; `None` means visible
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub visible: Option<bool>,
        /// Label of the final tier
        #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub final_tier_label: Option<String>,
        /// Label of the surge tier
        #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub surge_tier_label: Option<String>,
        /// Image of the surge tier
        #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub surge_tier_image: Option<String>,
        /// Label of the bruno tier
        #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub bruno_tier_label: Option<String>,
        /// Image of the bruno tier
        #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub bruno_tier_image: Option<String>,
        /// S tier label
        #[serde(default, rename = "sTierLabel", deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub s_tier_label: Option<String>,
        /// A tier label
        #[serde(default, rename = "aTierLabel", deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub a_tier_label: Option<String>,
        /// B tier label
        #[serde(default, rename = "bTierLabel", deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub b_tier_label: Option<String>,
        /// C tier label
        #[serde(default, rename = "cTierLabel", deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub c_tier_label: Option<String>,
        /// D tier label
        #[serde(default, rename = "dTierLabel", deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub d_tier_label: Option<String>,
        /// E tier label
        #[serde(default, rename = "eTierLabel", deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub e_tier_label: Option<String>,
        /// F tier label
        #[serde(default, rename = "fTierLabel", deserialize_with = "non_blank", skip_serializing_if = "is_blank")]
        pub f_tier_label: Option<String>,
    }

    #[allow(clippy::ref_option)]
    fn is_blank(value: &Option<String>) -> bool {
        value.as_deref().map_or(true, str::is_empty)
    }

    fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()))
    }

    /// Game assumed when a tierlist names none
    pub const DEFAULT_GAME: &str = "Yellow";

    /// One named ranking sheet
    #[derive(Debug, Clone, PartialEq)]
    pub struct Tierlist {
        /// On-disk file name; empty while unsaved
        pub filename: String,
        /// Display title
        pub name: String,
        /// Ruleset / species-data partition
        pub game: String,
        /// Auxiliary totals
        pub total: Vec<i64>,
        /// Thresholds applied to first attempts
        pub thresholds_first: Thresholds,
        /// Thresholds applied to best attempts
        pub thresholds_best: Thresholds,
        /// Entity name to attempt history
        pub entries: Entries,
        /// Optional labels and images
        pub display: TierlistDisplay,
        /// Unrecognized top-level keys, preserved verbatim
        pub extra: Map<String, Value>,
    }

    impl Tierlist {
        /// Empty skeleton for a new tierlist
        #[must_use]
        pub fn skeleton(name: &str) -> Self {
            Self {
                filename: Self::filename_for(name),
                name: name.to_string(),
                game: DEFAULT_GAME.to_string(),
                total: vec![0],
                thresholds_first: Thresholds::new(),
                thresholds_best: Thresholds::new(),
                entries: Entries::new(),
                display: TierlistDisplay::default(),
                extra: Map::new(),
            }
        }

        /// File name derived from a display name: lowercased, every
        /// character outside `[a-z0-9]` replaced by `_`, plus `.json`
        #[must_use]
        pub fn filename_for(name: &str) -> String {
            let stem: String = name
                .to_lowercase()
                .chars()
                .map(|c| {
                    if c.is_ascii_lowercase() || c.is_ascii_digit() {
                        c
                    } else {
                        '_'
                    }
                })
                .collect();
            format!("{stem}.json")
        }

        /// Whether the tierlist is listed
        #[must_use]
        pub fn is_visible(&self) -> bool {
            self.display.visible.unwrap_or(true)
        }

        /// Thresholds for a category
        #[must_use]
        pub fn thresholds(&self, best: bool) -> &Thresholds {
            if best {
                &self.thresholds_best
            } else {
                &self.thresholds_first
            }
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::types::*;
    pub use crate::workspace::{LoadReport, WorkspaceError, WorkspaceStore};
}
