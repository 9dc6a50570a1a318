// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Tierlist file codec
//!
//! Converts between the on-disk JSON shape and [`Tierlist`]. Parsing
//! normalizes every attempt (absent metrics become `-1`); writing emits only
//! what is known so that a parsed file written back parses to the same model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::pretty::{self, PrettyOptions};
use crate::time::{format_date, parse_date, parse_time, TimeError};
use crate::types::{
    MetricKey, MetricUnit, Metrics, ThresholdSet, Thresholds, Tierlist, TierlistDisplay,
    TierlistEntry, DEFAULT_GAME, UNSET,
};

/// Keys that must be present and truthy for a file to be a tierlist
pub const REQUIRED_KEYS: [&str; 5] = [
    "name",
    "total",
    "thresholds_first",
    "thresholds_best",
    "entries",
];

/// Line length used for every workspace file
pub const MAX_LINE_LENGTH: usize = 150;

/// Errors raised while decoding or encoding a tierlist
#[derive(Debug, Error)]
pub enum CodecError {
    /// Malformed JSON or a value of the wrong type
    #[error("invalid tierlist JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A duration string could not be parsed
    #[error("invalid time in {location}: {source}")]
    Time {
        /// Where the value was found
        location: String,
        /// Underlying parse error
        #[source]
        source: TimeError,
    },

    /// A count threshold that is not an integer
    #[error("invalid {key} threshold value {value:?}")]
    Threshold {
        /// Metric the threshold belongs to
        key: MetricKey,
        /// Offending value
        value: String,
    },
}

// ============================================================================
// On-disk shapes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct TierlistFile {
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    game: Option<String>,
    total: Vec<i64>,
    thresholds_first: Map<String, Value>,
    thresholds_best: Map<String, Value>,
    #[serde(flatten)]
    display: TierlistDisplay,
    #[serde(flatten)]
    extra: Map<String, Value>,
    entries: BTreeMap<String, EntryFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    #[serde(rename = "numAttempts", default)]
    num_attempts: Option<i64>,
    #[serde(rename = "numFinishes", default)]
    num_finishes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    #[serde(default)]
    attempts: Vec<AttemptFile>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AttemptFile {
    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    finished: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    releasedate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    realtime: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gametime: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    realtime_0: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gametime_0: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resets: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blackouts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level_0: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resets_0: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blackouts_0: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ThresholdFile {
    #[serde(default)]
    label: String,
    #[serde(default)]
    data: Vec<Scalar>,
}

/// A metric value as written: time metrics as strings, counts as numbers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(i64),
    Text(String),
}

/// `true`/`false` map to known, anything else to unknown
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| v.as_bool()))
}

/// Non-string values are treated as absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(|v| v.as_str().map(str::to_string)))
}

/// JavaScript-style truthiness of a JSON value
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

// ============================================================================
// Parse
// ============================================================================

/// Parse a tierlist file.
///
/// Returns `Ok(None)` when the text is valid JSON but one of
/// [`REQUIRED_KEYS`] is absent or falsy. The returned tierlist has an empty
/// `filename`; the caller assigns it.
///
/// # Errors
///
/// Malformed JSON, values of the wrong type and malformed time strings.
pub fn parse(text: &str) -> Result<Option<Tierlist>, CodecError> {
    let raw: Value = serde_json::from_str(text)?;

    if let Some(missing) = REQUIRED_KEYS.iter().find(|key| !is_truthy(raw.get(**key))) {
        debug!("Not a tierlist: missing or empty {:?}", missing);
        return Ok(None);
    }

    let mut file: TierlistFile = serde_json::from_value(raw)?;
    file.extra.remove("filename");

    let thresholds_first = parse_thresholds(&file.thresholds_first, "thresholds_first")?;
    let thresholds_best = parse_thresholds(&file.thresholds_best, "thresholds_best")?;

    let mut entries = BTreeMap::new();
    for (entity, entry) in file.entries {
        let attempts = entry
            .attempts
            .into_iter()
            .enumerate()
            .map(|(index, attempt)| parse_attempt(attempt, &format!("{entity}[{index}]")))
            .collect::<Result<Vec<_>, _>>()?;
        entries.insert(
            entity,
            TierlistEntry {
                num_attempts: entry.num_attempts.unwrap_or(UNSET),
                num_finishes: entry.num_finishes.unwrap_or(UNSET),
                tags: entry.tags.unwrap_or_default(),
                attempts,
            },
        );
    }

    Ok(Some(Tierlist {
        filename: String::new(),
        name: file.name,
        game: file
            .game
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| DEFAULT_GAME.to_string()),
        total: file.total,
        thresholds_first,
        thresholds_best,
        entries,
        display: file.display,
        extra: file.extra,
    }))
}

fn parse_thresholds(raw: &Map<String, Value>, field: &str) -> Result<Thresholds, CodecError> {
    let mut thresholds = Thresholds::new();
    for (key, sets) in raw {
        let Some(metric) = key.parse::<MetricKey>().ok().filter(|k| k.has_thresholds()) else {
            debug!("Ignoring {} for unknown metric {:?}", field, key);
            continue;
        };
        if !is_truthy(Some(sets)) {
            continue;
        }
        let sets: Vec<ThresholdFile> = serde_json::from_value(sets.clone())?;
        let mut parsed = Vec::with_capacity(sets.len());
        for set in sets {
            let data = set
                .data
                .iter()
                .map(|value| threshold_value(metric, value, &format!("{field}.{key}")))
                .collect::<Result<Vec<_>, _>>()?;
            parsed.push(ThresholdSet {
                label: set.label,
                data,
            });
        }
        thresholds.insert(metric, parsed);
    }
    Ok(thresholds)
}

fn threshold_value(metric: MetricKey, value: &Scalar, location: &str) -> Result<i64, CodecError> {
    match (metric.unit(), value) {
        (_, Scalar::Number(n)) => Ok(*n),
        (MetricUnit::Time, Scalar::Text(text)) => time_value(text, location),
        (_, Scalar::Text(text)) => text.trim().parse().map_err(|_| CodecError::Threshold {
            key: metric,
            value: text.clone(),
        }),
    }
}

fn time_value(text: &str, location: &str) -> Result<i64, CodecError> {
    parse_time(text).map_err(|source| CodecError::Time {
        location: location.to_string(),
        source,
    })
}

fn parse_attempt(raw: AttemptFile, location: &str) -> Result<Metrics, CodecError> {
    let time = |value: Option<Scalar>, key: MetricKey| match value {
        None => Ok(UNSET),
        Some(Scalar::Number(n)) => Ok(n),
        Some(Scalar::Text(text)) => time_value(&text, &format!("{location}.{key}")),
    };

    Ok(Metrics {
        finished: raw.finished,
        releasedate: parse_date(raw.releasedate.as_deref()),
        realtime: time(raw.realtime, MetricKey::RealTime)?,
        gametime: time(raw.gametime, MetricKey::GameTime)?,
        realtime_0: time(raw.realtime_0, MetricKey::RealTimeMid)?,
        gametime_0: time(raw.gametime_0, MetricKey::GameTimeMid)?,
        level: raw.level.unwrap_or(UNSET),
        resets: raw.resets.unwrap_or(UNSET),
        blackouts: raw.blackouts.unwrap_or(UNSET),
        level_0: raw.level_0.unwrap_or(UNSET),
        resets_0: raw.resets_0.unwrap_or(UNSET),
        blackouts_0: raw.blackouts_0.unwrap_or(UNSET),
    })
}

// ============================================================================
// Stringify
// ============================================================================

/// Serialize a tierlist into its on-disk text.
///
/// # Errors
///
/// Only if serialization itself fails, which the model's types rule out in
/// practice.
pub fn stringify(tierlist: &Tierlist) -> Result<String, CodecError> {
    let entries = tierlist
        .entries
        .iter()
        .map(|(entity, entry)| {
            let file = EntryFile {
                num_attempts: Some(entry.num_attempts),
                num_finishes: Some(entry.num_finishes),
                tags: (!entry.tags.is_empty()).then(|| entry.tags.clone()),
                attempts: entry.attempts.iter().map(write_attempt).collect(),
            };
            (entity.clone(), file)
        })
        .collect();

    let file = TierlistFile {
        name: tierlist.name.clone(),
        game: Some(tierlist.game.clone()),
        total: tierlist.total.clone(),
        thresholds_first: write_thresholds(&tierlist.thresholds_first)?,
        thresholds_best: write_thresholds(&tierlist.thresholds_best)?,
        display: tierlist.display.clone(),
        extra: tierlist.extra.clone(),
        entries,
    };

    Ok(stringify_value(&file)?)
}

/// Write any workspace document with the shared line length.
///
/// # Errors
///
/// Propagates serialization failures.
pub fn stringify_value<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    pretty::stringify(value, &PrettyOptions::default().max_length(MAX_LINE_LENGTH))
}

fn write_thresholds(thresholds: &Thresholds) -> Result<Map<String, Value>, serde_json::Error> {
    let mut out = Map::new();
    // time metrics first, then counts, each in canonical order
    let order = MetricKey::TIME
        .into_iter()
        .chain(MetricKey::COUNT)
        .chain([MetricKey::Faults, MetricKey::FaultsMid]);
    for key in order {
        let Some(sets) = thresholds.get(&key) else {
            continue;
        };
        let sets: Vec<ThresholdFile> = sets
            .iter()
            .map(|set| ThresholdFile {
                label: set.label.clone(),
                data: set.data.iter().map(|&v| write_scalar(key, v)).collect(),
            })
            .collect();
        out.insert(key.as_str().to_string(), serde_json::to_value(sets)?);
    }
    Ok(out)
}

fn write_scalar(key: MetricKey, value: i64) -> Scalar {
    if key.unit() == MetricUnit::Time {
        Scalar::Text(key.format_value(value))
    } else {
        Scalar::Number(value)
    }
}

fn write_attempt(attempt: &Metrics) -> AttemptFile {
    let time = |key: MetricKey| {
        let value = attempt.get(key);
        (value != UNSET).then(|| write_scalar(key, value))
    };
    let count = |value: i64| (value != UNSET).then_some(value);

    AttemptFile {
        finished: attempt.finished,
        releasedate: (attempt.releasedate != UNSET).then(|| format_date(attempt.releasedate)),
        realtime: time(MetricKey::RealTime),
        gametime: time(MetricKey::GameTime),
        realtime_0: time(MetricKey::RealTimeMid),
        gametime_0: time(MetricKey::GameTimeMid),
        level: count(attempt.level),
        resets: count(attempt.resets),
        blackouts: count(attempt.blackouts),
        level_0: count(attempt.level_0),
        resets_0: count(attempt.resets_0),
        blackouts_0: count(attempt.blackouts_0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "Gen 1 - Yellow",
        "game": "Yellow",
        "total": [151],
        "thresholds_first": {
            "realtime": [{"label": "Default", "data": ["1:00:00", "1:10:00.50"]}],
            "level": [{"label": "Levels", "data": [20, 30]}]
        },
        "thresholds_best": {"unknown": [{"label": "x", "data": [1]}]},
        "platform": "GB",
        "customKey": {"nested": true},
        "entries": {
            "Pikachu": {
                "numAttempts": 4,
                "numFinishes": 2,
                "tags": ["starter"],
                "attempts": [
                    {"finished": true, "releasedate": "2024-03-09", "realtime": "1:23:45.67",
                     "gametime": "1:20:00", "level": 42, "resets": 1, "blackouts": 2}
                ]
            },
            "Mew": {"attempts": [{"finished": "maybe"}]}
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let tierlist = parse(SAMPLE).unwrap().unwrap();
        assert_eq!(tierlist.filename, "");
        assert_eq!(tierlist.name, "Gen 1 - Yellow");
        assert_eq!(tierlist.total, vec![151]);
        assert_eq!(tierlist.display.platform.as_deref(), Some("GB"));
        assert!(tierlist.extra.contains_key("customKey"));
        assert!(tierlist.is_visible());

        let realtime = &tierlist.thresholds_first[&MetricKey::RealTime][0];
        assert_eq!(realtime.label, "Default");
        assert_eq!(realtime.data, vec![3_600_000, 4_200_500]);
        assert_eq!(tierlist.thresholds_first[&MetricKey::Level][0].data, vec![20, 30]);
        assert!(tierlist.thresholds_best.is_empty());

        let pikachu = &tierlist.entries["Pikachu"];
        assert_eq!(pikachu.num_attempts, 4);
        assert_eq!(pikachu.tags, vec!["starter"]);
        let attempt = &pikachu.attempts[0];
        assert_eq!(attempt.finished, Some(true));
        assert_eq!(attempt.realtime, 5_025_670);
        assert_eq!(attempt.gametime, 4_800_000);
        assert_eq!(attempt.faults(), 3);
        assert_eq!(attempt.faults_0(), UNSET);
        assert_eq!(attempt.realtime_0, UNSET);

        let mew = &tierlist.entries["Mew"];
        assert_eq!(mew.num_attempts, UNSET);
        assert!(mew.tags.is_empty());
        assert_eq!(mew.attempts[0], Metrics::default());
    }

    #[test]
    fn test_missing_or_falsy_required_key() {
        assert!(parse(r#"{"name": "x", "total": [0], "thresholds_first": {}, "thresholds_best": {}}"#)
            .unwrap()
            .is_none());
        assert!(parse(r#"{"name": "", "total": [0], "thresholds_first": {}, "thresholds_best": {}, "entries": {}}"#)
            .unwrap()
            .is_none());
        assert!(parse("[1, 2]").unwrap().is_none());
    }

    #[test]
    fn test_empty_containers_are_truthy() {
        let tierlist = parse(r#"{"name": "x", "total": [], "thresholds_first": {}, "thresholds_best": {}, "entries": {}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(tierlist.game, DEFAULT_GAME);
        assert!(tierlist.entries.is_empty());
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(matches!(parse("{not json"), Err(CodecError::Json(_))));
        let bad_time = r#"{"name": "x", "total": [0], "thresholds_first": {}, "thresholds_best": {},
            "entries": {"A": {"attempts": [{"realtime": "1.2345"}]}}}"#;
        assert!(matches!(parse(bad_time), Err(CodecError::Time { .. })));

        let huge_time = r#"{"name": "x", "total": [0], "thresholds_first": {}, "thresholds_best": {},
            "entries": {"A": {"attempts": [{"realtime": "9999999999999999:00:00"}]}}}"#;
        assert!(matches!(
            parse(huge_time),
            Err(CodecError::Time {
                source: TimeError::Overflow { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_stringify_omits_unknowns() {
        let mut tierlist = Tierlist::skeleton("Test");
        tierlist.entries.insert(
            "Eevee".to_string(),
            TierlistEntry::with_attempt(Metrics {
                realtime: 83_000,
                ..Metrics::default()
            }),
        );
        let text = stringify(&tierlist).unwrap();
        assert!(text.contains(r#""realtime": "0:01:23.00""#));
        assert!(!text.contains("finished"));
        assert!(!text.contains("releasedate"));
        assert!(!text.contains("tags"));
        assert!(!text.contains("filename"));
    }

    #[test]
    fn test_visible_false_is_written() {
        let mut tierlist = Tierlist::skeleton("Hidden");
        tierlist.display.visible = Some(false);
        let text = stringify(&tierlist).unwrap();
        assert!(text.contains(r#""visible": false"#));
        assert!(!parse(&text).unwrap().unwrap().is_visible());
    }

    #[test]
    fn test_key_order() {
        let tierlist = parse(SAMPLE).unwrap().unwrap();
        let text = stringify(&tierlist).unwrap();
        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("\"name\"") < pos("\"game\""));
        assert!(pos("\"thresholds_best\"") < pos("\"platform\""));
        assert!(pos("\"platform\"") < pos("\"customKey\""));
        assert!(pos("\"customKey\"") < pos("\"entries\""));
    }

    #[test]
    fn test_round_trip() {
        let first = parse(SAMPLE).unwrap().unwrap();
        let text = stringify(&first).unwrap();
        let second = parse(&text).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(stringify(&second).unwrap(), text);
    }
}
