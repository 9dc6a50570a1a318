// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for the tierlist codecs
//!
//! These tests verify critical invariants:
//! 1. Time fidelity - formatted durations parse back at centisecond resolution
//! 2. Layout - pretty output is valid JSON and respects the line budget
//! 3. Codec fidelity - tierlists survive write/read and rewriting is stable

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use tierlist::codec;
use tierlist::pretty::{self, PrettyOptions};
use tierlist::ranking::{group_into_tiers, RankedAttempt, Tier};
use tierlist::time::{format_date, format_time_full, format_time_hms, parse_date, parse_time};
use tierlist::types::{MetricKey, Metrics, ThresholdSet, Tierlist, TierlistEntry, UNSET};

// =============================================================================
// Test Helpers
// =============================================================================

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[ -~]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn metric(max: i64) -> impl Strategy<Value = i64> {
    prop_oneof![Just(UNSET), 0..max]
}

fn attempt() -> impl Strategy<Value = Metrics> {
    (
        prop::option::of(any::<bool>()),
        prop_oneof![Just(UNSET), (0i64..30_000).prop_map(|d| d * 86_400_000)],
        metric(36_000_000).prop_map(|t| if t < 0 { t } else { t / 10 * 10 }),
        metric(36_000).prop_map(|t| if t < 0 { t } else { t * 1000 }),
        metric(101),
        metric(1000),
    )
        .prop_map(|(finished, releasedate, realtime, gametime, level, resets)| Metrics {
            finished,
            releasedate,
            realtime,
            gametime,
            level,
            resets,
            ..Metrics::default()
        })
}

fn entry() -> impl Strategy<Value = TierlistEntry> {
    (
        prop::collection::vec(attempt(), 1..4),
        prop::collection::vec("[a-z]{3,8}", 0..3),
    )
        .prop_map(|(attempts, tags)| TierlistEntry {
            num_attempts: attempts.len() as i64,
            num_finishes: 0,
            tags,
            attempts,
        })
}

fn tierlist() -> impl Strategy<Value = Tierlist> {
    (
        "[A-Z][a-z]{2,10}( [A-Z][a-z]{2,8})?",
        prop::collection::btree_map("[A-Z][a-z]{2,10}", entry(), 0..6),
        prop::collection::vec((1i64..600).prop_map(|m| m * 60_000), 0..9),
    )
        .prop_map(|(name, entries, cuts)| {
            let mut tierlist = Tierlist::skeleton(&name);
            tierlist.filename = String::new();
            tierlist.entries = entries;
            if !cuts.is_empty() {
                tierlist.thresholds_first.insert(
                    MetricKey::RealTime,
                    vec![ThresholdSet {
                        label: "Default".to_string(),
                        data: cuts,
                    }],
                );
            }
            tierlist
        })
}

// =============================================================================
// Time Fidelity
// =============================================================================

proptest! {
    #[test]
    fn prop_full_time_round_trips_at_centiseconds(ms in 0i64..360_000_000) {
        prop_assert_eq!(parse_time(format_time_full(ms, false).as_str()), Ok(ms / 10 * 10));
        prop_assert_eq!(parse_time(format_time_full(ms, true).as_str()), Ok(ms / 10 * 10));
    }

    #[test]
    fn prop_hms_round_trips_at_seconds(ms in 0i64..360_000_000) {
        prop_assert_eq!(parse_time(format_time_hms(ms, false).as_str()), Ok(ms / 1000 * 1000));
    }

    #[test]
    fn prop_dates_round_trip(days in 0i64..60_000) {
        let ms = days * 86_400_000;
        prop_assert_eq!(parse_date(format_date(ms).as_str()), ms);
    }
}

#[test]
fn test_unset_survives_every_codec() {
    assert_eq!(parse_time(format_time_full(UNSET, false).as_str()), Ok(UNSET));
    assert_eq!(parse_time(None::<&str>), Ok(UNSET));
    assert_eq!(parse_date(None::<&str>), UNSET);
    assert_eq!(parse_date(""), UNSET);
}

// =============================================================================
// Layout
// =============================================================================

proptest! {
    #[test]
    fn prop_pretty_output_is_equivalent_json(value in json_value()) {
        let text = pretty::stringify(&value, &PrettyOptions::default()).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn prop_pretty_lines_fit(value in json_value()) {
        let text = pretty::stringify(&value, &PrettyOptions::default()).unwrap();
        for line in text.split("\r\n") {
            prop_assert!(line.chars().count() <= 80, "line too long: {:?}", line);
        }
    }

    #[test]
    fn prop_empty_indent_is_single_line(value in json_value()) {
        let text = pretty::stringify(&value, &PrettyOptions::default().indent("")).unwrap();
        prop_assert!(!text.contains('\n'));
    }
}

// =============================================================================
// Codec Fidelity
// =============================================================================

proptest! {
    #[test]
    fn prop_tierlist_round_trips(tierlist in tierlist()) {
        let text = codec::stringify(&tierlist).unwrap();
        let back = codec::parse(&text).unwrap().unwrap();
        prop_assert_eq!(back, tierlist);
    }

    #[test]
    fn prop_rewriting_is_stable(tierlist in tierlist()) {
        let once = codec::stringify(&tierlist).unwrap();
        let twice = codec::stringify(&codec::parse(&once).unwrap().unwrap()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_every_ranked_attempt_lands_in_one_tier(tierlist in tierlist()) {
        let attempts: Vec<RankedAttempt<'_>> = tierlist
            .entries
            .iter()
            .filter_map(|(entity, entry)| {
                entry.first_attempt().map(|attempt| RankedAttempt {
                    entity,
                    attempt,
                    tags: &entry.tags,
                })
            })
            .collect();
        let cuts = tierlist
            .thresholds_first
            .get(&MetricKey::RealTime)
            .map_or(Vec::new(), |sets| sets[0].data.clone());

        let groups = group_into_tiers(&attempts, MetricKey::RealTime, &cuts);
        let measured = attempts.iter().filter(|r| r.attempt.realtime >= 0).count();
        prop_assert_eq!(groups.iter().map(Vec::len).sum::<usize>(), measured);

        for (tier, group) in Tier::ALL.iter().zip(&groups) {
            prop_assert!(group.windows(2).all(|w| w[0].metric <= w[1].metric));
            if *tier != Tier::Impossible {
                prop_assert!(group.iter().all(|e| e.attempt.is_finished()));
            }
        }
    }
}

#[test]
fn test_known_file_survives_rewrite() {
    let text = r#"{
        "name": "Gen 2 - Crystal",
        "game": "Crystal",
        "total": [251],
        "thresholds_first": {"gametime": [{"label": "Main", "data": ["1:00:00", "2:00:00"]}]},
        "thresholds_best": {},
        "visible": false,
        "sTierLabel": "Legend",
        "notes": ["kept as is"],
        "filename": "dropped.json",
        "entries": {
            "Chikorita": {
                "numAttempts": 2,
                "numFinishes": 1,
                "attempts": [{"finished": true, "gametime": "1:30:00", "level": 50}]
            }
        }
    }"#;

    let tierlist = codec::parse(text).unwrap().unwrap();
    let rewritten = codec::stringify(&tierlist).unwrap();
    let value: Value = serde_json::from_str(&rewritten).unwrap();

    assert_eq!(value["notes"], json!(["kept as is"]));
    assert_eq!(value["sTierLabel"], json!("Legend"));
    assert_eq!(value["visible"], json!(false));
    assert!(value.get("filename").is_none());
    assert_eq!(value["thresholds_first"]["gametime"][0]["data"], json!(["1:00:00", "2:00:00"]));
    assert_eq!(value["entries"]["Chikorita"]["attempts"][0]["gametime"], json!("1:30:00"));
    assert_eq!(codec::parse(&rewritten).unwrap().unwrap(), tierlist);
}
