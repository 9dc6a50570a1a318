// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export file naming
//!
//! Exported images form numbered series in a folder: `<prefix>-<NNN>.png`.

use crate::fs::{DirEntry, EntryKind};

const EXTENSION: &str = ".png";

/// Split `<prefix>-<digits>.png` into prefix and number
fn numbered(name: &str) -> Option<(&str, u32)> {
    let stem = name.strip_suffix(EXTENSION)?;
    let (prefix, digits) = stem.rsplit_once('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((prefix, digits.parse().ok()?))
}

fn files(entries: &[DirEntry]) -> impl Iterator<Item = &str> {
    entries
        .iter()
        .filter(|e| e.kind == EntryKind::File)
        .map(|e| e.name.as_str())
}

/// Prefix of the highest-numbered image already in the folder
#[must_use]
pub fn file_prefix(entries: &[DirEntry]) -> Option<String> {
    files(entries)
        .filter_map(numbered)
        .max_by_key(|(_, num)| *num)
        .map(|(prefix, _)| prefix.to_string())
}

/// Prefix derived from a tierlist name: `Gen 1 - Yellow` -> `gen_1_-_yellow`
#[must_use]
pub fn default_prefix(tierlist_name: &str) -> String {
    tierlist_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Next free index for `prefix`; 0 when the series is empty
#[must_use]
pub fn next_file_index(entries: &[DirEntry], prefix: &str) -> u32 {
    files(entries)
        .filter(|name| name.starts_with(prefix) && name.ends_with(EXTENSION))
        .filter_map(|name| {
            let middle = name.get(prefix.len() + 1..name.len() - EXTENSION.len())?;
            let digits: String = middle.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u32>().ok()
        })
        .max()
        .map_or(0, |max| max + 1)
}

/// `<prefix>-<NNN>.png`
#[must_use]
pub fn export_filename(prefix: &str, index: u32) -> String {
    format!("{prefix}-{index:03}{EXTENSION}")
}

/// Name of the next export: explicit prefix, else the folder's existing
/// series, else one derived from the tierlist name
#[must_use]
pub fn plan_export(entries: &[DirEntry], prefix: Option<&str>, tierlist_name: &str) -> String {
    let prefix = prefix
        .map(str::to_string)
        .or_else(|| file_prefix(entries))
        .unwrap_or_else(|| default_prefix(tierlist_name));
    export_filename(&prefix, next_file_index(entries, &prefix))
}
