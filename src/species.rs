// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Species data lookup
//!
//! Ranking filters by type and growth rate need per-species data. The
//! lookup is a read-only dependency injected by the caller; [`Pokedex`] is
//! the JSON-backed implementation.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Static data about one species
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeciesInfo {
    /// Primary type
    pub type_1: String,
    /// Secondary type (may repeat the primary)
    #[serde(default)]
    pub type_2: String,
    /// Experience growth rate
    pub growth_rate: String,
    /// National dex number
    #[serde(default)]
    pub national_dex_number: Option<u32>,
}

impl SpeciesInfo {
    /// Whether either type is in `types`
    #[must_use]
    pub fn has_any_type(&self, types: &[String]) -> bool {
        types.iter().any(|t| *t == self.type_1 || *t == self.type_2)
    }
}

/// Read-only species data for a game
pub trait SpeciesLookup {
    /// Data for `name` as it exists in `game`, if known
    fn species(&self, game: &str, name: &str) -> Option<SpeciesInfo>;
}

/// Errors loading species data
#[derive(Debug, Error)]
pub enum SpeciesError {
    /// File could not be read
    #[error("Failed to read species data {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// File is not valid species data
    #[error("Invalid species data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Dex names in release order; lookups fall forward through later dexes
pub const RELEASE_ORDER: [&str; 11] = [
    "Red and Blue",
    "Yellow",
    "Gold and Silver",
    "Crystal",
    "Ruby and Sapphire",
    "Emerald",
    "FireRed and LeafGreen",
    "Diamond and Pearl",
    "Platinum",
    "HeartGold and SoulSilver",
    "Black and White and Black2 and White2",
];

/// Dex that holds the data for a tierlist game name
#[must_use]
pub fn dex_for_game(game: &str) -> &str {
    match game {
        "Black" | "White" | "Black2" | "White2" => "Black and White and Black2 and White2",
        "FireRed" | "LeafGreen" => "FireRed and LeafGreen",
        "Diamond" | "Pearl" => "Diamond and Pearl",
        "HeartGold" | "SoulSilver" => "HeartGold and SoulSilver",
        "Gold" | "Silver" => "Gold and Silver",
        "Japanese Green" => "Red and Blue",
        other => other,
    }
}

/// Species name without its form suffix: `Deoxys-Attack` -> `Deoxys`
#[must_use]
pub fn base_species_name(name: &str) -> &str {
    name.split_once('-').map_or(name, |(base, _)| base)
}

/// Species data keyed by dex name, then species name
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Pokedex {
    dexes: HashMap<String, HashMap<String, SpeciesInfo>>,
}

impl Pokedex {
    /// Parse `{dex: {species: info}}` JSON
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, SpeciesError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load from a JSON file
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SpeciesError> {
        let text = std::fs::read_to_string(path).map_err(|source| SpeciesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    fn find_from(&self, dex: &str, name: &str) -> Option<&SpeciesInfo> {
        let start = RELEASE_ORDER.iter().position(|d| *d == dex)?;
        RELEASE_ORDER[start..]
            .iter()
            .filter_map(|d| self.dexes.get(*d))
            .find_map(|species| species.get(name))
    }
}

impl SpeciesLookup for Pokedex {
    fn species(&self, game: &str, name: &str) -> Option<SpeciesInfo> {
        let dex = dex_for_game(game);
        if !self.dexes.contains_key(dex) {
            debug!("No species data for game {:?} (dex {:?})", game, dex);
            return None;
        }
        self.find_from(dex, name)
            .or_else(|| self.find_from(dex, base_species_name(name)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = r#"{
        "Red and Blue": {"Pikachu": {"type_1": "Electric", "type_2": "Electric", "growth_rate": "Medium Fast", "national_dex_number": 25}},
        "Gold and Silver": {"Pichu": {"type_1": "Electric", "type_2": "Electric", "growth_rate": "Medium Fast"}},
        "Emerald": {"Deoxys": {"type_1": "Psychic", "type_2": "Psychic", "growth_rate": "Slow"}},
        "Black and White and Black2 and White2": {"Ho-Oh": {"type_1": "Fire", "type_2": "Flying", "growth_rate": "Slow"}}
    }"#;

    #[test]
    fn test_game_mapping_and_fall_forward() {
        let dex = Pokedex::from_json(DATA).unwrap();
        assert_eq!(dex.species("Japanese Green", "Pikachu").unwrap().national_dex_number, Some(25));
        // Red and Blue has no Pichu; later dexes are searched
        assert!(dex.species("Red and Blue", "Pichu").is_some());
        // never searches backwards
        assert!(dex.species("Gold", "Pikachu").is_none());
    }

    #[test]
    fn test_forms_fall_back_to_base_species() {
        let dex = Pokedex::from_json(DATA).unwrap();
        assert_eq!(dex.species("Emerald", "Deoxys-Attack").unwrap().type_1, "Psychic");
        assert_eq!(dex.species("Black", "Ho-Oh").unwrap().type_2, "Flying");
    }

    #[test]
    fn test_unknown_game() {
        let dex = Pokedex::from_json(DATA).unwrap();
        assert!(dex.species("Sword", "Pikachu").is_none());
    }

    #[test]
    fn test_has_any_type() {
        let dex = Pokedex::from_json(DATA).unwrap();
        let info = dex.species("Black", "Ho-Oh").unwrap();
        assert!(info.has_any_type(&["Flying".to_string()]));
        assert!(!info.has_any_type(&["Water".to_string()]));
    }
}
