// Species catalog and CP multipliers read from the game master file.

use std::collections::HashMap;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::GameDataError;
use crate::metrics;
use crate::pvp::{BaseStats, LevelMultiplierTable};

lazy_static! {
    static ref DECIMAL: Regex = Regex::new(r"\b\d+\.\d+\b").unwrap();
}

/// Reference data for one species (and optionally one form).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesInfo {
    pub number: u32,
    /// Game enum name, e.g. "MEDICHAM".
    pub species: String,
    pub form: Option<String>,
    /// Lowercase elemental types.
    pub types: Vec<String>,
    pub legendary: bool,
    pub mythical: bool,
    /// Lowercase family name without the FAMILY_ prefix.
    pub family: Option<String>,
    pub pokedex_height: Option<f64>,
    pub pokedex_weight: Option<f64>,
    pub base: BaseStats,
}

fn catalog_key(number: u32, form: Option<&str>) -> String {
    match form.filter(|f| !f.is_empty()) {
        Some(form) => format!("{number}_{form}"),
        None => number.to_string(),
    }
}

/// Species lookup keyed by `number_FORM` and by bare `number`.
#[derive(Debug, Clone, Default)]
pub struct SpeciesCatalog {
    by_key: HashMap<String, SpeciesInfo>,
}

impl SpeciesCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, info: SpeciesInfo) {
        let key = catalog_key(info.number, info.form.as_deref());
        self.by_key.insert(key, info);
    }

    /// Form-specific entry first, then the form-less one.
    pub fn lookup(&self, number: u32, form: Option<&str>) -> Option<&SpeciesInfo> {
        self.by_key
            .get(&catalog_key(number, form))
            .or_else(|| self.by_key.get(&catalog_key(number, None)))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Everything the service needs from the game master.
#[derive(Debug, Clone, Default)]
pub struct GameMaster {
    pub catalog: SpeciesCatalog,
    pub levels: LevelMultiplierTable,
}

impl GameMaster {
    /// Parses a game master document (a JSON list of templates).
    pub fn parse(text: &str) -> Result<Self, GameDataError> {
        let value: Value = serde_json::from_str(text)?;
        let templates = value.as_array().ok_or(GameDataError::NotATemplateList)?;

        let mut catalog = SpeciesCatalog::new();
        let mut multipliers: Vec<f64> = Vec::new();
        for item in templates {
            let template_id = item
                .get("templateId")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if template_id == "PLAYER_LEVEL_SETTINGS" {
                if let Some(list) = item
                    .pointer("/data/playerLevelSettings/cpMultiplier")
                    .and_then(Value::as_array)
                {
                    multipliers = list.iter().filter_map(Value::as_f64).collect();
                }
            }
            if let Some(settings) = item.pointer("/data/pokemonSettings") {
                if let Some(info) = species_from_template(template_id, settings) {
                    catalog.insert(info);
                }
            }
        }

        if multipliers.is_empty() {
            multipliers = extract_multipliers_from_text(text);
        }
        let levels = build_levels(multipliers);
        Ok(Self { catalog, levels })
    }

    /// Loads the game master, degrading to empty tables on any failure.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) => {
                let err = GameDataError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                warn!("game master unavailable, PVP features disabled: {err}");
                return Self::default();
            }
        };

        let game_master = match Self::parse(&text) {
            Ok(gm) => gm,
            Err(e) => {
                warn!("failed to parse game master {}: {e}", path.display());
                Self {
                    catalog: SpeciesCatalog::new(),
                    levels: build_levels(extract_multipliers_from_text(&text)),
                }
            }
        };

        metrics::CATALOG_SPECIES.set(game_master.catalog.len() as i64);
        info!(
            species = game_master.catalog.len(),
            levels = game_master.levels.len(),
            "game master loaded"
        );
        game_master
    }
}

fn build_levels(values: Vec<f64>) -> LevelMultiplierTable {
    if values.is_empty() {
        warn!("{}", GameDataError::MissingMultipliers);
        return LevelMultiplierTable::empty();
    }
    LevelMultiplierTable::new(values).unwrap_or_else(|e| {
        warn!("{e}");
        LevelMultiplierTable::empty()
    })
}

/// Reads a plain JSON list of per-level multipliers.
pub fn load_multiplier_list(path: &Path) -> Result<LevelMultiplierTable, GameDataError> {
    let text = std::fs::read_to_string(path).map_err(|source| GameDataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let values: Vec<f64> = serde_json::from_str(&text)?;
    if values.is_empty() {
        return Err(GameDataError::MissingMultipliers);
    }
    LevelMultiplierTable::new(values)
}

fn species_from_template(template_id: &str, settings: &Value) -> Option<SpeciesInfo> {
    let digits = template_id.strip_prefix('V')?.get(..4)?;
    let number: u32 = digits.parse().ok()?;

    let text = |key: &str| {
        settings
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };
    let types = ["type", "type2"]
        .into_iter()
        .filter_map(text)
        .map(|t| t.trim_start_matches("POKEMON_TYPE_").to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let class = text("pokemonClass").unwrap_or_default();
    let stat = |key: &str| {
        settings
            .pointer(&format!("/stats/{key}"))
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    };

    Some(SpeciesInfo {
        number,
        species: text("pokemonId").unwrap_or_default().to_string(),
        form: text("form").map(str::to_string),
        types,
        legendary: class == "POKEMON_CLASS_LEGENDARY",
        mythical: class == "POKEMON_CLASS_MYTHIC",
        family: text("familyId").map(|f| f.trim_start_matches("FAMILY_").to_lowercase()),
        pokedex_height: settings.get("pokedexHeightM").and_then(Value::as_f64),
        pokedex_weight: settings.get("pokedexWeightKg").and_then(Value::as_f64),
        base: BaseStats::new(stat("baseAttack"), stat("baseDefense"), stat("baseStamina")),
    })
}

/// Line-scanning extraction of the multiplier list, for game master files
/// that cannot be traversed as JSON. Expects the pretty-printed layout where
/// the list follows the PLAYER_LEVEL_SETTINGS template id.
pub fn extract_multipliers_from_text(text: &str) -> Vec<f64> {
    let mut found_settings = false;
    let mut in_list = false;
    let mut values = Vec::new();

    for line in text.lines() {
        if !found_settings && line.contains(r#""templateId": "PLAYER_LEVEL_SETTINGS""#) {
            found_settings = true;
        }
        if found_settings && !in_list && line.contains(r#""cpMultiplier""#) {
            in_list = true;
        }
        if in_list {
            values.extend(
                DECIMAL
                    .find_iter(line)
                    .filter_map(|m| m.as_str().parse::<f64>().ok()),
            );
            if line.contains(']') {
                break;
            }
        }
    }
    values
}
