// Normalization of uploaded collection exports into creature records.
//
// Two source layouts are understood. Legacy exports carry flat records
// (`mon_number`, `mon_isshiny: "YES"`, ...). Tool exports carry camel-cased
// game enums (`HoloPokemonId_Medicham`, `PokemonDisplayProto_Form_...`) with
// nested `display`, `iv` and `dynamax` objects. Both are mapped onto one
// intermediate shape and enriched from the species catalog.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::IngestError;
use crate::gamedata::SpeciesCatalog;
use crate::metrics;
use crate::pvp::Ivs;
use crate::record::{iv_percent, iv_tier, CreatureRecord, Gender, SizeLabel};

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^A-Za-z0-9]+").unwrap();
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();
    static ref UNDERSCORES: Regex = Regex::new(r"_+").unwrap();
}

const APEX_FORMS: [&str; 2] = ["LUGIA_S", "HO_OH_S"];
const ETERNATUS_NUMBER: u64 = 890;

/// "ZenHeadbuttFast" -> "ZEN_HEADBUTT_FAST".
pub fn camel_to_upper_snake(s: &str) -> String {
    let s = NON_ALNUM.replace_all(s, "_");
    let s = CAMEL_BOUNDARY.replace_all(&s, "${1}_${2}");
    let s = UNDERSCORES.replace_all(&s, "_");
    s.trim_matches('_').to_uppercase()
}

/// Capitalizes the first letter of every alphabetic run, lowercasing the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn strip_known_prefix<'a>(value: &'a str, prefixes: &[&str]) -> &'a str {
    prefixes
        .iter()
        .find_map(|p| value.strip_prefix(p))
        .unwrap_or(value)
}

// ── Lenient field readers ────────────────────────────────────────────

fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u32(value: Option<&Value>) -> Option<u32> {
    as_f64(value)
        .filter(|v| v.is_finite() && *v >= 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v as u32)
}

fn as_iv(value: Option<&Value>) -> Option<u8> {
    as_u32(value)
        .filter(|v| *v <= u32::from(Ivs::MAX))
        .map(|v| v as u8)
}

fn as_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_uppercase().as_str(),
            "YES" | "TRUE" | "1" | "Y"
        ),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// Source-independent view of one record before enrichment.
#[derive(Debug, Clone, Default)]
struct RawRecord {
    id: Option<String>,
    number: Option<u32>,
    form: Option<String>,
    name: String,
    cp: Option<u32>,
    hp: u32,
    attack: Option<u8>,
    defence: Option<u8>,
    stamina: Option<u8>,
    height: f64,
    weight: f64,
    gender: String,
    alignment: String,
    shiny: bool,
    lucky: bool,
    costume: Option<String>,
    move_1: String,
    move_2: String,
    gigantamax: bool,
    dynamax: bool,
    background: bool,
    captured_at: Option<DateTime<Utc>>,
}

impl RawRecord {
    fn from_legacy(fields: &Map<String, Value>, fallback_id: Option<String>) -> Self {
        let p: Map<String, Value> = fields
            .iter()
            .map(|(k, v)| {
                let key = k.to_lowercase();
                let key = key.strip_prefix("mon_").unwrap_or(&key).to_string();
                (key, v.clone())
            })
            .collect();
        let text = |key: &str| as_text(p.get(key)).unwrap_or_default();

        Self {
            id: non_empty(as_text(fields.get("id"))).or(fallback_id),
            number: as_u32(p.get("number")),
            form: non_empty(as_text(p.get("form"))),
            name: text("name"),
            cp: as_u32(p.get("cp")),
            hp: as_u32(p.get("hp")).unwrap_or(0),
            attack: as_iv(p.get("attack")),
            defence: as_iv(p.get("defence")),
            stamina: as_iv(p.get("stamina")),
            height: as_f64(p.get("height")).unwrap_or(0.0),
            weight: as_f64(p.get("weight")).unwrap_or(0.0),
            gender: text("gender"),
            alignment: text("alignment"),
            shiny: as_flag(p.get("isshiny")),
            lucky: as_flag(p.get("islucky")),
            costume: non_empty(as_text(p.get("costume"))),
            move_1: text("move_1"),
            move_2: text("move_2"),
            gigantamax: as_flag(p.get("gigantamax")),
            dynamax: as_flag(p.get("dynamax")),
            background: false,
            captured_at: None,
        }
    }

    fn from_tool_export(rec: &Map<String, Value>) -> Self {
        let empty = Map::new();
        let display = rec.get("display").and_then(Value::as_object).unwrap_or(&empty);
        let iv = rec.get("iv").and_then(Value::as_object).unwrap_or(&empty);
        let moves = rec.get("moves").and_then(Value::as_object).unwrap_or(&empty);
        let dynamax = rec.get("dynamax");

        let pokemon_name = as_text(rec.get("pokemonName")).unwrap_or_default();
        let enum_raw = as_text(rec.get("pokemon")).unwrap_or_default();
        let enum_raw = strip_known_prefix(&enum_raw, &["HoloPokemonId_", "HoloPokemonId"]);
        let mut species = camel_to_upper_snake(enum_raw);
        if species.is_empty() {
            species = camel_to_upper_snake(&pokemon_name);
        }

        let form_raw = as_text(display.get("form")).unwrap_or_default();
        let form_raw = strip_known_prefix(&form_raw, &["PokemonDisplayProto_Form_"]);
        let mut form = camel_to_upper_snake(form_raw);
        if form.is_empty() || form == "FORM_UNSET" {
            form = if species.is_empty() {
                String::new()
            } else {
                format!("{species}_NORMAL")
            };
        } else if !species.is_empty() && !form.starts_with(&species) {
            form = format!("{species}_{form}");
        }

        let gigantamax_hint = dynamax
            .and_then(|d| d.get("isGigantamaxLikely"))
            .is_some_and(|v| as_flag(Some(v)));
        let gigantamax = gigantamax_hint && !is_false_positive_gigantamax(rec);
        if gigantamax && !form.is_empty() && !form.contains("GIGANTAMAX") {
            form = if species.is_empty() {
                format!("{form}_GIGANTAMAX")
            } else {
                format!("{species}_GIGANTAMAX")
            };
        }
        let has_dynamax = match dynamax {
            Some(Value::Object(d)) => !d.is_empty(),
            Some(Value::Bool(b)) => *b,
            _ => false,
        };

        let gender = match display.get("genderId").and_then(Value::as_u64) {
            Some(1) => "male".to_string(),
            Some(2) => "female".to_string(),
            Some(3) => "genderless".to_string(),
            _ => {
                let raw = as_text(display.get("gender")).unwrap_or_default();
                let token = camel_to_upper_snake(strip_known_prefix(
                    &raw,
                    &["PokemonDisplayProto_Gender_"],
                ));
                match token.as_str() {
                    "MALE" => "male".to_string(),
                    "FEMALE" => "female".to_string(),
                    t if t.contains("GENDERLESS") => "genderless".to_string(),
                    _ => String::new(),
                }
            }
        };

        let alignment = if as_flag(rec.get("isShadow")) {
            "SHADOW"
        } else if as_flag(rec.get("isPurified")) {
            "PURIFIED"
        } else {
            ""
        };

        let move_token = |key: &str| {
            let raw = as_text(moves.get(key)).unwrap_or_default();
            camel_to_upper_snake(strip_known_prefix(&raw, &["HoloPokemonMove_"]))
        };

        let costume = as_text(display.get("costume"))
            .map(|c| {
                camel_to_upper_snake(strip_known_prefix(&c, &["PokemonDisplayProto_Costume_"]))
            })
            .filter(|c| !c.is_empty() && !c.contains("UNSET"));

        let created_ms = rec.get("creationTimeMs").and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        let display_name = if pokemon_name.is_empty() {
            enum_raw.to_string()
        } else {
            pokemon_name
        };

        Self {
            id: non_empty(as_text(rec.get("creationTimeMs"))),
            number: as_u32(rec.get("dexNumber")),
            form: non_empty(Some(form)),
            name: title_case(&display_name.replace('_', " ")),
            cp: as_u32(rec.get("cp")),
            hp: as_u32(rec.get("stamina")).unwrap_or(0),
            attack: as_iv(iv.get("atk")),
            defence: as_iv(iv.get("def")),
            stamina: as_iv(iv.get("sta")),
            height: as_f64(rec.get("heightM")).unwrap_or(0.0),
            weight: as_f64(rec.get("weightKg")).unwrap_or(0.0),
            gender,
            alignment: alignment.to_string(),
            shiny: as_flag(display.get("isShiny")),
            lucky: as_flag(rec.get("isLucky")),
            costume,
            move_1: move_token("fast"),
            move_2: move_token("charged"),
            gigantamax,
            dynamax: has_dynamax,
            background: has_location_card(display),
            captured_at: created_ms.and_then(DateTime::from_timestamp_millis),
        }
    }
}

/// Crowned Zacian/Zamazenta and Eternatus are flagged as gigantamax by some
/// exporters even though they cannot be.
fn is_false_positive_gigantamax(rec: &Map<String, Value>) -> bool {
    let form = rec
        .get("display")
        .and_then(|d| d.get("form"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    if form.contains("ZamazentaCrownedShield") || form.contains("ZacianCrownedSword") {
        return true;
    }
    let species = as_text(rec.get("pokemon")).unwrap_or_default();
    let species = strip_known_prefix(&species, &["HoloPokemonId_", "HoloPokemonId"]);
    if camel_to_upper_snake(species) == "ETERNATUS" {
        return true;
    }
    rec.get("dexNumber").and_then(Value::as_u64) == Some(ETERNATUS_NUMBER)
}

fn has_location_card(display: &Map<String, Value>) -> bool {
    if as_flag(display.get("hasLocationCard")) {
        return true;
    }
    let named = |v: Option<&Value>| {
        as_text(v).is_some_and(|n| {
            let n = n.trim();
            !n.is_empty() && !n.to_lowercase().contains("unset")
        })
    };
    named(display.get("locationCard").and_then(|c| c.get("name")))
        || named(display.get("locationCardName"))
}

fn move_name(token: &str, strip_fast: bool) -> String {
    let token = if strip_fast {
        token.replace("_FAST", "")
    } else {
        token.to_string()
    };
    title_case(&token.replace('_', " "))
}

fn enrich(raw: RawRecord, catalog: &SpeciesCatalog) -> CreatureRecord {
    let number = raw.number.unwrap_or(0);
    let meta = catalog.lookup(number, raw.form.as_deref());

    let ivs = Ivs::new(
        raw.attack.unwrap_or(0),
        raw.defence.unwrap_or(0),
        raw.stamina.unwrap_or(0),
    );
    let iv = iv_percent(ivs);
    let shiny = raw.shiny;
    let alignment = raw.alignment.to_uppercase();
    let types: Vec<String> = meta.map(|m| m.types.clone()).unwrap_or_default();
    let search_text =
        format!("{} {} {}", raw.name.to_lowercase(), number, types.join(" ")).to_lowercase();

    CreatureRecord {
        id: raw
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        number,
        name: title_case(&raw.name.replace('_', " ")),
        cp: raw.cp,
        hp: raw.hp,
        attack: raw.attack,
        defence: raw.defence,
        stamina: raw.stamina,
        iv,
        iv_tier: iv_tier(iv).to_string(),
        height: raw.height,
        weight: raw.weight,
        height_label: SizeLabel::classify(raw.height, meta.and_then(|m| m.pokedex_height)),
        weight_label: SizeLabel::classify(raw.weight, meta.and_then(|m| m.pokedex_weight)),
        gender: Gender::parse(&raw.gender),
        shiny,
        lucky: raw.lucky,
        shundo: shiny && iv >= 100.0,
        nundo: ivs.total() == 0,
        shadow: alignment == "SHADOW",
        purified: alignment == "PURIFIED",
        apex: raw
            .form
            .as_deref()
            .is_some_and(|f| APEX_FORMS.contains(&f)),
        costume: raw.costume,
        move_1: move_name(&raw.move_1, true),
        move_2: move_name(&raw.move_2, false),
        family: meta.and_then(|m| m.family.clone()),
        types,
        legendary: meta.is_some_and(|m| m.legendary),
        mythical: meta.is_some_and(|m| m.mythical),
        pokedex_height: meta.and_then(|m| m.pokedex_height),
        pokedex_weight: meta.and_then(|m| m.pokedex_weight),
        base_attack: meta.map(|m| m.base.attack),
        base_defence: meta.map(|m| m.base.defense),
        base_stamina: meta.map(|m| m.base.stamina),
        gigantamax: raw.gigantamax,
        dynamax: raw.dynamax,
        background: raw.background,
        search_text,
        captured_at: raw.captured_at,
        form: raw.form,
        pvp: None,
    }
}

fn is_normalized(fields: &Map<String, Value>) -> bool {
    fields.contains_key("number") && fields.contains_key("iv_tier")
}

fn normalize_collection(
    value: &Value,
    catalog: &SpeciesCatalog,
) -> Result<Vec<CreatureRecord>, IngestError> {
    match value {
        Value::Object(by_id) => Ok(by_id
            .iter()
            .filter_map(|(id, rec)| {
                let fields = rec.as_object()?;
                Some(enrich(RawRecord::from_legacy(fields, Some(id.clone())), catalog))
            })
            .collect()),
        Value::Array(items) => Ok(items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| {
                let fields = item.as_object()?;
                if is_normalized(fields) {
                    if let Ok(record) = serde_json::from_value::<CreatureRecord>(item.clone()) {
                        return Some(record);
                    }
                }
                Some(enrich(RawRecord::from_legacy(fields, Some(idx.to_string())), catalog))
            })
            .collect()),
        _ => Err(IngestError::UnsupportedShape),
    }
}

/// Turns an uploaded export into normalized records.
///
/// Accepts a list of records, a tool export `{"pokemons": [...]}`, or a
/// legacy wrapper `{"fileData": {...}}` / `{"fileData": [...]}` (or the bare
/// id-keyed object). Non-object entries are skipped.
pub fn normalize_export(
    value: &Value,
    catalog: &SpeciesCatalog,
) -> Result<Vec<CreatureRecord>, IngestError> {
    let records = match value {
        Value::Object(obj) => match obj.get("pokemons").and_then(Value::as_array) {
            Some(list) => list
                .iter()
                .filter_map(Value::as_object)
                .map(|rec| enrich(RawRecord::from_tool_export(rec), catalog))
                .collect(),
            None => normalize_collection(obj.get("fileData").unwrap_or(value), catalog)?,
        },
        Value::Array(_) => normalize_collection(value, catalog)?,
        _ => return Err(IngestError::UnsupportedShape),
    };

    metrics::RECORDS_INGESTED_TOTAL.inc_by(records.len() as u64);
    debug!(records = records.len(), "export normalized");
    Ok(records)
}
