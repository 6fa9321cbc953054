// Atomic filter predicates.

use lazy_static::lazy_static;
use regex::Regex;

use super::range::NumericRange;
use crate::record::{CreatureRecord, Gender, SizeLabel};

lazy_static! {
    static ref NUMBER_RANGE: Regex = Regex::new(r"^\d+(-\d*)?$|^-\d+$").unwrap();
    static ref IV_TIER: Regex = Regex::new(r"^[0-4]\*$").unwrap();
}

pub const ELEMENTAL_TYPES: [&str; 18] = [
    "normal", "fire", "water", "electric", "grass", "ice", "fighting", "poison", "ground",
    "flying", "psychic", "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Cp,
    Hp,
    Attack,
    Defence,
    Stamina,
}

/// Prefixes are checked in this order.
const STAT_PREFIXES: [(&str, StatField); 5] = [
    ("cp", StatField::Cp),
    ("hp", StatField::Hp),
    ("atk", StatField::Attack),
    ("def", StatField::Defence),
    ("stm", StatField::Stamina),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Apex,
    Shiny,
    Shadow,
    Purified,
    Lucky,
    Legendary,
    Mythical,
    Costume,
    Shundo,
    Nundo,
    Gigantamax,
    Dynamax,
    Background,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Family(String),
    /// `None` range means the range text did not parse; matches nothing.
    Stat(StatField, Option<NumericRange>),
    Number(Option<NumericRange>),
    IvTier(String),
    Flag(Flag),
    Gender(Option<Gender>),
    Size(SizeLabel),
    Type(String),
    Text(String),
}

impl Predicate {
    /// Classifies trimmed, lowercased atom text.
    pub fn parse(atom: &str) -> Self {
        if atom == "apex" {
            return Predicate::Flag(Flag::Apex);
        }
        if let Some(family) = atom.strip_prefix('+') {
            return Predicate::Family(family.to_string());
        }
        for (prefix, field) in STAT_PREFIXES {
            if let Some(rest) = atom.strip_prefix(prefix) {
                return Predicate::Stat(field, NumericRange::parse(rest));
            }
        }
        if NUMBER_RANGE.is_match(atom) {
            return Predicate::Number(NumericRange::parse(atom));
        }
        if IV_TIER.is_match(atom) {
            return Predicate::IvTier(atom.to_string());
        }
        let flag = match atom {
            "shiny" => Some(Flag::Shiny),
            "shadow" => Some(Flag::Shadow),
            "purified" => Some(Flag::Purified),
            "lucky" => Some(Flag::Lucky),
            "legendary" => Some(Flag::Legendary),
            "mythical" => Some(Flag::Mythical),
            _ => None,
        };
        if let Some(flag) = flag {
            return Predicate::Flag(flag);
        }
        match atom {
            "male" => return Predicate::Gender(Some(Gender::Male)),
            "female" => return Predicate::Gender(Some(Gender::Female)),
            "genderunknown" => return Predicate::Gender(None),
            _ => {}
        }
        if let Some(size) = SizeLabel::parse(atom) {
            return Predicate::Size(size);
        }
        if ELEMENTAL_TYPES.contains(&atom) {
            return Predicate::Type(atom.to_string());
        }
        match atom {
            "costume" => Predicate::Flag(Flag::Costume),
            "shundo" => Predicate::Flag(Flag::Shundo),
            "nundo" => Predicate::Flag(Flag::Nundo),
            "gigantamax" | "gmax" => Predicate::Flag(Flag::Gigantamax),
            "dynamax" => Predicate::Flag(Flag::Dynamax),
            "background" => Predicate::Flag(Flag::Background),
            _ => Predicate::Text(atom.to_string()),
        }
    }

    pub fn matches(&self, record: &CreatureRecord) -> bool {
        match self {
            Predicate::Family(family) => record
                .family
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                .contains(family.as_str()),
            Predicate::Stat(field, range) => {
                range.is_some_and(|r| r.contains(stat_value(record, *field)))
            }
            Predicate::Number(range) => range.is_some_and(|r| r.contains(i64::from(record.number))),
            Predicate::IvTier(tier) => record.iv_tier == *tier,
            Predicate::Flag(flag) => flag_set(record, *flag),
            Predicate::Gender(Some(gender)) => record.gender == *gender,
            Predicate::Gender(None) => !matches!(record.gender, Gender::Male | Gender::Female),
            Predicate::Size(size) => record.height_label == *size || record.weight_label == *size,
            Predicate::Type(t) => record.types.iter().any(|have| have == t),
            Predicate::Text(text) => {
                record.name.to_lowercase().contains(text.as_str())
                    || record.form_str().to_lowercase().contains(text.as_str())
                    || record.search_text.to_lowercase().contains(text.as_str())
            }
        }
    }
}

fn stat_value(record: &CreatureRecord, field: StatField) -> i64 {
    match field {
        StatField::Cp => i64::from(record.cp.unwrap_or(0)),
        StatField::Hp => i64::from(record.hp),
        StatField::Attack => i64::from(record.attack.unwrap_or(0)),
        StatField::Defence => i64::from(record.defence.unwrap_or(0)),
        StatField::Stamina => i64::from(record.stamina.unwrap_or(0)),
    }
}

fn flag_set(record: &CreatureRecord, flag: Flag) -> bool {
    match flag {
        Flag::Apex => record.apex,
        Flag::Shiny => record.shiny,
        Flag::Shadow => record.shadow,
        Flag::Purified => record.purified,
        Flag::Lucky => record.lucky,
        Flag::Legendary => record.legendary,
        Flag::Mythical => record.mythical,
        Flag::Costume => record.has_costume(),
        Flag::Shundo => record.shundo,
        Flag::Nundo => record.nundo,
        Flag::Gigantamax => record.gigantamax,
        Flag::Dynamax => record.dynamax || record.gigantamax,
        Flag::Background => record.background,
    }
}
