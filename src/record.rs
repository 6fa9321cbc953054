// Normalized creature record and its PVP annotation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pvp::{BaseStats, Bracket, Ivs};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Genderless,
    #[default]
    #[serde(rename = "")]
    Unknown,
}

impl Gender {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MALE" => Gender::Male,
            "FEMALE" => Gender::Female,
            "GENDERLESS" => Gender::Genderless,
            _ => Gender::Unknown,
        }
    }
}

/// Size bucket relative to the species' pokedex height or weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeLabel {
    Xxs,
    Xs,
    #[default]
    #[serde(rename = "")]
    Average,
    Xl,
    Xxl,
}

impl SizeLabel {
    /// Labels a measurement against the species reference value.
    pub fn classify(value: f64, reference: Option<f64>) -> Self {
        let Some(reference) = reference.filter(|r| *r > 0.0) else {
            return SizeLabel::Average;
        };
        if value <= 0.0 {
            return SizeLabel::Average;
        }
        let ratio = value / reference;
        if ratio <= 0.5 {
            SizeLabel::Xxs
        } else if ratio <= 0.75 {
            SizeLabel::Xs
        } else if ratio > 1.5 {
            SizeLabel::Xxl
        } else if ratio > 1.25 {
            SizeLabel::Xl
        } else {
            SizeLabel::Average
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "xxs" => Some(SizeLabel::Xxs),
            "xs" => Some(SizeLabel::Xs),
            "xl" => Some(SizeLabel::Xl),
            "xxl" => Some(SizeLabel::Xxl),
            _ => None,
        }
    }

    /// Preference when collapsing duplicates: bigger wins.
    pub fn priority(self) -> u8 {
        match self {
            SizeLabel::Xxl => 5,
            SizeLabel::Xl => 4,
            SizeLabel::Average => 3,
            SizeLabel::Xs => 2,
            SizeLabel::Xxs => 1,
        }
    }
}

/// Competitive annotation attached to a record that matched a top spread.
///
/// Either the whole annotation is present or none of it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvpAnnotation {
    pub enabled: bool,
    pub league: Bracket,
    pub category: String,
    /// 1-based position of the matched spread in the top list.
    pub rank_top10: u32,
    pub distance_max: u8,
    pub distance_sum: u8,
    pub delta_atk: i8,
    pub delta_def: i8,
    pub delta_stm: i8,
    pub meta_atk: u8,
    pub meta_def: u8,
    pub meta_stm: u8,
    pub meta_level: f64,
    pub meta_cp: u32,
    pub best_atk: u8,
    pub best_def: u8,
    pub best_stm: u8,
    pub best_level: f64,
    pub best_cp: u32,
    pub species_prefix: String,
    pub species_id: String,
    pub rating: i32,
    pub meta_rank: u32,
}

/// One owned creature after ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureRecord {
    pub id: String,
    pub number: u32,
    pub form: Option<String>,
    pub name: String,
    pub cp: Option<u32>,
    pub hp: u32,
    pub attack: Option<u8>,
    pub defence: Option<u8>,
    pub stamina: Option<u8>,
    pub iv: f64,
    pub iv_tier: String,
    pub height: f64,
    pub weight: f64,
    pub height_label: SizeLabel,
    pub weight_label: SizeLabel,
    pub gender: Gender,
    pub shiny: bool,
    pub lucky: bool,
    pub shundo: bool,
    pub nundo: bool,
    pub shadow: bool,
    pub purified: bool,
    pub apex: bool,
    pub costume: Option<String>,
    pub move_1: String,
    pub move_2: String,
    pub family: Option<String>,
    pub types: Vec<String>,
    pub legendary: bool,
    pub mythical: bool,
    pub pokedex_height: Option<f64>,
    pub pokedex_weight: Option<f64>,
    pub base_attack: Option<u32>,
    pub base_defence: Option<u32>,
    pub base_stamina: Option<u32>,
    pub gigantamax: bool,
    pub dynamax: bool,
    pub background: bool,
    pub search_text: String,
    pub captured_at: Option<DateTime<Utc>>,
    pub pvp: Option<PvpAnnotation>,
}

impl CreatureRecord {
    /// IVs, when all three are known and in range.
    pub fn ivs(&self) -> Option<Ivs> {
        let ivs = Ivs::new(self.attack?, self.defence?, self.stamina?);
        ivs.is_valid().then_some(ivs)
    }

    /// Species base stats, when all three are known and positive.
    pub fn base_stats(&self) -> Option<BaseStats> {
        let base = BaseStats::new(self.base_attack?, self.base_defence?, self.base_stamina?);
        base.is_complete().then_some(base)
    }

    pub fn has_costume(&self) -> bool {
        self.costume.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn pvp_enabled(&self) -> bool {
        self.pvp.as_ref().is_some_and(|p| p.enabled)
    }

    pub fn form_str(&self) -> &str {
        self.form.as_deref().unwrap_or_default()
    }
}

/// IV percentage rounded to two decimals.
pub fn iv_percent(ivs: Ivs) -> f64 {
    let raw = f64::from(ivs.total()) / 45.0 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Star tier label for an IV percentage.
pub fn iv_tier(percent: f64) -> &'static str {
    if percent >= 100.0 {
        "4*"
    } else if percent >= 82.2 {
        "3*"
    } else if percent >= 51.1 {
        "2*"
    } else if percent > 0.0 {
        "1*"
    } else {
        "0*"
    }
}
