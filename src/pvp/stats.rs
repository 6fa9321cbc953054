// Stat model: effective stats, HP, stat product and CP for a creature at a level.
//
//   atk = (base_atk + iv_atk) * m
//   def = (base_def + iv_def) * m
//   hp  = floor((base_sta + iv_sta) * m)
//   cp  = max(10, floor(atk * sqrt(def) * sqrt(sta_eff) / 10))
//
// where sta_eff is the unfloored stamina. Stat product is atk * def * hp.

use serde::{Deserialize, Serialize};

use super::levels::LevelMultiplierTable;
use super::PvpError;

pub const MIN_CP: u32 = 10;

/// Species base stats from the game master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseStats {
    pub attack: u32,
    pub defense: u32,
    pub stamina: u32,
}

impl BaseStats {
    pub fn new(attack: u32, defense: u32, stamina: u32) -> Self {
        Self {
            attack,
            defense,
            stamina,
        }
    }

    /// All three components are known and positive.
    pub fn is_complete(&self) -> bool {
        self.attack > 0 && self.defense > 0 && self.stamina > 0
    }
}

/// Individual values, each 0..=15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ivs {
    pub attack: u8,
    pub defense: u8,
    pub stamina: u8,
}

impl Ivs {
    pub const MAX: u8 = 15;

    pub fn new(attack: u8, defense: u8, stamina: u8) -> Self {
        Self {
            attack,
            defense,
            stamina,
        }
    }

    /// All 4096 combinations, attack-major.
    pub fn all() -> impl Iterator<Item = Ivs> {
        (0..=Self::MAX).flat_map(|a| {
            (0..=Self::MAX).flat_map(move |d| (0..=Self::MAX).map(move |s| Ivs::new(a, d, s)))
        })
    }

    /// Every component within 0..=15.
    pub fn is_valid(&self) -> bool {
        self.attack <= Self::MAX && self.defense <= Self::MAX && self.stamina <= Self::MAX
    }

    pub fn total(&self) -> u32 {
        u32::from(self.attack) + u32::from(self.defense) + u32::from(self.stamina)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatLine {
    pub attack: f64,
    pub defense: f64,
    pub hp: u32,
    pub product: f64,
}

fn usable(multiplier: f64) -> Result<f64, PvpError> {
    if multiplier.is_finite() && multiplier > 0.0 {
        Ok(multiplier)
    } else {
        Err(PvpError::MultipliersUnavailable)
    }
}

fn effective(base: BaseStats, ivs: Ivs, m: f64) -> (f64, f64, f64) {
    (
        f64::from(base.attack + u32::from(ivs.attack)) * m,
        f64::from(base.defense + u32::from(ivs.defense)) * m,
        f64::from(base.stamina + u32::from(ivs.stamina)) * m,
    )
}

pub fn cp(base: BaseStats, ivs: Ivs, multiplier: f64) -> Result<u32, PvpError> {
    let m = usable(multiplier)?;
    let (atk, def, sta) = effective(base, ivs, m);
    let raw = (atk * def.sqrt() * sta.sqrt() / 10.0).floor();
    Ok((raw as u32).max(MIN_CP))
}

pub fn stats(base: BaseStats, ivs: Ivs, multiplier: f64) -> Result<StatLine, PvpError> {
    let m = usable(multiplier)?;
    let (attack, defense, sta) = effective(base, ivs, m);
    let hp = sta.floor() as u32;
    Ok(StatLine {
        attack,
        defense,
        hp,
        product: attack * defense * f64::from(hp),
    })
}

pub fn cp_at_level(
    table: &LevelMultiplierTable,
    base: BaseStats,
    ivs: Ivs,
    level: f64,
) -> Result<u32, PvpError> {
    let m = table
        .multiplier(level)
        .ok_or(PvpError::MultipliersUnavailable)?;
    cp(base, ivs, m)
}
