// Collection views: duplicate collapse, ordering and Max-form filtering.

use std::cmp::Ordering;
use std::str::FromStr;

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::record::CreatureRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum VariantClass {
    Apex,
    Shiny,
    Shadow,
    Purified,
    Normal,
}

impl VariantClass {
    fn of(record: &CreatureRecord) -> Self {
        if record.apex {
            VariantClass::Apex
        } else if record.shiny {
            VariantClass::Shiny
        } else if record.shadow {
            VariantClass::Shadow
        } else if record.purified {
            VariantClass::Purified
        } else {
            VariantClass::Normal
        }
    }
}

type VariantKey = (u32, String, String, VariantClass, bool);

fn variant_key(record: &CreatureRecord) -> VariantKey {
    (
        record.number,
        record.costume.clone().unwrap_or_default(),
        record.form.clone().unwrap_or_default(),
        VariantClass::of(record),
        record.lucky,
    )
}

/// One record per species variant, keeping the heaviest-labelled copy.
///
/// Output follows the order in which each variant was first seen.
pub fn unique_variants(records: Vec<CreatureRecord>) -> Vec<CreatureRecord> {
    let mut kept: IndexMap<VariantKey, CreatureRecord> = IndexMap::new();
    for record in records {
        match kept.entry(variant_key(&record)) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if record.weight_label.priority() > slot.get().weight_label.priority() {
                    slot.insert(record);
                }
            }
        }
    }
    kept.into_values().collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Number,
    Name,
    Cp,
    Captured,
    Height,
    Weight,
    Iv,
    Attack,
    Defense,
    Stamina,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Ok(SortKey::Number),
            "name" => Ok(SortKey::Name),
            "cp" => Ok(SortKey::Cp),
            "captured" => Ok(SortKey::Captured),
            "height" => Ok(SortKey::Height),
            "weight" => Ok(SortKey::Weight),
            "iv" => Ok(SortKey::Iv),
            "attack" => Ok(SortKey::Attack),
            "defense" | "defence" => Ok(SortKey::Defense),
            "stamina" => Ok(SortKey::Stamina),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than "desc" sorts ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// Capture time in epoch milliseconds. Records whose id is a long numeric
/// timestamp (tool exports without a parsed capture time) use the id.
fn captured_millis(record: &CreatureRecord) -> i64 {
    if let Some(at) = record.captured_at {
        return at.timestamp_millis();
    }
    let id = record.id.as_str();
    if id.len() >= 12 && id.bytes().all(|b| b.is_ascii_digit()) {
        return id.parse().unwrap_or(0);
    }
    0
}

fn compare_by(key: SortKey, a: &CreatureRecord, b: &CreatureRecord) -> Ordering {
    let iv = |r: Option<u8>| r.unwrap_or(0);
    match key {
        SortKey::Number => a.number.cmp(&b.number),
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Cp => a.cp.unwrap_or(0).cmp(&b.cp.unwrap_or(0)),
        SortKey::Captured => captured_millis(a).cmp(&captured_millis(b)),
        SortKey::Height => a.height.total_cmp(&b.height),
        SortKey::Weight => a.weight.total_cmp(&b.weight),
        SortKey::Iv => a.iv.total_cmp(&b.iv),
        SortKey::Attack => iv(a.attack).cmp(&iv(b.attack)),
        SortKey::Defense => iv(a.defence).cmp(&iv(b.defence)),
        SortKey::Stamina => iv(a.stamina).cmp(&iv(b.stamina)),
    }
}

/// Stable sort; equal records keep their relative order in both directions.
pub fn sort_records(records: &mut [CreatureRecord], key: SortKey, direction: SortDirection) {
    match direction {
        SortDirection::Asc => records.sort_by(|a, b| compare_by(key, a, b)),
        SortDirection::Desc => records.sort_by(|a, b| compare_by(key, b, a)),
    }
}

/// Keeps Max-capable records.
///
/// `gigantamax` alone keeps gigantamax records, `dynamax` alone keeps
/// dynamax records that are not gigantamax, both keep either. With neither
/// flag set the collection is returned untouched.
pub fn filter_max_forms(
    records: Vec<CreatureRecord>,
    dynamax: bool,
    gigantamax: bool,
) -> Vec<CreatureRecord> {
    if !dynamax && !gigantamax {
        return records;
    }
    records
        .into_iter()
        .filter(|r| {
            let dynamax_only = r.dynamax && !r.gigantamax;
            (gigantamax && r.gigantamax) || (dynamax && dynamax_only)
        })
        .collect()
}

fn pvp_order_key(record: &CreatureRecord) -> (u32, u32, u8, u8, u32) {
    match &record.pvp {
        Some(pvp) => (
            pvp.meta_rank,
            pvp.rank_top10,
            pvp.distance_max,
            pvp.distance_sum,
            record.number,
        ),
        None => (u32::MAX, u32::MAX, u8::MAX, u8::MAX, record.number),
    }
}

/// Competitive ordering: meta rank, then closeness to a top spread.
pub fn sort_pvp(records: &mut [CreatureRecord]) {
    records.sort_by_key(pvp_order_key);
}
