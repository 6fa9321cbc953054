// Exhaustive IV spread search under a CP cap.
//
// For each of the 4096 IV combinations we find the highest level on the
// ladder whose CP stays within the cap, then rank by stat product. Ties break
// on higher level, then lower attack IV, higher defense IV, higher stamina IV.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::debug;

use super::bracket::Bracket;
use super::levels::{level_ladder, LevelMultiplierTable};
use super::stats::{self, BaseStats, Ivs};
use crate::metrics;

pub const TOP_SPREADS: usize = 10;

/// One ranked IV combination at its best level under a cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IvSpread {
    pub atk_iv: u8,
    pub def_iv: u8,
    pub stm_iv: u8,
    pub level: f64,
    pub cp: u32,
    pub product: f64,
    pub attack: f64,
    pub defense: f64,
    pub hp: u32,
}

impl IvSpread {
    pub fn ivs(&self) -> Ivs {
        Ivs::new(self.atk_iv, self.def_iv, self.stm_iv)
    }
}

fn spread_order(a: &IvSpread, b: &IvSpread) -> Ordering {
    b.product
        .total_cmp(&a.product)
        .then_with(|| b.level.total_cmp(&a.level))
        .then_with(|| a.atk_iv.cmp(&b.atk_iv))
        .then_with(|| b.def_iv.cmp(&a.def_iv))
        .then_with(|| b.stm_iv.cmp(&a.stm_iv))
}

/// Highest (level, multiplier, cp) with cp <= cap. The ladder is scanned from
/// the top, so a creature that fits at the maximum level stops immediately.
fn best_level_under_cap(
    ladder: &[(f64, f64)],
    base: BaseStats,
    ivs: Ivs,
    cap: u32,
) -> Option<(f64, f64, u32)> {
    ladder.iter().rev().find_map(|&(level, m)| {
        let cp = stats::cp(base, ivs, m).ok()?;
        (cp <= cap).then_some((level, m, cp))
    })
}

/// The best `n` spreads for a species under `cp_cap`, best first.
///
/// Empty when the base stats are incomplete or the table has no usable levels.
pub fn top_spreads_n(
    levels: &LevelMultiplierTable,
    base: BaseStats,
    cp_cap: u32,
    n: usize,
) -> Vec<IvSpread> {
    if !base.is_complete() {
        return Vec::new();
    }
    let ladder: Vec<(f64, f64)> = level_ladder()
        .filter_map(|level| levels.multiplier(level).map(|m| (level, m)))
        .collect();
    if ladder.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::with_capacity(4096);
    for ivs in Ivs::all() {
        let Some((level, m, cp)) = best_level_under_cap(&ladder, base, ivs, cp_cap) else {
            continue;
        };
        let Ok(line) = stats::stats(base, ivs, m) else {
            continue;
        };
        found.push(IvSpread {
            atk_iv: ivs.attack,
            def_iv: ivs.defense,
            stm_iv: ivs.stamina,
            level,
            cp,
            product: line.product,
            attack: line.attack,
            defense: line.defense,
            hp: line.hp,
        });
    }

    found.sort_by(spread_order);
    found.truncate(n);
    found
}

pub fn top_spreads(levels: &LevelMultiplierTable, base: BaseStats, cp_cap: u32) -> Vec<IvSpread> {
    top_spreads_n(levels, base, cp_cap, TOP_SPREADS)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpreadKey {
    pub number: u32,
    pub form: Option<String>,
    pub bracket: Bracket,
}

impl SpreadKey {
    pub fn new(number: u32, form: Option<&str>, bracket: Bracket) -> Self {
        Self {
            number,
            form: form.filter(|f| !f.is_empty()).map(str::to_string),
            bracket,
        }
    }
}

/// Memoized top spreads per (species number, form, bracket).
///
/// Concurrent misses on the same key may compute twice; both results are
/// identical so the later insert is harmless.
#[derive(Debug, Clone, Default)]
pub struct SpreadCache {
    inner: Arc<RwLock<HashMap<SpreadKey, Arc<Vec<IvSpread>>>>>,
}

impl SpreadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(&self, key: SpreadKey, compute: F) -> Arc<Vec<IvSpread>>
    where
        F: FnOnce() -> Vec<IvSpread>,
    {
        if let Some(hit) = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            metrics::SPREAD_CACHE_HITS_TOTAL.inc();
            return Arc::clone(hit);
        }

        metrics::SPREAD_CACHE_MISSES_TOTAL.inc();
        let timer = metrics::SPREAD_SEARCH_DURATION_SECONDS.start_timer();
        let spreads = Arc::new(compute());
        timer.observe_duration();
        debug!(
            number = key.number,
            bracket = %key.bracket,
            spreads = spreads.len(),
            "spread cache miss"
        );

        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&spreads));
        spreads
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pvp::fixtures;
    use std::cell::Cell;

    /// Independent forward scan used to cross-check the search.
    fn brute_force(levels: &LevelMultiplierTable, base: BaseStats, cap: u32) -> Vec<IvSpread> {
        let mut all = Vec::new();
        for ivs in Ivs::all() {
            let mut best = None;
            for level in level_ladder() {
                let m = levels.multiplier(level).unwrap();
                let cp = stats::cp(base, ivs, m).unwrap();
                if cp <= cap {
                    best = Some((level, m, cp));
                }
            }
            if let Some((level, m, cp)) = best {
                let line = stats::stats(base, ivs, m).unwrap();
                all.push(IvSpread {
                    atk_iv: ivs.attack,
                    def_iv: ivs.defense,
                    stm_iv: ivs.stamina,
                    level,
                    cp,
                    product: line.product,
                    attack: line.attack,
                    defense: line.defense,
                    hp: line.hp,
                });
            }
        }
        all.sort_by(spread_order);
        all.truncate(10);
        all
    }

    #[test]
    fn test_great_league_matches_brute_force() {
        let levels = fixtures::levels();
        let base = BaseStats::new(200, 150, 180);
        let top = top_spreads(&levels, base, 1500);
        assert_eq!(top.len(), 10);
        assert_eq!(top, brute_force(&levels, base, 1500));
    }

    #[test]
    fn test_results_respect_cap_and_order() {
        let levels = fixtures::levels();
        let top = top_spreads(&levels, BaseStats::new(200, 150, 180), 1500);
        for s in &top {
            assert!(s.cp <= 1500);
            assert!(s.cp >= stats::MIN_CP);
        }
        for w in top.windows(2) {
            assert_ne!(spread_order(&w[0], &w[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_master_league_everything_at_max_level() {
        let levels = fixtures::levels();
        let top = top_spreads(&levels, BaseStats::new(100, 100, 100), 10000);
        assert_eq!(top.len(), 10);
        assert!(top.iter().all(|s| s.level == 51.0));
        assert_eq!(top[0].ivs(), Ivs::new(15, 15, 15));
    }

    #[test]
    fn test_nothing_fits_under_cap() {
        let levels = fixtures::levels();
        let top = top_spreads(&levels, BaseStats::new(5000, 5000, 5000), 1500);
        assert!(top.is_empty());
    }

    #[test]
    fn test_incomplete_base_or_empty_table() {
        let levels = fixtures::levels();
        assert!(top_spreads(&levels, BaseStats::new(0, 150, 180), 1500).is_empty());
        let empty = LevelMultiplierTable::empty();
        assert!(top_spreads(&empty, BaseStats::new(200, 150, 180), 1500).is_empty());
    }

    #[test]
    fn test_tie_breaks_on_level_then_ivs() {
        let mk = |a, d, s, level, product| IvSpread {
            atk_iv: a,
            def_iv: d,
            stm_iv: s,
            level,
            cp: 1400,
            product,
            attack: 0.0,
            defense: 0.0,
            hp: 0,
        };
        let mut v = vec![
            mk(3, 15, 15, 40.0, 100.0),
            mk(0, 15, 15, 40.0, 100.0),
            mk(0, 14, 15, 40.0, 100.0),
            mk(9, 9, 9, 41.0, 100.0),
            mk(15, 15, 15, 30.0, 200.0),
        ];
        v.sort_by(spread_order);
        let ivs: Vec<(u8, u8, u8)> = v.iter().map(|s| (s.atk_iv, s.def_iv, s.stm_iv)).collect();
        assert_eq!(
            ivs,
            vec![(15, 15, 15), (9, 9, 9), (0, 15, 15), (0, 14, 15), (3, 15, 15)]
        );
    }

    #[test]
    fn test_cache_computes_once() {
        let cache = SpreadCache::new();
        let calls = Cell::new(0);
        let key = SpreadKey::new(308, Some("MEDICHAM_NORMAL"), Bracket::Great);
        let first = cache.get_or_compute(key.clone(), || {
            calls.set(calls.get() + 1);
            Vec::new()
        });
        let second = cache.get_or_compute(key, || {
            calls.set(calls.get() + 1);
            Vec::new()
        });
        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_are_distinct_per_bracket_and_form() {
        let cache = SpreadCache::new();
        cache.get_or_compute(SpreadKey::new(1, None, Bracket::Great), Vec::new);
        cache.get_or_compute(SpreadKey::new(1, None, Bracket::Ultra), Vec::new);
        cache.get_or_compute(SpreadKey::new(1, Some("X"), Bracket::Great), Vec::new);
        // empty form is the same as no form
        cache.get_or_compute(SpreadKey::new(1, Some(""), Bracket::Great), Vec::new);
        assert_eq!(cache.len(), 3);
    }
}
