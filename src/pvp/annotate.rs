// Matches a creature's IVs against the top spreads for its species and
// annotates the record with the closest one.

use std::sync::Arc;

use super::bracket::Bracket;
use super::identifiers::candidate_identifiers;
use super::levels::LevelMultiplierTable;
use super::rankings::{RankedEntry, RankingIndex};
use super::spreads::{top_spreads, IvSpread, SpreadCache, SpreadKey};
use super::stats::Ivs;
use crate::metrics;
use crate::record::{CreatureRecord, PvpAnnotation};

#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Largest per-stat IV difference still counted as a match.
    pub threshold: u8,
    /// How many top spreads to compare against.
    pub top_n: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: 2,
            top_n: 10,
        }
    }
}

/// Closest spread within `threshold` of `ivs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadMatch {
    /// Index into the spread list.
    pub index: usize,
    pub delta: (i8, i8, i8),
    pub distance_max: u8,
    pub distance_sum: u8,
}

// Both sides are within 0..=15, so the difference fits in i8.
fn delta(have: u8, want: u8) -> i8 {
    (i16::from(have) - i16::from(want)) as i8
}

/// Picks the spread minimizing (max |d|, sum |d|); the earlier spread wins ties.
///
/// IVs outside 0..=15 never match.
pub fn closest_spread(ivs: Ivs, spreads: &[IvSpread], threshold: u8) -> Option<SpreadMatch> {
    if !ivs.is_valid() {
        return None;
    }
    let mut best: Option<SpreadMatch> = None;
    for (index, s) in spreads.iter().enumerate() {
        let d = (
            delta(ivs.attack, s.atk_iv),
            delta(ivs.defense, s.def_iv),
            delta(ivs.stamina, s.stm_iv),
        );
        let abs = [d.0.unsigned_abs(), d.1.unsigned_abs(), d.2.unsigned_abs()];
        let distance_max = abs.into_iter().max().unwrap_or(0);
        if distance_max > threshold {
            continue;
        }
        let candidate = SpreadMatch {
            index,
            delta: d,
            distance_max,
            distance_sum: abs.iter().sum(),
        };
        let closer = match &best {
            None => true,
            Some(b) => {
                (candidate.distance_max, candidate.distance_sum)
                    < (b.distance_max, b.distance_sum)
            }
        };
        if closer {
            best = Some(candidate);
        }
    }
    best
}

/// Attaches PVP annotations to creature records.
#[derive(Debug, Clone)]
pub struct MatchAnnotator {
    levels: Arc<LevelMultiplierTable>,
    rankings: Arc<RankingIndex>,
    spreads: SpreadCache,
}

impl MatchAnnotator {
    pub fn new(
        levels: Arc<LevelMultiplierTable>,
        rankings: Arc<RankingIndex>,
        spreads: SpreadCache,
    ) -> Self {
        Self {
            levels,
            rankings,
            spreads,
        }
    }

    pub fn rankings(&self) -> &Arc<RankingIndex> {
        &self.rankings
    }

    /// Top spreads for a species, served from the shared cache.
    ///
    /// The cache always holds the full top list; callers slice what they need.
    pub fn spreads_for(
        &self,
        number: u32,
        form: Option<&str>,
        base: super::BaseStats,
        bracket: Bracket,
    ) -> Arc<Vec<IvSpread>> {
        let key = SpreadKey::new(number, form, bracket);
        let levels = Arc::clone(&self.levels);
        self.spreads
            .get_or_compute(key, move || top_spreads(&levels, base, bracket.cp_cap()))
    }

    /// First candidate id that has a ranking entry, with the id that matched.
    pub fn find_ranking(
        &self,
        record: &CreatureRecord,
        bracket: Bracket,
        category: &str,
    ) -> Option<(String, RankedEntry)> {
        candidate_identifiers(record.form.as_deref(), &record.name, record.shadow)
            .into_iter()
            .find_map(|prefix| {
                self.rankings
                    .best_entry_for_prefix(category, bracket, &prefix)
                    .map(|found| (prefix, found))
            })
    }

    /// Annotates `record` when it is competitively viable in `bracket`.
    ///
    /// Returns false and leaves the record untouched when any precondition
    /// fails: unknown IVs, missing base stats, no ranking entry, CP above the
    /// cap, no spreads, or no spread within the threshold.
    pub fn match_and_annotate(
        &self,
        record: &mut CreatureRecord,
        bracket: Bracket,
        category: &str,
        options: MatchOptions,
    ) -> bool {
        match self.evaluate(record, bracket, category, options) {
            Some(annotation) => {
                record.pvp = Some(annotation);
                metrics::ANNOTATIONS_TOTAL
                    .with_label_values(&["matched"])
                    .inc();
                true
            }
            None => {
                metrics::ANNOTATIONS_TOTAL
                    .with_label_values(&["rejected"])
                    .inc();
                false
            }
        }
    }

    fn evaluate(
        &self,
        record: &CreatureRecord,
        bracket: Bracket,
        category: &str,
        options: MatchOptions,
    ) -> Option<PvpAnnotation> {
        let ivs = record.ivs()?;
        let base = record.base_stats()?;
        let category = self.rankings.resolve_category(category);
        let (prefix, ranked) = self.find_ranking(record, bracket, &category)?;

        if record.cp.is_some_and(|cp| cp > bracket.cp_cap()) {
            return None;
        }

        let spreads = self.spreads_for(record.number, record.form.as_deref(), base, bracket);
        let considered = &spreads[..options.top_n.min(spreads.len())];
        let best = considered.first()?;
        let hit = closest_spread(ivs, considered, options.threshold)?;
        let meta = &spreads[hit.index];

        Some(PvpAnnotation {
            enabled: true,
            league: bracket,
            category,
            rank_top10: hit.index as u32 + 1,
            distance_max: hit.distance_max,
            distance_sum: hit.distance_sum,
            delta_atk: hit.delta.0,
            delta_def: hit.delta.1,
            delta_stm: hit.delta.2,
            meta_atk: meta.atk_iv,
            meta_def: meta.def_iv,
            meta_stm: meta.stm_iv,
            meta_level: meta.level,
            meta_cp: meta.cp,
            best_atk: best.atk_iv,
            best_def: best.def_iv,
            best_stm: best.stm_iv,
            best_level: best.level,
            best_cp: best.cp,
            species_prefix: prefix,
            species_id: ranked.entry.species_id.clone(),
            rating: ranked.entry.rating,
            meta_rank: ranked.rank,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pvp::fixtures;
    use crate::pvp::rankings::RankingEntry;
    use crate::pvp::BaseStats;

    fn spread(a: u8, d: u8, s: u8) -> IvSpread {
        IvSpread {
            atk_iv: a,
            def_iv: d,
            stm_iv: s,
            level: 50.0,
            cp: 1490,
            product: 0.0,
            attack: 0.0,
            defense: 0.0,
            hp: 0,
        }
    }

    #[test]
    fn test_closest_within_threshold() {
        let hit = closest_spread(Ivs::new(14, 14, 14), &[spread(15, 15, 15)], 2).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.distance_max, 1);
        assert_eq!(hit.distance_sum, 3);
        assert_eq!(hit.delta, (-1, -1, -1));
    }

    #[test]
    fn test_outside_threshold() {
        assert!(closest_spread(Ivs::new(10, 15, 15), &[spread(15, 15, 15)], 2).is_none());
        assert!(closest_spread(Ivs::new(10, 15, 15), &[], 2).is_none());
        assert!(closest_spread(Ivs::new(14, 14, 14), &[spread(15, 15, 15)], 0).is_none());
    }

    #[test]
    fn test_out_of_range_ivs_never_match() {
        assert!(closest_spread(Ivs::new(128, 15, 15), &[spread(15, 15, 15)], 2).is_none());
        assert!(closest_spread(Ivs::new(16, 15, 15), &[spread(15, 15, 15)], u8::MAX).is_none());
    }

    #[test]
    fn test_prefers_smaller_max_then_sum_then_earlier() {
        let spreads = [
            spread(0, 15, 13), // max 2
            spread(1, 14, 14), // max 1, sum 3
            spread(0, 14, 14), // max 1, sum 2
            spread(1, 15, 14), // max 1, sum 2, later
        ];
        let hit = closest_spread(Ivs::new(1, 15, 15), &spreads, 2).unwrap();
        // (1,15,15) vs (0,14,14): deltas 1,1,1 -> max 1 sum 3
        // (1,15,15) vs (1,15,14): deltas 0,0,1 -> max 1 sum 1
        assert_eq!(hit.index, 3);
        assert_eq!(hit.distance_sum, 1);

        let hit = closest_spread(Ivs::new(0, 14, 14), &spreads, 2).unwrap();
        assert_eq!(hit.index, 2);
        assert_eq!(hit.distance_max, 0);
    }

    fn annotator(entries: Vec<RankingEntry>) -> MatchAnnotator {
        let mut rankings = RankingIndex::new();
        rankings.insert("overall", Bracket::Great, entries);
        MatchAnnotator::new(
            Arc::new(fixtures::levels()),
            Arc::new(rankings),
            SpreadCache::new(),
        )
    }

    fn medicham(ivs: Ivs) -> CreatureRecord {
        CreatureRecord {
            id: "m1".into(),
            number: 308,
            form: Some("MEDICHAM_NORMAL".into()),
            name: "Medicham".into(),
            cp: Some(1450),
            attack: Some(ivs.attack),
            defence: Some(ivs.defense),
            stamina: Some(ivs.stamina),
            base_attack: Some(121),
            base_defence: Some(152),
            base_stamina: Some(155),
            ..Default::default()
        }
    }

    #[test]
    fn test_annotates_exact_top_spread() {
        let levels = fixtures::levels();
        let top = top_spreads(&levels, BaseStats::new(121, 152, 155), 1500);
        let ann = annotator(vec![
            RankingEntry::new("azumarill", 95),
            RankingEntry::new("medicham", 90),
        ]);
        let mut record = medicham(top[0].ivs());
        assert!(ann.match_and_annotate(
            &mut record,
            Bracket::Great,
            "overall",
            MatchOptions::default()
        ));

        let pvp = record.pvp.unwrap();
        assert!(pvp.enabled);
        assert_eq!(pvp.league, Bracket::Great);
        assert_eq!(pvp.category, "overall");
        assert_eq!(pvp.rank_top10, 1);
        assert_eq!(pvp.distance_max, 0);
        assert_eq!(pvp.distance_sum, 0);
        assert_eq!(pvp.species_prefix, "medicham");
        assert_eq!(pvp.species_id, "medicham");
        assert_eq!(pvp.rating, 90);
        assert_eq!(pvp.meta_rank, 2);
        assert_eq!(
            (pvp.best_atk, pvp.best_def, pvp.best_stm),
            (pvp.meta_atk, pvp.meta_def, pvp.meta_stm)
        );
        assert!(pvp.meta_cp <= 1500);
    }

    #[test]
    fn test_rejections_leave_record_untouched() {
        let levels = fixtures::levels();
        let top = top_spreads(&levels, BaseStats::new(121, 152, 155), 1500);
        let ann = annotator(vec![RankingEntry::new("medicham", 90)]);
        let opts = MatchOptions::default();

        let mut over_cap = medicham(top[0].ivs());
        over_cap.cp = Some(1501);
        assert!(!ann.match_and_annotate(&mut over_cap, Bracket::Great, "overall", opts));
        assert!(over_cap.pvp.is_none());

        let mut no_ivs = medicham(top[0].ivs());
        no_ivs.stamina = None;
        assert!(!ann.match_and_annotate(&mut no_ivs, Bracket::Great, "overall", opts));

        let mut no_base = medicham(top[0].ivs());
        no_base.base_attack = None;
        assert!(!ann.match_and_annotate(&mut no_base, Bracket::Great, "overall", opts));

        let mut unranked = medicham(top[0].ivs());
        unranked.form = Some("BULBASAUR_NORMAL".into());
        unranked.name = "Bulbasaur".into();
        assert!(!ann.match_and_annotate(&mut unranked, Bracket::Great, "overall", opts));
        assert!(unranked.pvp.is_none());

        // no ranking list for UL
        let mut other_league = medicham(top[0].ivs());
        assert!(!ann.match_and_annotate(&mut other_league, Bracket::Ultra, "overall", opts));
    }

    #[test]
    fn test_out_of_range_iv_rejected_without_mutation() {
        let levels = fixtures::levels();
        let top = top_spreads(&levels, BaseStats::new(121, 152, 155), 1500);
        let ann = annotator(vec![RankingEntry::new("medicham", 90)]);

        for attack in [16, 128, u8::MAX] {
            let mut record = medicham(top[0].ivs());
            record.attack = Some(attack);
            let before = record.clone();
            assert!(!ann.match_and_annotate(
                &mut record,
                Bracket::Great,
                "overall",
                MatchOptions::default()
            ));
            assert_eq!(record, before);
        }
    }

    #[test]
    fn test_zero_threshold_requires_exact_spread() {
        let levels = fixtures::levels();
        let top = top_spreads(&levels, BaseStats::new(121, 152, 155), 1500);
        let ann = annotator(vec![RankingEntry::new("medicham", 90)]);
        let exact = MatchOptions {
            threshold: 0,
            ..MatchOptions::default()
        };

        let outside = Ivs::all()
            .find(|iv| top.iter().all(|s| s.ivs() != *iv))
            .unwrap();
        let mut record = medicham(outside);
        let before = record.clone();
        assert!(!ann.match_and_annotate(&mut record, Bracket::Great, "overall", exact));
        assert_eq!(record, before);

        let mut record = medicham(top[2].ivs());
        assert!(ann.match_and_annotate(&mut record, Bracket::Great, "overall", exact));
        assert_eq!(record.pvp.unwrap().rank_top10, 3);
    }

    #[test]
    fn test_cached_spreads_serve_any_top_n() {
        let levels = fixtures::levels();
        let top = top_spreads(&levels, BaseStats::new(121, 152, 155), 1500);
        let ann = annotator(vec![RankingEntry::new("medicham", 90)]);
        let only_best = MatchOptions {
            threshold: 0,
            top_n: 1,
        };
        let full = MatchOptions {
            threshold: 0,
            top_n: 10,
        };

        let mut first = medicham(top[0].ivs());
        assert!(ann.match_and_annotate(&mut first, Bracket::Great, "overall", only_best));

        let mut last = medicham(top[9].ivs());
        assert!(!ann.match_and_annotate(&mut last, Bracket::Great, "overall", only_best));
        assert!(last.pvp.is_none());
        assert!(ann.match_and_annotate(&mut last, Bracket::Great, "overall", full));
        assert_eq!(last.pvp.unwrap().rank_top10, 10);
    }

    #[test]
    fn test_unknown_cp_is_allowed() {
        let levels = fixtures::levels();
        let top = top_spreads(&levels, BaseStats::new(121, 152, 155), 1500);
        let ann = annotator(vec![RankingEntry::new("medicham", 90)]);
        let mut record = medicham(top[3].ivs());
        record.cp = None;
        assert!(ann.match_and_annotate(
            &mut record,
            Bracket::Great,
            "overall",
            MatchOptions::default()
        ));
        assert_eq!(record.pvp.unwrap().rank_top10, 4);
    }

    #[test]
    fn test_shadow_prefers_shadow_entry() {
        let levels = fixtures::levels();
        let top = top_spreads(&levels, BaseStats::new(121, 152, 155), 1500);
        let ann = annotator(vec![
            RankingEntry::new("medicham", 90),
            RankingEntry::new("medicham_shadow", 70),
        ]);
        let mut record = medicham(top[0].ivs());
        record.shadow = true;
        assert!(ann.match_and_annotate(
            &mut record,
            Bracket::Great,
            "remix",
            MatchOptions::default()
        ));
        let pvp = record.pvp.unwrap();
        assert_eq!(pvp.species_prefix, "medicham_shadow");
        assert_eq!(pvp.meta_rank, 2);
        // unknown category falls back
        assert_eq!(pvp.category, "overall");
    }
}
