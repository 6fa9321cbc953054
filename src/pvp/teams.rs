// Team synthesis: pick three-member teams from annotated creatures, scoring
// each triple by meta rank and how well the members cover each other's
// counters.
//
//   meta      = sum over members of max(0, 2000 - rank)
//   threats   = union of members' counters, keeping the lowest rating seen
//   uncovered = threats no member beats (matchup rating >= 550)
//   score     = meta + (threats - uncovered) * 10 - uncovered * 120

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use super::bracket::Bracket;
use super::rankings::RankingIndex;
use crate::metrics;
use crate::record::{CreatureRecord, PvpAnnotation};

pub const CANDIDATE_POOL: usize = 30;
pub const DEFAULT_MAX_TEAMS: usize = 3;
pub const COVERAGE_THRESHOLD: i32 = 550;
pub const GOOD_MATCHUP_THRESHOLD: i32 = 550;
pub const META_BASELINE: i64 = 2000;
pub const COVERED_BONUS: i64 = 10;
pub const UNCOVERED_PENALTY: i64 = 120;
pub const SUMMARY_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpponentRating {
    pub id: String,
    pub name: String,
    pub rating: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub score: i64,
    /// Opponents the team beats, strongest wins first.
    pub strengths: Vec<OpponentRating>,
    /// Threats nobody on the team covers, worst first.
    pub weaknesses: Vec<OpponentRating>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub score: i64,
    pub species_ids: [String; 3],
    pub member_ids: [String; 3],
    pub summary: TeamSummary,
}

struct Candidate<'a> {
    record: &'a CreatureRecord,
    species_id: &'a str,
    rank: u32,
    matchups: IndexMap<String, i32>,
    counters: IndexMap<String, i32>,
}

struct Assessment {
    score: i64,
    threats: IndexMap<String, i32>,
    uncovered: Vec<String>,
    strengths: IndexMap<String, i32>,
}

fn assess(members: [&Candidate<'_>; 3]) -> Assessment {
    let meta: i64 = members
        .iter()
        .map(|m| (META_BASELINE - i64::from(m.rank)).max(0))
        .sum();

    let mut threats: IndexMap<String, i32> = IndexMap::new();
    for m in &members {
        for (opponent, rating) in &m.counters {
            threats
                .entry(opponent.clone())
                .and_modify(|r| *r = (*r).min(*rating))
                .or_insert(*rating);
        }
    }

    let uncovered: Vec<String> = threats
        .keys()
        .filter(|opponent| {
            !members.iter().any(|m| {
                m.matchups
                    .get(opponent.as_str())
                    .is_some_and(|r| *r >= COVERAGE_THRESHOLD)
            })
        })
        .cloned()
        .collect();

    let mut strengths: IndexMap<String, i32> = IndexMap::new();
    for m in &members {
        for (opponent, rating) in &m.matchups {
            if *rating >= GOOD_MATCHUP_THRESHOLD {
                strengths
                    .entry(opponent.clone())
                    .and_modify(|r| *r = (*r).max(*rating))
                    .or_insert(*rating);
            }
        }
    }

    let covered = (threats.len() - uncovered.len()) as i64;
    let score = meta + covered * COVERED_BONUS - uncovered.len() as i64 * UNCOVERED_PENALTY;
    Assessment {
        score,
        threats,
        uncovered,
        strengths,
    }
}

/// Dedup key: a smaller tuple is a better representative of its species.
fn representative_key(pvp: &PvpAnnotation, record: &CreatureRecord) -> (u8, u8, u32, u32) {
    (
        pvp.distance_sum,
        pvp.distance_max,
        pvp.rank_top10,
        record.cp.unwrap_or(0),
    )
}

#[derive(Debug, Clone)]
pub struct TeamSynthesizer {
    rankings: Arc<RankingIndex>,
}

impl TeamSynthesizer {
    pub fn new(rankings: Arc<RankingIndex>) -> Self {
        Self { rankings }
    }

    /// Best distinct three-species teams from `records`, best first.
    ///
    /// Only records carrying a PVP annotation with a meta rank take part.
    /// Returns nothing when fewer than three distinct species qualify.
    pub fn synthesize(
        &self,
        records: &[CreatureRecord],
        bracket: Bracket,
        category: &str,
        max_teams: usize,
    ) -> Vec<Team> {
        let category = self.rankings.resolve_category(category);
        let candidates = self.candidates(records, bracket, &category);
        if candidates.len() < 3 {
            return Vec::new();
        }

        let n = candidates.len();
        let mut scored: Vec<(i64, [usize; 3])> = Vec::with_capacity(n * n * n / 6);
        for i in 0..n {
            for j in i + 1..n {
                for k in j + 1..n {
                    let members = [&candidates[i], &candidates[j], &candidates[k]];
                    scored.push((assess(members).score, [i, j, k]));
                }
            }
        }
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let mut seen: HashSet<[String; 3]> = HashSet::new();
        let mut teams = Vec::new();
        for (score, [i, j, k]) in scored {
            if teams.len() >= max_teams {
                break;
            }
            let members = [&candidates[i], &candidates[j], &candidates[k]];
            let mut key = members.map(|m| m.species_id.to_string());
            key.sort();
            if !seen.insert(key) {
                continue;
            }
            teams.push(self.build_team(score, members, bracket, &category));
        }

        metrics::TEAMS_SYNTHESIZED_TOTAL.inc_by(teams.len() as u64);
        teams
    }

    /// One representative per species, best meta rank first, capped.
    fn candidates<'a>(
        &self,
        records: &'a [CreatureRecord],
        bracket: Bracket,
        category: &str,
    ) -> Vec<Candidate<'a>> {
        let mut by_species: IndexMap<&'a str, (&'a CreatureRecord, &'a PvpAnnotation)> =
            IndexMap::new();
        for record in records {
            let Some(pvp) = record.pvp.as_ref().filter(|p| p.enabled && p.meta_rank > 0) else {
                continue;
            };
            // strict comparison: the first record wins ties
            let replace = match by_species.get(pvp.species_id.as_str()) {
                Some((held, held_pvp)) => {
                    representative_key(pvp, record) < representative_key(held_pvp, held)
                }
                None => true,
            };
            if replace {
                by_species.insert(pvp.species_id.as_str(), (record, pvp));
            }
        }

        let mut pool: Vec<(&'a CreatureRecord, &'a PvpAnnotation)> =
            by_species.into_values().collect();
        pool.sort_by_key(|(_, pvp)| pvp.meta_rank);
        pool.truncate(CANDIDATE_POOL);

        pool.into_iter()
            .map(|(record, pvp)| {
                let entry = self
                    .rankings
                    .best_entry_for_prefix(category, bracket, &pvp.species_prefix);
                let (matchups, counters) = entry
                    .map(|found| {
                        let collect = |list: &[super::rankings::Matchup]| {
                            list.iter()
                                .map(|m| (m.opponent.clone(), m.rating))
                                .collect::<IndexMap<_, _>>()
                        };
                        (collect(&found.entry.matchups), collect(&found.entry.counters))
                    })
                    .unwrap_or_default();
                Candidate {
                    record,
                    species_id: pvp.species_id.as_str(),
                    rank: pvp.meta_rank,
                    matchups,
                    counters,
                }
            })
            .collect()
    }

    fn build_team(
        &self,
        score: i64,
        members: [&Candidate<'_>; 3],
        bracket: Bracket,
        category: &str,
    ) -> Team {
        let assessment = assess(members);
        let named = |id: &String, rating: i32| OpponentRating {
            id: id.clone(),
            name: self.rankings.display_name(category, bracket, id),
            rating,
        };

        let mut strengths: Vec<(&String, i32)> =
            assessment.strengths.iter().map(|(k, v)| (k, *v)).collect();
        strengths.sort_by(|a, b| b.1.cmp(&a.1));

        let mut weaknesses: Vec<(&String, i32)> = assessment
            .uncovered
            .iter()
            .filter_map(|id| assessment.threats.get(id).map(|r| (id, *r)))
            .collect();
        weaknesses.sort_by_key(|(_, rating)| *rating);

        Team {
            score,
            species_ids: members.map(|m| m.species_id.to_string()),
            member_ids: members.map(|m| m.record.id.clone()),
            summary: TeamSummary {
                score,
                strengths: strengths
                    .into_iter()
                    .take(SUMMARY_SIZE)
                    .map(|(id, r)| named(id, r))
                    .collect(),
                weaknesses: weaknesses
                    .into_iter()
                    .take(SUMMARY_SIZE)
                    .map(|(id, r)| named(id, r))
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pvp::rankings::RankingEntry;

    fn annotated(id: &str, species: &str, meta_rank: u32) -> CreatureRecord {
        CreatureRecord {
            id: id.into(),
            name: species.into(),
            cp: Some(1400),
            pvp: Some(PvpAnnotation {
                enabled: true,
                league: Bracket::Great,
                category: "overall".into(),
                rank_top10: 1,
                distance_max: 0,
                distance_sum: 0,
                delta_atk: 0,
                delta_def: 0,
                delta_stm: 0,
                meta_atk: 0,
                meta_def: 15,
                meta_stm: 15,
                meta_level: 40.0,
                meta_cp: 1499,
                best_atk: 0,
                best_def: 15,
                best_stm: 15,
                best_level: 40.0,
                best_cp: 1499,
                species_prefix: species.into(),
                species_id: species.into(),
                rating: 0,
                meta_rank,
            }),
            ..Default::default()
        }
    }

    fn synthesizer() -> TeamSynthesizer {
        let mut rankings = RankingIndex::new();
        rankings.insert(
            "overall",
            Bracket::Great,
            vec![
                RankingEntry::new("a", 90)
                    .with_matchups(&[("x", 600), ("y", 400)])
                    .with_counters(&[("y", 300)]),
                RankingEntry::new("b", 80)
                    .with_matchups(&[("y", 700)])
                    .with_counters(&[("x", 200), ("z", 250)]),
                RankingEntry::new("c", 70)
                    .with_matchups(&[("z", 560)])
                    .with_counters(&[("x", 350)]),
                RankingEntry::new("d", 60).with_counters(&[("w", 100)]),
                RankingEntry::new("w", 50).with_name("Wobbuffet"),
            ],
        );
        TeamSynthesizer::new(Arc::new(rankings))
    }

    fn pool() -> Vec<CreatureRecord> {
        vec![
            annotated("r-a", "a", 1),
            annotated("r-b", "b", 2),
            annotated("r-c", "c", 3),
            annotated("r-d", "d", 4),
        ]
    }

    #[test]
    fn test_scores_and_order() {
        let teams = synthesizer().synthesize(&pool(), Bracket::Great, "overall", 3);
        let picked: Vec<([String; 3], i64)> =
            teams.iter().map(|t| (t.species_ids.clone(), t.score)).collect();
        let ids = |a: &str, b: &str, c: &str| [a.to_string(), b.to_string(), c.to_string()];
        assert_eq!(
            picked,
            vec![
                (ids("a", "b", "c"), 6024),
                (ids("a", "b", "d"), 5773),
                (ids("a", "c", "d"), 5762),
            ]
        );
        assert_eq!(teams[0].member_ids, ids("r-a", "r-b", "r-c"));
    }

    #[test]
    fn test_summary_contents() {
        let teams = synthesizer().synthesize(&pool(), Bracket::Great, "overall", 3);
        let strengths: Vec<(&str, i32)> = teams[0]
            .summary
            .strengths
            .iter()
            .map(|o| (o.id.as_str(), o.rating))
            .collect();
        assert_eq!(strengths, vec![("y", 700), ("x", 600), ("z", 560)]);
        assert!(strengths.iter().all(|(_, r)| *r >= GOOD_MATCHUP_THRESHOLD));
        assert!(teams[0].summary.weaknesses.is_empty());

        let weak = &teams[1].summary.weaknesses;
        assert_eq!(weak.len(), 2);
        assert_eq!((weak[0].id.as_str(), weak[0].rating), ("w", 100));
        assert_eq!(weak[0].name, "Wobbuffet");
        assert_eq!((weak[1].id.as_str(), weak[1].name.as_str()), ("z", "z"));
    }

    #[test]
    fn test_fewer_than_three_species() {
        let records = vec![
            annotated("1", "a", 1),
            annotated("2", "a", 1),
            annotated("3", "b", 2),
        ];
        assert!(synthesizer()
            .synthesize(&records, Bracket::Great, "overall", 3)
            .is_empty());
    }

    #[test]
    fn test_unannotated_records_are_ignored() {
        let mut records = pool();
        records[3].pvp = None;
        records.push(CreatureRecord::default());
        let teams = synthesizer().synthesize(&records, Bracket::Great, "overall", 5);
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].score, 6024);
    }

    #[test]
    fn test_best_representative_per_species() {
        let mut worse = annotated("a-worse", "a", 1);
        if let Some(p) = worse.pvp.as_mut() {
            p.distance_sum = 3;
            p.distance_max = 1;
        }
        let mut records = vec![worse];
        records.extend(pool());
        let teams = synthesizer().synthesize(&records, Bracket::Great, "overall", 1);
        assert_eq!(teams[0].member_ids[0], "r-a");
    }

    #[test]
    fn test_teams_are_distinct() {
        let mut records = pool();
        records.push(annotated("r-a2", "a", 1));
        records.push(annotated("r-b2", "b", 2));
        let teams = synthesizer().synthesize(&records, Bracket::Great, "overall", 10);
        let mut keys = HashSet::new();
        for t in &teams {
            let mut k = t.species_ids.clone();
            k.sort();
            assert!(keys.insert(k));
        }
        assert_eq!(teams.len(), 4);
        for w in teams.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
    }
}
