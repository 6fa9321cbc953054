// Ranking lists per (category, bracket) and species-prefix lookup.
//
// Files live at <data>/pvp/<category>/rankings-<cap>.json. When a category
// has no file for a bracket, <data>/rankings-<cap>.json is used instead.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::bracket::Bracket;
use super::DEFAULT_CATEGORY;
use crate::metrics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Matchup {
    pub opponent: String,
    pub rating: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub species_id: String,
    pub species_name: Option<String>,
    pub rating: i32,
    pub matchups: Vec<Matchup>,
    pub counters: Vec<Matchup>,
    /// Explicit rank from the file; list position is used when absent.
    pub rank: Option<u32>,
}

impl RankingEntry {
    pub fn new(species_id: impl Into<String>, rating: i32) -> Self {
        Self {
            species_id: species_id.into(),
            species_name: None,
            rating,
            matchups: Vec::new(),
            counters: Vec::new(),
            rank: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.species_name = Some(name.into());
        self
    }

    pub fn with_matchups(mut self, matchups: &[(&str, i32)]) -> Self {
        self.matchups = to_matchups(matchups);
        self
    }

    pub fn with_counters(mut self, counters: &[(&str, i32)]) -> Self {
        self.counters = to_matchups(counters);
        self
    }

    /// Lenient parse of one ranking object. Entries without a string
    /// `speciesId` are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let species_id = value.get("speciesId")?.as_str()?.trim();
        if species_id.is_empty() {
            return None;
        }
        Some(Self {
            species_id: species_id.to_string(),
            species_name: value
                .get("speciesName")
                .and_then(Value::as_str)
                .map(str::to_string),
            rating: value.get("rating").map(lenient_rating).unwrap_or(0),
            matchups: parse_matchups(value.get("matchups")),
            counters: parse_matchups(value.get("counters")),
            rank: value
                .get("rank")
                .and_then(Value::as_u64)
                .and_then(|r| u32::try_from(r).ok())
                .filter(|r| *r > 0),
        })
    }
}

fn to_matchups(pairs: &[(&str, i32)]) -> Vec<Matchup> {
    pairs
        .iter()
        .map(|(opponent, rating)| Matchup {
            opponent: (*opponent).to_string(),
            rating: *rating,
        })
        .collect()
}

fn lenient_rating(value: &Value) -> i32 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(|v| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
            .or_else(|| n.as_f64().map(|v| v as i32))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<i32>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(|v| v as i32))
            .unwrap_or(0),
        _ => 0,
    }
}

fn parse_matchups(value: Option<&Value>) -> Vec<Matchup> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|m| {
            let opponent = m.get("opponent")?.as_str()?;
            Some(Matchup {
                opponent: opponent.to_string(),
                rating: m.get("rating").map(lenient_rating).unwrap_or(0),
            })
        })
        .collect()
}

/// Parses a rankings document. Anything other than a list yields no entries.
pub fn parse_rankings(value: &Value) -> Vec<RankingEntry> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(RankingEntry::from_value).collect())
        .unwrap_or_default()
}

/// A ranking entry together with its 1-based rank in its list.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub entry: Arc<RankingEntry>,
    pub rank: u32,
}

type ListKey = (String, Bracket);
type PrefixKey = (String, Bracket, String);

#[derive(Debug, Default)]
struct RankingList {
    entries: Vec<Arc<RankingEntry>>,
    names: HashMap<String, String>,
}

impl RankingList {
    fn new(entries: Vec<RankingEntry>) -> Self {
        let mut names = HashMap::new();
        for e in &entries {
            let name = e
                .species_name
                .clone()
                .unwrap_or_else(|| e.species_id.replace('_', " "));
            names
                .entry(e.species_id.clone())
                .or_insert_with(|| name.clone());
            if let Some(base) = e.species_id.strip_suffix("_shadow") {
                names.entry(base.to_string()).or_insert(name);
            }
        }
        Self {
            entries: entries.into_iter().map(Arc::new).collect(),
            names,
        }
    }

    fn rank_of(&self, index: usize) -> u32 {
        self.entries[index].rank.unwrap_or(index as u32 + 1)
    }

    /// Single pass, keeping the highest-rated entry per bucket. Exact id wins
    /// over `prefix_` boundary matches, which win over plain prefix matches.
    fn best_for_prefix(&self, prefix: &str) -> Option<RankedEntry> {
        let boundary = format!("{prefix}_");
        let mut exact: Option<usize> = None;
        let mut bounded: Option<usize> = None;
        let mut loose: Option<usize> = None;

        let better = |slot: Option<usize>, i: usize| match slot {
            None => true,
            Some(j) => self.entries[i].rating > self.entries[j].rating,
        };

        for (i, e) in self.entries.iter().enumerate() {
            let sid = e.species_id.as_str();
            if sid == prefix {
                if better(exact, i) {
                    exact = Some(i);
                }
            } else if sid.starts_with(&boundary) {
                if better(bounded, i) {
                    bounded = Some(i);
                }
            } else if sid.starts_with(prefix) && better(loose, i) {
                loose = Some(i);
            }
        }

        exact.or(bounded).or(loose).map(|i| RankedEntry {
            entry: Arc::clone(&self.entries[i]),
            rank: self.rank_of(i),
        })
    }
}

/// All ranking lists, loaded once at startup and shared read-only.
#[derive(Debug)]
pub struct RankingIndex {
    categories: BTreeSet<String>,
    lists: HashMap<ListKey, RankingList>,
    prefix_memo: RwLock<HashMap<PrefixKey, Option<RankedEntry>>>,
}

impl Default for RankingIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RankingIndex {
    pub fn new() -> Self {
        let mut categories = BTreeSet::new();
        categories.insert(DEFAULT_CATEGORY.to_string());
        Self {
            categories,
            lists: HashMap::new(),
            prefix_memo: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `category` (lowercased) and replaces its list for `bracket`.
    pub fn insert(&mut self, category: &str, bracket: Bracket, entries: Vec<RankingEntry>) {
        let category = category.trim().to_lowercase();
        self.categories.insert(category.clone());
        self.lists
            .insert((category, bracket), RankingList::new(entries));
        self.prefix_memo
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Discovers categories under `<data_dir>/pvp` and loads every bracket.
    /// Missing or unreadable files give empty lists.
    pub fn load(data_dir: &Path) -> Self {
        let mut index = Self::new();
        let mut categories = discover_categories(&data_dir.join("pvp"));
        categories
            .entry(DEFAULT_CATEGORY.to_string())
            .or_insert_with(|| data_dir.join("pvp").join(DEFAULT_CATEGORY));

        for (category, dir) in &categories {
            for bracket in Bracket::ALL {
                let path = rankings_path(data_dir, dir, bracket);
                index.insert(category, bracket, read_rankings_file(&path));
            }
        }

        let total = index.entry_count();
        metrics::RANKING_ENTRIES_LOADED.set(total as i64);
        info!(
            categories = categories.len(),
            entries = total,
            "ranking lists loaded"
        );
        index
    }

    /// Known categories, sorted, always including the default.
    pub fn categories(&self) -> Vec<String> {
        self.categories.iter().cloned().collect()
    }

    /// Lowercases `category` and falls back to the default when unknown.
    pub fn resolve_category(&self, category: &str) -> String {
        let wanted = category.trim().to_lowercase();
        if self.categories.contains(&wanted) {
            wanted
        } else {
            DEFAULT_CATEGORY.to_string()
        }
    }

    pub fn entries(&self, category: &str, bracket: Bracket) -> &[Arc<RankingEntry>] {
        let category = self.resolve_category(category);
        self.lists
            .get(&(category, bracket))
            .map(|l| l.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn entry_count(&self) -> usize {
        self.lists.values().map(|l| l.entries.len()).sum()
    }

    /// Best ranking entry for a species prefix, memoized per
    /// (category, bracket, prefix), including misses.
    pub fn best_entry_for_prefix(
        &self,
        category: &str,
        bracket: Bracket,
        prefix: &str,
    ) -> Option<RankedEntry> {
        let category = self.resolve_category(category);
        let key = (category, bracket, prefix.to_string());

        if let Some(hit) = self
            .prefix_memo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return hit.clone();
        }

        let found = self
            .lists
            .get(&(key.0.clone(), bracket))
            .and_then(|list| list.best_for_prefix(prefix));
        self.prefix_memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, found.clone());
        found
    }

    /// Human-readable name for a species id. Shadow ids fall back to their
    /// base id's name; unknown ids are shown with spaces for underscores.
    pub fn display_name(&self, category: &str, bracket: Bracket, species_id: &str) -> String {
        let category = self.resolve_category(category);
        let names = self.lists.get(&(category, bracket)).map(|l| &l.names);
        if let Some(name) = names.and_then(|n| n.get(species_id)) {
            return name.clone();
        }
        let base = species_id.replace("_shadow", "");
        names
            .and_then(|n| n.get(&base))
            .cloned()
            .unwrap_or_else(|| species_id.replace('_', " "))
    }
}

/// Category name (lowercased) to its directory.
fn discover_categories(pvp_dir: &Path) -> BTreeMap<String, PathBuf> {
    let mut found = BTreeMap::new();
    let Ok(entries) = std::fs::read_dir(pvp_dir) else {
        debug!("no category directory at {}", pvp_dir.display());
        return found;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || !entry.path().is_dir() {
            continue;
        }
        found.entry(name.to_lowercase()).or_insert_with(|| entry.path());
    }
    found
}

fn rankings_path(data_dir: &Path, category_dir: &Path, bracket: Bracket) -> PathBuf {
    let file = format!("rankings-{}.json", bracket.cp_cap());
    let per_category = category_dir.join(&file);
    if per_category.exists() {
        per_category
    } else {
        data_dir.join(file)
    }
}

fn read_rankings_file(path: &Path) -> Vec<RankingEntry> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!("rankings unavailable at {}: {e}", path.display());
            return Vec::new();
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => parse_rankings(&value),
        Err(e) => {
            warn!("ignoring malformed rankings file {}: {e}", path.display());
            Vec::new()
        }
    }
}
