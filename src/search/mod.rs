// Collection filter language.
//
// Queries look like `shiny&dragon`, `cp1500-,!shadow` or `150-151`.

pub mod predicate;
pub mod query;
pub mod range;

pub use query::Query;

use crate::metrics;
use crate::record::CreatureRecord;

/// Records matching `query`, as references into `records`.
pub fn filter<'a>(records: &'a [CreatureRecord], query: &str) -> Vec<&'a CreatureRecord> {
    filter_indices(records, query)
        .into_iter()
        .map(|i| &records[i])
        .collect()
}

/// Positions in `records` matching `query`.
pub fn filter_indices(records: &[CreatureRecord], query: &str) -> Vec<usize> {
    metrics::SEARCH_QUERIES_TOTAL.inc();
    let all: Vec<usize> = (0..records.len()).collect();
    Query::parse(query).evaluate(records, &all)
}
