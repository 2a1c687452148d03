//! JSON output formatting

use notehash_core::{BarReport, QueryReport};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-reference match summary of one query
#[derive(Debug, Serialize, PartialEq)]
pub struct BucketSummary {
    pub matches: usize,
    /// Most common reference/query onset offset and its support
    pub best_offset: Option<(i64, usize)>,
}

/// Query classification without the raw onset lists
#[derive(Debug, Serialize)]
pub struct QuerySummary<'a> {
    pub query: &'a str,
    pub matches: usize,
    pub buckets: BTreeMap<&'a str, BucketSummary>,
    pub tally: &'a BTreeMap<String, usize>,
    pub score: f64,
    pub percentages: &'a BTreeMap<String, f64>,
}

impl<'a> QuerySummary<'a> {
    pub fn new(report: &'a QueryReport) -> Self {
        let buckets: BTreeMap<&str, BucketSummary> = report
            .buckets
            .iter()
            .map(|(source, bucket)| {
                (
                    source.as_str(),
                    BucketSummary {
                        matches: bucket.len(),
                        best_offset: bucket.best_offset(),
                    },
                )
            })
            .collect();

        Self {
            query: &report.query,
            matches: buckets.values().map(|b| b.matches).sum(),
            buckets,
            tally: &report.tally,
            score: report.score,
            percentages: &report.percentages,
        }
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing result: {}", e),
    }
}

/// Print query results as a JSON array of summaries
pub fn print_json_results(results: &[QueryReport]) {
    let summaries: Vec<QuerySummary> = results.iter().map(QuerySummary::new).collect();
    print_json(&summaries);
}

/// Print bar-interval results as `{file: percentages}`
pub fn print_bar_results(results: &[BarReport]) {
    let table: BTreeMap<&str, &BTreeMap<String, f64>> = results
        .iter()
        .map(|r| (r.query.as_str(), &r.percentages))
        .collect();
    print_json(&table);
}
