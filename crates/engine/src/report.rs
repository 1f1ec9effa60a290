use std::collections::BTreeMap;

use crate::model::{
    MatchResult, MatchStatus, MatchedRow, RunSummary, UnmatchedRow,
};

/// One decimal place for display; classification has already happened on
/// the raw value by the time a row is built.
fn round1(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

/// Partition results into the matched and unmatched tables, each sorted
/// by descending score with ties broken by original sequence position.
pub fn build_tables(results: &[MatchResult]) -> (Vec<MatchedRow>, Vec<UnmatchedRow>) {
    let mut matched: Vec<(usize, &MatchResult)> = Vec::new();
    let mut unmatched: Vec<(usize, &MatchResult)> = Vec::new();

    for (idx, result) in results.iter().enumerate() {
        match result.status {
            MatchStatus::Matched => matched.push((idx, result)),
            MatchStatus::Unmatched => unmatched.push((idx, result)),
        }
    }

    let by_score_desc = |a: &(usize, &MatchResult), b: &(usize, &MatchResult)| {
        b.1.score.total_cmp(&a.1.score).then(a.0.cmp(&b.0))
    };
    matched.sort_by(by_score_desc);
    unmatched.sort_by(by_score_desc);

    let matched_rows = matched
        .into_iter()
        .map(|(_, r)| MatchedRow {
            invoice_code: r.invoice_code.clone(),
            invoice_name: r.invoice_name.clone(),
            order_code: r.order_code.clone(),
            order_name: r.order_name.clone(),
            score: round1(r.score),
            confidence: r.confidence,
        })
        .collect();

    let unmatched_rows = unmatched
        .into_iter()
        .map(|(_, r)| UnmatchedRow {
            invoice_code: r.invoice_code.clone(),
            invoice_name: r.invoice_name.clone(),
            non_match_score: round1(100.0 - r.score),
            confidence: r.confidence,
        })
        .collect();

    (matched_rows, unmatched_rows)
}

pub fn compute_summary(results: &[MatchResult], order_records: usize) -> RunSummary {
    let mut label_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut matched = 0;
    let mut learned_hits = 0;

    for result in results {
        if result.status == MatchStatus::Matched {
            matched += 1;
        }
        if result.learned {
            learned_hits += 1;
        }
        *label_counts.entry(result.confidence.text().to_string()).or_insert(0) += 1;
    }

    RunSummary {
        invoice_records: results.len(),
        order_records,
        matched,
        unmatched: results.len() - matched,
        learned_hits,
        label_counts,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
