use std::collections::BTreeMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single line item as found in the source document, pre-normalization.
///
/// Extraction guarantees at least one of `code`/`name` is non-empty and
/// that `(code, name)` pairs are unique within one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ItemRecord {
    pub code: String,
    pub name: String,
}

impl ItemRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// A record with neither code nor name carries nothing to match on.
    pub fn is_blank(&self) -> bool {
        self.code.is_empty() && self.name.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Match results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    Unmatched,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

/// Confidence bucket derived from the combined score (matched rows) or
/// from the inverse non-match score (unmatched rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLabel {
    Excellent,
    VeryGood,
    Good,
    Weak,
    DifferentItem,
    SuspiciousNonMatch,
    ShouldBeChecked,
    LikelyDifferentItem,
}

impl ConfidenceLabel {
    /// Human-readable label used in reports and spreadsheet exports.
    pub fn text(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very good",
            Self::Good => "Good",
            Self::Weak => "Weak",
            Self::DifferentItem => "Different item",
            Self::SuspiciousNonMatch => "Suspicious non-match — review",
            Self::ShouldBeChecked => "Should be checked",
            Self::LikelyDifferentItem => "Likely different item",
        }
    }
}

impl std::fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// One output row per invoice record.
///
/// Invoice fields are copied verbatim from the source record. Order fields
/// hold the best-matching order record when `status == Matched` and are
/// empty otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub invoice_code: String,
    pub invoice_name: String,
    pub order_code: String,
    pub order_name: String,
    /// Combined weighted similarity in [0, 100].
    pub score: f64,
    pub status: MatchStatus,
    pub confidence: ConfidenceLabel,
    /// True when the pair came from the learned-match cache, bypassing scoring.
    pub learned: bool,
}

// ---------------------------------------------------------------------------
// Report tables
// ---------------------------------------------------------------------------

/// Matched-table row. `score` is rounded to one decimal for display;
/// classification always happens on the raw value.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedRow {
    pub invoice_code: String,
    pub invoice_name: String,
    pub order_code: String,
    pub order_name: String,
    pub score: f64,
    pub confidence: ConfidenceLabel,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedRow {
    pub invoice_code: String,
    pub invoice_name: String,
    pub non_match_score: f64,
    pub confidence: ConfidenceLabel,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub invoice_records: usize,
    pub order_records: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Results served from the learned-match cache.
    pub learned_hits: usize,
    /// Count per confidence label text.
    pub label_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    pub threshold: f64,
    pub w_code: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub matched: Vec<MatchedRow>,
    pub unmatched: Vec<UnmatchedRow>,
}
