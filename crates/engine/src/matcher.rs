use std::collections::HashMap;

use crate::classify::{match_label, non_match_label};
use crate::config::MatchConfig;
use crate::model::{ItemRecord, MatchResult, MatchStatus};
use crate::normalize::{normalize_code, normalize_name, TemplateSet};
use crate::score::combined_score;

// ---------------------------------------------------------------------------
// Learned-match cache
// ---------------------------------------------------------------------------

/// A previously accepted pair, replayed without scoring.
#[derive(Debug, Clone)]
pub struct LearnedMatch {
    pub order_code: String,
    pub order_name: String,
    pub score: f64,
}

/// Immutable snapshot of remembered matches, keyed by the raw invoice
/// code. Consulted before any scoring; a hit bypasses the scan entirely.
#[derive(Debug, Clone, Default)]
pub struct LearnedMatches {
    by_invoice_code: HashMap<String, LearnedMatch>,
}

impl LearnedMatches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, invoice_code: &str, learned: LearnedMatch) {
        self.by_invoice_code.insert(invoice_code.to_string(), learned);
    }

    pub fn get(&self, invoice_code: &str) -> Option<&LearnedMatch> {
        self.by_invoice_code.get(invoice_code)
    }

    pub fn len(&self) -> usize {
        self.by_invoice_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_invoice_code.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Comparison form of a record: supplier-stripped normalized code plus
/// normalized name. Derived once per record, the source stays verbatim.
struct NormalizedRecord {
    code: String,
    name: String,
}

fn normalize_record(record: &ItemRecord, templates: &TemplateSet, supplier: Option<&str>) -> NormalizedRecord {
    NormalizedRecord {
        code: normalize_code(&templates.apply(supplier, &record.code)),
        name: normalize_name(&record.name),
    }
}

/// Match every invoice record against the full order document.
///
/// Produces exactly one result per invoice record, in invoice order. The
/// best candidate is the first order record (in document order) with the
/// strictly highest combined score; ties keep the earlier candidate.
pub fn match_documents(
    config: &MatchConfig,
    templates: &TemplateSet,
    cache: Option<&LearnedMatches>,
    orders: &[ItemRecord],
    invoices: &[ItemRecord],
) -> Vec<MatchResult> {
    let supplier = config.supplier.as_deref();

    let order_norms: Vec<NormalizedRecord> = orders
        .iter()
        .map(|r| normalize_record(r, templates, supplier))
        .collect();

    let mut results = Vec::with_capacity(invoices.len());

    for invoice in invoices {
        if let Some(hit) = cache.and_then(|c| c.get(&invoice.code)) {
            results.push(build_result(invoice, Some((&hit.order_code, &hit.order_name)), hit.score, config.threshold, true));
            continue;
        }

        let invoice_norm = normalize_record(invoice, templates, supplier);

        let mut best: Option<(usize, f64)> = None;
        for (idx, order_norm) in order_norms.iter().enumerate() {
            let score = combined_score(
                &invoice_norm.code,
                &order_norm.code,
                &invoice_norm.name,
                &order_norm.name,
                config.w_code,
                config.name_scorer,
            );
            if best.is_none() || score > best.map(|(_, s)| s).unwrap_or(0.0) {
                best = Some((idx, score));
            }
        }

        let result = match best {
            Some((idx, score)) => {
                let order = &orders[idx];
                build_result(invoice, Some((&order.code, &order.name)), score, config.threshold, false)
            }
            None => build_result(invoice, None, 0.0, config.threshold, false),
        };
        results.push(result);
    }

    results
}

fn build_result(
    invoice: &ItemRecord,
    order: Option<(&str, &str)>,
    score: f64,
    threshold: f64,
    learned: bool,
) -> MatchResult {
    // No candidate at all (empty order document) is always Unmatched,
    // whatever the threshold
    let status = if order.is_some() && score >= threshold {
        MatchStatus::Matched
    } else {
        MatchStatus::Unmatched
    };

    // Order fields carry the winning pair only when it cleared the
    // threshold; the unmatched report never shows order-side columns.
    let (order_code, order_name) = match (status, order) {
        (MatchStatus::Matched, Some((code, name))) => (code.to_string(), name.to_string()),
        _ => (String::new(), String::new()),
    };

    let confidence = match status {
        MatchStatus::Matched => match_label(score),
        MatchStatus::Unmatched => non_match_label(100.0 - score),
    };

    MatchResult {
        invoice_code: invoice.code.clone(),
        invoice_name: invoice.name.clone(),
        order_code,
        order_name,
        score,
        status,
        confidence,
        learned,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConfidenceLabel;

    fn rec(code: &str, name: &str) -> ItemRecord {
        ItemRecord::new(code, name)
    }

    fn config() -> MatchConfig {
        MatchConfig::default()
    }

    #[test]
    fn best_candidate_wins() {
        let orders = vec![rec("A100", "Widget Blue"), rec("B200", "Widget Red")];
        let invoices = vec![rec("A100", "Widget Bleu")];

        let results = match_documents(&config(), &TemplateSet::new(), None, &orders, &invoices);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.order_code, "A100");
        assert_eq!(r.status, MatchStatus::Matched);
        assert!(r.score >= 90.0);
        assert_eq!(r.confidence, ConfidenceLabel::Excellent);
    }

    #[test]
    fn one_result_per_invoice_record() {
        let orders = vec![rec("A100", "Widget"), rec("B200", "Gasket")];
        let invoices = vec![rec("A100", "Widget"), rec("B200", "Gasket"), rec("Z9", "Unknown")];

        let results = match_documents(&config(), &TemplateSet::new(), None, &orders, &invoices);
        assert_eq!(results.len(), invoices.len());
    }

    #[test]
    fn tie_keeps_first_order_record() {
        // identical candidates; the earlier one must win deterministically
        let orders = vec![rec("A100", "Widget"), rec("A100", "Widget")];
        let invoices = vec![rec("A100", "Widget")];

        let results = match_documents(&config(), &TemplateSet::new(), None, &orders, &invoices);
        assert_eq!(results[0].order_code, "A100");
        assert_eq!(results[0].score, 100.0);
        // both candidates are equal, so this only checks the scan is stable:
        // the winning index is 0 (fields are identical either way, but the
        // strictly-greater comparison cannot pick index 1)
    }

    #[test]
    fn empty_order_document_leaves_all_unmatched() {
        let invoices = vec![rec("A100", "Widget"), rec("B200", "Gasket")];

        let results = match_documents(&config(), &TemplateSet::new(), None, &[], &invoices);
        assert_eq!(results.len(), 2);
        for r in &results {
            assert_eq!(r.status, MatchStatus::Unmatched);
            assert_eq!(r.score, 0.0);
            assert!(r.order_code.is_empty() && r.order_name.is_empty());
            assert_eq!(r.confidence, ConfidenceLabel::LikelyDifferentItem);
        }
    }

    #[test]
    fn threshold_boundary_is_closed() {
        let mut cfg = config();
        cfg.w_code = 1.0;

        let orders = vec![rec("A100", "")];
        let invoices = vec![rec("A100", "")];

        cfg.threshold = 100.0;
        let results = match_documents(&cfg, &TemplateSet::new(), None, &orders, &invoices);
        assert_eq!(results[0].status, MatchStatus::Matched);
    }

    #[test]
    fn below_threshold_is_unmatched_with_empty_order_fields() {
        let mut cfg = config();
        cfg.threshold = 99.0;

        let orders = vec![rec("A100", "Widget Blue")];
        let invoices = vec![rec("A100", "Widget Bleu")];

        let results = match_documents(&cfg, &TemplateSet::new(), None, &orders, &invoices);
        let r = &results[0];
        assert_eq!(r.status, MatchStatus::Unmatched);
        assert!(r.score > 90.0); // the candidate was close, just under threshold
        assert!(r.order_code.is_empty());
        assert_eq!(r.confidence, ConfidenceLabel::SuspiciousNonMatch);
    }

    #[test]
    fn supplier_template_applies_to_codes() {
        let mut templates = TemplateSet::new();
        templates.insert(
            "Acme",
            crate::normalize::SupplierTemplate::compile("Acme", Some("^XYZ"), None).unwrap(),
        );
        let mut cfg = config();
        cfg.supplier = Some("Acme".into());
        cfg.w_code = 1.0;

        let orders = vec![rec("123", "")];
        let invoices = vec![rec("XYZ00123", "")];

        let results = match_documents(&cfg, &templates, None, &orders, &invoices);
        assert_eq!(results[0].status, MatchStatus::Matched);
        assert_eq!(results[0].score, 100.0);
    }

    #[test]
    fn cache_hit_bypasses_scoring() {
        let mut cache = LearnedMatches::new();
        cache.insert(
            "INV-77",
            LearnedMatch {
                order_code: "ORD-77".into(),
                order_name: "Bolt M8".into(),
                score: 98.5,
            },
        );

        // order document does not even contain the remembered pair
        let orders = vec![rec("A100", "Widget")];
        let invoices = vec![rec("INV-77", "Bolt M-8")];

        let results = match_documents(&config(), &TemplateSet::new(), Some(&cache), &orders, &invoices);
        let r = &results[0];
        assert!(r.learned);
        assert_eq!(r.order_code, "ORD-77");
        assert_eq!(r.score, 98.5);
        assert_eq!(r.status, MatchStatus::Matched);
        assert_eq!(r.confidence, ConfidenceLabel::Excellent);
    }

    #[test]
    fn cache_miss_scores_normally() {
        let cache = LearnedMatches::new();
        let orders = vec![rec("A100", "Widget")];
        let invoices = vec![rec("A100", "Widget")];

        let results = match_documents(&config(), &TemplateSet::new(), Some(&cache), &orders, &invoices);
        assert!(!results[0].learned);
        assert_eq!(results[0].score, 100.0);
    }
}
