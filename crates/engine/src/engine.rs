use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::matcher::{match_documents, LearnedMatches};
use crate::model::{ItemRecord, MatchReport, RunMeta};
use crate::normalize::TemplateSet;
use crate::report::{build_tables, compute_summary};

/// Run one matching pass: every invoice record against the full order
/// document. Pure — the same inputs always produce the same report rows.
///
/// The config is re-validated here so that a hand-built (non-TOML) config
/// fails before any matching work, per the fail-fast contract.
pub fn run(
    config: &MatchConfig,
    templates: &TemplateSet,
    cache: Option<&LearnedMatches>,
    orders: &[ItemRecord],
    invoices: &[ItemRecord],
) -> Result<MatchReport, MatchError> {
    config.validate()?;

    let results = match_documents(config, templates, cache, orders, invoices);
    let (matched, unmatched) = build_tables(&results);
    let summary = compute_summary(&results, orders.len());

    Ok(MatchReport {
        meta: RunMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            supplier: config.supplier.clone(),
            threshold: config.threshold,
            w_code: config.w_code,
        },
        summary,
        matched,
        unmatched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_validates_config_first() {
        let config = MatchConfig {
            threshold: 250.0,
            ..MatchConfig::default()
        };
        let err = run(&config, &TemplateSet::new(), None, &[], &[]).unwrap_err();
        assert!(matches!(err, MatchError::ConfigValidation(_)));
    }

    #[test]
    fn run_produces_report_with_meta() {
        let orders = vec![ItemRecord::new("A100", "Widget Blue")];
        let invoices = vec![ItemRecord::new("A100", "Widget Bleu")];

        let report = run(&MatchConfig::default(), &TemplateSet::new(), None, &orders, &invoices)
            .unwrap();
        assert_eq!(report.meta.threshold, 90.0);
        assert_eq!(report.summary.invoice_records, 1);
        assert_eq!(report.matched.len(), 1);
        assert!(report.unmatched.is_empty());
    }
}
