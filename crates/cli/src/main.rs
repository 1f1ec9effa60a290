// LineMatch CLI - order/invoice line matching, headless

mod exit_codes;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use linematch_engine::config::{MatchConfig, NameScorer};
use linematch_engine::model::ConfidenceLabel;
use linematch_engine::normalize::TemplateSet;
use linematch_engine::MatchError;
use linematch_store::MatchStore;

use exit_codes::{
    EXIT_ERROR, EXIT_MATCH_INVALID_CONFIG, EXIT_MATCH_PARSE, EXIT_MATCH_UNMATCHED, EXIT_STORE,
    EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "lmatch")]
#[command(about = "Fuzzy order/invoice line matching (headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Match an invoice document against an order document
    #[command(after_help = "\
Examples:
  lmatch match order.csv invoice.csv
  lmatch match order.xml invoice.xlsx --threshold 85 --w-code 0.7
  lmatch match order.csv invoice.csv --supplier 'XYZ Metals' --learn
  lmatch match order.csv invoice.csv --output report.xlsx
  lmatch match order.csv invoice.csv --json > report.json")]
    Match {
        /// Purchase-order document (csv, txt, xml, xlsx, xls, xlsb, ods)
        order: PathBuf,

        /// Supplier-invoice document (same formats)
        invoice: PathBuf,

        /// TOML config file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Minimum combined score for a match, 0-100
        #[arg(long)]
        threshold: Option<f64>,

        /// Weight on code similarity, 0-1 (name weight is the rest)
        #[arg(long)]
        w_code: Option<f64>,

        /// Supplier name, selects a normalization template from the store
        #[arg(long)]
        supplier: Option<String>,

        /// Scorer for name comparison
        #[arg(long, value_enum)]
        name_scorer: Option<NameScorerArg>,

        /// Extraction cap per document
        #[arg(long)]
        record_cap: Option<usize>,

        /// Write the report to a file (.xlsx, .csv or .json by extension)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the full report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Template / learned-match store
        #[arg(long, default_value = "linematch.db")]
        store: PathBuf,

        /// Record Excellent matches into the learned store after the run
        #[arg(long)]
        learn: bool,

        /// Consult the learned store before scoring
        #[arg(long)]
        use_learned: bool,
    },

    /// Extract and print the records a document would contribute
    #[command(after_help = "\
Examples:
  lmatch extract invoice.xml
  lmatch extract order.csv --json")]
    Extract {
        /// Document to extract from
        file: PathBuf,

        /// TOML config file (record cap, token pattern)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print records as JSON instead of tab-separated lines
        #[arg(long)]
        json: bool,
    },

    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  lmatch validate matching.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },

    /// Manage supplier normalization templates
    Templates {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Manage learned matches
    Learned {
        #[command(subcommand)]
        command: LearnedCommands,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List stored templates
    List {
        #[arg(long, default_value = "linematch.db")]
        store: PathBuf,
    },
    /// Insert or replace a template
    #[command(after_help = "\
Examples:
  lmatch templates set 'XYZ Metals' --prefix '^XYZ'
  lmatch templates set Acme --prefix 'ACME-' --suffix '-EOL'")]
    Set {
        /// Supplier name the template is keyed by
        supplier: String,

        /// Regex removed from the start of raw codes
        #[arg(long)]
        prefix: Option<String>,

        /// Regex removed from the end of raw codes
        #[arg(long)]
        suffix: Option<String>,

        #[arg(long, default_value = "linematch.db")]
        store: PathBuf,
    },
    /// Remove a template
    Remove {
        supplier: String,

        #[arg(long, default_value = "linematch.db")]
        store: PathBuf,
    },
}

#[derive(Subcommand)]
enum LearnedCommands {
    /// List learned matches
    List {
        /// Restrict to one supplier
        #[arg(long)]
        supplier: Option<String>,

        #[arg(long, default_value = "linematch.db")]
        store: PathBuf,
    },
    /// Delete learned matches
    Clear {
        /// Restrict to one supplier
        #[arg(long)]
        supplier: Option<String>,

        #[arg(long, default_value = "linematch.db")]
        store: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NameScorerArg {
    Ratio,
    Partial,
}

impl From<NameScorerArg> for NameScorer {
    fn from(arg: NameScorerArg) -> Self {
        match arg {
            NameScorerArg::Ratio => NameScorer::Ratio,
            NameScorerArg::Partial => NameScorer::Partial,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: lmatch <command> [options]");
            eprintln!("       lmatch --help for more information");
            Ok(())
        }
        Some(Commands::Match {
            order,
            invoice,
            config,
            threshold,
            w_code,
            supplier,
            name_scorer,
            record_cap,
            output,
            json,
            store,
            learn,
            use_learned,
        }) => cmd_match(MatchArgs {
            order,
            invoice,
            config,
            threshold,
            w_code,
            supplier,
            name_scorer,
            record_cap,
            output,
            json,
            store,
            learn,
            use_learned,
        }),
        Some(Commands::Extract { file, config, json }) => cmd_extract(file, config, json),
        Some(Commands::Validate { config }) => cmd_validate(config),
        Some(Commands::Templates { command }) => match command {
            TemplateCommands::List { store } => cmd_templates_list(store),
            TemplateCommands::Set { supplier, prefix, suffix, store } => {
                cmd_templates_set(supplier, prefix, suffix, store)
            }
            TemplateCommands::Remove { supplier, store } => cmd_templates_remove(supplier, store),
        },
        Some(Commands::Learned { command }) => match command {
            LearnedCommands::List { supplier, store } => cmd_learned_list(supplier, store),
            LearnedCommands::Clear { supplier, store } => cmd_learned_clear(supplier, store),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_MATCH_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_MATCH_PARSE, message: msg.into(), hint: None }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self { code: EXIT_STORE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ---------------------------------------------------------------------------
// match
// ---------------------------------------------------------------------------

struct MatchArgs {
    order: PathBuf,
    invoice: PathBuf,
    config: Option<PathBuf>,
    threshold: Option<f64>,
    w_code: Option<f64>,
    supplier: Option<String>,
    name_scorer: Option<NameScorerArg>,
    record_cap: Option<usize>,
    output: Option<PathBuf>,
    json: bool,
    store: PathBuf,
    learn: bool,
    use_learned: bool,
}

/// Build the run config: TOML file first (if any), then flag overrides,
/// then one validation pass before any document is touched.
fn build_config(args: &MatchArgs) -> Result<MatchConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| CliError::config(format!("cannot read {}: {e}", path.display())))?;
            MatchConfig::from_toml(&raw).map_err(|e| CliError::config(e.to_string()))?
        }
        None => MatchConfig::default(),
    };

    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(w_code) = args.w_code {
        config.w_code = w_code;
    }
    if let Some(supplier) = &args.supplier {
        config.supplier = Some(supplier.clone());
    }
    if let Some(scorer) = args.name_scorer {
        config.name_scorer = scorer.into();
    }
    if let Some(cap) = args.record_cap {
        config.record_cap = cap;
    }

    config.validate().map_err(|e| CliError::config(e.to_string()))?;
    Ok(config)
}

fn cmd_match(args: MatchArgs) -> Result<(), CliError> {
    let config = build_config(&args)?;

    // The store is only opened when something actually needs it, so a
    // plain run never creates a database file
    let needs_store = config.supplier.is_some() || args.learn || args.use_learned;
    let store = if needs_store {
        Some(MatchStore::open(&args.store).map_err(CliError::store)?)
    } else {
        None
    };

    let templates = match (&store, &config.supplier) {
        (Some(store), Some(_)) => store.template_set().map_err(CliError::config)?,
        _ => TemplateSet::new(),
    };

    let cache = match (&store, args.use_learned) {
        (Some(store), true) => {
            Some(store.learned_matches(config.supplier.as_deref()).map_err(CliError::store)?)
        }
        _ => None,
    };

    let orders = linematch_io::load_records(&args.order, &config)
        .map_err(|e| CliError::parse(format!("order file {}: {e}", args.order.display())))?;
    let invoices = linematch_io::load_records(&args.invoice, &config)
        .map_err(|e| CliError::parse(format!("invoice file {}: {e}", args.invoice.display())))?;

    let report = linematch_engine::run(&config, &templates, cache.as_ref(), &orders, &invoices)
        .map_err(|e| match e {
            MatchError::ConfigParse(_) | MatchError::ConfigValidation(_)
            | MatchError::TemplateRegex { .. } => CliError::config(e.to_string()),
            MatchError::EmptyTable => CliError::parse(e.to_string()),
        })?;

    // Remember accepted pairs (the original tool's >= 97 auto-save rule:
    // exactly the Excellent tier, judged on the raw score)
    if args.learn {
        if let Some(store) = &store {
            let supplier = config.supplier.as_deref().unwrap_or("");
            let mut recorded = 0;
            for row in &report.matched {
                if row.confidence == ConfidenceLabel::Excellent {
                    store.record_learned(supplier, row).map_err(CliError::store)?;
                    recorded += 1;
                }
            }
            if recorded > 0 {
                eprintln!("learned {} match(es)", recorded);
            }
        }
    }

    if let Some(path) = &args.output {
        write_output(&report, path)?;
    }

    if args.json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &report.summary;
    let learned_note = if s.learned_hits > 0 {
        format!(", {} from learned cache", s.learned_hits)
    } else {
        String::new()
    };
    eprintln!(
        "{} invoice line(s) vs {} order line(s) — {} matched, {} unmatched{}",
        s.invoice_records, s.order_records, s.matched, s.unmatched, learned_note,
    );

    if s.unmatched > 0 {
        return Err(CliError {
            code: EXIT_MATCH_UNMATCHED,
            message: format!("{} invoice line(s) left unmatched", s.unmatched),
            hint: None,
        });
    }

    Ok(())
}

/// Dispatch report serialization on the output extension.
fn write_output(report: &linematch_engine::MatchReport, path: &Path) -> Result<(), CliError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xlsx" => {
            linematch_io::xlsx::export_report(report, path).map_err(CliError::general)?;
            eprintln!("wrote {}", path.display());
        }
        "csv" => {
            linematch_io::csv::export_matched(report, path).map_err(CliError::general)?;
            eprintln!("wrote {}", path.display());
            let unmatched_path = path.with_extension("unmatched.csv");
            linematch_io::csv::export_unmatched(report, &unmatched_path)
                .map_err(CliError::general)?;
            eprintln!("wrote {}", unmatched_path.display());
        }
        "json" => {
            let json_str = serde_json::to_string_pretty(report)
                .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
            fs::write(path, &json_str)
                .map_err(|e| CliError::general(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        other => {
            return Err(CliError::args(format!("unsupported output format: \"{other}\""))
                .with_hint("use a .xlsx, .csv or .json output path"));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// extract / validate
// ---------------------------------------------------------------------------

fn cmd_extract(file: PathBuf, config: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = match config {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .map_err(|e| CliError::config(format!("cannot read {}: {e}", path.display())))?;
            MatchConfig::from_toml(&raw).map_err(|e| CliError::config(e.to_string()))?
        }
        None => MatchConfig::default(),
    };

    let records = linematch_io::load_records(&file, &config)
        .map_err(|e| CliError::parse(format!("{}: {e}", file.display())))?;

    if json {
        let json_str = serde_json::to_string_pretty(&records)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for record in &records {
            println!("{}\t{}", record.code, record.name);
        }
    }

    eprintln!("{} record(s) extracted from {}", records.len(), file.display());
    Ok(())
}

fn cmd_validate(config: PathBuf) -> Result<(), CliError> {
    let raw = fs::read_to_string(&config)
        .map_err(|e| CliError::config(format!("cannot read {}: {e}", config.display())))?;
    let parsed = MatchConfig::from_toml(&raw).map_err(|e| CliError::config(e.to_string()))?;

    eprintln!(
        "config OK: threshold={}, w_code={}, record_cap={}, supplier={}",
        parsed.threshold,
        parsed.w_code,
        parsed.record_cap,
        parsed.supplier.as_deref().unwrap_or("(none)"),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// templates / learned
// ---------------------------------------------------------------------------

fn cmd_templates_list(store: PathBuf) -> Result<(), CliError> {
    let store = MatchStore::open(&store).map_err(CliError::store)?;
    let templates = store.list_templates().map_err(CliError::store)?;

    if templates.is_empty() {
        eprintln!("no templates stored");
        return Ok(());
    }

    for t in templates {
        println!(
            "{}\tprefix={}\tsuffix={}",
            t.supplier,
            t.remove_prefix.as_deref().unwrap_or("-"),
            t.remove_suffix.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn cmd_templates_set(
    supplier: String,
    prefix: Option<String>,
    suffix: Option<String>,
    store: PathBuf,
) -> Result<(), CliError> {
    if prefix.is_none() && suffix.is_none() {
        return Err(CliError::args("nothing to set")
            .with_hint("pass --prefix and/or --suffix"));
    }

    let store = MatchStore::open(&store).map_err(CliError::store)?;
    store
        .set_template(&supplier, prefix.as_deref(), suffix.as_deref())
        .map_err(CliError::store)?;
    eprintln!("template stored for '{}'", supplier.trim());
    Ok(())
}

fn cmd_templates_remove(supplier: String, store: PathBuf) -> Result<(), CliError> {
    let store = MatchStore::open(&store).map_err(CliError::store)?;
    if store.remove_template(&supplier).map_err(CliError::store)? {
        eprintln!("template removed for '{}'", supplier.trim());
        Ok(())
    } else {
        Err(CliError::store(format!("no template stored for '{}'", supplier.trim())))
    }
}

fn cmd_learned_list(supplier: Option<String>, store: PathBuf) -> Result<(), CliError> {
    let store = MatchStore::open(&store).map_err(CliError::store)?;
    let rows = store.list_learned(supplier.as_deref()).map_err(CliError::store)?;

    if rows.is_empty() {
        eprintln!("no learned matches");
        return Ok(());
    }

    for r in rows {
        println!(
            "{}\t{} -> {}\t{:.1}\t{}",
            r.supplier, r.invoice_code, r.order_code, r.score, r.timestamp,
        );
    }
    Ok(())
}

fn cmd_learned_clear(supplier: Option<String>, store: PathBuf) -> Result<(), CliError> {
    let store = MatchStore::open(&store).map_err(CliError::store)?;
    let n = store.clear_learned(supplier.as_deref()).map_err(CliError::store)?;
    eprintln!("removed {} learned match(es)", n);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn args(order: &str, invoice: &str) -> MatchArgs {
        MatchArgs {
            order: PathBuf::from(order),
            invoice: PathBuf::from(invoice),
            config: None,
            threshold: None,
            w_code: None,
            supplier: None,
            name_scorer: None,
            record_cap: None,
            output: None,
            json: false,
            store: PathBuf::from("linematch.db"),
            learn: false,
            use_learned: false,
        }
    }

    #[test]
    fn flags_override_defaults() {
        let mut a = args("o.csv", "i.csv");
        a.threshold = Some(85.0);
        a.w_code = Some(0.5);
        a.supplier = Some("Acme".into());
        a.name_scorer = Some(NameScorerArg::Partial);

        let config = build_config(&a).unwrap();
        assert_eq!(config.threshold, 85.0);
        assert_eq!(config.w_code, 0.5);
        assert_eq!(config.supplier.as_deref(), Some("Acme"));
        assert_eq!(config.name_scorer, NameScorer::Partial);
    }

    #[test]
    fn out_of_range_flag_is_a_config_error() {
        let mut a = args("o.csv", "i.csv");
        a.w_code = Some(1.5);
        let err = build_config(&a).unwrap_err();
        assert_eq!(err.code, EXIT_MATCH_INVALID_CONFIG);
    }

    #[test]
    fn flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matching.toml");
        fs::write(&path, "threshold = 80.0\nw_code = 0.6\n").unwrap();

        let mut a = args("o.csv", "i.csv");
        a.config = Some(path);
        a.threshold = Some(95.0);

        let config = build_config(&a).unwrap();
        assert_eq!(config.threshold, 95.0); // flag wins
        assert_eq!(config.w_code, 0.6); // file value kept
    }
}
