//! `linematch-store` — SQLite persistence for supplier normalization
//! templates and learned matches.
//!
//! The engine never touches this crate: callers load immutable
//! [`TemplateSet`] / [`LearnedMatches`] snapshots here and pass them in.

use std::path::Path;

use rusqlite::{params, Connection};

use linematch_engine::matcher::{LearnedMatch, LearnedMatches};
use linematch_engine::model::MatchedRow;
use linematch_engine::normalize::{SupplierTemplate, TemplateSet};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS supplier_templates (
    supplier_name TEXT PRIMARY KEY,
    remove_prefix TEXT,
    remove_suffix TEXT
);

CREATE TABLE IF NOT EXISTS learned_matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    supplier_name TEXT,
    invoice_code TEXT,
    order_code TEXT,
    invoice_name TEXT,
    order_name TEXT,
    score REAL,
    timestamp TEXT
);
"#;

/// A supplier template row as stored, regexes uncompiled.
#[derive(Debug, Clone)]
pub struct TemplateRow {
    pub supplier: String,
    pub remove_prefix: Option<String>,
    pub remove_suffix: Option<String>,
}

/// A learned match row as stored.
#[derive(Debug, Clone)]
pub struct LearnedRow {
    pub supplier: String,
    pub invoice_code: String,
    pub order_code: String,
    pub invoice_name: String,
    pub order_name: String,
    pub score: f64,
    pub timestamp: String,
}

pub struct MatchStore {
    conn: Connection,
}

impl MatchStore {
    pub fn open(path: &Path) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| e.to_string())?;
        conn.execute_batch(SCHEMA).map_err(|e| e.to_string())?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory().map_err(|e| e.to_string())?;
        conn.execute_batch(SCHEMA).map_err(|e| e.to_string())?;
        Ok(Self { conn })
    }

    // -----------------------------------------------------------------------
    // Supplier templates
    // -----------------------------------------------------------------------

    /// Insert or replace a supplier template. Patterns are compiled first
    /// so an invalid regex never reaches the table.
    pub fn set_template(
        &self,
        supplier: &str,
        remove_prefix: Option<&str>,
        remove_suffix: Option<&str>,
    ) -> Result<(), String> {
        SupplierTemplate::compile(supplier, remove_prefix, remove_suffix)
            .map_err(|e| e.to_string())?;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO supplier_templates (supplier_name, remove_prefix, remove_suffix)
                 VALUES (?1, ?2, ?3)",
                params![supplier.trim(), remove_prefix, remove_suffix],
            )
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn remove_template(&self, supplier: &str) -> Result<bool, String> {
        let n = self
            .conn
            .execute(
                "DELETE FROM supplier_templates WHERE supplier_name = ?1",
                params![supplier.trim()],
            )
            .map_err(|e| e.to_string())?;
        Ok(n > 0)
    }

    pub fn list_templates(&self) -> Result<Vec<TemplateRow>, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT supplier_name, remove_prefix, remove_suffix
                 FROM supplier_templates ORDER BY supplier_name",
            )
            .map_err(|e| e.to_string())?;

        let rows = stmt
            .query_map([], |row| {
                Ok(TemplateRow {
                    supplier: row.get(0)?,
                    remove_prefix: row.get(1)?,
                    remove_suffix: row.get(2)?,
                })
            })
            .map_err(|e| e.to_string())?;

        rows.collect::<Result<Vec<_>, _>>().map_err(|e| e.to_string())
    }

    /// Compile every stored template into an immutable per-run snapshot.
    /// A row that no longer compiles surfaces as a configuration error
    /// before any matching work.
    pub fn template_set(&self) -> Result<TemplateSet, String> {
        let mut set = TemplateSet::new();
        for row in self.list_templates()? {
            let template = SupplierTemplate::compile(
                &row.supplier,
                row.remove_prefix.as_deref(),
                row.remove_suffix.as_deref(),
            )
            .map_err(|e| e.to_string())?;
            set.insert(&row.supplier, template);
        }
        Ok(set)
    }

    // -----------------------------------------------------------------------
    // Learned matches
    // -----------------------------------------------------------------------

    /// Record an accepted pair, mirroring the matched-table row.
    pub fn record_learned(&self, supplier: &str, row: &MatchedRow) -> Result<(), String> {
        self.conn
            .execute(
                "INSERT INTO learned_matches
                 (supplier_name, invoice_code, order_code, invoice_name, order_name, score, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    supplier.trim(),
                    row.invoice_code,
                    row.order_code,
                    row.invoice_name,
                    row.order_name,
                    row.score,
                    chrono::Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Load the learned-match snapshot for one supplier (or all suppliers
    /// when none is given). Where an invoice code was recorded more than
    /// once the most recent row wins.
    pub fn learned_matches(&self, supplier: Option<&str>) -> Result<LearnedMatches, String> {
        let mut cache = LearnedMatches::new();

        let mut load = |sql: &str, args: &[&dyn rusqlite::ToSql]| -> Result<(), String> {
            let mut stmt = self.conn.prepare(sql).map_err(|e| e.to_string())?;
            let rows = stmt
                .query_map(args, |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        LearnedMatch {
                            order_code: row.get(1)?,
                            order_name: row.get(2)?,
                            score: row.get(3)?,
                        },
                    ))
                })
                .map_err(|e| e.to_string())?;
            for row in rows {
                let (invoice_code, learned) = row.map_err(|e| e.to_string())?;
                cache.insert(&invoice_code, learned);
            }
            Ok(())
        };

        match supplier {
            Some(s) => load(
                "SELECT invoice_code, order_code, order_name, score
                 FROM learned_matches WHERE supplier_name = ?1 ORDER BY id",
                &[&s.trim()],
            )?,
            None => load(
                "SELECT invoice_code, order_code, order_name, score
                 FROM learned_matches ORDER BY id",
                &[],
            )?,
        }

        Ok(cache)
    }

    pub fn list_learned(&self, supplier: Option<&str>) -> Result<Vec<LearnedRow>, String> {
        let sql = match supplier {
            Some(_) => {
                "SELECT supplier_name, invoice_code, order_code, invoice_name, order_name, score, timestamp
                 FROM learned_matches WHERE supplier_name = ?1 ORDER BY id"
            }
            None => {
                "SELECT supplier_name, invoice_code, order_code, invoice_name, order_name, score, timestamp
                 FROM learned_matches ORDER BY id"
            }
        };

        let mut stmt = self.conn.prepare(sql).map_err(|e| e.to_string())?;
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok(LearnedRow {
                supplier: row.get(0)?,
                invoice_code: row.get(1)?,
                order_code: row.get(2)?,
                invoice_name: row.get(3)?,
                order_name: row.get(4)?,
                score: row.get(5)?,
                timestamp: row.get(6)?,
            })
        };

        let rows = match supplier {
            Some(s) => stmt.query_map(params![s.trim()], map_row),
            None => stmt.query_map([], map_row),
        }
        .map_err(|e| e.to_string())?;

        rows.collect::<Result<Vec<_>, _>>().map_err(|e| e.to_string())
    }

    pub fn clear_learned(&self, supplier: Option<&str>) -> Result<usize, String> {
        let n = match supplier {
            Some(s) => self.conn.execute(
                "DELETE FROM learned_matches WHERE supplier_name = ?1",
                params![s.trim()],
            ),
            None => self.conn.execute("DELETE FROM learned_matches", []),
        }
        .map_err(|e| e.to_string())?;
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use linematch_engine::model::ConfidenceLabel;
    use linematch_engine::normalize::normalize_code;

    fn matched_row(invoice_code: &str, order_code: &str, score: f64) -> MatchedRow {
        MatchedRow {
            invoice_code: invoice_code.into(),
            invoice_name: "Widget".into(),
            order_code: order_code.into(),
            order_name: "Widget".into(),
            score,
            confidence: ConfidenceLabel::Excellent,
        }
    }

    #[test]
    fn templates_round_trip_and_compile() {
        let store = MatchStore::open_in_memory().unwrap();
        store.set_template("XYZ Metals", Some("^XYZ"), None).unwrap();

        let listed = store.list_templates().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].supplier, "XYZ Metals");
        assert_eq!(listed[0].remove_prefix.as_deref(), Some("^XYZ"));

        let set = store.template_set().unwrap();
        assert_eq!(normalize_code(&set.apply(Some("XYZ Metals"), "XYZ00123")), "123");
    }

    #[test]
    fn invalid_template_regex_is_rejected_up_front() {
        let store = MatchStore::open_in_memory().unwrap();
        assert!(store.set_template("Bad", Some("("), None).is_err());
        assert!(store.list_templates().unwrap().is_empty());
    }

    #[test]
    fn set_template_replaces_existing() {
        let store = MatchStore::open_in_memory().unwrap();
        store.set_template("Acme", Some("^A"), None).unwrap();
        store.set_template("Acme", Some("^AC"), Some("-X$")).unwrap();

        let listed = store.list_templates().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].remove_prefix.as_deref(), Some("^AC"));
        assert_eq!(listed[0].remove_suffix.as_deref(), Some("-X$"));
    }

    #[test]
    fn remove_template_reports_presence() {
        let store = MatchStore::open_in_memory().unwrap();
        store.set_template("Acme", Some("^A"), None).unwrap();
        assert!(store.remove_template("Acme").unwrap());
        assert!(!store.remove_template("Acme").unwrap());
    }

    #[test]
    fn learned_matches_round_trip() {
        let store = MatchStore::open_in_memory().unwrap();
        store.record_learned("Acme", &matched_row("INV-1", "ORD-1", 98.5)).unwrap();
        store.record_learned("Other", &matched_row("INV-2", "ORD-2", 97.0)).unwrap();

        let acme = store.learned_matches(Some("Acme")).unwrap();
        assert_eq!(acme.len(), 1);
        let hit = acme.get("INV-1").unwrap();
        assert_eq!(hit.order_code, "ORD-1");
        assert_eq!(hit.score, 98.5);
        assert!(acme.get("INV-2").is_none());

        let all = store.learned_matches(None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn latest_learned_row_wins() {
        let store = MatchStore::open_in_memory().unwrap();
        store.record_learned("Acme", &matched_row("INV-1", "ORD-OLD", 97.0)).unwrap();
        store.record_learned("Acme", &matched_row("INV-1", "ORD-NEW", 99.0)).unwrap();

        let cache = store.learned_matches(Some("Acme")).unwrap();
        assert_eq!(cache.get("INV-1").unwrap().order_code, "ORD-NEW");
    }

    #[test]
    fn clear_learned_by_supplier() {
        let store = MatchStore::open_in_memory().unwrap();
        store.record_learned("Acme", &matched_row("INV-1", "ORD-1", 97.0)).unwrap();
        store.record_learned("Other", &matched_row("INV-2", "ORD-2", 97.0)).unwrap();

        assert_eq!(store.clear_learned(Some("Acme")).unwrap(), 1);
        assert_eq!(store.list_learned(None).unwrap().len(), 1);
        assert_eq!(store.clear_learned(None).unwrap(), 1);
    }

    #[test]
    fn store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learning.db");

        {
            let store = MatchStore::open(&path).unwrap();
            store.set_template("Acme", Some("^AC"), None).unwrap();
        }

        let store = MatchStore::open(&path).unwrap();
        assert_eq!(store.list_templates().unwrap().len(), 1);
    }
}
