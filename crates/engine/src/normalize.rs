use std::collections::HashMap;

use regex::Regex;

use crate::error::MatchError;

// ---------------------------------------------------------------------------
// Canonical forms
// ---------------------------------------------------------------------------

/// Canonicalize a product code for comparison: uppercase, alphanumeric
/// characters only, leading zeros stripped. Total — empty in, empty out.
pub fn normalize_code(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect();
    folded.trim_start_matches('0').to_string()
}

/// Canonicalize an item description: lowercase, punctuation replaced by
/// spaces, whitespace runs collapsed, trimmed.
pub fn normalize_name(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Supplier templates
// ---------------------------------------------------------------------------

/// Per-supplier code decoration stripping. Both regexes run against the
/// raw code, before [`normalize_code`] — prefix stripping therefore
/// happens before leading-zero stripping.
#[derive(Debug, Clone)]
pub struct SupplierTemplate {
    remove_prefix: Option<Regex>,
    remove_suffix: Option<Regex>,
}

impl SupplierTemplate {
    /// Compile a template. Patterns are anchored if the author did not
    /// anchor them: prefixes at the start, suffixes at the end.
    pub fn compile(
        supplier: &str,
        remove_prefix: Option<&str>,
        remove_suffix: Option<&str>,
    ) -> Result<Self, MatchError> {
        let compile = |pattern: &str, anchored: String| -> Result<Regex, MatchError> {
            Regex::new(&anchored).map_err(|e| MatchError::TemplateRegex {
                supplier: supplier.to_string(),
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        };

        let remove_prefix = remove_prefix
            .map(|p| {
                let anchored = if p.starts_with('^') { p.to_string() } else { format!("^{p}") };
                compile(p, anchored)
            })
            .transpose()?;

        let remove_suffix = remove_suffix
            .map(|p| {
                let anchored = if p.ends_with('$') { p.to_string() } else { format!("{p}$") };
                compile(p, anchored)
            })
            .transpose()?;

        Ok(Self { remove_prefix, remove_suffix })
    }

    /// Strip the first prefix match, then the first suffix match, from a raw code.
    pub fn apply(&self, code: &str) -> String {
        let mut out = code.to_string();
        if let Some(re) = &self.remove_prefix {
            if let Some(m) = re.find(&out) {
                out = out[m.end()..].to_string();
            }
        }
        if let Some(re) = &self.remove_suffix {
            if let Some(m) = re.find(&out) {
                out = out[..m.start()].to_string();
            }
        }
        out
    }
}

/// Immutable per-run snapshot of supplier templates, keyed by trimmed
/// supplier name. The engine never re-reads the backing store mid-run.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: HashMap<String, SupplierTemplate>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, supplier: &str, template: SupplierTemplate) {
        self.templates.insert(supplier.trim().to_string(), template);
    }

    pub fn get(&self, supplier: &str) -> Option<&SupplierTemplate> {
        self.templates.get(supplier.trim())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Supplier-aware stripping of a raw code. An unknown supplier (or
    /// none at all) is a no-op, never an error.
    pub fn apply(&self, supplier: Option<&str>, code: &str) -> String {
        match supplier.and_then(|s| self.get(s)) {
            Some(template) => template.apply(code),
            None => code.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
