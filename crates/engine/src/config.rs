use serde::Deserialize;

use crate::error::MatchError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Per-run matching configuration. One explicit value object — the engine
/// reads nothing from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    /// Minimum combined score for a Matched classification.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Weight on code similarity; name weight is `1 - w_code`.
    #[serde(default = "default_w_code")]
    pub w_code: f64,
    /// Selects a supplier normalization template, if one exists.
    #[serde(default)]
    pub supplier: Option<String>,
    /// Extraction truncation limit, applied after deduplication.
    #[serde(default = "default_record_cap")]
    pub record_cap: usize,
    /// Scorer used for name comparison.
    #[serde(default)]
    pub name_scorer: NameScorer,
    /// Token shape accepted by unstructured extraction.
    #[serde(default)]
    pub token_pattern: TokenPattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameScorer {
    /// Full-string normalized edit distance.
    #[default]
    Ratio,
    /// Best-window substring ratio, for names where one side embeds the other.
    Partial,
}

/// Length band for code-like tokens in unstructured extraction.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TokenPattern {
    #[serde(default = "default_token_min")]
    pub min_len: usize,
    #[serde(default = "default_token_max")]
    pub max_len: usize,
}

impl Default for TokenPattern {
    fn default() -> Self {
        Self {
            min_len: default_token_min(),
            max_len: default_token_max(),
        }
    }
}

fn default_threshold() -> f64 {
    90.0
}

fn default_w_code() -> f64 {
    0.8
}

fn default_record_cap() -> usize {
    2000
}

fn default_token_min() -> usize {
    3
}

fn default_token_max() -> usize {
    25
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            w_code: default_w_code(),
            supplier: None,
            record_cap: default_record_cap(),
            name_scorer: NameScorer::default(),
            token_pattern: TokenPattern::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatchConfig {
    pub fn from_toml(input: &str) -> Result<Self, MatchError> {
        let config: MatchConfig =
            toml::from_str(input).map_err(|e| MatchError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(MatchError::ConfigValidation(format!(
                "threshold must be within [0, 100], got {}",
                self.threshold
            )));
        }

        if !(0.0..=1.0).contains(&self.w_code) {
            return Err(MatchError::ConfigValidation(format!(
                "w_code must be within [0, 1], got {}",
                self.w_code
            )));
        }

        if self.record_cap == 0 {
            return Err(MatchError::ConfigValidation(
                "record_cap must be at least 1".into(),
            ));
        }

        let band = &self.token_pattern;
        if band.min_len == 0 || band.min_len > band.max_len {
            return Err(MatchError::ConfigValidation(format!(
                "token_pattern band {}..{} is not a valid length range",
                band.min_len, band.max_len
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
