use std::fmt;

#[derive(Debug)]
pub enum MatchError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold/weight out of range, bad token band).
    ConfigValidation(String),
    /// A supplier template regex failed to compile.
    TemplateRegex {
        supplier: String,
        pattern: String,
        reason: String,
    },
    /// Structured input with no header row — no code/name field can be located.
    EmptyTable,
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::TemplateRegex { supplier, pattern, reason } => {
                write!(f, "supplier '{supplier}': cannot compile pattern '{pattern}': {reason}")
            }
            Self::EmptyTable => write!(f, "input table has no header row"),
        }
    }
}

impl std::error::Error for MatchError {}
