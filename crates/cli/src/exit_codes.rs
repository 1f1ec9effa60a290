//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of
//! the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 1       | Universal | General error (unspecified)              |
//! | 2       | Universal | CLI usage error (bad args, missing file) |
//! | 3-9     | match     | Matching-run codes                       |
//! | 10-19   | store     | Template / learned-match store codes     |

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Match (3-9)
// =============================================================================

/// The run completed but left invoice lines unmatched.
/// Like `diff(1)`, a nonzero exit means "the sides differ."
pub const EXIT_MATCH_UNMATCHED: u8 = 3;

/// Config file rejected (parse or validation failure, bad supplier regex).
pub const EXIT_MATCH_INVALID_CONFIG: u8 = 4;

/// An input document could not be parsed or yielded no usable records.
pub const EXIT_MATCH_PARSE: u8 = 5;

// =============================================================================
// Store (10-19)
// =============================================================================

/// Template / learned-match store failure (open, read, write).
pub const EXIT_STORE: u8 = 10;
