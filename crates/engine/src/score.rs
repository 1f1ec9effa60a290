use rapidfuzz::fuzz;

use crate::config::NameScorer;

/// Indel-based similarity ratio scaled to [0, 100].
///
/// Symmetric; `similarity(s, s) == 100` for any `s` including the empty
/// string, and `similarity(a, "") == 0` for non-empty `a`.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    fuzz::ratio(a.chars(), b.chars())
}

/// Best-alignment substring ratio: the shorter string scored against the
/// best-matching window of the longer one. Rates a name highly when one
/// side embeds the other plus extra words.
pub fn partial_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    fuzz::partial_ratio(a.chars(), b.chars())
}

fn name_similarity(a: &str, b: &str, scorer: NameScorer) -> f64 {
    match scorer {
        NameScorer::Ratio => similarity(a, b),
        NameScorer::Partial => partial_similarity(a, b),
    }
}

/// Weighted blend of code and name similarity over already-normalized
/// strings: `w_code * sim_code + (1 - w_code) * sim_name`.
///
/// Fallbacks, applied uniformly across a run: when either name is empty
/// the score is code-only; when both codes are empty it is name-only;
/// when nothing comparable remains on either axis the score is 0.
pub fn combined_score(
    code_a: &str,
    code_b: &str,
    name_a: &str,
    name_b: &str,
    w_code: f64,
    scorer: NameScorer,
) -> f64 {
    let codes_comparable = !code_a.is_empty() || !code_b.is_empty();
    let names_comparable = !name_a.is_empty() && !name_b.is_empty();

    match (codes_comparable, names_comparable) {
        (true, true) => {
            w_code * similarity(code_a, code_b)
                + (1.0 - w_code) * name_similarity(name_a, name_b, scorer)
        }
        (true, false) => similarity(code_a, code_b),
        (false, true) => name_similarity(name_a, name_b, scorer),
        (false, false) => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
