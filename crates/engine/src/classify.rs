use crate::model::ConfidenceLabel;

/// Confidence bucket for a matched row. Boundaries are closed on the
/// stated value and evaluated on the raw score, never the rounded one.
pub fn match_label(score: f64) -> ConfidenceLabel {
    if score >= 97.0 {
        ConfidenceLabel::Excellent
    } else if score >= 90.0 {
        ConfidenceLabel::VeryGood
    } else if score >= 80.0 {
        ConfidenceLabel::Good
    } else if score >= 65.0 {
        ConfidenceLabel::Weak
    } else {
        ConfidenceLabel::DifferentItem
    }
}

/// Confidence bucket for an unmatched row, from the inverse score
/// `100 - score`. A low non-match percentage means the best candidate was
/// close — suspicious for a supposed non-match.
pub fn non_match_label(non_match: f64) -> ConfidenceLabel {
    if non_match <= 20.0 {
        ConfidenceLabel::SuspiciousNonMatch
    } else if non_match <= 34.0 {
        ConfidenceLabel::ShouldBeChecked
    } else {
        ConfidenceLabel::LikelyDifferentItem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_boundaries_are_closed() {
        assert_eq!(match_label(100.0), ConfidenceLabel::Excellent);
        assert_eq!(match_label(97.0), ConfidenceLabel::Excellent);
        assert_eq!(match_label(96.999), ConfidenceLabel::VeryGood);
        assert_eq!(match_label(90.0), ConfidenceLabel::VeryGood);
        assert_eq!(match_label(89.999), ConfidenceLabel::Good);
        assert_eq!(match_label(80.0), ConfidenceLabel::Good);
        assert_eq!(match_label(65.0), ConfidenceLabel::Weak);
        assert_eq!(match_label(64.999), ConfidenceLabel::DifferentItem);
        assert_eq!(match_label(0.0), ConfidenceLabel::DifferentItem);
    }

    #[test]
    fn non_match_boundaries_are_closed() {
        assert_eq!(non_match_label(0.0), ConfidenceLabel::SuspiciousNonMatch);
        assert_eq!(non_match_label(20.0), ConfidenceLabel::SuspiciousNonMatch);
        assert_eq!(non_match_label(20.001), ConfidenceLabel::ShouldBeChecked);
        assert_eq!(non_match_label(34.0), ConfidenceLabel::ShouldBeChecked);
        assert_eq!(non_match_label(34.001), ConfidenceLabel::LikelyDifferentItem);
        assert_eq!(non_match_label(100.0), ConfidenceLabel::LikelyDifferentItem);
    }
}
