//! Risk assessment derivation.
//!
//! Maps a [`ScanResult`] to a priority tier and urgency window using fixed thresholds:
//!
//! | Condition                              | priority | urgency |
//! |----------------------------------------|----------|---------|
//! | `riskScore >= 85` or MTF suspected     | critical | 4h      |
//! | `riskScore >= 70`                      | high     | 24h     |
//! | `riskScore >= 50`                      | medium   | 48h     |
//! | otherwise                              | low      | 72h     |
//!
//! Recommendations are the scan's own list followed by tier-specific additions. Strings are not
//! deduplicated.

use crate::constants::{
    CRITICAL_RISK_THRESHOLD, CRITICAL_URGENCY_HOURS, HIGH_RISK_THRESHOLD, HIGH_URGENCY_HOURS,
    LOW_URGENCY_HOURS, MEDIUM_RISK_THRESHOLD, MEDIUM_URGENCY_HOURS,
    RECOMMEND_OSTEOPOROSIS_ASSESSMENT, RECOMMEND_SPECIALIST_REVIEW, RECOMMEND_URGENT_FOLLOW_UP,
};
use crate::models::{PatientContext, RiskAssessment, RiskLevel, ScanResult};

/// Derive a [`RiskAssessment`] from a scan result.
///
/// Total over any well-formed `ScanResult`. The patient context is accepted for call-site
/// symmetry with the scan endpoint but does not influence the outcome.
pub fn derive_risk_assessment(
    scan: &ScanResult,
    _patient: Option<&PatientContext>,
) -> RiskAssessment {
    let score = scan.risk_score.value();

    let (priority, estimated_urgency) = if score >= CRITICAL_RISK_THRESHOLD || scan.mtf_suspected
    {
        (RiskLevel::Critical, CRITICAL_URGENCY_HOURS)
    } else if score >= HIGH_RISK_THRESHOLD {
        (RiskLevel::High, HIGH_URGENCY_HOURS)
    } else if score >= MEDIUM_RISK_THRESHOLD {
        (RiskLevel::Medium, MEDIUM_URGENCY_HOURS)
    } else {
        (RiskLevel::Low, LOW_URGENCY_HOURS)
    };

    let mut recommendations = scan.key_findings.recommendations.clone();
    if scan.mtf_suspected {
        recommendations.push(RECOMMEND_SPECIALIST_REVIEW.to_string());
        recommendations.push(RECOMMEND_OSTEOPOROSIS_ASSESSMENT.to_string());
    }
    if scan.is_high_risk() {
        recommendations.push(RECOMMEND_URGENT_FOLLOW_UP.to_string());
    }

    RiskAssessment {
        priority,
        recommendations,
        follow_up_required: scan.key_findings.follow_up_required || scan.mtf_suspected,
        estimated_urgency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KeyFindings;
    use mtf_types::{PatientId, Score};

    fn scan(score: u8, mtf: bool, recommendations: &[&str], follow_up: bool) -> ScanResult {
        ScanResult {
            patient_id: PatientId::new("P-1").unwrap(),
            risk_score: Score::new(score).unwrap(),
            risk_level: RiskLevel::Low,
            key_findings: KeyFindings {
                recommendations: recommendations.iter().map(|s| s.to_string()).collect(),
                follow_up_required: follow_up,
                ..KeyFindings::default()
            },
            mtf_suspected: mtf,
            confidence: Score::clamped(50),
            processing_time: 0,
        }
    }

    #[test]
    fn thresholds_match_table_at_boundaries() {
        let expected = [
            (0, RiskLevel::Low, 72),
            (49, RiskLevel::Low, 72),
            (50, RiskLevel::Medium, 48),
            (69, RiskLevel::Medium, 48),
            (70, RiskLevel::High, 24),
            (84, RiskLevel::High, 24),
            (85, RiskLevel::Critical, 4),
            (100, RiskLevel::Critical, 4),
        ];

        for (score, priority, urgency) in expected {
            let assessment = derive_risk_assessment(&scan(score, false, &[], false), None);
            assert_eq!(assessment.priority, priority, "score {score}");
            assert_eq!(assessment.estimated_urgency, urgency, "score {score}");
        }
    }

    #[test]
    fn mtf_suspicion_forces_critical_below_high_threshold() {
        for score in [0, 30, 49, 50, 69] {
            let assessment = derive_risk_assessment(&scan(score, true, &[], false), None);
            assert_eq!(assessment.priority, RiskLevel::Critical, "score {score}");
            assert_eq!(assessment.estimated_urgency, 4, "score {score}");
        }
    }

    #[test]
    fn recommendations_keep_every_scan_recommendation() {
        let input = ["DEXA scan", "Vitamin D level", "Falls clinic referral"];
        for (score, mtf) in [(10, false), (60, true), (75, false), (95, true)] {
            let assessment = derive_risk_assessment(&scan(score, mtf, &input, false), None);
            for rec in input {
                assert!(
                    assessment.recommendations.iter().any(|r| r == rec),
                    "missing {rec} for score {score}"
                );
            }
            assert_eq!(&assessment.recommendations[..input.len()], &input[..]);
        }
    }

    #[test]
    fn follow_up_is_the_or_of_scan_flag_and_mtf() {
        for (follow_up, mtf) in [(false, false), (true, false), (false, true), (true, true)] {
            let assessment = derive_risk_assessment(&scan(20, mtf, &[], follow_up), None);
            assert_eq!(assessment.follow_up_required, follow_up || mtf);
        }
    }

    #[test]
    fn example_scenario_produces_expected_assessment() {
        let assessment = derive_risk_assessment(&scan(90, true, &["DEXA scan"], false), None);

        assert_eq!(assessment.priority, RiskLevel::Critical);
        assert_eq!(assessment.estimated_urgency, 4);
        assert!(assessment.follow_up_required);
        assert_eq!(
            assessment.recommendations,
            vec![
                "DEXA scan",
                "Immediate specialist review",
                "Osteoporosis assessment",
                "Urgent follow-up required",
            ]
        );
    }

    #[test]
    fn duplicate_recommendations_are_preserved() {
        let assessment = derive_risk_assessment(
            &scan(72, false, &["Urgent follow-up required"], true),
            None,
        );
        assert_eq!(
            assessment.recommendations,
            vec!["Urgent follow-up required", "Urgent follow-up required"]
        );
    }

    #[test]
    fn empty_findings_yield_low_priority_without_additions() {
        let assessment = derive_risk_assessment(&scan(0, false, &[], false), None);
        assert_eq!(assessment.priority, RiskLevel::Low);
        assert!(assessment.recommendations.is_empty());
        assert!(!assessment.follow_up_required);
    }
}
