//! Validation engine: pure scoring and gating rules.
//!
//! Nothing here touches storage, so every rule can be tested on its own.

use crate::domain::{Actor, Role, ValidationCriteria};
use crate::error::{EvidenceError, Result};

/// Lowest accepted rubric score
pub const MIN_SCORE: u8 = 1;

/// Highest accepted rubric score
pub const MAX_SCORE: u8 = 10;

/// Rounded arithmetic mean of the four criteria.
///
/// Halves round up (`round(6.5) == 7`). Any criterion outside
/// `MIN_SCORE..=MAX_SCORE` is rejected rather than clamped.
pub fn compute_overall_score(criteria: &ValidationCriteria) -> Result<u8> {
    let mut sum: u32 = 0;
    for (name, score) in criteria.scores() {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(EvidenceError::Validation(format!(
                "{} score must be between {} and {}, got {}",
                name, MIN_SCORE, MAX_SCORE, score
            )));
        }
        sum += u32::from(score);
    }

    // Four scores in 1..=10 keep the result in 1..=10
    Ok(((sum + 2) / 4) as u8)
}

/// Drop blank entries and trim the rest, preserving order
pub fn sanitize_list_inputs<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .filter_map(|item| {
            let trimmed = item.as_ref().trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Reject the call unless the actor holds `required`
pub fn require_role(actor: &Actor, required: Role, operation: &'static str) -> Result<()> {
    if actor.role != required {
        return Err(EvidenceError::Forbidden {
            role: actor.role,
            operation,
        });
    }
    Ok(())
}

/// Reject blank text fields
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EvidenceError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_score_rounds_mean() {
        let criteria = ValidationCriteria::new(8, 6, 7, 7);
        assert_eq!(compute_overall_score(&criteria).unwrap(), 7);

        // 26 / 4 = 6.5 rounds up
        let criteria = ValidationCriteria::new(8, 6, 6, 6);
        assert_eq!(compute_overall_score(&criteria).unwrap(), 7);

        // 25 / 4 = 6.25 rounds down
        let criteria = ValidationCriteria::new(7, 6, 6, 6);
        assert_eq!(compute_overall_score(&criteria).unwrap(), 6);

        // 27 / 4 = 6.75 rounds up
        let criteria = ValidationCriteria::new(9, 6, 6, 6);
        assert_eq!(compute_overall_score(&criteria).unwrap(), 7);
    }

    #[test]
    fn test_overall_score_matches_float_rounding_for_whole_domain() {
        for c in MIN_SCORE..=MAX_SCORE {
            for r in MIN_SCORE..=MAX_SCORE {
                for q in MIN_SCORE..=MAX_SCORE {
                    for i in MIN_SCORE..=MAX_SCORE {
                        let criteria = ValidationCriteria::new(c, r, q, i);
                        let expected =
                            ((c as f64 + r as f64 + q as f64 + i as f64) / 4.0).round() as u8;
                        assert_eq!(compute_overall_score(&criteria).unwrap(), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_overall_score_rejects_out_of_range() {
        let result = compute_overall_score(&ValidationCriteria::new(0, 5, 5, 5));
        match result {
            Err(EvidenceError::Validation(msg)) => assert!(msg.contains("completeness")),
            other => panic!("Expected validation error, got {:?}", other),
        }

        let result = compute_overall_score(&ValidationCriteria::new(5, 5, 5, 11));
        match result {
            Err(EvidenceError::Validation(msg)) => assert!(msg.contains("implementation")),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_sanitize_drops_blank_entries() {
        let cleaned = sanitize_list_inputs(vec!["  Update the policy ", "", "   ", "\t\n", "Train staff"]);
        assert_eq!(cleaned, vec!["Update the policy", "Train staff"]);

        let empty: Vec<String> = sanitize_list_inputs(Vec::<String>::new());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_require_role() {
        let department = Actor::department("alice");
        assert!(require_role(&department, Role::Department, "submit evidence").is_ok());

        let result = require_role(&department, Role::Rssi, "validate a version");
        assert_eq!(
            result,
            Err(EvidenceError::Forbidden {
                role: Role::Department,
                operation: "validate a version",
            })
        );
    }
}
