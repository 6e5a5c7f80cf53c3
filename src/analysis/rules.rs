//! Local rule-based stages: sentiment and entities, plus entity validation.
//!
//! Both rules are deliberately simple substring checks over the summary.
//! They are placeholders rather than calibrated models, but their exact
//! behaviour is part of the observable output, so they stay exactly as they
//! are until there is a requirement for something better.

use crate::error::ValidationError;
use crate::state::{Entities, Sentiment};
use once_cell::sync::Lazy;
use regex::Regex;

/// `positive` iff the lowercased summary contains "good", else `neutral`.
pub fn classify_sentiment(summary: &str) -> Sentiment {
    if summary.to_lowercase().contains("good") {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

/// Fixed-literal entity extraction.
///
/// | Slot      | Emitted value  | Condition (case-sensitive)       |
/// |-----------|----------------|----------------------------------|
/// | `names`   | `"Alice"`      | summary contains `"Alice"`       |
/// | `dates`   | `"2025-01-01"` | summary contains `"2025"`        |
/// | `amounts` | `"$1000"`      | summary contains `"$1000"`       |
pub fn extract_entities(summary: &str) -> Entities {
    let when = |needle: &str, value: &str| -> Vec<String> {
        if summary.contains(needle) {
            vec![value.to_string()]
        } else {
            Vec::new()
        }
    };

    Entities {
        names: when("Alice", "Alice"),
        dates: when("2025", "2025-01-01"),
        amounts: when("$1000", "$1000"),
    }
}

static RE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z ]+$").unwrap());
static RE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static RE_AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$\d+$").unwrap());

/// Check every entity against its slot's expected shape.
///
/// One violation is reported per offending slot (the last bad value wins).
pub fn validate_entities(entities: &Entities) -> Result<(), ValidationError> {
    let slots: [(&str, &Regex, &[String]); 3] = [
        ("names", &RE_NAME, &entities.names),
        ("dates", &RE_DATE, &entities.dates),
        ("amounts", &RE_AMOUNT, &entities.amounts),
    ];

    let violations: Vec<String> = slots
        .iter()
        .filter_map(|(slot, re, values)| {
            values
                .iter()
                .filter(|v| !re.is_match(v))
                .last()
                .map(|bad| format!("Invalid {slot}: {bad}"))
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_anywhere_is_positive() {
        assert_eq!(
            classify_sentiment("Good finance research summary."),
            Sentiment::Positive
        );
        assert_eq!(classify_sentiment("A GOODLY result"), Sentiment::Positive);
        assert_eq!(classify_sentiment("Mixed results."), Sentiment::Neutral);
        assert_eq!(classify_sentiment(""), Sentiment::Neutral);
    }

    #[test]
    fn entities_are_empty_without_triggers() {
        let e = extract_entities("Good finance research summary.");
        assert_eq!(e, Entities::default());
    }

    #[test]
    fn each_trigger_fills_its_slot() {
        let e = extract_entities("Alice paid $1000 in 2025.");
        assert_eq!(e.names, vec!["Alice"]);
        assert_eq!(e.dates, vec!["2025-01-01"]);
        assert_eq!(e.amounts, vec!["$1000"]);
    }

    #[test]
    fn name_trigger_is_case_sensitive() {
        let e = extract_entities("alice and ALICE");
        assert!(e.names.is_empty());
    }

    #[test]
    fn extracted_entities_always_validate() {
        let e = extract_entities("Alice, 2025, $1000");
        assert!(validate_entities(&e).is_ok());
    }

    #[test]
    fn validation_reports_each_bad_slot() {
        let e = Entities {
            names: vec!["Alice".into(), "R2-D2".into()],
            dates: vec!["2025-01-01".into()],
            amounts: vec!["1000 USD".into()],
        };
        let err = validate_entities(&e).unwrap_err();
        assert_eq!(
            err.violations,
            vec!["Invalid names: R2-D2", "Invalid amounts: 1000 USD"]
        );
    }
}
