use crate::{KtError, KtResult};

/// Floating point type used throughout the system.
pub type Real = f64;

/// Parse the text of a numeric input field.
///
/// - `,` and `.` are both accepted as decimal separator
/// - empty (or whitespace-only) text is an absent value, not zero
/// - anything that is not a finite decimal number is rejected
pub fn parse_decimal(text: &str) -> KtResult<Option<Real>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let normalized = trimmed.replace(',', ".");
    let value: Real = normalized
        .parse()
        .map_err(|_| KtError::InvalidNumber {
            text: text.to_string(),
        })?;

    if !value.is_finite() {
        return Err(KtError::InvalidNumber {
            text: text.to_string(),
        });
    }
    Ok(Some(value))
}

/// Format a value for a numeric input field. Absent values become empty text.
///
/// The output always parses back to the same value with [`parse_decimal`].
pub fn format_decimal(value: Option<Real>) -> String {
    match value {
        Some(v) => format!("{v}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_and_dot_are_the_same_separator() {
        assert_eq!(parse_decimal("3,14").unwrap(), Some(3.14));
        assert_eq!(parse_decimal("3.14").unwrap(), Some(3.14));
        assert_eq!(parse_decimal(" -0,5 ").unwrap(), Some(-0.5));
    }

    #[test]
    fn empty_text_is_absent() {
        assert_eq!(parse_decimal("").unwrap(), None);
        assert_eq!(parse_decimal("   ").unwrap(), None);
        assert_eq!(format_decimal(None), "");
    }

    #[test]
    fn garbage_and_non_finite_are_rejected() {
        for text in ["abc", "1,000.5", "NaN", "inf", "-", "1e"] {
            assert!(
                matches!(parse_decimal(text), Err(KtError::InvalidNumber { .. })),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn exponent_notation_is_accepted() {
        assert_eq!(parse_decimal("1e-3").unwrap(), Some(0.001));
        assert_eq!(parse_decimal("2,5E2").unwrap(), Some(250.0));
    }
}
