//! Resource name and identifier validation.
//!
//! Every resource carries a display name; plugin-like kinds additionally
//! require identifier syntax because their names are referenced from code.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum allowed length for a resource name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum allowed length for a resource description.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a resource name: must be non-empty, trimmed, and within
/// [`MAX_NAME_LENGTH`].
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Resource name must not be empty".to_string(),
        ));
    }
    if trimmed.len() != name.len() {
        return Err(CoreError::Validation(
            "Resource name must not have leading or trailing whitespace".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Resource name must not exceed {MAX_NAME_LENGTH} characters, got {}",
            name.len()
        )));
    }
    Ok(())
}

/// Validate an optional description against [`MAX_DESCRIPTION_LENGTH`].
pub fn validate_description(description: Option<&str>) -> Result<(), CoreError> {
    if let Some(desc) = description {
        if desc.len() > MAX_DESCRIPTION_LENGTH {
            return Err(CoreError::Validation(format!(
                "Description must not exceed {MAX_DESCRIPTION_LENGTH} characters, got {}",
                desc.len()
            )));
        }
    }
    Ok(())
}

/// Validate identifier syntax: must start with a letter or underscore,
/// remaining characters letters, digits, or underscores.
pub fn validate_identifier(name: &str) -> Result<(), CoreError> {
    let mut chars = name.chars();
    match chars.next() {
        None => {
            return Err(CoreError::Validation(
                "Identifier must not be empty".to_string(),
            ));
        }
        Some(first) if !first.is_ascii_alphabetic() && first != '_' => {
            return Err(CoreError::Validation(format!(
                "Identifier '{name}' must start with a letter or underscore"
            )));
        }
        Some(_) => {}
    }
    if let Some(bad) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(CoreError::Validation(format!(
            "Identifier '{name}' contains invalid character '{bad}'; \
             only letters, digits, and underscores are allowed"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- validate_name -------------------------------------------------------

    #[test]
    fn valid_short_name() {
        assert!(validate_name("mnist baseline").is_ok());
    }

    #[test]
    fn valid_name_at_max_length() {
        let name = "a".repeat(MAX_NAME_LENGTH);
        assert!(validate_name(&name).is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        assert!(validate_name("").is_err());
    }

    #[test]
    fn rejects_whitespace_only_name() {
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn rejects_leading_whitespace() {
        assert!(validate_name(" queue").is_err());
    }

    #[test]
    fn rejects_trailing_whitespace() {
        assert!(validate_name("queue ").is_err());
    }

    #[test]
    fn rejects_name_exceeding_max() {
        let name = "a".repeat(MAX_NAME_LENGTH + 1);
        assert!(validate_name(&name).is_err());
    }

    // -- validate_description ------------------------------------------------

    #[test]
    fn none_description_is_valid() {
        assert!(validate_description(None).is_ok());
    }

    #[test]
    fn rejects_description_exceeding_max() {
        let desc = "d".repeat(MAX_DESCRIPTION_LENGTH + 1);
        assert!(validate_description(Some(&desc)).is_err());
    }

    // -- validate_identifier -------------------------------------------------

    #[test]
    fn valid_identifiers() {
        assert!(validate_identifier("attack_fgsm").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("Layer2Norm").is_ok());
        assert!(validate_identifier("x").is_ok());
    }

    #[test]
    fn rejects_empty_identifier() {
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn rejects_leading_digit() {
        let err = validate_identifier("2fast").unwrap_err();
        assert!(err.to_string().contains("start with a letter or underscore"));
    }

    #[test]
    fn rejects_hyphen() {
        let err = validate_identifier("fast-gradient").unwrap_err();
        assert!(err.to_string().contains("invalid character '-'"));
    }

    #[test]
    fn rejects_space() {
        assert!(validate_identifier("fast gradient").is_err());
    }
}
