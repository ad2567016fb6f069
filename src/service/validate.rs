//! Input validation shared by the signup, login, reset, and listing flows.

use crate::error::ApiError;

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Address shape check: one `@`, non-empty local part, and a dot inside the
/// domain with at least one character on each side. No whitespace anywhere.
pub fn is_valid_email(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let Some(domain) = parts.next() else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, ch)| ch == '.' && i >= 1 && i + 1 < domain.len())
}

pub fn is_exact_digits(value: &str, count: usize) -> bool {
    value.len() == count && value.bytes().all(|b| b.is_ascii_digit())
}

/// Listing contact phones must be 10 digits starting with 0.
pub fn is_mobile_phone(value: &str) -> bool {
    is_exact_digits(value, 10) && value.starts_with('0')
}

/// Letters in any script plus whitespace; nothing else.
pub fn is_person_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_alphabetic() || ch.is_whitespace())
}

/// Minimum 6 characters with at least one uppercase letter, one lowercase
/// letter, and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), ApiError> {
    if password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters.".to_string(),
        ));
    }
    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    for ch in password.chars() {
        if ch.is_ascii_uppercase() {
            has_upper = true;
        } else if ch.is_ascii_lowercase() {
            has_lower = true;
        } else if ch.is_ascii_digit() {
            has_digit = true;
        }
    }
    if !(has_upper && has_lower && has_digit) {
        return Err(ApiError::Validation(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number."
                .to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization_trims_and_lowercases() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a@b.co.th"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn digit_runs() {
        assert!(is_exact_digits("0812345678", 10));
        assert!(!is_exact_digits("081234567", 10));
        assert!(!is_exact_digits("08123456789", 10));
        assert!(!is_exact_digits("08123456a8", 10));
        assert!(is_exact_digits("1234567890123", 13));
    }

    #[test]
    fn listing_phone_needs_leading_zero() {
        assert!(is_mobile_phone("0812345678"));
        assert!(!is_mobile_phone("8812345678"));
        assert!(!is_mobile_phone("081234567"));
    }

    #[test]
    fn person_names_allow_any_script() {
        assert!(is_person_name("Somchai"));
        assert!(is_person_name("สมชาย ใจดี"));
        assert!(is_person_name("Mary Jane"));
        assert!(!is_person_name("R2D2"));
        assert!(!is_person_name("a_b"));
        assert!(!is_person_name(""));
    }

    #[test]
    fn password_strength_policy() {
        assert!(validate_password_strength("Abc123").is_ok());
        assert!(validate_password_strength("Ab1").is_err());
        assert!(validate_password_strength("abcdef1").is_err());
        assert!(validate_password_strength("ABCDEF1").is_err());
        assert!(validate_password_strength("Abcdefg").is_err());
    }

    #[test]
    fn short_password_message_is_the_length_one() {
        let err = validate_password_strength("Ab1").unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters.");
    }
}
