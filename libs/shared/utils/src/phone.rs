use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// E.164 allows at most 15 digits; anything under 8 cannot be a dialable subscriber number.
const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 15;

/// National numbers longer than this are assumed to already carry a country code.
const MAX_NATIONAL_DIGITS: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("Phone number is empty")]
    Empty,

    #[error("Phone number {0:?} must have between 8 and 15 digits")]
    InvalidLength(String),
}

fn non_digits() -> &'static Regex {
    static NON_DIGITS: OnceLock<Regex> = OnceLock::new();
    NON_DIGITS.get_or_init(|| Regex::new(r"\D").expect("static pattern is valid"))
}

/// Canonical `+<country><subscriber>` form used as the per-tenant patient key.
///
/// Accepts `+55 (11) 91234-5678`, `0055...`, `whatsapp:+55...`, and national
/// numbers, which get `default_country_code` prepended after dropping trunk zeros.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> Result<String, PhoneError> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("whatsapp:")
        .or_else(|| trimmed.strip_prefix("tel:"))
        .unwrap_or(trimmed)
        .trim();

    if trimmed.is_empty() {
        return Err(PhoneError::Empty);
    }

    let digits = non_digits().replace_all(trimmed, "").into_owned();
    if digits.is_empty() {
        return Err(PhoneError::Empty);
    }

    let international = if trimmed.starts_with('+') {
        digits
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else {
        let national = digits.trim_start_matches('0');
        if national.len() > MAX_NATIONAL_DIGITS {
            national.to_string()
        } else {
            let country = non_digits().replace_all(default_country_code, "");
            format!("{}{}", country, national)
        }
    };

    if !(MIN_DIGITS..=MAX_DIGITS).contains(&international.len()) {
        return Err(PhoneError::InvalidLength(raw.to_string()));
    }

    Ok(format!("+{}", international))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn formats_collapse_to_one_key() {
        let expected = "+5511912345678";
        for raw in [
            "+55 (11) 91234-5678",
            "whatsapp:+5511912345678",
            "005511912345678",
            "(11) 91234-5678",
            "011 91234 5678",
            "5511912345678",
        ] {
            assert_eq!(normalize_phone(raw, "55").unwrap(), expected, "input {raw}");
        }
    }

    #[test]
    fn default_country_code_is_sanitized() {
        assert_eq!(normalize_phone("2025550143", "+1").unwrap(), "+12025550143");
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!(normalize_phone("   ", "55"), Err(PhoneError::Empty));
        assert_matches!(normalize_phone("call me", "55"), Err(PhoneError::Empty));
        assert_matches!(normalize_phone("+12", "55"), Err(PhoneError::InvalidLength(_)));
        assert_matches!(
            normalize_phone("+1234567890123456", "55"),
            Err(PhoneError::InvalidLength(_))
        );
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(digits in "[1-9][0-9]{9,12}") {
            let first = normalize_phone(&format!("+{digits}"), "55").unwrap();
            let second = normalize_phone(&first, "55").unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
