//! Request field checks.
//!
//! Each check records a message in [`FieldErrors`] instead of returning
//! early, so a client sees every invalid field at once. Lengths are counted
//! in characters after trimming.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use babycash_core::Email;

use crate::error::FieldErrors;

static CONTACT_PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 \-()]{7,20}$").expect("Invalid regex"));

static BUSINESS_PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-() ]{7,20}$").expect("Invalid regex"));

/// Longest phone number the contact tables can store.
pub const PHONE_MAX: usize = 20;

/// Password length bounds.
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 50;

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

/// `value` must be non-blank and between `min` and `max` characters.
pub fn length(errors: &mut FieldErrors, field: &'static str, value: &str, min: usize, max: usize) {
    let len = char_len(value);
    if len == 0 {
        errors.add(field, "must not be blank");
    } else if len < min || len > max {
        errors.add(field, format!("must be between {min} and {max} characters"));
    }
}

/// `value` may be absent, but when given must be at most `max` characters.
pub fn max_length(errors: &mut FieldErrors, field: &'static str, value: Option<&str>, max: usize) {
    if value.is_some_and(|v| char_len(v) > max) {
        errors.add(field, format!("must be at most {max} characters"));
    }
}

/// `value` must be non-blank and at least `min` characters.
pub fn min_length(errors: &mut FieldErrors, field: &'static str, value: &str, min: usize) {
    let len = char_len(value);
    if len == 0 {
        errors.add(field, "must not be blank");
    } else if len < min {
        errors.add(field, format!("must be at least {min} characters"));
    }
}

/// Parse an email address, recording an error if it is malformed.
pub fn email(errors: &mut FieldErrors, field: &'static str, value: &str) -> Option<Email> {
    match Email::parse(value) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.add(field, "must be a valid email address");
            None
        }
    }
}

/// Password rules: 6 to 50 characters with at least one letter and one digit.
pub fn password(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if let Err(message) = check_password(value) {
        errors.add(field, message);
    }
}

/// Password rules as a plain check, for callers outside request validation.
///
/// # Errors
///
/// Returns the message describing the first rule broken.
pub fn check_password(value: &str) -> Result<(), &'static str> {
    let len = value.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err("must be between 6 and 50 characters");
    }
    if !value.chars().any(char::is_alphabetic) || !value.chars().any(|c| c.is_ascii_digit()) {
        return Err("must contain at least one letter and one number");
    }
    Ok(())
}

/// Account phone: empty, or exactly 10 digits.
pub fn account_phone(errors: &mut FieldErrors, field: &'static str, value: Option<&str>) {
    let Some(phone) = value.map(str::trim).filter(|p| !p.is_empty()) else {
        return;
    };
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        errors.add(field, "must be exactly 10 digits");
    }
}

/// Contact-form phone: optional, ASCII digits with spaces, dashes,
/// parentheses and a leading `+`, at most 20 characters in all.
pub fn contact_phone(errors: &mut FieldErrors, field: &'static str, value: Option<&str>) {
    let Some(phone) = value.map(str::trim).filter(|p| !p.is_empty()) else {
        return;
    };
    if phone.len() > PHONE_MAX || !CONTACT_PHONE_RE.is_match(phone) {
        errors.add(field, "must be a valid phone number");
    }
}

/// Company phone on the contact page: required, 7 to 20 of digits, `+`,
/// dashes, parentheses and spaces.
pub fn business_phone(errors: &mut FieldErrors, field: &'static str, value: &str) {
    let phone = value.trim();
    if phone.is_empty() {
        errors.add(field, "must not be blank");
    } else if !BUSINESS_PHONE_RE.is_match(phone) {
        errors.add(field, "must be a valid phone number");
    }
}

/// Optional coordinate, finite and within `-limit..=limit` degrees.
pub fn coordinate(errors: &mut FieldErrors, field: &'static str, value: Option<f64>, limit: f64) {
    if value.is_some_and(|v| !v.is_finite() || v.abs() > limit) {
        errors.add(field, format!("must be between -{limit} and {limit}"));
    }
}

/// `value` must lie within `min..=max`.
pub fn range(errors: &mut FieldErrors, field: &'static str, value: i64, min: i64, max: i64) {
    if value < min || value > max {
        errors.add(field, format!("must be between {min} and {max}"));
    }
}

/// `value` must be strictly positive.
pub fn positive(errors: &mut FieldErrors, field: &'static str, value: Decimal) {
    if value <= Decimal::ZERO {
        errors.add(field, "must be greater than 0");
    }
}

/// Trim an optional string, treating blank as absent.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(f: impl FnOnce(&mut FieldErrors)) -> Option<String> {
        let mut errors = FieldErrors::new();
        f(&mut errors);
        errors.get("f").map(str::to_string)
    }

    #[test]
    fn test_length_counts_trimmed_characters() {
        assert!(check(|e| length(e, "f", "  Ñoño ", 2, 4)).is_none());
        assert_eq!(
            check(|e| length(e, "f", "a", 2, 50)).as_deref(),
            Some("must be between 2 and 50 characters")
        );
        assert_eq!(check(|e| length(e, "f", "   ", 2, 50)).as_deref(), Some("must not be blank"));
    }

    #[test]
    fn test_password_rules() {
        assert!(check_password("bebe2025").is_ok());
        assert!(check_password("a1b2c").is_err());
        assert!(check_password("onlyletters").is_err());
        assert!(check_password("12345678").is_err());
        assert!(check_password(&format!("a1{}", "x".repeat(49))).is_err());
    }

    #[test]
    fn test_account_phone() {
        assert!(check(|e| account_phone(e, "f", None)).is_none());
        assert!(check(|e| account_phone(e, "f", Some(""))).is_none());
        assert!(check(|e| account_phone(e, "f", Some("3001234567"))).is_none());
        assert!(check(|e| account_phone(e, "f", Some("300-123-4567"))).is_some());
        assert!(check(|e| account_phone(e, "f", Some("300123456"))).is_some());
    }

    #[test]
    fn test_contact_phone() {
        assert!(check(|e| contact_phone(e, "f", Some("+57 (300) 123-4567"))).is_none());
        assert!(check(|e| contact_phone(e, "f", Some("12345"))).is_some());
        assert!(check(|e| contact_phone(e, "f", Some("call me maybe"))).is_some());
    }

    #[test]
    fn test_contact_phone_fits_column() {
        let twenty = format!("+{}", "1".repeat(19));
        assert!(check(|e| contact_phone(e, "f", Some(twenty.as_str()))).is_none());

        let twenty_one = format!("+{}", "1".repeat(20));
        assert_eq!(
            check(|e| contact_phone(e, "f", Some(twenty_one.as_str()))).as_deref(),
            Some("must be a valid phone number")
        );
    }

    #[test]
    fn test_contact_phone_is_ascii_only() {
        // Arabic-Indic and fullwidth digits.
        assert!(check(|e| contact_phone(e, "f", Some("\u{0663}\u{0660}\u{0660}\u{0661}\u{0662}\u{0663}\u{0664}"))).is_some());
        assert!(check(|e| contact_phone(e, "f", Some("\u{FF13}\u{FF10}\u{FF10}\u{FF11}\u{FF12}\u{FF13}\u{FF14}"))).is_some());
        assert!(check(|e| contact_phone(e, "f", Some("300\u{2003}123\u{2003}4567"))).is_some());
    }

    #[test]
    fn test_business_phone() {
        assert!(check(|e| business_phone(e, "f", "+57 (601) 555-0101")).is_none());
        assert!(check(|e| business_phone(e, "f", &"1".repeat(20))).is_none());
        assert!(check(|e| business_phone(e, "f", &"1".repeat(21))).is_some());
        assert!(check(|e| business_phone(e, "f", "123456")).is_some());
        assert_eq!(check(|e| business_phone(e, "f", "  ")).as_deref(), Some("must not be blank"));
    }

    #[test]
    fn test_coordinate() {
        assert!(check(|e| coordinate(e, "f", None, 90.0)).is_none());
        assert!(check(|e| coordinate(e, "f", Some(-90.0), 90.0)).is_none());
        assert!(check(|e| coordinate(e, "f", Some(90.5), 90.0)).is_some());
        assert!(check(|e| coordinate(e, "f", Some(f64::NAN), 180.0)).is_some());
        assert!(check(|e| coordinate(e, "f", Some(-180.1), 180.0)).is_some());
    }

    #[test]
    fn test_email_and_range() {
        assert!(check(|e| {
            email(e, "f", "Ana@BabyCash.com");
        })
        .is_none());
        assert!(check(|e| {
            email(e, "f", "not-an-email");
        })
        .is_some());
        assert!(check(|e| range(e, "f", 6, 1, 5)).is_some());
        assert!(check(|e| positive(e, "f", Decimal::ZERO)).is_some());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  nota ")), Some("nota".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
