//! Field validators
//!
//! Pure pass/fail checks over single values. The engine aggregates failures
//! into [`crate::error::FieldError`] lists; nothing here touches storage.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// 10 digits, first digit 6-9 (national mobile prefix set).
pub static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").expect("mobile pattern compiles"));

/// 5 letters, 4 digits, 1 letter, upper-cased.
pub static TAX_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").expect("tax id pattern compiles"));

/// Generic email shape: local part, domain, TLD of at least 2 letters.
pub static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern compiles")
});

pub fn is_valid_mobile(s: &str) -> bool {
    MOBILE_RE.is_match(s)
}

/// Exactly 12 digits. No checksum; the issuing authority's check-digit
/// algorithm is intentionally not implemented.
pub fn is_valid_national_id(s: &str) -> bool {
    s.len() == 12 && s.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_tax_id(s: &str) -> bool {
    TAX_ID_RE.is_match(&s.to_ascii_uppercase())
}

pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// Civil-calendar age at `today`: year difference, minus one if the birthday
/// has not yet occurred this year.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

pub fn meets_min_age(dob: NaiveDate, today: NaiveDate, min_age: i32) -> bool {
    age_on(dob, today) >= min_age
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn mobile_requires_ten_digits_with_valid_prefix() {
        assert!(is_valid_mobile("9876543210"));
        assert!(is_valid_mobile("6000000000"));
        assert!(!is_valid_mobile("1234567890"));
        assert!(!is_valid_mobile("987654321"));
        assert!(!is_valid_mobile("98765432101"));
        assert!(!is_valid_mobile("98765x3210"));
    }

    #[test]
    fn national_id_is_twelve_digits() {
        assert!(is_valid_national_id("123456789012"));
        assert!(!is_valid_national_id("12345"));
        assert!(!is_valid_national_id("1234567890123"));
        assert!(!is_valid_national_id("12345678901a"));
    }

    #[test]
    fn tax_id_matches_pattern_case_insensitively() {
        assert!(is_valid_tax_id("ABCDE1234F"));
        assert!(is_valid_tax_id("abcde1234f"));
        assert!(!is_valid_tax_id("ABCD1234F"));
        assert!(!is_valid_tax_id("ABCDE12345"));
        assert!(!is_valid_tax_id("INVALID"));
    }

    #[test]
    fn email_needs_local_domain_and_tld() {
        assert!(is_valid_email("john.doe@example.com"));
        assert!(is_valid_email("a+b@x.co"));
        assert!(!is_valid_email("invalid-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@b.c"));
    }

    #[test]
    fn age_counts_birthday_not_yet_reached() {
        let today = date(2024, 6, 15);
        assert_eq!(age_on(date(1990, 6, 15), today), 34);
        assert_eq!(age_on(date(1990, 6, 16), today), 33);
        assert_eq!(age_on(date(1990, 12, 1), today), 33);
    }

    #[test]
    fn min_age_boundary_is_exact() {
        let today = date(2024, 6, 15);
        // 18th birthday today: passes.
        assert!(meets_min_age(date(2006, 6, 15), today, 18));
        // One day short of 18: fails.
        assert!(!meets_min_age(date(2006, 6, 16), today, 18));
        assert!(meets_min_age(date(2000, 1, 1), today, 18));
    }
}
