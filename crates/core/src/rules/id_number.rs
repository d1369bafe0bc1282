//! Resident identity number checksum.
//!
//! Accepts 15-digit legacy numbers (date check only) and 18-character numbers
//! whose last character is a mod-11 check digit (`0-9` or `X`).

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{15}|[0-9]{17}[0-9Xx])$").expect("valid regex"));

/// Weights applied to the first 17 digits.
const WEIGHTS: [u32; 17] = [7, 9, 10, 5, 8, 4, 2, 1, 6, 3, 7, 9, 10, 5, 8, 4, 2];

/// Check character indexed by `sum % 11`.
const CHECK_CHARS: [char; 11] = ['1', '0', 'X', '9', '8', '7', '6', '5', '4', '3', '2'];

/// Whether `value` is a well-formed identity number.
pub fn is_id_number(value: &str) -> bool {
    if !SHAPE_RE.is_match(value) {
        return false;
    }

    // ASCII only past the shape check, so byte slicing stays on char boundaries.
    let (year, month, day) = if value.len() == 15 {
        (
            parse_digits(&value[6..8]).map(|yy| 1900 + yy),
            parse_digits(&value[8..10]),
            parse_digits(&value[10..12]),
        )
    } else {
        (
            parse_digits(&value[6..10]),
            parse_digits(&value[10..12]),
            parse_digits(&value[12..14]),
        )
    };
    let (Some(year), Some(month), Some(day)) = (year, month, day) else {
        return false;
    };
    let Ok(year) = i32::try_from(year) else {
        return false;
    };
    if NaiveDate::from_ymd_opt(year, month, day).is_none() {
        return false;
    }

    if value.len() == 18 {
        return check_char(&value[..17]).is_some_and(|expected| {
            value[17..]
                .chars()
                .next()
                .is_some_and(|actual| actual.to_ascii_uppercase() == expected)
        });
    }

    true
}

/// Compute the check character for the first 17 digits.
pub fn check_char(body: &str) -> Option<char> {
    if body.len() != WEIGHTS.len() {
        return None;
    }
    let mut sum = 0u32;
    for (c, weight) in body.chars().zip(WEIGHTS) {
        sum += c.to_digit(10)? * weight;
    }
    Some(CHECK_CHARS[(sum % 11) as usize])
}

fn parse_digits(s: &str) -> Option<u32> {
    s.parse().ok()
}
