//! # Card Module
//!
//! Checksum validation and normalization for 16-digit loyalty card numbers.
//!
//! ## Representations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Card, Three Shapes                               │
//! │                                                                         │
//! │  Raw input (typed / pasted / decoded from a QR)                        │
//! │    " 4111 1111-1111_1111 "                                             │
//! │          │                                                              │
//! │          │ only_digits()                                                │
//! │          ▼                                                              │
//! │  Canonical (wire)          "4111111111111111"                          │
//! │          │                                                              │
//! │          │ format_card16()                                              │
//! │          ▼                                                              │
//! │  Display                   "4111-1111-1111-1111"                       │
//! │                                                                         │
//! │  The canonical form is what the gateway receives. The display form is  │
//! │  what the card field holds while the merchant types.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use aliados_core::card::{format_card16, is_valid_luhn16, only_digits};
//!
//! assert_eq!(only_digits("4111-1111 1111x1111"), "4111111111111111");
//! assert_eq!(format_card16("411111"), "4111-11");
//! assert!(is_valid_luhn16("4111-1111-1111-1111"));
//! assert!(!is_valid_luhn16("4111111111111112"));
//! ```
//!
//! These are loyalty card identifiers, not payment PANs: no brand detection,
//! no issuer ranges. Sixteen digits and a valid checksum is the whole rule.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::{CARD_DELIMITER, CARD_DIGITS, CARD_GROUP_SIZE};

// =============================================================================
// Normalizer / Formatter
// =============================================================================

/// Removes every character that is not an ASCII digit `0-9`.
///
/// Total function: empty input gives empty output, nothing fails.
pub fn only_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Formats input as `xxxx-xxxx-xxxx-xxxx`.
///
/// ## Steps
/// 1. Keep digits only
/// 2. Truncate to the first 16
/// 3. Join groups of 4 with `-`, no trailing delimiter after a partial group
///
/// ## Example
/// ```rust
/// use aliados_core::card::format_card16;
///
/// assert_eq!(format_card16("4111111111111111"), "4111-1111-1111-1111");
/// assert_eq!(format_card16("411111"), "4111-11");
/// assert_eq!(format_card16("41111111111111119999"), "4111-1111-1111-1111");
/// assert_eq!(format_card16("abc"), "");
/// ```
pub fn format_card16(input: &str) -> String {
    let digits: Vec<char> = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(CARD_DIGITS)
        .collect();

    let mut out = String::with_capacity(CARD_DIGITS + CARD_DIGITS / CARD_GROUP_SIZE);
    for (i, group) in digits.chunks(CARD_GROUP_SIZE).enumerate() {
        if i > 0 {
            out.push(CARD_DELIMITER);
        }
        out.extend(group.iter());
    }
    out
}

/// Reformats a field that is being edited and moves the cursor along.
///
/// The cursor shifts by however many characters formatting added or
/// removed, never below zero and never past the end of the new text.
///
/// ## Returns
/// `(formatted_text, new_cursor)` where the cursor counts characters.
///
/// ## Example
/// ```rust
/// use aliados_core::card::reformat_live;
///
/// // Typing the fifth digit inserts a delimiter before it.
/// assert_eq!(reformat_live("41111", 5), ("4111-1".to_string(), 6));
/// ```
pub fn reformat_live(value: &str, cursor: usize) -> (String, usize) {
    let formatted = format_card16(value);
    let before = value.chars().count() as isize;
    let after = formatted.chars().count() as isize;
    let moved = (cursor as isize + (after - before)).max(0) as usize;
    (formatted, moved.min(after as usize))
}

// =============================================================================
// Checksum Validator
// =============================================================================

/// Luhn mod-10 check over exactly 16 digits.
///
/// Non-digits are stripped first. Anything that does not leave exactly 16
/// digits is invalid, whatever its checksum would be.
///
/// ## Algorithm
/// ```text
/// digits:   4  1  1  1  1  1  1  1  1  1  1  1  1  1  1  1
/// double?:  Y  n  Y  n  Y  n  Y  n  Y  n  Y  n  Y  n  Y  n   ◄── from the right,
/// value:    8  1  2  1  2  1  2  1  2  1  2  1  2  1  2  1       rightmost is "n"
///
/// doubled > 9 ──► subtract 9     sum = 30 ──► 30 % 10 == 0 ──► valid
/// ```
pub fn is_valid_luhn16(input: &str) -> bool {
    let digits = only_digits(input);
    if digits.len() != CARD_DIGITS {
        return false;
    }
    luhn_sum(&digits) % 10 == 0
}

/// Luhn sum of an ASCII digit string (no length check).
fn luhn_sum(digits: &str) -> u32 {
    let mut sum = 0;
    let mut double = false;

    for byte in digits.bytes().rev() {
        let mut n = u32::from(byte - b'0');
        if double {
            n *= 2;
            if n > 9 {
                n -= 9;
            }
        }
        sum += n;
        double = !double;
    }

    sum
}

// =============================================================================
// Card Number
// =============================================================================

/// A validated loyalty card identifier: exactly 16 digits, Luhn-valid.
///
/// ## Invariant
/// `len(canonical) == 16 ∧ digits only ∧ luhn(canonical)`. The only ways to
/// build one go through [`CardNumber::parse`], so holding a `CardNumber`
/// proves the checks already ran.
///
/// Serializes as the canonical digit string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardNumber(String);

impl CardNumber {
    /// Parses raw input (any formatting) into a validated card number.
    ///
    /// ## Errors
    /// - `MissingCard` if the input holds no digits at all
    /// - `WrongLength` if it holds a number of digits other than 16
    /// - `InvalidChecksum` if the 16 digits fail the Luhn check
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let digits = only_digits(input);

        if digits.is_empty() {
            return Err(ValidationError::MissingCard);
        }

        if digits.len() != CARD_DIGITS {
            return Err(ValidationError::WrongLength {
                expected: CARD_DIGITS,
                actual: digits.len(),
            });
        }

        if luhn_sum(&digits) % 10 != 0 {
            return Err(ValidationError::InvalidChecksum);
        }

        Ok(CardNumber(digits))
    }

    /// Canonical digits-only representation (what goes on the wire).
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Grouped representation for the card field.
    pub fn display(&self) -> String {
        format_card16(&self.0)
    }

    /// Last four digits.
    pub fn last4(&self) -> &str {
        &self.0[CARD_DIGITS - 4..]
    }

    /// Display form with everything but the last group hidden. Use this in logs.
    pub fn masked(&self) -> String {
        format!("****-****-****-{}", self.last4())
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl TryFrom<String> for CardNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CardNumber::parse(&value)
    }
}

impl From<CardNumber> for String {
    fn from(card: CardNumber) -> Self {
        card.0
    }
}

impl std::str::FromStr for CardNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CardNumber::parse(s)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
