//! Italian fiscal code (codice fiscale) validation and data extraction.
//!
//! A fiscal code packs birth date and sex into a fixed 16-character layout:
//! six surname/name letters, two year digits, a month letter, two day digits
//! (offset by 40 for women), a four-character birth-place code, and a check
//! character computed over the first fifteen characters. Validation never
//! panics or returns `Err`; every failure is reported as a human-readable
//! reason in [`FiscalCodeData::errors`].

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

pub const FISCAL_CODE_LEN: usize = 16;

/// Sex encoded in the day-of-birth digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    pub const fn label(self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
        }
    }
}

/// Outcome of decoding a fiscal code. `sex` and `birth_date` are populated
/// only when `valid` is true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiscalCodeData {
    pub valid: bool,
    pub sex: Option<Sex>,
    pub birth_date: Option<NaiveDate>,
    pub errors: Vec<String>,
}

impl FiscalCodeData {
    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            sex: None,
            birth_date: None,
            errors: vec![reason.into()],
        }
    }
}

/// Result of cross-checking a declared birth date against the code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BirthDateCheck {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Decode and validate a raw fiscal code string.
///
/// Input is uppercased and trimmed before any check. The checks run in
/// order: length, structure, year, month, day/sex, calendar-date validity,
/// and finally the check character.
pub fn extract(raw: &str) -> FiscalCodeData {
    let code = raw.trim().to_ascii_uppercase();

    if code.len() != FISCAL_CODE_LEN {
        return FiscalCodeData::invalid("il codice fiscale deve essere di 16 caratteri");
    }

    let chars: Vec<char> = code.chars().collect();
    if !has_valid_structure(&chars) {
        return FiscalCodeData::invalid("formato codice fiscale non valido");
    }

    // The structure check guarantees digits at these positions.
    let two_digit_year = digit_pair(chars[6], chars[7]) as i32;
    // Century heuristic: a two-digit year greater than the current year's
    // last two digits belongs to the 1900s. Ambiguous exactly at a century
    // boundary; kept as documented behavior.
    let current_two_digit = Utc::now().year() % 100;
    let year = if two_digit_year > current_two_digit {
        1900 + two_digit_year
    } else {
        2000 + two_digit_year
    };

    let month = match month_from_letter(chars[8]) {
        Some(month) => month,
        None => return FiscalCodeData::invalid("mese non valido nel codice fiscale"),
    };

    let day_value = digit_pair(chars[9], chars[10]);
    let (sex, day) = if day_value > 40 {
        (Sex::F, day_value - 40)
    } else {
        (Sex::M, day_value)
    };

    let birth_date = match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => return FiscalCodeData::invalid("data di nascita non valida nel codice fiscale"),
    };

    let expected = check_character(&code[..15]);
    if chars[15] != expected {
        return FiscalCodeData::invalid("carattere di controllo non valido");
    }

    FiscalCodeData {
        valid: true,
        sex: Some(sex),
        birth_date: Some(birth_date),
        errors: Vec::new(),
    }
}

/// Compare a declared birth date against the one encoded in the code.
///
/// A mismatch is a warning for the caller to display, not a blocking error
/// in the pipeline: the check fails only when the code itself is invalid or
/// the dates disagree.
pub fn verify_birth_date(raw: &str, declared: NaiveDate) -> BirthDateCheck {
    let data = extract(raw);
    if !data.valid {
        return BirthDateCheck {
            valid: false,
            errors: data.errors,
        };
    }

    let decoded = match data.birth_date {
        Some(date) => date,
        None => {
            return BirthDateCheck {
                valid: false,
                errors: vec!["codice fiscale senza data decodificata".to_string()],
            }
        }
    };
    if decoded != declared {
        return BirthDateCheck {
            valid: false,
            errors: vec![format!(
                "la data di nascita non corrisponde al codice fiscale. Dal CF risulta: {}",
                decoded.format("%d/%m/%Y")
            )],
        };
    }

    BirthDateCheck {
        valid: true,
        errors: Vec::new(),
    }
}

/// Decoded sex, if the code is valid.
pub fn sex_from_code(raw: &str) -> Option<Sex> {
    extract(raw).sex
}

/// Decoded birth date, if the code is valid.
pub fn birth_date_from_code(raw: &str) -> Option<NaiveDate> {
    extract(raw).birth_date
}

fn digit_pair(tens: char, units: char) -> u32 {
    (tens as u32 - '0' as u32) * 10 + (units as u32 - '0' as u32)
}

/// Structural pattern: 6 letters, 2 digits, 1 letter, 2 digits, 1 letter,
/// 3 digits, 1 letter.
fn has_valid_structure(chars: &[char]) -> bool {
    chars.len() == FISCAL_CODE_LEN
        && chars.iter().enumerate().all(|(i, c)| match i {
            0..=5 | 8 | 11 | 15 => c.is_ascii_uppercase(),
            _ => c.is_ascii_digit(),
        })
}

/// Month table of the fiscal code. Letters that could be confused with
/// check-character values are skipped by the encoding itself.
fn month_from_letter(letter: char) -> Option<u32> {
    Some(match letter {
        'A' => 1,
        'B' => 2,
        'C' => 3,
        'D' => 4,
        'E' => 5,
        'H' => 6,
        'L' => 7,
        'M' => 8,
        'P' => 9,
        'R' => 10,
        'S' => 11,
        'T' => 12,
        _ => return None,
    })
}

/// Compute the expected check character over the first fifteen characters.
///
/// Characters at even 0-indexed positions (odd positions in the official
/// 1-based numbering) use the scrambled table; odd 0-indexed positions use
/// the plain ordinal table. The sum modulo 26 indexes the alphabet.
pub fn check_character(cf15: &str) -> char {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let sum: u32 = cf15
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if i % 2 == 0 {
                odd_position_value(c)
            } else {
                even_position_value(c)
            }
        })
        .sum();

    ALPHABET[(sum % 26) as usize] as char
}

fn even_position_value(c: char) -> u32 {
    match c {
        '0'..='9' => c as u32 - '0' as u32,
        'A'..='Z' => c as u32 - 'A' as u32,
        _ => 0,
    }
}

fn odd_position_value(c: char) -> u32 {
    match c {
        '0' | 'A' => 1,
        '1' | 'B' => 0,
        '2' | 'C' => 5,
        '3' | 'D' => 7,
        '4' | 'E' => 9,
        '5' | 'F' => 13,
        '6' | 'G' => 15,
        '7' | 'H' => 17,
        '8' | 'I' => 19,
        '9' | 'J' => 21,
        'K' => 2,
        'L' => 4,
        'M' => 18,
        'N' => 20,
        'O' => 11,
        'P' => 3,
        'Q' => 6,
        'R' => 8,
        'S' => 12,
        'T' => 14,
        'U' => 16,
        'V' => 10,
        'W' => 22,
        'X' => 25,
        'Y' => 24,
        'Z' => 23,
        _ => 0,
    }
}
