//! Display masks for Brazilian tax ids (CNPJ) and phone numbers.
//!
//! Every function here is total: input is reduced to its ASCII digits first,
//! and lengths that don't fit a mask come back as the bare digit string.

/// Number of digits in a CNPJ.
pub const TAX_ID_DIGITS: usize = 14;

/// Longest accepted phone number (mobile, with area code).
pub const PHONE_MAX_DIGITS: usize = 11;

/// Shortest accepted phone number (landline, with area code).
pub const PHONE_MIN_DIGITS: usize = 10;

/// Keep only ASCII digits.
pub fn strip_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Format a CNPJ as `NN.NNN.NNN/NNNN-NN`.
pub fn format_tax_id(value: &str) -> String {
    let digits = strip_digits(value);
    if digits.len() != TAX_ID_DIGITS {
        return digits;
    }

    // Digits are ASCII so byte slicing is safe
    format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    )
}

/// Format a phone as `(NN) NNNNN-NNNN` (mobile) or `(NN) NNNN-NNNN` (landline).
pub fn format_phone(value: &str) -> String {
    let digits = strip_digits(value);
    match digits.len() {
        11 => format!("({}) {}-{}", &digits[0..2], &digits[2..7], &digits[7..11]),
        10 => format!("({}) {}-{}", &digits[0..2], &digits[2..6], &digits[6..10]),
        _ => digits,
    }
}

/// Mask tax id input as it is typed, dropping digits past the 14th.
pub fn mask_tax_id_input(value: &str) -> String {
    format_tax_id(&truncate_digits(value, TAX_ID_DIGITS))
}

/// Mask phone input as it is typed, dropping digits past the 11th.
pub fn mask_phone_input(value: &str) -> String {
    format_phone(&truncate_digits(value, PHONE_MAX_DIGITS))
}

fn truncate_digits(value: &str, max: usize) -> String {
    strip_digits(value).chars().take(max).collect()
}

/// Human count for list headers: "No suppliers", "1 supplier", "3 suppliers".
pub fn count_label(count: usize, singular: &str, plural: &str) -> String {
    match count {
        0 => format!("No {}", plural),
        1 => format!("1 {}", singular),
        n => format!("{} {}", n, plural),
    }
}
