//! National identification number (CPF) check-digit validation.
//!
//! A document is eleven decimal digits once punctuation is removed. The last
//! two digits are check digits derived from the leading ones by a weighted
//! sum modulo 11.

const DOCUMENT_LEN: usize = 11;
const FIRST_DIGIT_FACTOR: u32 = 10;
const SECOND_DIGIT_FACTOR: u32 = 11;

/// Drops every character that is not an ASCII digit.
pub fn clean_document(document: &str) -> String {
    document.chars().filter(char::is_ascii_digit).collect()
}

pub fn is_document_valid(document: &str) -> bool {
    let digits = clean_document(document);
    if digits.len() != DOCUMENT_LEN {
        return false;
    }
    let digits: Vec<u32> = digits.bytes().map(|b| u32::from(b - b'0')).collect();
    if all_digits_same(&digits) {
        return false;
    }
    let first = calculate_digit(&digits, FIRST_DIGIT_FACTOR);
    let second = calculate_digit(&digits, SECOND_DIGIT_FACTOR);
    digits[9] == first && digits[10] == second
}

fn all_digits_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|pair| pair[0] == pair[1])
}

/// Weighted sum of the first `factor - 1` digits, weights counting down from
/// `factor` to 2. Always yields a single digit.
fn calculate_digit(digits: &[u32], factor: u32) -> u32 {
    let total: u32 = digits
        .iter()
        .take((factor - 1) as usize)
        .zip((2..=factor).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();
    let rest = total % 11;
    if rest < 2 { 0 } else { 11 - rest }
}
