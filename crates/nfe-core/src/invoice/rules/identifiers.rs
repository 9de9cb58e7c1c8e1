//! CNPJ, CPF and access key validation.

use super::patterns::{ACCESS_KEY_ID, DIGITS};

/// Length of a CNPJ (legal entity taxpayer id).
pub const CNPJ_LEN: usize = 14;

/// Length of a CPF (individual taxpayer id).
pub const CPF_LEN: usize = 11;

/// Length of an NF-e access key.
pub const ACCESS_KEY_LEN: usize = 44;

/// Check that `s` is digits only with one of the accepted lengths.
pub fn check_identifier(s: &str, lengths: &[usize]) -> Result<String, String> {
    let s = s.trim();

    if !DIGITS.is_match(s) {
        return Err(format!("'{}' is not digits only", s));
    }

    if !lengths.contains(&s.len()) {
        let expected: Vec<String> = lengths.iter().map(|l| l.to_string()).collect();
        return Err(format!(
            "'{}' has {} digits, expected {}",
            s,
            s.len(),
            expected.join(" or ")
        ));
    }

    Ok(s.to_string())
}

/// Strip the `NFe` prefix `infNFe/@Id` puts in front of the access key.
pub fn access_key_from_id(id: &str) -> String {
    ACCESS_KEY_ID
        .captures(id.trim())
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| id.trim().to_string())
}

fn digits_of(s: &str) -> Option<Vec<u32>> {
    s.chars().map(|c| c.to_digit(10)).collect()
}

/// Mod-11 check digit over `digits`, weights cycling from the right.
fn mod11_digit(digits: &[u32], max_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .rev()
        .zip((2..=max_weight).cycle())
        .map(|(d, w)| d * w)
        .sum();

    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Validate a CNPJ using its two check digits.
///
/// Weights cycle 2..=9 from the right; a repeated single digit is rejected.
pub fn validate_cnpj(cnpj: &str) -> bool {
    let Some(digits) = digits_of(cnpj) else {
        return false;
    };

    if digits.len() != CNPJ_LEN || all_same(&digits) {
        return false;
    }

    let first = mod11_digit(&digits[..12], 9);
    let second = mod11_digit(&digits[..13], 9);

    digits[12] == first && digits[13] == second
}

/// Validate a CPF using its two check digits.
///
/// Weights grow from 2 with no wrap; a repeated single digit is rejected.
pub fn validate_cpf(cpf: &str) -> bool {
    let Some(digits) = digits_of(cpf) else {
        return false;
    };

    if digits.len() != CPF_LEN || all_same(&digits) {
        return false;
    }

    let first = mod11_digit(&digits[..9], 10);
    let second = mod11_digit(&digits[..10], 11);

    digits[9] == first && digits[10] == second
}

/// Validate the access key check digit (last of 44, weights 2..=9).
pub fn validate_access_key(key: &str) -> bool {
    let Some(digits) = digits_of(key) else {
        return false;
    };

    if digits.len() != ACCESS_KEY_LEN {
        return false;
    }

    mod11_digit(&digits[..43], 9) == digits[43]
}

/// Format CNPJ with punctuation (XX.XXX.XXX/XXXX-XX).
pub fn format_cnpj(cnpj: &str) -> String {
    if cnpj.len() != CNPJ_LEN || !DIGITS.is_match(cnpj) {
        return cnpj.to_string();
    }

    format!(
        "{}.{}.{}/{}-{}",
        &cnpj[0..2],
        &cnpj[2..5],
        &cnpj[5..8],
        &cnpj[8..12],
        &cnpj[12..14]
    )
}

/// Format CPF with punctuation (XXX.XXX.XXX-XX).
pub fn format_cpf(cpf: &str) -> String {
    if cpf.len() != CPF_LEN || !DIGITS.is_match(cpf) {
        return cpf.to_string();
    }

    format!("{}.{}.{}-{}", &cpf[0..3], &cpf[3..6], &cpf[6..9], &cpf[9..11])
}

/// Format a CNPJ or CPF by length.
pub fn format_tax_id(id: &str) -> String {
    match id.len() {
        CNPJ_LEN => format_cnpj(id),
        CPF_LEN => format_cpf(id),
        _ => id.to_string(),
    }
}
