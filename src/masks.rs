//! Input masks and advisory validators for the structured identifier fields.
//!
//! A mask pattern uses `0` for a digit slot; every other character is a
//! literal separator inserted once the next digit is present.

/// Identifier formats with a fixed digit-group mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskedField {
    /// National individual tax ID (CPF), 11 digits with a mod-11 check.
    Cpf,
    /// Property title deed registration (matrícula), 16 digits.
    TitleDeed,
    /// Rural property registry code (INCRA/CCIR), 13 digits.
    Incra,
    /// Federal rural property number (NIRF), 8 digits.
    Nirf,
}

impl MaskedField {
    pub fn pattern(self) -> &'static str {
        match self {
            MaskedField::Cpf => "000.000.000-00",
            MaskedField::TitleDeed => "000000.0.0000000-00",
            MaskedField::Incra => "000.000.000.000-0",
            MaskedField::Nirf => "0.000.000-0",
        }
    }

    pub fn digit_count(self) -> usize {
        self.pattern().chars().filter(|c| *c == '0').count()
    }

    pub fn label(self) -> &'static str {
        match self {
            MaskedField::Cpf => "CPF",
            MaskedField::TitleDeed => "Matrícula",
            MaskedField::Incra => "Código INCRA",
            MaskedField::Nirf => "NIRF",
        }
    }

    pub fn mask(self, raw: &str) -> String {
        apply_mask(self.pattern(), raw)
    }

    /// Advisory check: digit count for every format, plus the two-pass
    /// checksum for CPF.
    pub fn validate(self, display: &str) -> bool {
        let digits = digits_of(display);
        if digits.len() != self.digit_count() {
            return false;
        }
        match self {
            MaskedField::Cpf => cpf_checksum_ok(&digits),
            _ => true,
        }
    }
}

fn digits_of(input: &str) -> Vec<u32> {
    input.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn apply_mask(pattern: &str, raw: &str) -> String {
    let max = pattern.chars().filter(|c| *c == '0').count();
    let mut digits = raw.chars().filter(char::is_ascii_digit).take(max).peekable();

    let mut out = String::with_capacity(pattern.len());
    for slot in pattern.chars() {
        if digits.peek().is_none() {
            break;
        }
        if slot == '0' {
            if let Some(d) = digits.next() {
                out.push(d);
            }
        } else {
            out.push(slot);
        }
    }
    out
}

fn cpf_check_digit(digits: &[u32]) -> u32 {
    let first_weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (first_weight - i as u32))
        .sum();
    match 11 - (sum % 11) {
        10 | 11 => 0,
        r => r,
    }
}

fn cpf_checksum_ok(digits: &[u32]) -> bool {
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    cpf_check_digit(&digits[..9]) == digits[9] && cpf_check_digit(&digits[..10]) == digits[10]
}
