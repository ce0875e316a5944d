//! Formatting and validation of the national ID (CPF) of the voters.
//!
//! The canonical form is the string of the 11 digits. The display form groups
//! them as `000.000.000-00`. Validation only checks the number of digits, the
//! check digits of the CPF are not verified.

/// The number of digits in a CPF.
pub const CPF_DIGITS: usize = 11;

/// Keeps only the digits of the input.
pub fn clean_cpf(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Formats whatever was typed into the display form.
///
/// Non-digits are dropped and the input is cut at 11 digits. Partial input is
/// grouped as far as it goes (`123.45`), so that the function can be applied
/// while the value is being typed.
pub fn format_cpf(value: &str) -> String {
    let digits: String = clean_cpf(value).chars().take(CPF_DIGITS).collect();
    // Only ASCII digits are left, byte slicing is safe.
    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("{}.{}", &digits[..3], &digits[3..]),
        7..=9 => format!("{}.{}.{}", &digits[..3], &digits[3..6], &digits[6..]),
        _ => format!(
            "{}.{}.{}-{}",
            &digits[..3],
            &digits[3..6],
            &digits[6..9],
            &digits[9..]
        ),
    }
}

/// True when the value holds exactly 11 digits, whatever the punctuation.
pub fn is_valid_cpf(value: &str) -> bool {
    clean_cpf(value).len() == CPF_DIGITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_full_cpf() {
        assert_eq!(format_cpf("11144477735"), "111.444.777-35");
        assert_eq!(format_cpf("111.444.777-35"), "111.444.777-35");
    }

    #[test]
    fn formats_partial_input() {
        assert_eq!(format_cpf(""), "");
        assert_eq!(format_cpf("12"), "12");
        assert_eq!(format_cpf("123"), "123");
        assert_eq!(format_cpf("1234"), "123.4");
        assert_eq!(format_cpf("123456"), "123.456");
        assert_eq!(format_cpf("1234567"), "123.456.7");
        assert_eq!(format_cpf("1234567890"), "123.456.789-0");
    }

    #[test]
    fn truncates_extra_digits_and_noise() {
        assert_eq!(format_cpf("abc111 444 777 35 99"), "111.444.777-35");
    }

    #[test]
    fn format_then_clean_recovers_the_digits() {
        for digits in ["00000000000", "11144477735", "98765432100"] {
            let formatted = format_cpf(digits);
            assert_eq!(clean_cpf(&formatted), digits);
            assert_eq!(format_cpf(&formatted), formatted);
        }
    }

    #[test]
    fn validates_length_only() {
        assert!(is_valid_cpf("111.444.777-35"));
        assert!(is_valid_cpf("11144477735"));
        // Wrong check digits are accepted.
        assert!(is_valid_cpf("111.444.777-00"));
        assert!(!is_valid_cpf("111.444.777-3"));
        assert!(!is_valid_cpf("111444777351"));
        assert!(!is_valid_cpf(""));
        assert!(!is_valid_cpf("abc"));
    }
}
