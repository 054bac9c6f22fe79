/// Parse human byte-size strings like `1024`, `4k`, `2M`.
///
/// `k` multiplies by 1024, `M` by 1024×1024. At most one suffix character
/// is accepted and nothing may follow it (`1Mx` is rejected).

/// Errors from parsing a byte-size string.
#[derive(Debug, PartialEq, Eq)]
pub enum ByteSizeError {
    /// No digits at the start of the string.
    MissingDigits,
    /// Unknown suffix character, or characters after the suffix.
    TrailingGarbage(String),
    /// The count does not fit in a u64 after applying the suffix.
    Overflow,
}

impl std::fmt::Display for ByteSizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteSizeError::MissingDigits => write!(f, "expected a decimal byte count"),
            ByteSizeError::TrailingGarbage(rest) => {
                write!(f, "unexpected characters after byte count: {:?}", rest)
            }
            ByteSizeError::Overflow => write!(f, "byte count too large"),
        }
    }
}

impl std::error::Error for ByteSizeError {}

/// Parse `s` into a byte count.
pub fn parse(s: &str) -> Result<u64, ByteSizeError> {
    let digits_end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (digits, rest) = s.split_at(digits_end);

    if digits.is_empty() {
        return Err(ByteSizeError::MissingDigits);
    }
    let count: u64 = digits.parse().map_err(|_| ByteSizeError::Overflow)?;

    let multiplier: u64 = match rest {
        "" => 1,
        "k" => 1024,
        "M" => 1024 * 1024,
        other => return Err(ByteSizeError::TrailingGarbage(other.to_string())),
    };

    count
        .checked_mul(multiplier)
        .ok_or(ByteSizeError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_count() {
        assert_eq!(parse("1024"), Ok(1024));
        assert_eq!(parse("0"), Ok(0));
    }

    #[test]
    fn test_kilobyte_suffix() {
        assert_eq!(parse("4k"), Ok(4096));
        assert_eq!(parse("1k"), Ok(1024));
    }

    #[test]
    fn test_megabyte_suffix() {
        assert_eq!(parse("2M"), Ok(2 * 1024 * 1024));
    }

    #[test]
    fn test_unknown_suffix_rejected() {
        assert!(matches!(parse("5x"), Err(ByteSizeError::TrailingGarbage(_))));
    }

    #[test]
    fn test_garbage_after_suffix_rejected() {
        // One valid suffix char followed by anything else is still an error.
        assert!(matches!(parse("1Mx"), Err(ByteSizeError::TrailingGarbage(_))));
        assert!(matches!(parse("4kb"), Err(ByteSizeError::TrailingGarbage(_))));
    }

    #[test]
    fn test_empty_and_suffix_only_rejected() {
        assert_eq!(parse(""), Err(ByteSizeError::MissingDigits));
        assert_eq!(parse("k"), Err(ByteSizeError::MissingDigits));
        assert_eq!(parse("M"), Err(ByteSizeError::MissingDigits));
    }

    #[test]
    fn test_whitespace_rejected() {
        assert!(matches!(parse(" 10"), Err(ByteSizeError::MissingDigits)));
        assert!(matches!(parse("10 "), Err(ByteSizeError::TrailingGarbage(_))));
    }

    #[test]
    fn test_uppercase_k_rejected() {
        // Suffixes are exactly `k` and `M`, matching the original surface.
        assert!(matches!(parse("4K"), Err(ByteSizeError::TrailingGarbage(_))));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(parse("99999999999999999999"), Err(ByteSizeError::Overflow));
        // u64::MAX fits bare, but not once multiplied by 1024.
        assert_eq!(parse("18446744073709551615"), Ok(u64::MAX));
        assert_eq!(parse("18446744073709551615k"), Err(ByteSizeError::Overflow));
    }
}
