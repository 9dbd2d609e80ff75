use thiserror::Error;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Largest amount accepted for a single expense or budget (one billion units).
/// Keeps per-user sums far below `i64::MAX`.
pub const MAX_AMOUNT_CENTS: Cents = 100_000_000_000;

/// Format cents as a human-readable amount.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCentsError {
    #[error("invalid money format")]
    InvalidFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount must not exceed {}", format_cents(MAX_AMOUNT_CENTS))]
    TooLarge,
}

/// Check that an amount can be stored: positive and at most [`MAX_AMOUNT_CENTS`].
pub fn validate_amount(cents: Cents) -> Result<Cents, AmountError> {
    if cents <= 0 {
        Err(AmountError::NotPositive)
    } else if cents > MAX_AMOUNT_CENTS {
        Err(AmountError::TooLarge)
    } else {
        Ok(cents)
    }
}

/// Parse a decimal string into cents.
/// Accepts `.` or `,` as the decimal separator; digits past the second
/// fraction digit are truncated.
/// Example: "50.00" -> 5000, "12,5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, input) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    let (units_str, decimal_str) = match input.split_once(['.', ',']) {
        Some((units, decimals)) => (units, decimals),
        None => (input, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (units_str.is_empty() && decimal_str.is_empty())
        || !all_digits(units_str)
        || !all_digits(decimal_str)
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?
    };

    // Pad or truncate the fraction to exactly two digits
    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        1 => i64::from(decimal_str.as_bytes()[0] - b'0') * 10,
        _ => decimal_str[..2]
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::InvalidFormat)?;
    Ok(if negative { -cents } else { cents })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents(" 12.34 "), Ok(1234));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents("12,5"), Ok(1250));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("7."), Ok(700));
        assert_eq!(parse_cents("+3"), Ok(300));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
        assert_eq!(parse_cents("100.999"), Ok(10099)); // Truncates
        assert_eq!(parse_cents("0.001"), Ok(0));
    }

    #[test]
    fn test_validate_amount_bounds() {
        assert_eq!(validate_amount(1), Ok(1));
        assert_eq!(validate_amount(MAX_AMOUNT_CENTS), Ok(MAX_AMOUNT_CENTS));
        assert_eq!(validate_amount(0), Err(AmountError::NotPositive));
        assert_eq!(validate_amount(-1), Err(AmountError::NotPositive));
        assert_eq!(validate_amount(MAX_AMOUNT_CENTS + 1), Err(AmountError::TooLarge));
        assert_eq!(
            parse_cents("92233720368547758").map(validate_amount),
            Ok(Err(AmountError::TooLarge))
        );
    }

    #[test]
    fn test_parse_cents_invalid() {
        for input in [
            "", "-", ".", "abc", "12.34.56", "1e3", "nan", "inf", "5.-3", "1 000",
            "99999999999999999999",
        ] {
            assert_eq!(
                parse_cents(input),
                Err(ParseCentsError::InvalidFormat),
                "{input:?} should be rejected"
            );
        }
    }
}
