//! Numeric argument parsing
//!
//! Operators type numbers either in decimal or with a `0x`/`0X` prefix in
//! hexadecimal. The target type decides the accepted width: `u8`, `u16` or
//! `u32`.

use core::fmt;

/// Why a token is not a valid number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Token (or the part after the hex prefix) is empty
    Empty,
    /// Token contains a character that is not a digit of its radix
    InvalidDigit,
    /// Value does not fit into the requested width
    Overflow,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty number"),
            Self::InvalidDigit => write!(f, "invalid digit"),
            Self::Overflow => write!(f, "value too large"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

/// Parse a decimal or `0x` prefixed hexadecimal token into `T`
///
/// Unlike `str::parse`, a leading sign is rejected.
///
/// # Example
///
/// ```
/// use flashshell_core::number::parse_number;
///
/// assert_eq!(parse_number::<u16>("0x1234"), Ok(0x1234));
/// assert_eq!(parse_number::<u8>("255"), Ok(255));
/// assert!(parse_number::<u8>("256").is_err());
/// ```
pub fn parse_number<T: TryFrom<u32>>(token: &str) -> Result<T, ParseError> {
    let (digits, radix) = match token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (token, 10),
    };

    if digits.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut value: u32 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(radix).ok_or(ParseError::InvalidDigit)?;
        value = value
            .checked_mul(radix)
            .and_then(|v| v.checked_add(digit))
            .ok_or(ParseError::Overflow)?;
    }

    T::try_from(value).map_err(|_| ParseError::Overflow)
}
