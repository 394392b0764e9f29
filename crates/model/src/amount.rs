use crate::cell::Cell;

const CURRENCY_SIGNS: [char; 1] = ['€'];

/// Amount column value as it is written to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Amount {
    Empty,
    Number(f64),
    /// Source text that could not be read as a number, kept untouched.
    Raw(String),
}

impl Amount {
    /// Strips currency signs and whitespace, turns commas into dots and reads
    /// the last separator as the decimal point. Everything before it is
    /// concatenated into the integer part, so `1.234,50 €` becomes `1234.50`.
    pub fn normalize(raw: &str) -> Amount {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && !CURRENCY_SIGNS.contains(c))
            .collect();
        if cleaned.is_empty() {
            return Amount::Empty;
        }

        let dotted = cleaned.replace(',', ".");
        let candidate = match dotted.rsplit_once('.') {
            Some((int_part, dec_part)) => format!("{}.{}", int_part.replace('.', ""), dec_part),
            None => dotted,
        };

        match parse_plain_number(&candidate) {
            Some(value) => Amount::Number(value),
            None => Amount::Raw(raw.to_owned()),
        }
    }
}

// Only sign, digits and a single dot. `f64::from_str` also takes "inf" and "NaN".
fn parse_plain_number(value: &str) -> Option<f64> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    value.parse::<f64>().ok()
}

impl From<Amount> for Cell {
    fn from(amount: Amount) -> Self {
        match amount {
            Amount::Empty => Cell::Empty,
            Amount::Number(value) => Cell::Number(value),
            Amount::Raw(text) => Cell::Text(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands_and_decimal_comma() {
        assert_eq!(Amount::normalize("1.234,50 €"), Amount::Number(1234.50));
    }

    #[test]
    fn test_plain_integer() {
        assert_eq!(Amount::normalize("15"), Amount::Number(15.0));
    }

    #[test]
    fn test_empty() {
        assert_eq!(Amount::normalize(""), Amount::Empty);
        assert_eq!(Amount::normalize("   "), Amount::Empty);
        assert_eq!(Amount::normalize(" € "), Amount::Empty);
    }

    #[test]
    fn test_non_numeric_passthrough() {
        assert_eq!(Amount::normalize("n/a"), Amount::Raw("n/a".to_owned()));
        assert_eq!(Amount::normalize("NaN"), Amount::Raw("NaN".to_owned()));
        assert_eq!(Amount::normalize("12.-"), Amount::Raw("12.-".to_owned()));
    }

    #[test]
    fn test_decimal_comma_and_nbsp() {
        assert_eq!(Amount::normalize("12,50"), Amount::Number(12.5));
        assert_eq!(Amount::normalize("€\u{a0}7,00"), Amount::Number(7.0));
    }

    #[test]
    fn test_last_separator_is_decimal_point() {
        assert_eq!(Amount::normalize("1,234.56"), Amount::Number(1234.56));
        assert_eq!(Amount::normalize("1.000.000,5"), Amount::Number(1000000.5));
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(Amount::normalize("-25,00 €"), Amount::Number(-25.0));
    }

    #[test]
    fn test_into_cell() {
        assert_eq!(Cell::from(Amount::Empty), Cell::Empty);
        assert_eq!(Cell::from(Amount::Number(1.5)), Cell::Number(1.5));
        assert_eq!(
            Cell::from(Amount::Raw("n/a".to_owned())),
            Cell::Text("n/a".to_owned())
        );
    }
}
