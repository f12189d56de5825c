/// Render a number the way a spreadsheet user typed it: integral values
/// without a fractional part, everything else in shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // also folds negative zero
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{}", value)
}

/// Parse a user-entered number, accepting a comma as decimal separator.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_values_have_no_fraction() {
        assert_eq!(format_number(35.0), "35");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn fractional_values_round_trip() {
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(0.1), "0.1");
    }

    #[test]
    fn parse_accepts_decimal_comma() {
        assert_eq!(parse_number("2,5"), Some(2.5));
        assert_eq!(parse_number(" 7 "), Some(7.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn formatted_numbers_parse_back(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
                prop_assert_eq!(parse_number(&format_number(v)), Some(v));
            }

            #[test]
            fn integral_values_print_as_integers(n in -999_999_999_999i64..999_999_999_999) {
                prop_assert_eq!(format_number(n as f64), n.to_string());
            }
        }
    }
}
