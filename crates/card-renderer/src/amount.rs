//! Token amount formatting for card display.

const WEI_PER_TOKEN: u128 = 1_000_000_000_000_000_000;
const TOKEN_SYMBOL: &str = "METIS";

/// Format a wei-denominated amount for display on a card, e.g.
/// `1.5 METIS`. Trailing zeros in the fractional part are trimmed.
pub fn format_amount(wei: u128) -> String {
    let whole = wei / WEI_PER_TOKEN;
    let frac = wei % WEI_PER_TOKEN;

    if frac == 0 {
        return format!("{} {}", whole, TOKEN_SYMBOL);
    }

    let frac = format!("{:018}", frac);
    let frac = frac.trim_end_matches('0');
    format!("{}.{} {}", whole, frac, TOKEN_SYMBOL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert_eq!(format_amount(0), "0 METIS");
    }

    #[test]
    fn test_whole_tokens() {
        assert_eq!(format_amount(WEI_PER_TOKEN), "1 METIS");
        assert_eq!(format_amount(42 * WEI_PER_TOKEN), "42 METIS");
    }

    #[test]
    fn test_fractional_trims_trailing_zeros() {
        assert_eq!(format_amount(1_500_000_000_000_000_000), "1.5 METIS");
        assert_eq!(format_amount(2_250_000_000_000_000_000), "2.25 METIS");
    }

    #[test]
    fn test_sub_unit_amount_keeps_leading_zeros() {
        assert_eq!(format_amount(1), "0.000000000000000001 METIS");
        assert_eq!(format_amount(10_000_000_000_000_000), "0.01 METIS");
    }
}
