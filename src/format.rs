// Humane rendering of ingredient amounts

/// Render an amount as a kitchen-friendly fraction or rounded number.
///
/// Amounts below five snap to the nearest common fraction (`¼`, `⅓`, `½`,
/// `⅔`, `¾`) or mixed number; larger ones are truncated and rounded to three
/// significant digits.
pub fn format_num(num: f64) -> String {
    match num {
        n if n < 0.29 => "¼".to_string(),
        n if n < 0.4 => "⅓".to_string(),
        n if n < 0.6 => "½".to_string(),
        n if n < 0.7 => "⅔".to_string(),
        n if n <= 0.85 => "¾".to_string(),
        n if n <= 1.0 => "1".to_string(),
        n if n <= 1.85 => format!("1 {}", format_num(n - 1.0)),
        n if n <= 2.15 => "2".to_string(),
        n if n <= 2.35 => "2 ¼".to_string(),
        n if n <= 2.65 => "2 ½".to_string(),
        n if n <= 2.85 => "2 ¾".to_string(),
        n if n <= 3.25 => "3".to_string(),
        n if n <= 3.75 => "3 ½".to_string(),
        n if n <= 4.33 => "4".to_string(),
        n if n <= 5.0 => "5".to_string(),
        n => round_approximate(n).to_string(),
    }
}

/// Truncate to an integer and round to three significant digits, ties to even
fn round_approximate(num: f64) -> i64 {
    let n = num.trunc() as i64;
    if n == 0 {
        return 0;
    }

    let exponent = n.unsigned_abs().ilog10();
    if exponent <= 2 {
        return n;
    }

    let factor = 10_i64.pow(exponent - 2);
    let (quotient, remainder) = (n / factor, n % factor);
    let rounded = match (remainder * 2).cmp(&factor) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + quotient % 2,
    };
    rounded * factor
}

/// Smallest whole number covering `num`
pub fn round_up(num: f64) -> i64 {
    num.ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractions() {
        assert_eq!(format_num(0.1), "¼");
        assert_eq!(format_num(0.25), "¼");
        assert_eq!(format_num(0.33), "⅓");
        assert_eq!(format_num(0.5), "½");
        assert_eq!(format_num(0.66), "⅔");
        assert_eq!(format_num(0.75), "¾");
        assert_eq!(format_num(0.85), "¾");
        assert_eq!(format_num(0.9), "1");
    }

    #[test]
    fn test_mixed_numbers() {
        assert_eq!(format_num(1.5), "1 ½");
        assert_eq!(format_num(1.25), "1 ¼");
        assert_eq!(format_num(2.0), "2");
        assert_eq!(format_num(2.25), "2 ¼");
        assert_eq!(format_num(2.5), "2 ½");
        assert_eq!(format_num(2.8), "2 ¾");
        assert_eq!(format_num(3.5), "3 ½");
        assert_eq!(format_num(4.3), "4");
        assert_eq!(format_num(4.9), "5");
    }

    #[test]
    fn test_large_numbers_round_to_three_digits() {
        assert_eq!(format_num(6.7), "6");
        assert_eq!(format_num(250.0), "250");
        assert_eq!(format_num(1234.0), "1230");
        assert_eq!(format_num(1236.0), "1240");
        assert_eq!(format_num(1235.0), "1240");
        assert_eq!(format_num(1225.0), "1220");
        assert_eq!(format_num(98765.4), "98800");
    }

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(2.0), 2);
        assert_eq!(round_up(2.01), 3);
        assert_eq!(round_up(0.5), 1);
    }
}
