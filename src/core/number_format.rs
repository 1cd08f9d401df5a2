/*
 * Human-readable formatting of token totals. Digits are grouped in threes from
 * the least significant end and separated by a single space.
 */

pub fn format_number(number: usize) -> String {
    let digits = number.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            formatted.push(' ');
        }
        formatted.push(digit);
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_groups_millions() {
        assert_eq!(format_number(1_234_567), "1 234 567");
    }

    #[test]
    fn test_format_number_leaves_short_numbers_alone() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(7), "7");
        assert_eq!(format_number(999), "999");
    }

    #[test]
    fn test_format_number_group_boundaries() {
        assert_eq!(format_number(1000), "1 000");
        assert_eq!(format_number(12_345), "12 345");
        assert_eq!(format_number(100_000), "100 000");
        assert_eq!(format_number(1_000_000), "1 000 000");
    }
}
