// 🔢 GTIN Helpers - digit canonicalization shared by decoder, index and matcher
// GTIN-14/13/12 are derived by dropping leading zeros, never by renumbering.

/// Widths that carry a GS1 check digit (EAN-8, UPC-A, EAN-13, GTIN-14)
pub const GTIN_LENGTHS: [usize; 4] = [8, 12, 13, 14];

/// Keep only ASCII digits
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True when every char is an ASCII digit (and there is at least one)
pub fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Left-pad with zeros up to `width`. Longer input is returned unchanged.
pub fn pad_left(s: &str, width: usize) -> String {
    format!("{:0>width$}", s, width = width)
}

/// GTIN-14 canonical form
pub fn to_gtin14(s: &str) -> String {
    pad_left(s, 14)
}

/// Drop exactly one leading zero, if there is one
pub fn drop_leading_zero(s: &str) -> &str {
    s.strip_prefix('0').unwrap_or(s)
}

/// Strip every leading zero
pub fn strip_leading_zeros(s: &str) -> &str {
    s.trim_start_matches('0')
}

/// Last `n` chars of an ASCII digit string (the whole string if shorter)
pub fn last_n(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[s.len() - n..]
    }
}

/// Is this a length that a canonical GTIN can have?
pub fn is_gtin_length(len: usize) -> bool {
    GTIN_LENGTHS.contains(&len)
}

/// GS1 mod-10 check digit for the payload (identifier without its check digit)
///
/// Weights alternate 3,1,3,... starting from the rightmost payload digit.
pub fn check_digit(payload: &str) -> Option<u32> {
    if !is_all_digits(payload) {
        return None;
    }

    let sum: u32 = payload
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = (b - b'0') as u32;
            if i % 2 == 0 { d * 3 } else { d }
        })
        .sum();

    Some((10 - sum % 10) % 10)
}

/// Validate the trailing check digit of an 8/12/13/14-digit identifier
pub fn has_valid_check_digit(code: &str) -> bool {
    if !is_all_digits(code) || !is_gtin_length(code.len()) {
        return false;
    }

    let (payload, last) = code.split_at(code.len() - 1);
    let expected = match check_digit(payload) {
        Some(d) => d,
        None => return false,
    };

    last.parse::<u32>().map(|d| d == expected).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("50-1234 5678x900"), "5012345678900");
        assert_eq!(digits_only("ABC"), "");
    }

    #[test]
    fn test_pad_left() {
        assert_eq!(pad_left("5012345678900", 14), "05012345678900");
        assert_eq!(pad_left("12345", 8), "00012345");
        assert_eq!(pad_left("123456789012345", 14), "123456789012345");
    }

    #[test]
    fn test_drop_leading_zero_only_once() {
        assert_eq!(drop_leading_zero("0012"), "012");
        assert_eq!(drop_leading_zero("12"), "12");
        assert_eq!(strip_leading_zeros("0012"), "12");
        assert_eq!(strip_leading_zeros("000"), "");
    }

    #[test]
    fn test_last_n() {
        assert_eq!(last_n("05012345678900", 8), "45678900");
        assert_eq!(last_n("1234", 8), "1234");
    }

    #[test]
    fn test_check_digit() {
        // EAN-13 4006381333931
        assert_eq!(check_digit("400638133393"), Some(1));
        // UPC-A 036000291452
        assert_eq!(check_digit("03600029145"), Some(2));
        assert_eq!(check_digit("12a"), None);
    }

    #[test]
    fn test_has_valid_check_digit() {
        assert!(has_valid_check_digit("4006381333931"));
        assert!(has_valid_check_digit("04006381333931"));
        assert!(has_valid_check_digit("036000291452"));
        assert!(!has_valid_check_digit("4006381333932"));
        // Internal short codes never carry a check digit
        assert!(!has_valid_check_digit("12345"));
    }
}
