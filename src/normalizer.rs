// 🧹 Code Normalizer - raw scan text → parenthesized GS1 token string
//
// Three input shapes are handled:
// 1. "(01)05012345678900(17)250228(10)L123"  already parenthesized
// 2. "0105012345678900<GS>10L123<GS>21X"       raw GS1 with group separators
// 3. "5012345678900"                           bare numeric / internal code

use serde::{Deserialize, Serialize};

/// ASCII Group Separator (FNC1 in raw GS1 payloads)
pub const GROUP_SEPARATOR: char = '\u{1D}';

/// Internal field terminator that replaces the group separator
pub const FIELD_DELIMITER: char = '|';

// ============================================================================
// AI TABLE
// ============================================================================

/// Length of the data field following an Application Identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLength {
    Fixed(usize),
    Variable,
}

/// Known Application Identifiers.
/// Lookup tries 3-digit AIs before 2-digit ones.
const AI_TABLE: &[(&str, FieldLength)] = &[
    ("00", FieldLength::Fixed(18)), // SSCC
    ("01", FieldLength::Fixed(14)), // GTIN
    ("02", FieldLength::Fixed(14)), // GTIN of contained items
    ("10", FieldLength::Variable),  // Batch / lot
    ("11", FieldLength::Fixed(6)),  // Production date
    ("13", FieldLength::Fixed(6)),  // Packaging date
    ("15", FieldLength::Fixed(6)),  // Best before
    ("17", FieldLength::Fixed(6)),  // Expiry
    ("20", FieldLength::Fixed(2)),  // Variant
    ("21", FieldLength::Variable),  // Serial
    ("22", FieldLength::Variable),  // Consumer product variant
    ("30", FieldLength::Variable),  // Variable count
    ("37", FieldLength::Variable),  // Count of trade items
];

/// Look up a known AI starting at `pos`
fn lookup_ai(chars: &[char], pos: usize) -> Option<(&'static str, FieldLength)> {
    for width in [3, 2] {
        if pos + width > chars.len() {
            continue;
        }
        let candidate: String = chars[pos..pos + width].iter().collect();
        if let Some((ai, len)) = AI_TABLE.iter().find(|(ai, _)| *ai == candidate) {
            return Some((*ai, *len));
        }
    }
    None
}

/// Pipe or any control char ends a variable-length field
pub fn is_delimiter(c: char) -> bool {
    c == FIELD_DELIMITER || c.is_control()
}

// ============================================================================
// SHAPE CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeShape {
    /// 5-21 digits without AI markup (EAN/UPC/GTIN printed plain)
    BareNumeric,

    /// 5-7 digits: pharmacy-internal short code
    ShortCode,

    /// Digits that start with AI 01 but carry no parentheses
    Headerless,

    /// Unparenthesized GS1 payload (group separators, no markers)
    RawGs1,

    /// Already in "(AI)value" form, or unrecognized text
    Parenthesized,
}

/// A scan after delimiter rewriting and shape detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedScan {
    pub shape: CodeShape,

    /// Trimmed input with group separators rewritten
    pub cleaned: String,

    /// "(AI)value" token string for AI shapes; the bare code otherwise
    pub text: String,
}

impl NormalizedScan {
    /// Shapes whose identifier is the code itself (no AI decoding)
    pub fn is_plain_code(&self) -> bool {
        matches!(self.shape, CodeShape::BareNumeric | CodeShape::ShortCode)
    }
}

/// Classify a raw scan and, where needed, insert AI markers.
pub fn normalize(raw: &str) -> NormalizedScan {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if c == GROUP_SEPARATOR { FIELD_DELIMITER } else { c })
        .collect();

    let has_paren = cleaned.contains('(');
    let all_digits = !cleaned.is_empty() && cleaned.bytes().all(|b| b.is_ascii_digit());
    let len = cleaned.len();

    // Rule 1: bare numeric, unless it is a headerless "01..." stream
    if !has_paren && all_digits && (5..=21).contains(&len) {
        if cleaned.starts_with("01") && len >= 16 {
            let text = convert_ai_tokens(&cleaned);
            return NormalizedScan {
                shape: CodeShape::Headerless,
                cleaned,
                text,
            };
        }

        // Rule 2 (5-7 digits) is a subset of rule 1 and shares its
        // identifier handling; only the reported shape differs.
        let shape = if len <= 7 {
            CodeShape::ShortCode
        } else {
            CodeShape::BareNumeric
        };
        return NormalizedScan {
            shape,
            text: cleaned.clone(),
            cleaned,
        };
    }

    // Rule 3: unparenthesized payload starting with two digits
    let starts_with_two_digits = cleaned
        .chars()
        .take(2)
        .filter(|c| c.is_ascii_digit())
        .count()
        == 2;

    if !has_paren && starts_with_two_digits {
        let text = convert_ai_tokens(&cleaned);
        return NormalizedScan {
            shape: CodeShape::RawGs1,
            cleaned,
            text,
        };
    }

    NormalizedScan {
        shape: CodeShape::Parenthesized,
        text: cleaned.clone(),
        cleaned,
    }
}

// ============================================================================
// AI-TOKEN CONVERSION
// ============================================================================

/// Insert "(AI)" markers into an unparenthesized GS1 payload.
///
/// Best effort: unknown characters are skipped one at a time, a fixed field
/// truncated by the end of input keeps what is there, and when no field at
/// all can be recovered the input is returned unchanged.
pub fn convert_ai_tokens(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut emitted = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        if is_delimiter(chars[i]) {
            i += 1;
            continue;
        }

        let (ai, length) = match lookup_ai(&chars, i) {
            Some(found) => found,
            None => {
                i += 1;
                continue;
            }
        };
        i += ai.len();

        let value: String = match length {
            FieldLength::Fixed(n) => {
                let end = (i + n).min(chars.len());
                let v = chars[i..end].iter().collect();
                i = end;
                v
            }
            FieldLength::Variable => {
                let start = i;
                let mut end = i;
                while i < chars.len() {
                    if is_delimiter(chars[i]) {
                        i += 1;
                        break;
                    }
                    if i > start && lookup_ai(&chars, i).is_some() {
                        break;
                    }
                    i += 1;
                    end = i;
                }
                chars[start..end].iter().collect()
            }
        };

        if value.is_empty() {
            continue;
        }

        out.push('(');
        out.push_str(ai);
        out.push(')');
        out.push_str(&value);
        emitted += 1;
    }

    if emitted == 0 {
        log::debug!("No AI recovered from {:?}, keeping input as-is", input);
        return input.to_string();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_ean13() {
        let scan = normalize("  5012345678900 ");
        assert_eq!(scan.shape, CodeShape::BareNumeric);
        assert_eq!(scan.text, "5012345678900");
        assert!(scan.is_plain_code());
    }

    #[test]
    fn test_short_code_shape() {
        let scan = normalize("12345");
        assert_eq!(scan.shape, CodeShape::ShortCode);
        assert!(scan.is_plain_code());
    }

    #[test]
    fn test_too_short_is_not_numeric() {
        let scan = normalize("1234");
        assert!(!scan.is_plain_code());
    }

    #[test]
    fn test_headerless_01_stream() {
        let scan = normalize("010501234567890010123");
        assert_eq!(scan.shape, CodeShape::Headerless);
        assert_eq!(scan.text, "(01)05012345678900(10)123");
    }

    #[test]
    fn test_long_digit_stream_is_raw_gs1() {
        // Past 21 digits the bare-numeric rule no longer applies
        let scan = normalize("010501234567890017250228100123");
        assert_eq!(scan.shape, CodeShape::RawGs1);
        assert_eq!(scan.text, "(01)05012345678900(17)250228(10)0123");
    }

    #[test]
    fn test_headerless_requires_16_digits() {
        // 15 digits starting with 01 is still a plain code
        let scan = normalize("012345678901234");
        assert_eq!(scan.shape, CodeShape::BareNumeric);
    }

    #[test]
    fn test_group_separator_rewritten() {
        let raw = "0105012345678900\u{1D}10LOT42\u{1D}21SER9";
        let scan = normalize(raw);
        assert_eq!(scan.shape, CodeShape::RawGs1);
        assert!(scan.cleaned.contains('|'));
        assert_eq!(scan.text, "(01)05012345678900(10)LOT42(21)SER9");
    }

    #[test]
    fn test_parenthesized_passthrough() {
        let scan = normalize("(01)05012345678900(17)250228");
        assert_eq!(scan.shape, CodeShape::Parenthesized);
        assert_eq!(scan.text, "(01)05012345678900(17)250228");
    }

    #[test]
    fn test_convert_fixed_and_variable_fields() {
        let converted = convert_ai_tokens("010501234567890017250228|10ABC|21XYZ");
        assert_eq!(converted, "(01)05012345678900(17)250228(10)ABC(21)XYZ");
    }

    #[test]
    fn test_variable_field_stops_at_next_ai() {
        // No separator after the batch: "17" starts a new field
        let converted = convert_ai_tokens("10ABC17250228");
        assert_eq!(converted, "(10)ABC(17)250228");
    }

    #[test]
    fn test_variable_field_keeps_first_char() {
        // "10" right after the serial AI is data, not a new field: a field
        // never ends before it has consumed anything.
        let converted = convert_ai_tokens("2110XY");
        assert_eq!(converted, "(21)10XY");
    }

    #[test]
    fn test_leading_noise_skipped() {
        let converted = convert_ai_tokens("**0105012345678900");
        assert_eq!(converted, "(01)05012345678900");
    }

    #[test]
    fn test_truncated_fixed_field() {
        let converted = convert_ai_tokens("172502");
        assert_eq!(converted, "(17)2502");
    }

    #[test]
    fn test_quantity_field() {
        let converted = convert_ai_tokens("0105012345678900|30007");
        assert_eq!(converted, "(01)05012345678900(30)007");
    }

    #[test]
    fn test_nothing_recoverable_returns_input() {
        assert_eq!(convert_ai_tokens("ABCDEF"), "ABCDEF");
        assert_eq!(convert_ai_tokens(""), "");
    }
}
