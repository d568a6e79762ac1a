// 🏷️ GS1 Decoder - token string → ParsedCode
//
// The parenthesized string is split into (AI, value) fields first; each
// extractor then reads the field it cares about. Extractors are independent,
// so field order in the scan never matters.

use crate::config::ScanConfig;
use crate::expiry::{self, ExpiryStatus};
use crate::gtin;
use crate::normalizer::{self, is_delimiter};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// PARSED CODE
// ============================================================================

/// Normalized product record extracted from one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCode {
    pub raw: String,

    /// True iff an identifier could be extracted
    pub valid: bool,

    /// 14-digit left-zero-padded identifier (empty when not valid)
    pub gtin14: String,

    pub gtin13: String,

    pub expiry_iso: Option<NaiveDate>,

    /// DDMMYY
    pub expiry_compact: String,

    /// DD/MM/YYYY
    pub expiry_display: String,

    pub expiry_status: ExpiryStatus,

    pub batch: String,

    pub serial: String,

    /// Always >= 1
    pub quantity: u32,
}

impl ParsedCode {
    /// Empty, invalid record for `raw`
    pub fn empty(raw: &str) -> Self {
        ParsedCode {
            raw: raw.to_string(),
            valid: false,
            gtin14: String::new(),
            gtin13: String::new(),
            expiry_iso: None,
            expiry_compact: String::new(),
            expiry_display: String::new(),
            expiry_status: ExpiryStatus::Missing,
            batch: String::new(),
            serial: String::new(),
            quantity: 1,
        }
    }

    /// Set both identifier forms from a 12-14 digit GTIN
    fn set_gtin(&mut self, digits: &str) {
        self.gtin14 = gtin::to_gtin14(digits);
        self.gtin13 = gtin::drop_leading_zero(&self.gtin14).to_string();
        self.valid = true;
    }

    fn set_expiry(&mut self, exp: &expiry::Expiry, today: NaiveDate, soon_days: i64) {
        self.expiry_iso = Some(exp.date);
        self.expiry_compact = exp.compact.clone();
        self.expiry_display = exp.display.clone();
        self.expiry_status = exp.status(today, soon_days);
    }
}

// ============================================================================
// AI FIELD TOKENIZER
// ============================================================================

/// One "(AI)value" field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiField {
    pub ai: String,
    pub value: String,
}

/// Split a parenthesized GS1 string into fields.
///
/// A value runs to the next "(" or delimiter; delimiters are dropped and the
/// value trimmed. Text outside any "(AI)" marker is ignored.
pub fn tokenize(text: &str) -> Vec<AiField> {
    let chars: Vec<char> = text.chars().collect();
    let mut fields = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        if chars[i] != '(' {
            i += 1;
            continue;
        }

        let close = match chars[i + 1..].iter().position(|&c| c == ')') {
            Some(offset) => i + 1 + offset,
            None => break,
        };

        let ai: String = chars[i + 1..close].iter().collect();
        if !(2..=4).contains(&ai.len()) || !ai.bytes().all(|b| b.is_ascii_digit()) {
            i += 1;
            continue;
        }

        let start = close + 1;
        let mut end = start;
        while end < chars.len() && chars[end] != '(' && !is_delimiter(chars[end]) {
            end += 1;
        }

        let value: String = chars[start..end].iter().collect();
        fields.push(AiField {
            ai,
            value: value.trim().to_string(),
        });
        i = end;
    }

    fields
}

/// First value for `ai`
fn field<'a>(fields: &'a [AiField], ai: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|f| f.ai == ai)
        .map(|f| f.value.as_str())
}

/// Leading run of ASCII digits
fn leading_digits(value: &str) -> &str {
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    &value[..end]
}

// ============================================================================
// EXTRACTORS
// ============================================================================

/// (01): 12-14 digits, at most the first 14 of a longer run
fn extract_gtin(fields: &[AiField]) -> Option<&str> {
    let digits = leading_digits(field(fields, "01")?);
    if digits.len() < 12 {
        return None;
    }
    Some(&digits[..digits.len().min(14)])
}

/// (17): exactly 6 digits
fn extract_expiry(fields: &[AiField]) -> Option<&str> {
    let digits = leading_digits(field(fields, "17")?);
    if digits.len() < 6 {
        return None;
    }
    Some(&digits[..6])
}

/// (10) batch / (21) serial
fn extract_text(fields: &[AiField], ai: &str) -> Option<String> {
    let value = field(fields, ai)?;
    let cleaned: String = value.chars().filter(|&c| !is_delimiter(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// (30): count; 0 or unparseable falls back to the default of 1
fn extract_quantity(fields: &[AiField]) -> Option<u32> {
    leading_digits(field(fields, "30")?)
        .parse::<u32>()
        .ok()
        .filter(|&q| q >= 1)
}

// ============================================================================
// DECODER
// ============================================================================

pub struct Gs1Decoder {
    /// Days before expiry that count as "soon" (default: 90)
    pub expiry_soon_days: i64,
}

impl Gs1Decoder {
    pub fn new() -> Self {
        Gs1Decoder::from_config(&ScanConfig::default())
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Gs1Decoder {
            expiry_soon_days: config.expiry_soon_days,
        }
    }

    /// Decode a raw scan, classifying expiry against the local calendar day
    pub fn decode(&self, raw: &str) -> ParsedCode {
        self.decode_as_of(raw, Local::now().date_naive())
    }

    /// Decode a raw scan with an explicit "today"
    pub fn decode_as_of(&self, raw: &str, today: NaiveDate) -> ParsedCode {
        let mut parsed = ParsedCode::empty(raw);
        let scan = normalizer::normalize(raw);

        if scan.cleaned.is_empty() {
            return parsed;
        }

        if scan.is_plain_code() {
            parsed.gtin14 = gtin::to_gtin14(&scan.text);
            parsed.gtin13 = scan.text.chars().take(13).collect();
            parsed.valid = true;
            return parsed;
        }

        self.apply_fields(&mut parsed, &tokenize(&scan.text), today);
        parsed
    }

    /// Run every extractor against an already tokenized field list
    pub fn apply_fields(&self, parsed: &mut ParsedCode, fields: &[AiField], today: NaiveDate) {
        if let Some(digits) = extract_gtin(fields) {
            parsed.set_gtin(digits);
        }

        if let Some(exp) = extract_expiry(fields).and_then(expiry::decode_yymmdd) {
            parsed.set_expiry(&exp, today, self.expiry_soon_days);
        }

        if let Some(batch) = extract_text(fields, "10") {
            parsed.batch = batch;
        }

        if let Some(serial) = extract_text(fields, "21") {
            parsed.serial = serial;
        }

        parsed.quantity = extract_quantity(fields).unwrap_or(1);
    }
}

impl Default for Gs1Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a raw scan with the default configuration. Never fails: unusable
/// input comes back with `valid == false`.
pub fn normalize_and_decode(raw: &str) -> ParsedCode {
    Gs1Decoder::new().decode(raw)
}
