// 📤 Scan History Export - CSV / TSV
//
// A ScanRecord is one decoded + matched scan with its own identity and
// timestamp. Export flattens it into a fixed column layout.

use crate::gs1::ParsedCode;
use crate::matcher::MatchResult;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

// ============================================================================
// SCAN RECORD
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Stable identity of the scan (UUID v4)
    pub id: String,

    pub scanned_at: DateTime<Utc>,

    pub parsed: ParsedCode,

    #[serde(rename = "match")]
    pub matched: MatchResult,
}

impl ScanRecord {
    pub fn new(parsed: ParsedCode, matched: MatchResult) -> Self {
        ScanRecord {
            id: uuid::Uuid::new_v4().to_string(),
            scanned_at: Utc::now(),
            parsed,
            matched,
        }
    }
}

// ============================================================================
// EXPORT FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
}

impl ExportFormat {
    fn delimiter(&self) -> u8 {
        match self {
            ExportFormat::Csv => b',',
            ExportFormat::Tsv => b'\t',
        }
    }

    /// Pick the format from a file extension (".tsv" → Tsv, anything else → Csv)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => ExportFormat::Tsv,
            _ => ExportFormat::Csv,
        }
    }
}

/// One exported line
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Scanned_At")]
    scanned_at: String,

    #[serde(rename = "GTIN14")]
    gtin14: &'a str,

    #[serde(rename = "GTIN13")]
    gtin13: &'a str,

    #[serde(rename = "Product")]
    product: &'a str,

    #[serde(rename = "Match_Type")]
    match_type: &'static str,

    #[serde(rename = "Expiry")]
    expiry: &'a str,

    #[serde(rename = "Expiry_Status")]
    expiry_status: &'static str,

    #[serde(rename = "Batch")]
    batch: &'a str,

    #[serde(rename = "Serial")]
    serial: &'a str,

    #[serde(rename = "Quantity")]
    quantity: u32,

    #[serde(rename = "Raw")]
    raw: &'a str,

    #[serde(rename = "Scan_Id")]
    id: &'a str,
}

impl<'a> From<&'a ScanRecord> for ExportRow<'a> {
    fn from(record: &'a ScanRecord) -> Self {
        ExportRow {
            scanned_at: record.scanned_at.to_rfc3339(),
            gtin14: &record.parsed.gtin14,
            gtin13: &record.parsed.gtin13,
            product: &record.matched.product_name,
            match_type: record.matched.match_type.as_str(),
            expiry: &record.parsed.expiry_display,
            expiry_status: record.parsed.expiry_status.as_str(),
            batch: &record.parsed.batch,
            serial: &record.parsed.serial,
            quantity: record.parsed.quantity,
            raw: &record.parsed.raw,
            id: &record.id,
        }
    }
}

/// Write records (with a header row) to any writer; returns rows written
pub fn write_records<W: Write>(
    writer: W,
    format: ExportFormat,
    records: &[ScanRecord],
) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(writer);

    for record in records {
        csv_writer
            .serialize(ExportRow::from(record))
            .with_context(|| format!("Failed to write scan {}", record.id))?;
    }

    csv_writer.flush().context("Failed to flush export")?;
    Ok(records.len())
}

/// Export to a file; format follows the extension
pub fn export_to_file(path: &Path, records: &[ScanRecord]) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;

    write_records(file, ExportFormat::from_path(path), records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gs1::Gs1Decoder;
    use crate::matcher::MatchType;
    use chrono::NaiveDate;

    fn record(raw: &str, product: &str) -> ScanRecord {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let parsed = Gs1Decoder::new().decode_as_of(raw, today);
        ScanRecord::new(parsed, MatchResult::exact(product))
    }

    #[test]
    fn test_scan_record_identity() {
        let a = record("5012345678900", "A");
        let b = record("5012345678900", "A");
        assert_ne!(a.id, b.id);
        assert_eq!(a.matched.match_type, MatchType::Exact);
    }

    #[test]
    fn test_csv_export() {
        let records = vec![record("(01)05012345678900(17)250228(10)L1(30)3", "Paracetamol, 500mg")];
        let mut out = Vec::new();

        let written = write_records(&mut out, ExportFormat::Csv, &records).unwrap();
        assert_eq!(written, 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Scanned_At,GTIN14,GTIN13,Product,Match_Type,Expiry,Expiry_Status,Batch,Serial,Quantity,Raw,Scan_Id"
        );
        let row = lines.next().unwrap();
        assert!(row.contains(",05012345678900,5012345678900,\"Paracetamol, 500mg\",EXACT,28/02/2025,soon,L1,,3,"));
    }

    #[test]
    fn test_tsv_export() {
        let records = vec![record("5012345678900", "Paracetamol")];
        let mut out = Vec::new();
        write_records(&mut out, ExportFormat::Tsv, &records).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Scanned_At\tGTIN14\t"));
        assert!(text.contains("\t05012345678900\t5012345678900\tParacetamol\tEXACT\t\tmissing\t"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("scans.tsv")), ExportFormat::Tsv);
        assert_eq!(ExportFormat::from_path(Path::new("scans.TSV")), ExportFormat::Tsv);
        assert_eq!(ExportFormat::from_path(Path::new("scans.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("scans")), ExportFormat::Csv);
    }
}
