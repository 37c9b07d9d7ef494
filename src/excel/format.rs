//! Output formats for export and input format detection for import

use crate::error::{SheetError, SheetResult};
use std::fmt;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Export format. Unknown names fall back to `Xlsx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    /// Legacy extension; the payload is an OOXML workbook
    Xls,
    Csv,
}

impl ExportFormat {
    /// Case-insensitive; anything other than xlsx/xls/csv becomes `Xlsx`.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "xls" => ExportFormat::Xls,
            "csv" => ExportFormat::Csv,
            _ => ExportFormat::Xlsx,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Xls => "xls",
            ExportFormat::Csv => "csv",
        }
    }

    /// MIME type of the bytes actually produced.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx | ExportFormat::Xls => XLSX_CONTENT_TYPE,
            ExportFormat::Csv => CSV_CONTENT_TYPE,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Concrete container of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Xlsx,
    Xlsb,
    Xls,
    Ods,
    Csv,
}

impl SourceFormat {
    /// Detect from content signature, using the extension to pick among
    /// zip-based containers and to recognise CSV text.
    pub fn detect(extension: &str, bytes: &[u8]) -> SheetResult<Self> {
        let ext = extension.trim_start_matches('.').to_lowercase();

        if bytes.starts_with(ZIP_MAGIC) {
            return Ok(match ext.as_str() {
                "xlsb" => SourceFormat::Xlsb,
                "ods" => SourceFormat::Ods,
                _ => SourceFormat::Xlsx,
            });
        }
        if bytes.starts_with(OLE_MAGIC) {
            return Ok(SourceFormat::Xls);
        }
        if matches!(ext.as_str(), "csv" | "txt") && std::str::from_utf8(bytes).is_ok() {
            return Ok(SourceFormat::Csv);
        }

        Err(SheetError::UnsupportedFormat(if ext.is_empty() {
            "unrecognised file content".to_string()
        } else {
            format!("cannot read '.{}' file", ext)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient() {
        assert_eq!(ExportFormat::parse_lenient("xlsx"), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::parse_lenient("Xls"), ExportFormat::Xls);
        assert_eq!(ExportFormat::parse_lenient("CSV"), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse_lenient("PDF"), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::parse_lenient(""), ExportFormat::Xlsx);
    }

    #[test]
    fn test_extension_and_content_type() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Xls.to_string(), "xls");
        assert_eq!(ExportFormat::Xls.content_type(), XLSX_CONTENT_TYPE);
        assert_eq!(ExportFormat::Csv.content_type(), CSV_CONTENT_TYPE);
    }

    #[test]
    fn test_detect_by_signature() {
        assert_eq!(
            SourceFormat::detect("xlsx", b"PK\x03\x04rest").unwrap(),
            SourceFormat::Xlsx
        );
        // OOXML bytes under a legacy extension
        assert_eq!(
            SourceFormat::detect("xls", b"PK\x03\x04rest").unwrap(),
            SourceFormat::Xlsx
        );
        assert_eq!(
            SourceFormat::detect("", b"PK\x03\x04").unwrap(),
            SourceFormat::Xlsx
        );
        assert_eq!(
            SourceFormat::detect("ods", b"PK\x03\x04").unwrap(),
            SourceFormat::Ods
        );
        assert_eq!(
            SourceFormat::detect("bin", OLE_MAGIC).unwrap(),
            SourceFormat::Xls
        );
    }

    #[test]
    fn test_detect_csv_and_unsupported() {
        assert_eq!(
            SourceFormat::detect(".CSV", b"id,name\n1,a\n").unwrap(),
            SourceFormat::Csv
        );
        let err = SourceFormat::detect("pdf", b"%PDF-1.7").unwrap_err();
        assert!(matches!(err, SheetError::UnsupportedFormat(_)));
        assert!(SourceFormat::detect("csv", &[0xFF, 0xFE, 0x00]).is_err());
    }
}
