//! Spreadsheet import/export
//!
//! - Export: records → styled .xlsx (or .csv) download
//! - Import: uploaded .xlsx/.xls/.xlsb/.ods/.csv → records

mod cell;
mod exporter;
mod format;
mod importer;
mod sink;

pub use cell::{format_float, formatted_value, text_value};
pub use exporter::SheetExporter;
pub use format::{ExportFormat, SourceFormat, CSV_CONTENT_TYPE, XLSX_CONTENT_TYPE};
pub use importer::{ImportOutcome, SheetImporter, UploadSource, UploadedFile};
