//! Sheetbridge - schema-driven spreadsheet import/export
//!
//! A single configuration describes the columns of a sheet: their order,
//! titles, styling, and optional value dictionaries. From it the library
//! exports records as a styled single-sheet workbook and imports uploaded
//! workbooks back into validated records.
//!
//! # Features
//!
//! - Export to .xlsx (or .csv) with bold headers, colors, alignment, widths
//! - Import from .xlsx, .xls, .xlsb, .ods and .csv uploads
//! - Dictionary translation between stored values and display labels
//! - Row validation with rule strings or JSON Schema
//! - Streaming import into a caller-supplied consumer
//! - axum HTTP adapter (`sheetbridge-server`)
//!
//! # Example
//!
//! ```no_run
//! use royalbit_sheetbridge::{SheetBridge, SheetConfig, UploadedFile};
//! use std::collections::HashMap;
//! use std::path::Path;
//!
//! let bridge = SheetBridge::new(SheetConfig::from_path(Path::new("users.yaml"))?)?;
//!
//! let mut uploads = HashMap::new();
//! uploads.insert(
//!     "file".to_string(),
//!     UploadedFile::from_path(Path::new("users.xlsx"))?,
//! );
//!
//! let records = bridge.import(&uploads)?.into_records().unwrap_or_default();
//! println!("Imported {} rows", records.len());
//! # Ok::<(), royalbit_sheetbridge::SheetError>(())
//! ```

pub mod api;
pub mod bridge;
pub mod column;
pub mod config;
pub mod dictionary;
pub mod download;
pub mod error;
pub mod excel;
pub mod producer;
pub mod schema;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use bridge::SheetBridge;
pub use column::{cell_reference, column_label, column_offset};
pub use config::{RuleSpec, SheetConfig};
pub use dictionary::{DictKey, Dictionary};
pub use download::Download;
pub use error::{SheetError, SheetResult};
pub use excel::{ExportFormat, ImportOutcome, UploadSource, UploadedFile};
pub use producer::ExportData;
pub use schema::Schema;
pub use types::{Align, FieldConfig, FieldDescriptor, HexColor, PropertyMap, Record};
pub use validation::{JsonSchemaValidator, RecordValidator, RuleSet};
