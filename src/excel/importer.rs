//! Excel importer implementation - uploaded workbook → validated records

use super::cell::formatted_value;
use super::format::SourceFormat;
use crate::column::cell_reference;
use crate::error::{BoxError, SheetError, SheetResult};
use crate::schema::Schema;
use crate::types::Record;
use crate::validation::RecordValidator;
use calamine::{open_workbook, Ods, Reader, Sheets, Xls, Xlsb, Xlsx};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// An uploaded file: its extension and raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub filename: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let extension = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        Self {
            filename,
            extension,
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> SheetResult<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self::new(filename, bytes))
    }
}

/// Where uploads are looked up by form-field key.
pub trait UploadSource {
    fn file(&self, key: &str) -> Option<&UploadedFile>;
}

impl UploadSource for HashMap<String, UploadedFile> {
    fn file(&self, key: &str) -> Option<&UploadedFile> {
        self.get(key)
    }
}

/// Result of an import call.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// Nothing was uploaded under the key
    NoFile,
    /// Records collected in sheet order
    Records(Vec<Record>),
    /// Every record went to the consumer
    Consumed { rows: usize },
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ImportOutcome::NoFile)
    }

    pub fn records(&self) -> Option<&[Record]> {
        match self {
            ImportOutcome::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn into_records(self) -> Option<Vec<Record>> {
        match self {
            ImportOutcome::Records(records) => Some(records),
            _ => None,
        }
    }
}

/// One data row as formatted text, columns A..=last.
struct SheetRow {
    /// 1-based spreadsheet row number
    number: u32,
    cells: Vec<String>,
}

/// Reads data rows of the first sheet into records shaped by a schema.
pub struct SheetImporter<'a> {
    schema: &'a Schema,
    validator: Option<&'a dyn RecordValidator>,
    scratch_dir: Option<&'a Path>,
}

impl<'a> SheetImporter<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            validator: None,
            scratch_dir: None,
        }
    }

    pub fn with_validator(mut self, validator: &'a dyn RecordValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_scratch_dir(mut self, dir: &'a Path) -> Self {
        self.scratch_dir = Some(dir);
        self
    }

    /// Import every record into memory.
    pub fn import(&self, file: &UploadedFile) -> SheetResult<Vec<Record>> {
        let mut records = Vec::new();
        self.run(file, &mut |record| {
            records.push(record);
            Ok(())
        })?;
        Ok(records)
    }

    /// Hand each record to `consumer`; returns how many were consumed.
    ///
    /// A consumer failure aborts the import as `SheetError::Import`.
    pub fn import_each<F, E>(&self, file: &UploadedFile, mut consumer: F) -> SheetResult<usize>
    where
        F: FnMut(Record) -> Result<(), E>,
        E: Into<BoxError>,
    {
        self.run(file, &mut |record| consumer(record).map_err(Into::into))
    }

    fn run(
        &self,
        file: &UploadedFile,
        sink: &mut dyn FnMut(Record) -> Result<(), BoxError>,
    ) -> SheetResult<usize> {
        // removed on drop, whichever way this function returns
        let scratch = self.write_scratch(file)?;
        let format = SourceFormat::detect(&file.extension, &file.bytes)?;

        let width = self.schema.len();
        debug!(
            file = %file.filename,
            scratch = %scratch.path().display(),
            ?format,
            "reading upload"
        );

        let rows = read_rows(scratch.path(), format, width)?;
        if let Some(last) = rows.last() {
            let end = cell_reference(self.schema.last_offset(), last.number);
            debug!(rows = rows.len(), range = %format!("A2:{end}"), "upload rows read");
        }
        let mut count = 0;

        for row in rows {
            let record = self.assemble(&row);
            if record.is_empty() {
                continue;
            }

            if let Some(validator) = self.validator {
                if let Err(messages) = validator.validate(&record) {
                    let message = messages
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| "Validation failed".to_string());
                    warn!(row = row.number, %message, "import validation failed");
                    return Err(SheetError::Validation {
                        row: row.number,
                        message,
                    });
                }
            }

            if let Err(e) = sink(record) {
                warn!(row = row.number, error = %e, "import consumer failed");
                return Err(SheetError::import(e));
            }
            count += 1;
        }

        info!(file = %file.filename, rows = count, "import complete");
        Ok(count)
    }

    fn write_scratch(&self, file: &UploadedFile) -> SheetResult<NamedTempFile> {
        let suffix = if file.extension.is_empty() {
            String::new()
        } else {
            format!(".{}", file.extension)
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix("import_").suffix(&suffix);

        let mut scratch = match self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        scratch.write_all(&file.bytes)?;
        scratch.flush()?;
        Ok(scratch)
    }

    /// Map one row's cells onto schema fields.
    fn assemble(&self, row: &SheetRow) -> Record {
        let mut record = Record::new();
        for (offset, formatted) in row.cells.iter().enumerate() {
            let Some(field) = self.schema.get(offset) else {
                continue;
            };
            if field.only_export || formatted.is_empty() {
                continue;
            }
            record.insert(field.name.clone(), field.dict_data.resolve_import(formatted));
        }
        record
    }
}

fn read_rows(path: &Path, format: SourceFormat, width: usize) -> SheetResult<Vec<SheetRow>> {
    match format {
        SourceFormat::Csv => read_csv_rows(path, width),
        _ => read_workbook_rows(path, format, width),
    }
}

fn open_error(e: impl std::fmt::Display) -> SheetError {
    SheetError::UnsupportedFormat(format!("Failed to open workbook: {}", e))
}

fn read_workbook_rows(
    path: &Path,
    format: SourceFormat,
    width: usize,
) -> SheetResult<Vec<SheetRow>> {
    let mut workbook: Sheets<_> = match format {
        SourceFormat::Xls => Sheets::Xls(open_workbook::<Xls<_>, _>(path).map_err(open_error)?),
        SourceFormat::Xlsb => Sheets::Xlsb(open_workbook::<Xlsb<_>, _>(path).map_err(open_error)?),
        SourceFormat::Ods => Sheets::Ods(open_workbook::<Ods<_>, _>(path).map_err(open_error)?),
        SourceFormat::Xlsx | SourceFormat::Csv => {
            Sheets::Xlsx(open_workbook::<Xlsx<_>, _>(path).map_err(open_error)?)
        }
    };

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::UnsupportedFormat("Workbook has no worksheets".to_string()))?
        .map_err(open_error)?;

    let Some((last_row, _)) = range.end() else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    // row index 0 is the header
    for row in 1..=last_row {
        let cells = (0..width)
            .map(|col| {
                range
                    .get_value((row, col as u32))
                    .map(formatted_value)
                    .unwrap_or_default()
            })
            .collect();
        rows.push(SheetRow {
            number: row + 1,
            cells,
        });
    }
    Ok(rows)
}

fn read_csv_rows(path: &Path, width: usize) -> SheetResult<Vec<SheetRow>> {
    let content = std::fs::read(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_slice());

    // record positions are taken before blank lines are skipped and their line
    // counter ignores them, so physical line numbers come from byte offsets
    let mut scanned = 0usize;
    let mut line = 1u32;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| SheetError::UnsupportedFormat(format!("Invalid CSV: {}", e)))?;
        let mut start = record
            .position()
            .map_or(scanned, |p| usize::try_from(p.byte()).unwrap_or(scanned))
            .clamp(scanned, content.len());
        while matches!(content.get(start), Some(b'\r' | b'\n')) {
            start += 1;
        }
        let newlines = content[scanned..start].iter().filter(|&&b| b == b'\n').count();
        line = line.saturating_add(u32::try_from(newlines).unwrap_or(u32::MAX));
        scanned = start;

        if index == 0 {
            continue;
        }
        let cells = (0..width)
            .map(|col| record.get(col).unwrap_or_default().to_string())
            .collect();
        rows.push(SheetRow {
            number: line,
            cells,
        });
    }
    Ok(rows)
}
