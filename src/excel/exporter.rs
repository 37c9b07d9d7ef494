//! Excel exporter implementation - records → styled workbook download

use super::format::ExportFormat;
use super::sink::{CsvSink, SheetSink, XlsxSink};
use crate::download::Download;
use crate::error::{SheetError, SheetResult};
use crate::producer::{ExportData, RowProducer};
use crate::schema::Schema;
use serde_json::Value;
use tracing::{debug, info};

/// Writes a dataset into a single-sheet workbook laid out by a schema.
pub struct SheetExporter<'a> {
    schema: &'a Schema,
}

impl<'a> SheetExporter<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Export `data` as `<filename>.<format>`.
    ///
    /// Row 1 holds the bold field titles; records follow from row 2 in the
    /// order the data yields them. The workbook lives only for this call.
    pub fn export(
        &self,
        filename: &str,
        data: ExportData,
        format: ExportFormat,
    ) -> SheetResult<Download> {
        let fields = self.schema.fields();
        let mut sink: Box<dyn SheetSink> = match format {
            ExportFormat::Csv => Box::new(CsvSink::new(fields.len())),
            ExportFormat::Xlsx | ExportFormat::Xls => Box::new(XlsxSink::new(fields)),
        };

        for (col, field) in fields.iter().enumerate() {
            sink.write_header(column_number(col)?, field)?;
        }
        sink.end_row()?;

        let mut rows: u32 = 0;
        for values in RowProducer::new(self.schema, data.into_records()) {
            rows = rows
                .checked_add(1)
                .ok_or_else(|| SheetError::Export("Too many rows".to_string()))?;

            for (col, (field, value)) in fields.iter().zip(values.iter()).enumerate() {
                let col = column_number(col)?;
                let display = if field.dict_data.is_empty() {
                    None
                } else {
                    field.dict_data.display_for(value)
                };
                match display {
                    Some(text) => {
                        sink.write_cell(rows, col, &Value::String(text.to_string()))?
                    }
                    None => sink.write_cell(rows, col, value)?,
                }
            }
            sink.end_row()?;
        }
        debug!(rows, columns = fields.len(), "rows written");

        let body = sink.finish()?;
        let download = Download::new(
            format!("{}.{}", filename, format.extension()),
            format.content_type(),
            body,
        );

        info!(
            filename = %download.filename,
            format = %format,
            rows,
            bytes = download.body.len(),
            "export complete"
        );

        Ok(download)
    }
}

fn column_number(col: usize) -> SheetResult<u16> {
    u16::try_from(col).map_err(|_| SheetError::Export(format!("Column {} out of range", col)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldConfig, PropertyMap, Record};
    use serde_json::json;

    fn schema() -> Schema {
        let mut property = PropertyMap::new();
        property.insert("id".to_string(), FieldConfig::new(0).with_title("ID"));
        property.insert(
            "status".to_string(),
            FieldConfig::new(1).with_dict([(0, "inactive"), (1, "active")]),
        );
        Schema::parse(&property).unwrap()
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_csv_export_substitutes_dictionary() {
        let schema = schema();
        let exporter = SheetExporter::new(&schema);
        let data = vec![
            record(json!({"id": 1, "status": 1})),
            record(json!({"id": 2, "status": 5, "ignored": "x"})),
            record(json!({"status": "0"})),
        ];

        let download = exporter
            .export("users", data.into(), ExportFormat::Csv)
            .unwrap();

        assert_eq!(download.filename, "users.csv");
        assert_eq!(
            String::from_utf8(download.body).unwrap(),
            "ID,status\n1,active\n2,5\n,inactive\n"
        );
    }

    #[test]
    fn test_xlsx_export_empty_dataset() {
        let schema = schema();
        let download = SheetExporter::new(&schema)
            .export("empty", Vec::new().into(), ExportFormat::Xlsx)
            .unwrap();
        assert_eq!(download.filename, "empty.xlsx");
        assert!(download.body.starts_with(b"PK\x03\x04"));
    }

    #[test]
    fn test_column_number_bounds() {
        assert_eq!(column_number(16383).unwrap(), 16383);
        assert!(column_number(70000).is_err());
    }
}
