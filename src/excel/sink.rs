//! Output sinks: the exporter writes cells, a sink turns them into file bytes

use super::cell::text_value;
use crate::error::{SheetError, SheetResult};
use crate::types::{Align, FieldDescriptor, HexColor};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};
use serde_json::Value;

/// Row-ordered cell writer. Row 0 is the header row.
pub(crate) trait SheetSink {
    fn write_header(&mut self, col: u16, field: &FieldDescriptor) -> SheetResult<()>;

    fn write_cell(&mut self, row: u32, col: u16, value: &Value) -> SheetResult<()>;

    /// Called after the last cell of every row, header included.
    fn end_row(&mut self) -> SheetResult<()>;

    fn finish(self: Box<Self>) -> SheetResult<Vec<u8>>;
}

fn export_error(what: &str) -> impl Fn(rust_xlsxwriter::XlsxError) -> SheetError + '_ {
    move |e| SheetError::Export(format!("Failed to {}: {}", what, e))
}

/// Integers beyond 2^53 lose digits as a double.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// The number as a double when no digits are lost; `None` means write it as text.
fn exact_f64(n: &serde_json::Number) -> Option<f64> {
    if let Some(i) = n.as_i64() {
        return (i.unsigned_abs() <= MAX_EXACT_INTEGER).then_some(i as f64);
    }
    if let Some(u) = n.as_u64() {
        return (u <= MAX_EXACT_INTEGER).then_some(u as f64);
    }
    n.as_f64()
}

fn to_format_align(align: Align) -> FormatAlign {
    match align {
        Align::General => FormatAlign::General,
        Align::Left => FormatAlign::Left,
        Align::Center => FormatAlign::Center,
        Align::Right => FormatAlign::Right,
        Align::Fill => FormatAlign::Fill,
        Align::Justify => FormatAlign::Justify,
        Align::CenterContinuous => FormatAlign::CenterAcross,
        Align::Distributed => FormatAlign::Distributed,
    }
}

fn to_color(color: HexColor) -> Color {
    Color::RGB(color.0)
}

/// Bold header format with the field's alignment and header colors.
fn header_format(field: &FieldDescriptor) -> Format {
    let mut format = Format::new().set_bold();
    if let Some(align) = field.align {
        format = format.set_align(to_format_align(align));
    }
    if let Some(color) = field.head_color {
        format = format.set_font_color(to_color(color));
    }
    if let Some(color) = field.head_bg_color {
        format = format.set_background_color(to_color(color));
    }
    format
}

fn body_format(field: &FieldDescriptor) -> Option<Format> {
    if !field.has_body_style() {
        return None;
    }
    let mut format = Format::new();
    if let Some(align) = field.align {
        format = format.set_align(to_format_align(align));
    }
    if let Some(color) = field.color {
        format = format.set_font_color(to_color(color));
    }
    if let Some(color) = field.bg_color {
        format = format.set_background_color(to_color(color));
    }
    Some(format)
}

/// Styled OOXML workbook with a single worksheet.
pub(crate) struct XlsxSink {
    worksheet: Worksheet,
    body_formats: Vec<Option<Format>>,
    widths: Vec<Option<f64>>,
}

impl XlsxSink {
    pub fn new(fields: &[FieldDescriptor]) -> Self {
        Self {
            worksheet: Worksheet::new(),
            body_formats: fields.iter().map(body_format).collect(),
            widths: fields.iter().map(|field| field.width).collect(),
        }
    }
}

impl SheetSink for XlsxSink {
    fn write_header(&mut self, col: u16, field: &FieldDescriptor) -> SheetResult<()> {
        self.worksheet
            .write_string_with_format(0, col, &field.title, &header_format(field))
            .map_err(export_error("write header"))?;
        Ok(())
    }

    fn write_cell(&mut self, row: u32, col: u16, value: &Value) -> SheetResult<()> {
        let format = self.body_formats.get(col as usize).and_then(Option::as_ref);
        let worksheet = &mut self.worksheet;

        let result = match (value, format) {
            (Value::Null, Some(format)) => worksheet.write_blank(row, col, format),
            (Value::Null, None) => return Ok(()),
            (Value::String(s), Some(format)) if s.is_empty() => {
                worksheet.write_blank(row, col, format)
            }
            (Value::String(s), None) if s.is_empty() => return Ok(()),
            (Value::String(s), Some(format)) => {
                worksheet.write_string_with_format(row, col, s, format)
            }
            (Value::String(s), None) => worksheet.write_string(row, col, s),
            (Value::Bool(b), Some(format)) => {
                worksheet.write_boolean_with_format(row, col, *b, format)
            }
            (Value::Bool(b), None) => worksheet.write_boolean(row, col, *b),
            (Value::Number(n), format) => match (exact_f64(n), format) {
                (Some(f), Some(format)) => worksheet.write_number_with_format(row, col, f, format),
                (Some(f), None) => worksheet.write_number(row, col, f),
                (None, Some(format)) => {
                    worksheet.write_string_with_format(row, col, n.to_string(), format)
                }
                (None, None) => worksheet.write_string(row, col, n.to_string()),
            },
            (other, Some(format)) => {
                worksheet.write_string_with_format(row, col, other.to_string(), format)
            }
            (other, None) => worksheet.write_string(row, col, other.to_string()),
        };

        result.map_err(export_error("write cell"))?;
        Ok(())
    }

    fn end_row(&mut self) -> SheetResult<()> {
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> SheetResult<Vec<u8>> {
        // explicit widths override the fitted ones
        self.worksheet.autofit();
        for (col, width) in self.widths.iter().enumerate() {
            if let Some(width) = width {
                self.worksheet
                    .set_column_width(col as u16, *width)
                    .map_err(export_error("set column width"))?;
            }
        }

        let mut workbook = Workbook::new();
        workbook.push_worksheet(self.worksheet);
        workbook
            .save_to_buffer()
            .map_err(export_error("serialize workbook"))
    }
}

/// Plain CSV; styling is dropped.
pub(crate) struct CsvSink {
    writer: csv::Writer<Vec<u8>>,
    row: Vec<String>,
}

impl CsvSink {
    pub fn new(width: usize) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(Vec::new()),
            row: Vec::with_capacity(width),
        }
    }

    fn put(&mut self, col: u16, text: String) {
        let col = col as usize;
        if self.row.len() <= col {
            self.row.resize(col + 1, String::new());
        }
        self.row[col] = text;
    }
}

impl SheetSink for CsvSink {
    fn write_header(&mut self, col: u16, field: &FieldDescriptor) -> SheetResult<()> {
        self.put(col, field.title.clone());
        Ok(())
    }

    fn write_cell(&mut self, _row: u32, col: u16, value: &Value) -> SheetResult<()> {
        self.put(col, text_value(value));
        Ok(())
    }

    fn end_row(&mut self) -> SheetResult<()> {
        self.writer
            .write_record(&self.row)
            .map_err(|e| SheetError::Export(format!("Failed to write CSV row: {}", e)))?;
        self.row.clear();
        Ok(())
    }

    fn finish(self: Box<Self>) -> SheetResult<Vec<u8>> {
        self.writer
            .into_inner()
            .map_err(|e| SheetError::Export(format!("Failed to flush CSV: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldConfig;
    use serde_json::json;

    fn field(name: &str, config: FieldConfig) -> FieldDescriptor {
        FieldDescriptor::from_config(name, &config).unwrap()
    }

    #[test]
    fn test_body_format_only_when_styled() {
        assert!(body_format(&field("a", FieldConfig::new(0))).is_none());

        let mut config = FieldConfig::new(0);
        config.align = Some("right".to_string());
        assert!(body_format(&field("a", config)).is_some());
    }

    #[test]
    fn test_exact_f64_guards_long_integers() {
        let exact = |value: Value| match value {
            Value::Number(n) => exact_f64(&n),
            _ => unreachable!(),
        };
        assert_eq!(exact(json!(42)), Some(42.0));
        assert_eq!(exact(json!(-7)), Some(-7.0));
        assert_eq!(exact(json!(2.5)), Some(2.5));
        assert_eq!(exact(json!(9_007_199_254_740_992_u64)), Some(9_007_199_254_740_992.0));
        assert_eq!(exact(json!(12345678901234567_u64)), None);
        assert_eq!(exact(json!(-12345678901234567_i64)), None);
        assert_eq!(exact(json!(u64::MAX)), None);
    }

    #[test]
    fn test_csv_sink_rows() {
        let fields = vec![
            field("id", FieldConfig::new(0).with_title("ID")),
            field("name", FieldConfig::new(1)),
        ];
        let mut sink: Box<dyn SheetSink> = Box::new(CsvSink::new(2));
        sink.write_header(0, &fields[0]).unwrap();
        sink.write_header(1, &fields[1]).unwrap();
        sink.end_row().unwrap();
        sink.write_cell(1, 0, &json!(1)).unwrap();
        sink.write_cell(1, 1, &json!("Ann, Jr.")).unwrap();
        sink.end_row().unwrap();

        let bytes = sink.finish().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "ID,name\n1,\"Ann, Jr.\"\n"
        );
    }

    #[test]
    fn test_xlsx_sink_produces_zip() {
        let mut config = FieldConfig::new(0);
        config.width = Some(20.0);
        config.bg_color = Some("#FFEEDD".to_string());
        let fields = vec![field("id", config)];

        let mut sink: Box<dyn SheetSink> = Box::new(XlsxSink::new(&fields));
        sink.write_header(0, &fields[0]).unwrap();
        sink.end_row().unwrap();
        sink.write_cell(1, 0, &json!(3.5)).unwrap();
        sink.write_cell(2, 0, &json!("")).unwrap();
        sink.end_row().unwrap();

        let bytes = sink.finish().unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }
}
