//! Export data sources and the row producer that reshapes records to the schema

use crate::schema::Schema;
use crate::types::Record;
use serde_json::Value;

/// Data handed to an export call.
pub enum ExportData {
    /// Materialized rows
    Rows(Vec<Record>),
    /// Invoked once to produce the rows
    Producer(Box<dyn FnOnce() -> Vec<Record>>),
    /// Consumed lazily, row by row
    Stream(Box<dyn Iterator<Item = Record>>),
}

impl ExportData {
    pub fn producer<F>(f: F) -> Self
    where
        F: FnOnce() -> Vec<Record> + 'static,
    {
        ExportData::Producer(Box::new(f))
    }

    pub fn stream<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Record>,
        I::IntoIter: 'static,
    {
        ExportData::Stream(Box::new(iter.into_iter()))
    }

    /// Resolve into a single-use record iterator.
    pub fn into_records(self) -> Box<dyn Iterator<Item = Record>> {
        match self {
            ExportData::Rows(rows) => Box::new(rows.into_iter()),
            ExportData::Producer(f) => Box::new(f().into_iter()),
            ExportData::Stream(iter) => iter,
        }
    }
}

impl From<Vec<Record>> for ExportData {
    fn from(rows: Vec<Record>) -> Self {
        ExportData::Rows(rows)
    }
}

/// Reshape one record into schema order; missing fields become `""`.
pub fn reshape(schema: &Schema, record: &Record) -> Vec<Value> {
    schema
        .iter()
        .map(|field| {
            record
                .get(&field.name)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()))
        })
        .collect()
}

/// Lazy, single-use sequence of schema-ordered rows.
///
/// The first `None` from the source ends production for good.
pub struct RowProducer<'s, I: Iterator<Item = Record>> {
    schema: &'s Schema,
    source: std::iter::Fuse<I>,
}

impl<'s, I: Iterator<Item = Record>> RowProducer<'s, I> {
    pub fn new(schema: &'s Schema, source: I) -> Self {
        Self {
            schema,
            source: source.fuse(),
        }
    }
}

impl<I: Iterator<Item = Record>> Iterator for RowProducer<'_, I> {
    type Item = Vec<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source
            .next()
            .map(|record| reshape(self.schema, &record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.source.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldConfig, PropertyMap};
    use serde_json::json;

    fn schema() -> Schema {
        let mut property = PropertyMap::new();
        property.insert("name".to_string(), FieldConfig::new(1));
        property.insert("id".to_string(), FieldConfig::new(0));
        Schema::parse(&property).unwrap()
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_reshape_orders_drops_and_defaults() {
        let schema = schema();
        let row = reshape(&schema, &record(json!({"extra": true, "name": "Ann"})));
        assert_eq!(row, vec![json!(""), json!("Ann")]);
    }

    #[test]
    fn test_row_producer_is_lazy_and_single_use() {
        let schema = schema();
        let records = vec![
            record(json!({"id": 1, "name": "Ann"})),
            record(json!({"id": 2})),
        ];
        let mut producer = RowProducer::new(&schema, records.into_iter());
        assert_eq!(producer.size_hint(), (2, Some(2)));
        assert_eq!(producer.next(), Some(vec![json!(1), json!("Ann")]));
        assert_eq!(producer.next(), Some(vec![json!(2), json!("")]));
        assert_eq!(producer.next(), None);
        assert_eq!(producer.next(), None);
    }

    #[test]
    fn test_export_data_producer_invoked_once() {
        let data = ExportData::producer(|| vec![record(json!({"id": 7}))]);
        let rows: Vec<Record> = data.into_records().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(7));
    }

    #[test]
    fn test_export_data_stream() {
        let data = ExportData::stream((0..3).map(|i| record(json!({ "id": i }))));
        assert_eq!(data.into_records().count(), 3);
    }
}
