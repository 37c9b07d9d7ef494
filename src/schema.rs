//! Ordered field schema derived from the `property` configuration

use crate::error::{SheetError, SheetResult};
use crate::types::{FieldDescriptor, PropertyMap};
use std::collections::HashMap;

/// Field descriptors in column order (ascending `index`).
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Parse a property map into an ordered schema.
    ///
    /// Fails on an empty map, duplicate `index` values, or malformed attributes.
    pub fn parse(property: &PropertyMap) -> SheetResult<Self> {
        if property.is_empty() {
            return Err(SheetError::Config(
                "Field properties cannot be empty".to_string(),
            ));
        }

        let mut seen: HashMap<i64, &str> = HashMap::new();
        let mut fields = Vec::with_capacity(property.len());

        for (name, config) in property {
            if let Some(previous) = seen.insert(config.index, name) {
                return Err(SheetError::Config(format!(
                    "Fields '{}' and '{}' share index {}",
                    previous, name, config.index
                )));
            }
            fields.push(FieldDescriptor::from_config(name, config)?);
        }

        fields.sort_by_key(|field| field.index);

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Descriptor at a zero-based column offset.
    pub fn get(&self, offset: usize) -> Option<&FieldDescriptor> {
        self.fields.get(offset)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Offset of the rightmost column.
    pub fn last_offset(&self) -> usize {
        self.fields.len().saturating_sub(1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldConfig;

    fn property(entries: &[(&str, i64)]) -> PropertyMap {
        entries
            .iter()
            .map(|(name, index)| (name.to_string(), FieldConfig::new(*index)))
            .collect()
    }

    #[test]
    fn test_parse_sorts_by_index() {
        let schema = Schema::parse(&property(&[("c", 10), ("a", 0), ("b", 5)])).unwrap();
        let names: Vec<&str> = schema.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.last_offset(), 2);
        assert_eq!(schema.get(1).map(|f| f.name.as_str()), Some("b"));
        assert!(schema.get(3).is_none());
    }

    #[test]
    fn test_parse_is_order_independent() {
        let first = Schema::parse(&property(&[("x", 1), ("y", 0), ("z", 2)])).unwrap();
        let second = Schema::parse(&property(&[("z", 2), ("x", 1), ("y", 0)])).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Schema::parse(&property(&[("x", 1), ("y", 0), ("z", 2)])).unwrap());
    }

    #[test]
    fn test_parse_empty_fails() {
        let err = Schema::parse(&PropertyMap::new()).unwrap_err();
        assert!(matches!(err, SheetError::Config(_)));
    }

    #[test]
    fn test_parse_duplicate_index_fails() {
        let err = Schema::parse(&property(&[("a", 0), ("b", 0)])).unwrap_err();
        assert!(err.to_string().contains("share index 0"));
    }

    #[test]
    fn test_field_lookup() {
        let schema = Schema::parse(&property(&[("id", 0), ("name", 1)])).unwrap();
        assert_eq!(schema.field("name").map(|f| f.index), Some(1));
        assert!(schema.field("missing").is_none());
    }
}
