use super::RecordValidator;
use crate::error::{SheetError, SheetResult};
use crate::types::Record;
use jsonschema::JSONSchema;
use serde_json::Value;

/// Validates records as JSON objects against a compiled JSON Schema.
pub struct JsonSchemaValidator {
    compiled: JSONSchema,
}

impl JsonSchemaValidator {
    pub fn new(schema: &Value) -> SheetResult<Self> {
        let compiled = JSONSchema::compile(schema)
            .map_err(|e| SheetError::Config(format!("Failed to compile schema: {}", e)))?;
        Ok(Self { compiled })
    }

    pub fn from_json_str(schema: &str) -> SheetResult<Self> {
        let value: Value = serde_json::from_str(schema)?;
        Self::new(&value)
    }
}

impl RecordValidator for JsonSchemaValidator {
    fn validate(&self, record: &Record) -> Result<(), Vec<String>> {
        let instance = Value::Object(record.clone());
        let result = self.compiled.validate(&instance);
        if let Err(errors) = result {
            let messages: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path.trim_start_matches('/'), e)
                    }
                })
                .collect();
            return Err(messages);
        }
        Ok(())
    }
}
