//! Record validation for imports
//!
//! - `RuleSet`: field rule strings (`required|integer|max:10`) with custom messages
//! - `JsonSchemaValidator`: records checked against a JSON Schema document
//! - any `Fn(&Record) -> Result<(), Vec<String>>`

mod json_schema;
mod rules;

pub use json_schema::JsonSchemaValidator;
pub use rules::{Rule, RuleSet};

use crate::types::Record;

/// Validates one assembled record; failures carry ordered messages.
pub trait RecordValidator: Send + Sync {
    fn validate(&self, record: &Record) -> Result<(), Vec<String>>;
}

impl<F> RecordValidator for F
where
    F: Fn(&Record) -> Result<(), Vec<String>> + Send + Sync,
{
    fn validate(&self, record: &Record) -> Result<(), Vec<String>> {
        self(record)
    }
}
