//! The owning component: one immutable configuration, import and export on demand

use crate::config::SheetConfig;
use crate::download::Download;
use crate::error::{BoxError, SheetResult};
use crate::excel::{ExportFormat, ImportOutcome, SheetExporter, SheetImporter, UploadSource};
use crate::producer::ExportData;
use crate::schema::Schema;
use crate::types::{PropertyMap, Record};
use crate::validation::{RecordValidator, RuleSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Schema-driven spreadsheet import/export.
///
/// Built once from a [`SheetConfig`]; every import or export call is
/// self-contained, so a bridge can be shared across threads.
///
/// # Example
///
/// ```no_run
/// use royalbit_sheetbridge::{SheetBridge, SheetConfig};
///
/// let config = SheetConfig::from_yaml_str(r#"
/// property:
///   id: { index: 0, title: ID }
///   status: { index: 1, dictData: { 0: inactive, 1: active } }
/// "#)?;
/// let bridge = SheetBridge::new(config)?;
///
/// let rows = vec![serde_json::json!({"id": 1, "status": 1})
///     .as_object()
///     .cloned()
///     .unwrap_or_default()];
/// let download = bridge.export("users", rows, "xlsx")?;
/// assert_eq!(download.filename, "users.xlsx");
/// # Ok::<(), royalbit_sheetbridge::SheetError>(())
/// ```
pub struct SheetBridge {
    schema: Schema,
    validator: Option<Box<dyn RecordValidator>>,
    upload_key: String,
    scratch_dir: Option<PathBuf>,
}

impl SheetBridge {
    /// Fails with `SheetError::Config` on an empty `property` map or invalid rules.
    pub fn new(config: SheetConfig) -> SheetResult<Self> {
        let schema = Schema::parse(&config.property)?;

        let validator: Option<Box<dyn RecordValidator>> = if config.import_roles.is_empty() {
            None
        } else {
            Some(Box::new(RuleSet::new(
                &config.import_roles,
                &config.import_messages,
            )?))
        };

        for name in unimportable_rules(&schema, &config) {
            warn!(field = %name, "import rule targets a field that is never imported");
        }

        debug!(
            fields = schema.len(),
            rules = config.import_roles.len(),
            "sheet bridge configured"
        );

        Ok(Self {
            schema,
            validator,
            upload_key: config.upload_key,
            scratch_dir: config.scratch_dir,
        })
    }

    /// Replace the configured rule set with another validator.
    pub fn with_validator(mut self, validator: impl RecordValidator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn upload_key(&self) -> &str {
        &self.upload_key
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch_dir.as_deref()
    }

    fn importer(&self) -> SheetImporter<'_> {
        let mut importer = SheetImporter::new(&self.schema);
        if let Some(validator) = self.validator.as_deref() {
            importer = importer.with_validator(validator);
        }
        if let Some(dir) = self.scratch_dir.as_deref() {
            importer = importer.with_scratch_dir(dir);
        }
        importer
    }

    /// Import the upload under the configured key into memory.
    ///
    /// `ImportOutcome::NoFile` when nothing was uploaded under the key.
    pub fn import<S>(&self, source: &S) -> SheetResult<ImportOutcome>
    where
        S: UploadSource + ?Sized,
    {
        let Some(file) = source.file(&self.upload_key) else {
            debug!(key = %self.upload_key, "no upload under key");
            return Ok(ImportOutcome::NoFile);
        };
        let records = self.importer().import(file)?;
        Ok(ImportOutcome::Records(records))
    }

    /// Import the upload under the configured key, feeding each record to `consumer`.
    pub fn import_with<S, F, E>(&self, source: &S, consumer: F) -> SheetResult<ImportOutcome>
    where
        S: UploadSource + ?Sized,
        F: FnMut(Record) -> Result<(), E>,
        E: Into<BoxError>,
    {
        let Some(file) = source.file(&self.upload_key) else {
            debug!(key = %self.upload_key, "no upload under key");
            return Ok(ImportOutcome::NoFile);
        };
        let rows = self.importer().import_each(file, consumer)?;
        Ok(ImportOutcome::Consumed { rows })
    }

    /// Export with the configured schema. `format` is xlsx/xls/csv, anything else means xlsx.
    pub fn export(
        &self,
        filename: &str,
        data: impl Into<ExportData>,
        format: &str,
    ) -> SheetResult<Download> {
        self.export_with_schema(filename, data, None, format)
    }

    /// Export with `schema` replacing the configured one for this call only.
    pub fn export_with_schema(
        &self,
        filename: &str,
        data: impl Into<ExportData>,
        schema: Option<&Schema>,
        format: &str,
    ) -> SheetResult<Download> {
        let schema = schema.unwrap_or(&self.schema);
        let format = ExportFormat::parse_lenient(format);
        SheetExporter::new(schema).export(filename, data.into(), format)
    }

    /// Export with a property map parsed into a one-off schema.
    pub fn export_with_property(
        &self,
        filename: &str,
        data: impl Into<ExportData>,
        property: &PropertyMap,
        format: &str,
    ) -> SheetResult<Download> {
        let schema = Schema::parse(property)?;
        self.export_with_schema(filename, data, Some(&schema), format)
    }
}

/// Rule keys naming a field outside the schema or an export-only field.
fn unimportable_rules<'a>(schema: &Schema, config: &'a SheetConfig) -> Vec<&'a str> {
    config
        .import_roles
        .keys()
        .filter(|name| !matches!(schema.field(name), Some(field) if !field.only_export))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetError;
    use crate::types::FieldConfig;

    fn config() -> SheetConfig {
        let mut property = PropertyMap::new();
        property.insert("id".to_string(), FieldConfig::new(0));
        SheetConfig::new(property)
    }

    #[test]
    fn test_empty_property_is_config_error() {
        let err = SheetBridge::new(SheetConfig::default()).err().unwrap();
        assert!(matches!(err, SheetError::Config(_)));
    }

    #[test]
    fn test_invalid_rules_fail_construction() {
        let mut roles = indexmap::IndexMap::new();
        roles.insert(
            "id".to_string(),
            crate::config::RuleSpec::Pipe("required|frobnicate".to_string()),
        );
        let err = SheetBridge::new(config().with_rules(roles)).err().unwrap();
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn test_rules_outside_import_columns_are_reported() {
        let config = SheetConfig::from_yaml_str(
            "property:\n  id:\n    index: 0\n  note:\n    index: 1\n    onlyExport: true\nimport_roles:\n  id: required\n  note: string\n  ghost: required\n",
        )
        .unwrap();
        let schema = Schema::parse(&config.property).unwrap();
        assert_eq!(unimportable_rules(&schema, &config), vec!["note", "ghost"]);

        // still a usable bridge
        assert!(SheetBridge::new(config).is_ok());
    }

    #[test]
    fn test_non_ascii_color_is_config_error() {
        let config = SheetConfig::from_yaml_str(
            "property:\n  id:\n    index: 0\n    color: \"a\u{e9}34567\"\n",
        )
        .unwrap();
        let err = SheetBridge::new(config).err().unwrap();
        assert!(matches!(err, SheetError::Config(_)));
        assert!(err.to_string().contains("Invalid color"));
    }

    #[test]
    fn test_accessors() {
        let bridge = SheetBridge::new(config().with_scratch_dir("/tmp")).unwrap();
        assert_eq!(bridge.upload_key(), "file");
        assert_eq!(bridge.schema().len(), 1);
        assert_eq!(bridge.scratch_dir(), Some(Path::new("/tmp")));
    }

    #[test]
    fn test_bridge_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SheetBridge>();
    }
}
