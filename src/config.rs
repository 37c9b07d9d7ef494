//! Bridge configuration: field schema, import rules, upload settings

use crate::error::SheetResult;
use crate::types::PropertyMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upload form-field key used when none is configured.
pub const DEFAULT_UPLOAD_KEY: &str = "file";

/// Field rules as `"required|integer"` or `["required", "regex:^(a|b)$"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Pipe(String),
    List(Vec<String>),
}

impl RuleSpec {
    pub fn rules(&self) -> Vec<&str> {
        match self {
            RuleSpec::Pipe(s) => s
                .split('|')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .collect(),
            RuleSpec::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

/// Everything a `SheetBridge` needs, usually loaded from YAML.
///
/// ```yaml
/// property:
///   id:     { index: 0, title: ID, width: 10 }
///   status: { index: 1, dictData: { 0: inactive, 1: active } }
/// import_roles:
///   id: required|integer
/// import_messages:
///   id.required: ID is missing
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetConfig {
    pub property: PropertyMap,

    #[serde(default)]
    pub import_roles: IndexMap<String, RuleSpec>,

    #[serde(default)]
    pub import_messages: IndexMap<String, String>,

    #[serde(default = "default_upload_key")]
    pub upload_key: String,

    /// Directory for upload scratch files (system temp dir when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

fn default_upload_key() -> String {
    DEFAULT_UPLOAD_KEY.to_string()
}

impl SheetConfig {
    pub fn new(property: PropertyMap) -> Self {
        Self {
            property,
            upload_key: default_upload_key(),
            ..Default::default()
        }
    }

    pub fn from_yaml_str(content: &str) -> SheetResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> SheetResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn from_path(path: &Path) -> SheetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn with_rules(mut self, roles: IndexMap<String, RuleSpec>) -> Self {
        self.import_roles = roles;
        self
    }

    pub fn with_messages(mut self, messages: IndexMap<String, String>) -> Self {
        self.import_messages = messages;
        self
    }

    pub fn with_upload_key(mut self, key: impl Into<String>) -> Self {
        self.upload_key = key.into();
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }
}
