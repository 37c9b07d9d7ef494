//! Field configuration and resolved column descriptors

use crate::dictionary::{DictKey, Dictionary};
use crate::error::{SheetError, SheetResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One imported or exported row: field name → scalar value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Field configuration map keyed by field name (the `property` section).
pub type PropertyMap = IndexMap<String, FieldConfig>;

/// Raw field attributes as they appear in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// Column ordering key (ascending, need not be contiguous)
    pub index: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_bg_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,

    #[serde(default, alias = "only_export")]
    pub only_export: bool,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dict_data: IndexMap<DictKey, String>,
}

impl FieldConfig {
    pub fn new(index: i64) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_dict<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<DictKey>,
        V: Into<String>,
    {
        self.dict_data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn export_only(mut self) -> Self {
        self.only_export = true;
        self
    }
}

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl FromStr for Align {
    type Err = SheetError;

    fn from_str(s: &str) -> SheetResult<Self> {
        match s.to_lowercase().replace(['_', '-'], "").as_str() {
            "general" => Ok(Align::General),
            "left" => Ok(Align::Left),
            "center" | "centre" => Ok(Align::Center),
            "right" => Ok(Align::Right),
            "fill" => Ok(Align::Fill),
            "justify" => Ok(Align::Justify),
            "centercontinuous" => Ok(Align::CenterContinuous),
            "distributed" => Ok(Align::Distributed),
            _ => Err(SheetError::Config(format!("Unknown alignment '{}'", s))),
        }
    }
}

/// RGB color parsed from `#RRGGBB`, `RRGGBB` or `AARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor(pub u32);

impl FromStr for HexColor {
    type Err = SheetError;

    fn from_str(s: &str) -> SheetResult<Self> {
        let invalid = || SheetError::Config(format!("Invalid color '{}'", s));
        let hex = s.trim().trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        // ARGB: alpha is ignored
        let rgb = match hex.len() {
            6 => hex,
            8 => &hex[2..],
            _ => return Err(invalid()),
        };
        u32::from_str_radix(rgb, 16).map(HexColor).map_err(|_| invalid())
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

/// A parsed, immutable column descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub title: String,
    pub width: Option<f64>,
    pub align: Option<Align>,
    pub head_color: Option<HexColor>,
    pub head_bg_color: Option<HexColor>,
    pub color: Option<HexColor>,
    pub bg_color: Option<HexColor>,
    pub only_export: bool,
    pub dict_data: Dictionary,
    pub index: i64,
}

impl FieldDescriptor {
    /// Resolve a configuration entry, filling documented defaults.
    pub fn from_config(name: &str, config: &FieldConfig) -> SheetResult<Self> {
        let parse_color = |value: &Option<String>| -> SheetResult<Option<HexColor>> {
            match value.as_deref() {
                None | Some("") => Ok(None),
                Some(s) => s
                    .parse()
                    .map(Some)
                    .map_err(|e| SheetError::Config(format!("Field '{}': {}", name, e))),
            }
        };

        if let Some(width) = config.width {
            if !(width.is_finite() && width > 0.0) {
                return Err(SheetError::Config(format!(
                    "Field '{}': width must be positive, got {}",
                    name, width
                )));
            }
        }

        let align = match config.align.as_deref() {
            None | Some("") => None,
            Some(s) => Some(
                s.parse()
                    .map_err(|e| SheetError::Config(format!("Field '{}': {}", name, e)))?,
            ),
        };

        Ok(Self {
            name: name.to_string(),
            title: config.title.clone().unwrap_or_else(|| name.to_string()),
            width: config.width,
            align,
            head_color: parse_color(&config.head_color)?,
            head_bg_color: parse_color(&config.head_bg_color)?,
            color: parse_color(&config.color)?,
            bg_color: parse_color(&config.bg_color)?,
            only_export: config.only_export,
            dict_data: Dictionary::from_entries(&config.dict_data),
            index: config.index,
        })
    }

    /// True when body cells of this field need a format.
    pub fn has_body_style(&self) -> bool {
        self.align.is_some() || self.color.is_some() || self.bg_color.is_some()
    }
}
