//! Compiled page layout schema

use crate::{ExportError, Result};
use serde::{Deserialize, Serialize};

/// A compiled report layout
///
/// One layout exists per locale variant; the dispatcher keys them by
/// template handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: String,

    /// Page geometry
    #[serde(default)]
    pub page: PageSetup,

    /// Content blocks, drawn in order
    pub blocks: Vec<Block>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Page geometry in points
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageSetup {
    pub width: f64,
    pub height: f64,

    /// Bottom margin; table rows never cross it
    #[serde(default = "default_margin")]
    pub margin: f64,
}

fn default_margin() -> f64 {
    36.0
}

impl Default for PageSetup {
    /// A4 portrait
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: default_margin(),
        }
    }
}

/// Content block (tagged union)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    /// Single line of text
    Text(TextBlock),

    /// Repeating rows from a record source
    Table(TableBlock),

    /// Pre-loaded image
    Image(ImageBlock),
}

/// Position in points, y measured from the top of the page
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Size in points
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

fn default_font_size() -> f64 {
    10.0
}

fn default_row_height() -> f64 {
    13.5
}

fn default_true() -> bool {
    true
}

/// Text block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    /// Data binding path (`$.parameter` or `$.parameter.field`)
    #[serde(default)]
    pub bind: Option<String>,

    /// Static text (used if bind is not specified)
    #[serde(default)]
    pub text: Option<String>,

    /// Position
    pub position: Position,

    /// Font size in points
    #[serde(default = "default_font_size")]
    pub size: f64,

    /// Text alignment
    #[serde(default)]
    pub align: Align,
}

/// Table block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableBlock {
    /// Binding to a record-source parameter; the main data source if absent
    #[serde(default)]
    pub bind: Option<String>,

    /// Position of the first row
    pub position: Position,

    /// Row height in points
    #[serde(rename = "rowHeight")]
    #[serde(default = "default_row_height")]
    pub row_height: f64,

    /// Font size in points
    #[serde(default = "default_font_size")]
    pub size: f64,

    /// Print a header row of column titles
    #[serde(default = "default_true")]
    pub header: bool,

    /// Column definitions
    pub columns: Vec<TableColumn>,
}

/// Table column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Field name in the record
    pub field: String,

    /// Header text (defaults to the field name)
    #[serde(default)]
    pub title: Option<String>,

    /// X offset from table position
    pub x: f64,

    /// Text alignment
    #[serde(default)]
    pub align: Align,
}

impl TableColumn {
    /// Header text for this column
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.field)
    }
}

/// Image block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageBlock {
    /// Binding to an image parameter
    pub bind: String,

    /// Top-left corner
    pub position: Position,

    /// Drawn size
    pub size: Size,
}

/// Parse a layout from JSON
pub fn parse_layout(json: &str) -> Result<Layout> {
    serde_json::from_str(json).map_err(|e| ExportError::ParseError(e.to_string()))
}
