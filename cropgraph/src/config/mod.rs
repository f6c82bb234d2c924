//! YAML configuration.
//!
//! Keys are lowercase, matching config files written by earlier versions of
//! the tool:
//!
//! ```yaml
//! inputtype: HermesCSVOut
//! numheader: 1
//! delimiter: ","
//! theme: ""
//! multifiles: false
//! columntograph:
//!   Graph1:
//!     graphtype: line
//!     title: Graph 1
//!     columns: [Column1, Column2]
//!     datecolumn: Date
//!     columnview:
//!       - name: Total
//!         operation: sum
//!         columns: [Column1, Column2]
//!         multiply: 0
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::transform::operations::OperationSpec;

/// Default input type (HERMES simulation CSV output).
pub const DEFAULT_INPUT_TYPE: &str = "HermesCSVOut";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Type of input file
    #[serde(default = "default_input_type", rename = "inputtype")]
    pub input_type: String,

    /// Number of header lines; column names come from the first one
    #[serde(default = "default_num_header", rename = "numheader")]
    pub num_header: usize,

    /// Field delimiter of the input and batch files
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Chart theme name
    #[serde(default)]
    pub theme: String,

    /// Batch mode: aggregate several inputs into one output
    #[serde(default, rename = "multifiles")]
    pub multi_files: bool,

    /// Graph definitions by name, processed in name order
    #[serde(default, rename = "columntograph")]
    pub column_to_graph: BTreeMap<String, GraphDefinition>,
}

/// One graph on the output page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// `line`, `ThemeRiver`, `bar3d` or `kline`
    #[serde(rename = "graphtype")]
    pub graph_type: String,

    #[serde(default)]
    pub title: String,

    /// Columns read from the input for this graph
    #[serde(default)]
    pub columns: Vec<String>,

    /// Column used as axis labels (optional)
    #[serde(default, rename = "datecolumn", skip_serializing_if = "String::is_empty")]
    pub date_column: String,

    /// Derived columns; when present they replace the raw columns on the chart
    #[serde(default, rename = "columnview", skip_serializing_if = "Vec::is_empty")]
    pub column_view: Vec<OperationSpec>,
}

fn default_input_type() -> String {
    DEFAULT_INPUT_TYPE.to_string()
}

fn default_num_header() -> usize {
    1
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_type: default_input_type(),
            num_header: default_num_header(),
            delimiter: default_delimiter(),
            theme: String::new(),
            multi_files: false,
            column_to_graph: BTreeMap::new(),
        }
    }
}

impl GraphDefinition {
    /// Name of the date column, if one is configured.
    pub fn date_column(&self) -> Option<&str> {
        Some(self.date_column.as_str()).filter(|c| !c.is_empty())
    }
}

impl Config {
    /// The configuration written when none exists yet.
    pub fn example() -> Self {
        let mut config = Self::default();
        config.column_to_graph.insert(
            "Graph1".to_string(),
            GraphDefinition {
                graph_type: "line".to_string(),
                title: "Graph 1".to_string(),
                columns: vec!["Column1".to_string(), "Column2".to_string()],
                date_column: "Date".to_string(),
                column_view: Vec::new(),
            },
        );
        config
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The delimiter as a single byte, for the CSV reader.
    ///
    /// Accepts `\t` and `tab` as spellings of the tab character.
    pub fn delimiter_byte(&self) -> ConfigResult<u8> {
        let delimiter = match self.delimiter.as_str() {
            "\\t" | "tab" => "\t",
            other => other,
        };
        match delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(ConfigError::InvalidDelimiter(self.delimiter.clone())),
        }
    }

    /// Number of header lines, validated.
    pub fn header_lines(&self) -> ConfigResult<usize> {
        if self.num_header == 0 {
            return Err(ConfigError::InvalidHeaderCount(self.num_header));
        }
        Ok(self.num_header)
    }

    /// Every column referenced by any graph.
    pub fn required_columns(&self) -> BTreeSet<String> {
        self.column_to_graph
            .values()
            .flat_map(|g| g.columns.iter().cloned())
            .collect()
    }
}

/// Read a configuration file. Missing keys take their defaults.
pub fn read_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let content = fs::read_to_string(path.as_ref())?;
    Config::from_yaml(&content)
}

/// Write [`Config::example`] to `path`, creating parent directories.
pub fn write_default_config(path: impl AsRef<Path>) -> ConfigResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, Config::example().to_yaml()?)?;
    Ok(())
}
