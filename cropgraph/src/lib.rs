//! # Cropgraph - charts from crop simulation output
//!
//! Cropgraph reads the delimited output of crop simulation runs, derives
//! chart series from it as described by a YAML configuration, and writes
//! interactive HTML chart pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV files  │────▶│   Parser    │────▶│  Transform  │────▶│  HTML page  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (ops + agg) │     │  (ECharts)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cropgraph::{graph_file, read_config};
//! use std::path::Path;
//!
//! let config = read_config("config.yml")?;
//! let report = graph_file(Path::new("run.csv"), &config, Path::new("run.html"))?;
//! for failure in &report.failed {
//!     eprintln!("{}: {}", failure.graph, failure.error);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cells, series and datasets
//! - [`config`] - YAML configuration
//! - [`parser`] - Record file loading with encoding detection
//! - [`transform`] - Operations, aggregation, assembly and the run pipeline
//! - [`render`] - HTML chart pages
//! - [`logs`] - Run logging

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Configuration
pub mod config;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Presentation
pub mod render;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, GraphError, PipelineError, RecordError, RenderError,
    GraphResult, PipelineResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, Dataset, Series};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{read_config, write_default_config, Config, GraphDefinition};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{decode_content, detect_encoding, load_dataset, parse_dataset, LoadOptions};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    aggregate,
    apply_operation,
    assemble_band,
    assemble_graph,
    operations_description,
    AggregationResult,
    BandEntry,
    GraphContent,
    GraphData,
    OperationKind,
    OperationSpec,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    batch_file_graph,
    graph_file,
    multi_file_graph,
    BatchReport,
    GraphFailure,
    RunReport,
};

// =============================================================================
// Re-exports - Rendering
// =============================================================================

pub use render::{Chart, Page, Style};
