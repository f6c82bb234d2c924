//! Error types for the cropgraph engine.
//!
//! One error type per layer:
//!
//! - [`GraphError`] - per-graph data errors (coercion, resolution, operations, aggregation)
//! - [`RecordError`] - loading delimited record files
//! - [`ConfigError`] - reading and writing the YAML configuration
//! - [`RenderError`] - writing the chart page
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Graph Errors
// =============================================================================

/// Errors while turning loaded columns into chart series.
///
/// All of these are scoped to a single graph: the run pipeline records
/// them and keeps assembling the remaining graphs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A cell could not be read as a number.
    #[error("Value '{0}' is not numeric")]
    NonNumericValue(String),

    /// A referenced column is not declared for the graph or absent from the source.
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// An operation was given no input series.
    #[error("Operation '{0}' needs at least one input column")]
    EmptyOperationInput(String),

    /// The operation kind is not part of the vocabulary.
    #[error("Unsupported operation '{0}'")]
    UnsupportedOperation(String),

    /// Series that must line up row by row have different lengths.
    #[error("Column '{column}' has {got} rows, expected {expected}")]
    MismatchedLengths {
        column: String,
        expected: usize,
        got: usize,
    },

    /// Cross-file aggregation was asked to run without any source.
    #[error("No sources to aggregate")]
    NoSources,

    /// The graph definition cannot be assembled as written.
    #[error("Invalid graph definition: {0}")]
    InvalidGraph(String),

    /// The graph type is not rendered in this mode.
    #[error("Graph type '{0}' not supported")]
    UnsupportedGraphType(String),
}

// =============================================================================
// Record Source Errors
// =============================================================================

/// Errors while loading a delimited record file.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Failed to read file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed delimited content.
    #[error("Invalid record format: {0}")]
    Csv(#[from] csv::Error),

    /// The file has fewer lines than the configured header count.
    #[error("Expected {expected} header line(s), found {found}")]
    MissingHeader { expected: usize, found: usize },

    /// A data row has a different number of fields than the header.
    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Loaded columns disagree on their row count.
    #[error("Inconsistent dataset: {0}")]
    Inconsistent(#[from] GraphError),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors from reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error.
    #[error("Config YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Delimiter is not a single-byte character.
    #[error("Invalid delimiter '{0}': must be a single ASCII character")]
    InvalidDelimiter(String),

    /// Header count must be at least one (column names come from the first header line).
    #[error("Invalid header count {0}: at least one header line is required")]
    InvalidHeaderCount(usize),
}

// =============================================================================
// Render Errors
// =============================================================================

/// Errors from the presentation layer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// IO error while saving the page.
    #[error("Failed to write page: {0}")]
    Io(#[from] std::io::Error),

    /// Chart options could not be serialized.
    #[error("Chart JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by the functions in
/// [`crate::transform::pipeline`]. Graph-level failures never surface here;
/// they are collected in the run report instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Record loading error.
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Rendering error.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Invalid batch file.
    #[error("Batch file error: {0}")]
    Batch(String),

    /// A background loading task panicked or was cancelled.
    #[error("Loader task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for graph assembly.
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type for record loading.
pub type RecordResult<T> = Result<T, RecordError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ConfigError -> PipelineError
        let config_err = ConfigError::InvalidHeaderCount(0);
        let pipeline_err: PipelineError = config_err.into();
        assert!(pipeline_err.to_string().contains("header count 0"));

        // GraphError -> RecordError -> PipelineError
        let graph_err = GraphError::MismatchedLengths {
            column: "Yield".into(),
            expected: 10,
            got: 9,
        };
        let record_err: RecordError = graph_err.into();
        let pipeline_err: PipelineError = record_err.into();
        assert!(pipeline_err.to_string().contains("Yield"));
    }

    #[test]
    fn test_graph_error_format() {
        let msg = GraphError::ColumnNotFound("Biomass".into()).to_string();
        assert!(msg.contains("Biomass"));

        let msg = GraphError::UnsupportedOperation("median".into()).to_string();
        assert!(msg.contains("median"));
    }
}
