//! Transformation module.
//!
//! This module turns loaded columns into chart data:
//! - Operations: per-row arithmetic over input columns
//! - Resolver: column lookup scoped to a graph
//! - Aggregate: statistics across parallel sources
//! - Assembler: graph definition to chart series
//! - Pipeline: files in, page out

pub mod aggregate;
pub mod assembler;
pub mod operations;
pub mod pipeline;
pub mod resolver;

pub use aggregate::{aggregate, AggregationResult, BandEntry};
pub use assembler::{assemble_band, assemble_graph, GraphContent, GraphData, NamedSeries};
pub use operations::{apply_operation, multiply, operations_description, OperationKind, OperationSpec};
pub use pipeline::{
    batch_file_graph, graph_dataset, graph_file, graph_sources, load_sources, multi_file_graph,
    parse_batch, read_batch, BatchJob, BatchReport, GraphFailure, PageBuild, RunReport,
};
pub use resolver::{graph_columns, resolve, NamedColumn};
