//! Graph data assembly.
//!
//! Turns one [`GraphDefinition`] plus loaded data into the named series a
//! chart is drawn from.
//!
//! ```text
//! single source:  Dataset ─▶ graph columns ─▶ columnview ops ─▶ Lines
//!                                         └─▶ (no ops) raw columns ─▶ Lines
//! multi source:   [Dataset] ─▶ data column ─▶ aggregate ─▶ Band
//! ```

use serde::Serialize;

use super::aggregate::{aggregate, BandEntry};
use super::operations::apply_operation;
use super::resolver::{graph_columns, resolve};
use crate::config::GraphDefinition;
use crate::error::{GraphError, GraphResult};
use crate::models::{Dataset, Series};

/// A chart series with its legend name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSeries {
    pub name: String,
    pub series: Series,
}

/// What a chart draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GraphContent {
    /// One or more series over the same axis
    Lines(Vec<NamedSeries>),
    /// Spread across sources, one band entry per row
    Band(Vec<BandEntry>),
}

/// Everything the presentation layer needs for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphData {
    /// Key of the graph in the config
    pub name: String,
    pub title: String,
    pub graph_type: String,
    /// Axis labels: dates when a date column is declared, row indices otherwise
    pub labels: Vec<String>,
    pub content: GraphContent,
}

impl GraphData {
    /// Number of rows on the axis.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Row indices `"0".."n-1"` as labels.
fn index_labels(rows: usize) -> Vec<String> {
    (0..rows).map(|i| i.to_string()).collect()
}

/// Assemble a graph from a single source.
///
/// With a `columnview`, each operation produces one series named after it.
/// Without one, every declared column except the date column is charted as is.
pub fn assemble_graph(
    name: &str,
    graph: &GraphDefinition,
    dataset: &Dataset,
) -> GraphResult<GraphData> {
    if graph.columns.is_empty() {
        return Err(GraphError::InvalidGraph(format!("graph '{}' declares no columns", name)));
    }

    let available = graph_columns(graph, dataset)?;
    let date_column = graph.date_column();

    let labels = available
        .iter()
        .find(|(col, _)| Some(*col) == date_column)
        .map(|(_, series)| series.labels())
        .unwrap_or_else(|| index_labels(dataset.row_count()));

    let series = if graph.column_view.is_empty() {
        available
            .iter()
            .filter(|(col, _)| Some(*col) != date_column)
            .map(|(col, series)| NamedSeries {
                name: col.to_string(),
                series: (*series).clone(),
            })
            .collect()
    } else {
        graph
            .column_view
            .iter()
            .map(|spec| {
                let inputs = resolve(&spec.columns, &available)?;
                Ok(NamedSeries {
                    name: spec.name.clone(),
                    series: apply_operation(spec, &inputs)?,
                })
            })
            .collect::<GraphResult<Vec<_>>>()?
    };

    Ok(GraphData {
        name: name.to_string(),
        title: graph.title.clone(),
        graph_type: graph.graph_type.clone(),
        labels,
        content: GraphContent::Lines(series),
    })
}

/// Assemble a band graph from several parallel sources.
///
/// The graph must declare exactly one data column besides the optional date
/// column. Row count and dates come from the first source.
pub fn assemble_band(
    name: &str,
    graph: &GraphDefinition,
    sources: &[Dataset],
) -> GraphResult<GraphData> {
    let first = sources.first().ok_or(GraphError::NoSources)?;
    let date_column = graph.date_column();

    let data_columns: Vec<&String> = graph
        .columns
        .iter()
        .filter(|c| Some(c.as_str()) != date_column)
        .collect();
    let column = match data_columns.as_slice() {
        [column] => column.as_str(),
        other => {
            return Err(GraphError::InvalidGraph(format!(
                "{} graph '{}' requires exactly one data column, found {}",
                graph.graph_type,
                name,
                other.len()
            )))
        }
    };

    let row_count = first.column(column)?.len();
    let labels = match date_column {
        Some(date) => first.column(date)?.labels(),
        None => index_labels(row_count),
    };

    let bands = aggregate(column, sources, row_count)?
        .iter()
        .map(|row| row.band())
        .collect();

    Ok(GraphData {
        name: name.to_string(),
        title: graph.title.clone(),
        graph_type: graph.graph_type.clone(),
        labels,
        content: GraphContent::Band(bands),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;
    use crate::transform::operations::OperationSpec;

    fn dataset(origin: &str, yields: &[f64]) -> Dataset {
        let dates: Vec<Cell> = (1..=yields.len())
            .map(|d| Cell::from(format!("{:02}.01.2020", d)))
            .collect();
        Dataset::new(origin)
            .with_column("Date", Series::new(dates))
            .unwrap()
            .with_column("Yield", Series::from_numbers(yields.iter().copied()))
            .unwrap()
            .with_column("Wat1", Series::new(vec!["1"; yields.len()].into_iter().map(Cell::from).collect()))
            .unwrap()
    }

    fn graph(graph_type: &str, columns: &[&str], date: &str) -> GraphDefinition {
        GraphDefinition {
            graph_type: graph_type.into(),
            title: "Test".into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            date_column: date.into(),
            column_view: Vec::new(),
        }
    }

    fn lines(data: &GraphData) -> &[NamedSeries] {
        match &data.content {
            GraphContent::Lines(series) => series,
            GraphContent::Band(_) => panic!("expected lines"),
        }
    }

    #[test]
    fn test_raw_columns_without_date() {
        let data = dataset("run.csv", &[1.0, 2.0]);
        let graph = graph("line", &["Yield", "Wat1"], "");
        let out = assemble_graph("G", &graph, &data).unwrap();

        assert_eq!(out.labels, vec!["0", "1"]);
        let series = lines(&out);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "Yield");
        assert_eq!(series[1].series, Series::new(vec!["1".into(), "1".into()]));
    }

    #[test]
    fn test_date_column_becomes_labels() {
        let data = dataset("run.csv", &[1.0, 2.0]);
        let graph = graph("line", &["Date", "Yield"], "Date");
        let out = assemble_graph("G", &graph, &data).unwrap();

        assert_eq!(out.labels, vec!["01.01.2020", "02.01.2020"]);
        let series = lines(&out);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, "Yield");
    }

    #[test]
    fn test_column_view_operations() {
        let data = dataset("run.csv", &[10.0, 15.0, 13.0]);
        let mut graph = graph("line", &["Date", "Yield", "Wat1"], "Date");
        graph.column_view = vec![
            OperationSpec::new("Growth", "dailydifference", &["Yield"]),
            OperationSpec::new("Net", "diff", &["Yield", "Wat1"]).with_multiply(2.0),
        ];
        let out = assemble_graph("G", &graph, &data).unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out.labels, vec!["01.01.2020", "02.01.2020", "03.01.2020"]);
        let series = lines(&out);
        assert_eq!(series[0].name, "Growth");
        assert_eq!(series[0].series, Series::from_numbers([0.0, 5.0, -2.0]));
        assert_eq!(series[1].series, Series::from_numbers([18.0, 28.0, 24.0]));
    }

    #[test]
    fn test_operation_on_undeclared_column() {
        let data = dataset("run.csv", &[1.0]);
        let mut graph = graph("line", &["Yield"], "");
        graph.column_view = vec![OperationSpec::new("S", "sum", &["Yield", "Wat1"])];

        let err = assemble_graph("G", &graph, &data).unwrap_err();
        assert_eq!(err, GraphError::ColumnNotFound("Wat1".into()));
    }

    #[test]
    fn test_unsupported_operation_is_an_error() {
        let data = dataset("run.csv", &[1.0]);
        let mut graph = graph("line", &["Yield"], "");
        graph.column_view = vec![OperationSpec::new("M", "median", &["Yield"])];

        let err = assemble_graph("G", &graph, &data).unwrap_err();
        assert_eq!(err, GraphError::UnsupportedOperation("median".into()));
    }

    #[test]
    fn test_band_across_sources() {
        let sources = vec![
            dataset("a.csv", &[2.0, 1.0]),
            dataset("b.csv", &[4.0, 1.0]),
            dataset("c.csv", &[6.0, 1.0]),
        ];
        let graph = graph("kline", &["Date", "Yield"], "Date");
        let out = assemble_band("K", &graph, &sources).unwrap();

        assert_eq!(out.labels, vec!["01.01.2020", "02.01.2020"]);
        match &out.content {
            GraphContent::Band(bands) => {
                assert_eq!(bands.len(), 2);
                assert_eq!(bands[0].low, 2.0);
                assert_eq!(bands[0].high, 6.0);
                assert!((bands[0].open - 2.367).abs() < 1e-3);
            }
            GraphContent::Lines(_) => panic!("expected band"),
        }
    }

    #[test]
    fn test_band_requires_one_data_column() {
        let sources = vec![dataset("a.csv", &[1.0])];
        let graph = graph("kline", &["Date", "Yield", "Wat1"], "Date");
        let err = assemble_band("K", &graph, &sources).unwrap_err();
        assert!(matches!(err, GraphError::InvalidGraph(msg) if msg.contains("found 2")));
    }

    #[test]
    fn test_band_without_date_uses_indices() {
        let sources = vec![dataset("a.csv", &[1.0, 2.0, 3.0]), dataset("b.csv", &[3.0, 2.0, 1.0])];
        let graph = graph("kline", &["Yield"], "");
        let out = assemble_band("K", &graph, &sources).unwrap();
        assert_eq!(out.labels, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_band_rejects_short_source() {
        let sources = vec![dataset("a.csv", &[1.0, 2.0]), dataset("b.csv", &[1.0])];
        let graph = graph("kline", &["Yield"], "");
        let err = assemble_band("K", &graph, &sources).unwrap_err();
        assert!(matches!(err, GraphError::MismatchedLengths { .. }));
    }
}
