//! High-level run pipeline: record files in, chart page out.
//!
//! Three entry points combine loading, assembly and rendering:
//!
//! - [`graph_file`] - one input file, one page
//! - [`multi_file_graph`] - several parallel input files aggregated into one page
//! - [`batch_file_graph`] - a batch file listing many of the above
//!
//! Graphs are processed in name order. A graph that fails is logged and
//! reported; the remaining graphs are still drawn and the page is still saved.
//!
//! # Example
//!
//! ```rust,ignore
//! use cropgraph::config::read_config;
//! use cropgraph::transform::pipeline::graph_file;
//! use std::path::Path;
//!
//! let config = read_config("config.yml")?;
//! let report = graph_file(Path::new("run.csv"), &config, Path::new("run.html"))?;
//! println!("{} graphs drawn", report.rendered.len());
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::assembler::{assemble_band, assemble_graph, GraphData};
use crate::config::{Config, GraphDefinition};
use crate::error::{GraphError, GraphResult, PipelineError, PipelineResult, RecordError};
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::models::Dataset;
use crate::parser::{load_dataset, LoadOptions};
use crate::render::{Chart, Page, Style};

/// Graph types drawn from several aggregated input files.
///
/// Single-file runs draw `line`, `ThemeRiver` and `bar3d`.
pub const MULTI_FILE_GRAPH_TYPES: &[&str] = &["kline"];

/// A graph that could not be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphFailure {
    pub graph: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: GraphError,
}

fn serialize_display<S: serde::Serializer>(error: &GraphError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// Outcome of producing one output page.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Page that was written
    pub output: PathBuf,
    /// Graphs drawn, in page order
    pub rendered: Vec<String>,
    /// Graphs that failed
    pub failed: Vec<GraphFailure>,
    /// Graphs left out because their type does not belong to this mode
    pub skipped: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One output page of a batch file and its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Pages that were written (possibly with failed graphs)
    pub runs: Vec<RunReport>,
    /// Jobs that produced no page at all
    pub failed: Vec<(PathBuf, PipelineError)>,
}

impl BatchReport {
    /// True when every page was written and every graph drawn.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.runs.iter().all(RunReport::is_success)
    }
}

/// Charts of one page plus what happened to each graph.
#[derive(Debug, Default)]
pub struct PageBuild {
    pub page: Page,
    pub rendered: Vec<String>,
    pub failed: Vec<GraphFailure>,
    pub skipped: Vec<String>,
}

impl PageBuild {
    fn into_report(self, output: &Path) -> RunReport {
        RunReport {
            output: output.to_path_buf(),
            rendered: self.rendered,
            failed: self.failed,
            skipped: self.skipped,
        }
    }
}

/// Assemble and chart every graph whose type is in `types`.
fn build_page<F>(config: &Config, types: &[&str], mut assemble: F) -> PageBuild
where
    F: FnMut(&str, &GraphDefinition) -> GraphResult<GraphData>,
{
    let mut build = PageBuild::default();

    for (name, graph) in &config.column_to_graph {
        if !types.contains(&graph.graph_type.as_str()) {
            log_info_indent(format!("{}: {} not drawn in this mode", name, graph.graph_type), 1);
            build.skipped.push(name.clone());
            continue;
        }

        let style = Style {
            title: graph.title.clone(),
            theme: config.theme.clone(),
        };
        match assemble(name, graph).and_then(|data| Chart::from_graph(&data, style)) {
            Ok(chart) => {
                log_success(format!("{} ({})", name, graph.graph_type));
                build.page.add_chart(chart);
                build.rendered.push(name.clone());
            }
            Err(error) => {
                log_warning(format!("{}: {}", name, error));
                build.failed.push(GraphFailure {
                    graph: name.clone(),
                    error,
                });
            }
        }
    }

    build
}

/// Chart every single-file graph of `config` from one dataset.
///
/// Every graph is attempted: `kline` (which needs several sources) and
/// unknown types are reported as failed graphs.
pub fn graph_dataset(dataset: &Dataset, config: &Config) -> PageBuild {
    let types: Vec<&str> = config
        .column_to_graph
        .values()
        .map(|g| g.graph_type.as_str())
        .collect();

    build_page(config, &types, |name, graph| {
        if MULTI_FILE_GRAPH_TYPES.contains(&graph.graph_type.as_str()) {
            return Err(GraphError::UnsupportedGraphType(graph.graph_type.clone()));
        }
        assemble_graph(name, graph, dataset)
    })
}

/// Chart every band graph of `config` across parallel datasets.
pub fn graph_sources(sources: &[Dataset], config: &Config) -> PageBuild {
    build_page(config, MULTI_FILE_GRAPH_TYPES, |name, graph| {
        assemble_band(name, graph, sources)
    })
}

/// Graph one input file into one HTML page.
pub fn graph_file(input: &Path, config: &Config, output: &Path) -> PipelineResult<RunReport> {
    log_info(format!("📖 Reading {}", input.display()));
    let options = LoadOptions::from_config(config)?;
    let dataset = load_dataset(input, &options)?;
    log_success(format!(
        "{} rows, {} columns",
        dataset.row_count(),
        dataset.column_count()
    ));

    let build = graph_dataset(&dataset, config);
    save_page(build, output)
}

/// Load several files concurrently, keeping their order.
pub async fn load_sources(inputs: &[PathBuf], options: &LoadOptions) -> PipelineResult<Vec<Dataset>> {
    let tasks = inputs.iter().cloned().map(|path| {
        let options = options.clone();
        tokio::task::spawn_blocking(move || load_dataset(&path, &options))
    });

    let loaded = futures::future::try_join_all(tasks).await?;
    let datasets = loaded.into_iter().collect::<Result<Vec<_>, RecordError>>()?;
    Ok(datasets)
}

/// Aggregate several parallel input files into one HTML page.
pub async fn multi_file_graph(
    inputs: &[PathBuf],
    config: &Config,
    output: &Path,
) -> PipelineResult<RunReport> {
    log_info(format!("📖 Reading {} input files", inputs.len()));
    let options = LoadOptions::from_config(config)?;
    let sources = load_sources(inputs, &options).await?;

    let build = graph_sources(&sources, config);
    save_page(build, output)
}

fn save_page(build: PageBuild, output: &Path) -> PipelineResult<RunReport> {
    build.page.save(output)?;
    if build.failed.is_empty() {
        log_success(format!("💾 Saved {} ({} graphs)", output.display(), build.rendered.len()));
    } else {
        log_warning(format!(
            "💾 Saved {} ({} graphs, {} failed)",
            output.display(),
            build.rendered.len(),
            build.failed.len()
        ));
    }
    Ok(build.into_report(output))
}

/// Parse a batch file.
///
/// The batch file uses the configured delimiter and has no header.
///
/// - single-file mode: every row is `input,output`
/// - multi-file mode: every row names an input; the second field names its
///   output and carries forward to following rows that leave it empty.
///   Inputs are grouped per output, outputs in order of first appearance.
pub fn parse_batch(content: &str, config: &Config) -> PipelineResult<Vec<BatchJob>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter_byte()?)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut jobs: Vec<BatchJob> = Vec::new();
    // Output of the previous row (multi-file mode)
    let mut current: Option<PathBuf> = None;

    for record in reader.records() {
        let record = record.map_err(RecordError::from)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |i: usize| record.get(i).map(str::trim).filter(|f| !f.is_empty());

        let input = field(0)
            .ok_or_else(|| PipelineError::Batch(format!("line {}: missing input file", line)))?;

        if config.multi_files {
            if let Some(output) = field(1) {
                current = Some(PathBuf::from(output));
            }
            let output = current.as_ref().ok_or_else(|| {
                PipelineError::Batch(format!("line {}: first row must name an output file", line))
            })?;

            match jobs.iter_mut().find(|job| &job.output == output) {
                Some(job) => job.inputs.push(PathBuf::from(input)),
                None => jobs.push(BatchJob {
                    output: output.clone(),
                    inputs: vec![PathBuf::from(input)],
                }),
            }
        } else {
            let output = field(1).ok_or_else(|| {
                PipelineError::Batch(format!("line {}: expected input and output file", line))
            })?;
            jobs.push(BatchJob {
                output: PathBuf::from(output),
                inputs: vec![PathBuf::from(input)],
            });
        }
    }

    Ok(jobs)
}

/// Read and parse a batch file from disk.
pub fn read_batch(path: &Path, config: &Config) -> PipelineResult<Vec<BatchJob>> {
    let content = std::fs::read_to_string(path).map_err(|source| RecordError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_batch(&content, config)
}

/// Run every job of a batch file.
///
/// A failing job is logged and recorded; later jobs still run.
pub async fn batch_file_graph(batch: &Path, config: &Config) -> PipelineResult<BatchReport> {
    let jobs = read_batch(batch, config)?;
    log_info(format!("📋 {} jobs in {}", jobs.len(), batch.display()));

    let mut report = BatchReport::default();
    for job in jobs {
        let result = if config.multi_files {
            multi_file_graph(&job.inputs, config, &job.output).await
        } else {
            // Single-file jobs always carry exactly one input
            match job.inputs.first() {
                Some(input) => graph_file(input, config, &job.output),
                None => Err(PipelineError::Batch("job without input".to_string())),
            }
        };

        match result {
            Ok(run) => report.runs.push(run),
            Err(error) => {
                log_error(format!("{}: {}", job.output.display(), error));
                report.failed.push((job.output, error));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CONFIG: &str = r#"
delimiter: ","
columntograph:
  A_Yield:
    graphtype: line
    title: Yield
    columns: [Date, Yield]
    datecolumn: Date
  B_Broken:
    graphtype: line
    title: Broken
    columns: [Date, Yield]
    columnview:
      - name: Bad
        operation: median
        columns: [Yield]
  C_Spread:
    graphtype: kline
    title: Spread
    columns: [Date, Yield]
    datecolumn: Date
"#;

    fn config() -> Config {
        Config::from_yaml(CONFIG).unwrap()
    }

    fn write_run(dir: &Path, name: &str, yields: &[f64]) -> PathBuf {
        let mut content = String::from("Date,Yield,LAI\n");
        for (i, y) in yields.iter().enumerate() {
            content.push_str(&format!("{:02}.05.2021,{},0.5\n", i + 1, y));
        }
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_graph_file_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_run(dir.path(), "run.csv", &[1.0, 2.0]);
        let output = dir.path().join("out/run.html");

        let report = graph_file(&input, &config(), &output).unwrap();

        assert_eq!(report.rendered, vec!["A_Yield"]);
        assert!(report.skipped.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].graph, "B_Broken");
        assert_eq!(report.failed[0].error, GraphError::UnsupportedOperation("median".into()));
        assert_eq!(report.failed[1].graph, "C_Spread");
        assert_eq!(report.failed[1].error, GraphError::UnsupportedGraphType("kline".into()));
        assert!(!report.is_success());
        assert!(fs::read_to_string(&output).unwrap().contains("chart_0"));
    }

    #[test]
    fn test_unknown_graph_type_fails_in_single_mode() {
        let config = Config::from_yaml(
            "columntograph:\n  P:\n    graphtype: pie\n    columns: [Yield]\n",
        )
        .unwrap();
        let dataset = Dataset::new("mem")
            .with_column("Yield", crate::models::Series::from_numbers([1.0]))
            .unwrap();

        let build = graph_dataset(&dataset, &config);
        assert!(build.page.is_empty());
        assert_eq!(build.failed[0].error, GraphError::UnsupportedGraphType("pie".into()));
    }

    #[test]
    fn test_graph_file_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = graph_file(&dir.path().join("nope.csv"), &config(), &dir.path().join("o.html"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Record(RecordError::Io { .. })));
    }

    #[tokio::test]
    async fn test_multi_file_graph_draws_bands_only() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![
            write_run(dir.path(), "a.csv", &[2.0, 1.0]),
            write_run(dir.path(), "b.csv", &[4.0, 1.0]),
            write_run(dir.path(), "c.csv", &[6.0, 1.0]),
        ];
        let output = dir.path().join("spread.html");

        let report = multi_file_graph(&inputs, &config(), &output).await.unwrap();

        assert_eq!(report.rendered, vec!["C_Spread"]);
        assert_eq!(report.skipped, vec!["A_Yield", "B_Broken"]);
        assert!(report.is_success());
        assert!(fs::read_to_string(&output).unwrap().contains("candlestick"));
    }

    #[tokio::test]
    async fn test_load_sources_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![
            write_run(dir.path(), "z.csv", &[1.0]),
            write_run(dir.path(), "a.csv", &[1.0, 2.0]),
        ];
        let sources = load_sources(&inputs, &LoadOptions::default()).await.unwrap();
        assert_eq!(sources[0].row_count(), 1);
        assert_eq!(sources[1].row_count(), 2);
    }

    #[test]
    fn test_parse_batch_single_mode() {
        let jobs = parse_batch("a.csv,a.html\n b.csv , b.html\n", &config()).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].inputs, vec![PathBuf::from("b.csv")]);
        assert_eq!(jobs[1].output, PathBuf::from("b.html"));

        let err = parse_batch("a.csv\n", &config()).unwrap_err();
        assert!(matches!(err, PipelineError::Batch(msg) if msg.contains("line 1")));
    }

    #[test]
    fn test_parse_batch_multi_mode_groups() {
        let mut config = config();
        config.multi_files = true;
        config.delimiter = ";".into();

        let jobs = parse_batch("a1.csv;a.html\na2.csv\nb1.csv;b.html\nb2.csv;\nb3.csv\n", &config).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].inputs.len(), 2);
        assert_eq!(jobs[1].output, PathBuf::from("b.html"));
        assert_eq!(jobs[1].inputs.len(), 3);

        let err = parse_batch("a1.csv\n", &config).unwrap_err();
        assert!(matches!(err, PipelineError::Batch(_)));
    }

    #[test]
    fn test_parse_batch_multi_mode_repeated_output() {
        let mut config = config();
        config.multi_files = true;

        let jobs = parse_batch("a.csv,out.html\nb.csv,out.html\nc.csv,out.html\n", &config).unwrap();
        assert_eq!(
            jobs,
            vec![BatchJob {
                output: PathBuf::from("out.html"),
                inputs: vec!["a.csv".into(), "b.csv".into(), "c.csv".into()],
            }]
        );
    }

    #[test]
    fn test_parse_batch_multi_mode_returning_output() {
        let mut config = config();
        config.multi_files = true;

        let jobs = parse_batch("a1.csv,a.html\nb1.csv,b.html\na2.csv,a.html\nb2.csv,b.html\n", &config)
            .unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].output, PathBuf::from("a.html"));
        assert_eq!(jobs[0].inputs, vec![PathBuf::from("a1.csv"), PathBuf::from("a2.csv")]);
        assert_eq!(jobs[1].output, PathBuf::from("b.html"));
        assert_eq!(jobs[1].inputs, vec![PathBuf::from("b1.csv"), PathBuf::from("b2.csv")]);
    }

    #[tokio::test]
    async fn test_batch_continues_after_failed_job() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_run(dir.path(), "good.csv", &[1.0, 2.0]);
        let batch = dir.path().join("batch.csv");
        fs::write(
            &batch,
            format!(
                "{},{}\n{},{}\n",
                dir.path().join("missing.csv").display(),
                dir.path().join("missing.html").display(),
                good.display(),
                dir.path().join("good.html").display(),
            ),
        )
        .unwrap();

        let report = batch_file_graph(&batch, &config()).await.unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.runs.len(), 1);
        assert!(dir.path().join("good.html").exists());
        assert!(!report.is_success());
    }
}
