//! Cropgraph CLI - Chart crop simulation output
//!
//! # Commands
//!
//! ```bash
//! cropgraph graph -c config.yml -i run.csv -o run.html   # One input, one page
//! cropgraph graph -c multi.yml -i a.csv -i b.csv -o spread.html
//! cropgraph batch -c config.yml batch.csv                # Many pages
//! cropgraph init config.yml                              # Write an example config
//! cropgraph operations                                   # Show column operations
//! ```

use clap::{Parser, Subcommand};
use cropgraph::config::{read_config, write_default_config, Config};
use cropgraph::logs::LogTally;
use cropgraph::transform::pipeline::{batch_file_graph, graph_file, multi_file_graph, RunReport};
use std::path::{Path, PathBuf};

type CmdResult = Result<bool, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "cropgraph")]
#[command(about = "Chart crop simulation output as interactive HTML pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Graph input file(s) into one HTML page
    Graph {
        /// YAML config file (written with defaults if missing)
        #[arg(short, long, default_value = "config.yml")]
        config: PathBuf,

        /// Input file; repeat for multi-file configs
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Output HTML file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Graph every job listed in a batch file
    Batch {
        /// YAML config file (written with defaults if missing)
        #[arg(short, long, default_value = "config.yml")]
        config: PathBuf,

        /// Batch file: `input,output` rows
        batch: PathBuf,
    },

    /// Write an example config file
    Init {
        /// Config file to create
        #[arg(default_value = "config.yml")]
        path: PathBuf,
    },

    /// Show available column operations
    Operations,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let tally = LogTally::start();

    let result = match cli.command {
        Commands::Graph {
            config,
            input,
            output,
        } => cmd_graph(&config, &input, &output).await,

        Commands::Batch { config, batch } => cmd_batch(&config, &batch).await,

        Commands::Init { path } => cmd_init(&path),

        Commands::Operations => cmd_operations(),
    };

    let counts = tally.finish().await;
    if counts.warnings > 0 || counts.errors > 0 {
        eprintln!("📊 {} warning(s), {} error(s)", counts.warnings, counts.errors);
    }

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load the config, or write the example one and return `None` when it is missing.
fn load_or_init_config(path: &Path) -> Result<Option<Config>, Box<dyn std::error::Error>> {
    if path.exists() {
        eprintln!("⚙️  Config: {}", path.display());
        return Ok(Some(read_config(path)?));
    }

    write_default_config(path)?;
    eprintln!("📝 No config found, wrote an example to {}", path.display());
    eprintln!("   Edit it to match your input columns and run again.");
    Ok(None)
}

async fn cmd_graph(config: &Path, inputs: &[PathBuf], output: &Path) -> CmdResult {
    let Some(config) = load_or_init_config(config)? else {
        return Ok(true);
    };

    let report = if config.multi_files {
        multi_file_graph(inputs, &config, output).await?
    } else {
        match inputs {
            [input] => graph_file(input, &config, output)?,
            _ => {
                return Err(format!(
                    "single-file config takes exactly one input, got {} (set multifiles: true to aggregate)",
                    inputs.len()
                )
                .into())
            }
        }
    };

    print_report(&report);
    Ok(report.is_success())
}

async fn cmd_batch(config: &Path, batch: &Path) -> CmdResult {
    let Some(config) = load_or_init_config(config)? else {
        return Ok(true);
    };

    let report = batch_file_graph(batch, &config).await?;

    for run in &report.runs {
        print_report(run);
    }
    for (output, error) in &report.failed {
        eprintln!("❌ {}: {}", output.display(), error);
    }
    eprintln!(
        "📊 {} pages written, {} failed",
        report.runs.len(),
        report.failed.len()
    );

    Ok(report.is_success())
}

fn cmd_init(path: &Path) -> CmdResult {
    write_default_config(path)?;
    eprintln!("✅ Wrote example config to {}", path.display());
    Ok(true)
}

fn cmd_operations() -> CmdResult {
    println!("{}", cropgraph::operations_description());
    Ok(true)
}

fn print_report(report: &RunReport) {
    if report.failed.is_empty() {
        eprintln!(
            "✅ {}: {} graphs",
            report.output.display(),
            report.rendered.len()
        );
    } else {
        eprintln!(
            "⚠️  {}: {} graphs, {} failed",
            report.output.display(),
            report.rendered.len(),
            report.failed.len()
        );
        for failure in &report.failed {
            eprintln!("   • {}: {}", failure.graph, failure.error);
        }
    }
}
