use std::fs::File;
use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use apq_routes::reader::{self, Label};
use apq_routes::{dijkstra, init_tracing, write_cost_table, Error};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "csv")]
#[command(about = "Build a graph from a CSV of source,target,cost[,oneway] rows and run Dijkstra from a source vertex label.", long_about = None)]
struct Cli {
    /// Path to the .csv file
    #[arg(short, long)]
    csv: String,

    /// Vertex label to run Dijkstra from
    #[arg(short, long)]
    source: Label,

    /// Output CSV (vertex, cost, predecessor). If omitted, writes to stdout.
    #[arg(short, long)]
    out: Option<String>,

    /// Include unreachable vertices in output with infinite cost
    #[arg(long, default_value_t = false)]
    include_unreachable: bool,

    /// Treat every row as a one-way edge
    #[arg(long, default_value_t = false)]
    directed: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let graph = reader::load_csv_edges(&cli.csv, cli.directed)
        .with_context(|| format!("reading {}", &cli.csv))?;
    let source = graph
        .vertex_by_label(&cli.source)
        .ok_or_else(|| Error::UnknownVertex {
            label: cli.source.to_string(),
        })?;

    let now = Instant::now();
    let paths = dijkstra(&graph, source);
    tracing::info!(
        elapsed_s = now.elapsed().as_secs_f64(),
        reachable = paths.len(),
        vertices = graph.num_vertices(),
        "dijkstra"
    );

    let out: Box<dyn Write> = match &cli.out {
        Some(path) => Box::new(File::create(path).with_context(|| format!("creating CSV {path}"))?),
        None => Box::new(io::stdout().lock()),
    };
    write_cost_table(&graph, &paths, cli.include_unreachable, b',', out)?;
    if let Some(path) = &cli.out {
        tracing::info!(rows = paths.len(), path = %path, "wrote cost table");
    }
    Ok(())
}
