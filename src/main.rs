use std::fs::File;
use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use apq_routes::reader::{self, Label};
use apq_routes::{dijkstra, init_tracing, write_cost_table, write_report, Error};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "route")]
#[command(about = "Load a Node/Edge map and run Dijkstra from a source vertex label.", long_about = None)]
struct Cli {
    /// Path to the Node/Edge map file
    #[arg(short, long)]
    map: String,

    /// Vertex label to route from
    #[arg(short, long)]
    source: Label,

    /// Vertex label to route to. If omitted, prints the cost table for every reachable vertex.
    #[arg(short, long)]
    dest: Option<Label>,

    /// Read a plain graph without coordinates, costed by edge length
    #[arg(long, default_value_t = false)]
    plain: bool,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    out: Option<String>,
}

fn unknown(label: Label) -> Error {
    Error::UnknownVertex {
        label: label.to_string(),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let out: Box<dyn Write> = match &cli.out {
        Some(path) => Box::new(File::create(path).with_context(|| format!("creating {path}"))?),
        None => Box::new(io::stdout().lock()),
    };

    if cli.plain {
        run_plain(&cli, out)
    } else {
        run_route(&cli, out)
    }
}

fn run_plain(cli: &Cli, mut out: Box<dyn Write>) -> Result<()> {
    let graph = reader::load_graph(&cli.map).with_context(|| format!("reading {}", &cli.map))?;
    let source = graph.vertex_by_label(&cli.source).ok_or_else(|| unknown(cli.source))?;

    let now = Instant::now();
    let paths = dijkstra(&graph, source);
    tracing::info!(elapsed_s = now.elapsed().as_secs_f64(), settled = paths.len(), "dijkstra");

    match cli.dest {
        Some(label) => {
            let dest = graph.vertex_by_label(&label).ok_or_else(|| unknown(label))?;
            let path = paths.path_to(dest).ok_or_else(|| Error::NoPath {
                from: cli.source.to_string(),
                to: label.to_string(),
            })?;
            let labels: Vec<String> = path
                .iter()
                .filter_map(|&v| graph.element(v).map(ToString::to_string))
                .collect();
            writeln!(out, "{}", labels.join(" -> "))?;
            if let Some(cost) = paths.cost(dest) {
                writeln!(out, "cost\t{cost}")?;
            }
        }
        None => write_cost_table(&graph, &paths, false, b'\t', out)?,
    }
    Ok(())
}

fn run_route(cli: &Cli, out: Box<dyn Write>) -> Result<()> {
    let map = reader::load_route_map(&cli.map).with_context(|| format!("reading {}", &cli.map))?;
    let source = map.vertex_by_label(&cli.source).ok_or_else(|| unknown(cli.source))?;

    let Some(label) = cli.dest else {
        let now = Instant::now();
        let paths = map.dijkstra(source);
        tracing::info!(elapsed_s = now.elapsed().as_secs_f64(), settled = paths.len(), "dijkstra");
        write_cost_table(map.graph(), &paths, false, b'\t', out)?;
        return Ok(());
    };

    let dest = map.vertex_by_label(&label).ok_or_else(|| unknown(label))?;
    let now = Instant::now();
    let path = map.shortest_path(source, dest)?;
    tracing::info!(
        elapsed_s = now.elapsed().as_secs_f64(),
        vertices = path.len(),
        straight_line_m = ?map.straight_line_meters(source, dest),
        "shortest path"
    );

    let rows = map.report(&path)?;
    write_report(&rows, out)?;
    Ok(())
}
