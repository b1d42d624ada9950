use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A label did not resolve to any vertex in the graph.
    #[error("unknown vertex: {label}")]
    UnknownVertex { label: String },

    /// The destination was never finalized by a shortest-path run from the source.
    #[error("no path from {from} to {to}")]
    NoPath { from: String, to: String },

    /// Two consecutive path vertices are not joined by an edge.
    #[error("no edge between {from} and {to}")]
    MissingEdge { from: String, to: String },

    /// A route map vertex was added without coordinates.
    #[error("no coordinates recorded for vertex {label}")]
    MissingCoordinates { label: String },

    /// A graph description file could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
