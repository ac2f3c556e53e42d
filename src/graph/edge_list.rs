//! Plain-text edge-list persistence.
//!
//! Format: the vertex count on the first non-blank line, then one
//! `from to weight` triple per line, whitespace separated.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::Graph;
use crate::error::GraphError;

impl Graph {
    /// Parses an edge list.
    ///
    /// # Errors
    /// [`GraphError::Parse`] for malformed lines (with their 1-based number),
    /// [`GraphError::VertexOutOfRange`] for endpoints beyond the declared
    /// vertex count, [`GraphError::Io`] for read failures.
    pub fn read_edge_list<R: BufRead>(reader: R) -> Result<Self, GraphError> {
        let mut graph: Option<Graph> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = idx + 1;
            let mut fields = line.split_whitespace();
            let Some(first) = fields.next() else {
                continue;
            };

            match graph.as_mut() {
                None => {
                    let vertices = parse_field::<usize>(first, lineno, "vertex count")?;
                    if let Some(extra) = fields.next() {
                        return Err(parse_error(
                            lineno,
                            format!("unexpected token `{extra}` after vertex count"),
                        ));
                    }
                    graph = Some(Graph::new(vertices));
                }
                Some(g) => {
                    let from = parse_field(first, lineno, "source vertex")?;
                    let to = parse_field(
                        fields
                            .next()
                            .ok_or_else(|| parse_error(lineno, "missing target vertex".into()))?,
                        lineno,
                        "target vertex",
                    )?;
                    let weight = parse_field(
                        fields.next().ok_or_else(|| parse_error(lineno, "missing weight".into()))?,
                        lineno,
                        "weight",
                    )?;
                    if let Some(extra) = fields.next() {
                        return Err(parse_error(
                            lineno,
                            format!("unexpected token `{extra}` after weight"),
                        ));
                    }
                    g.add_edge(from, to, weight)?;
                }
            }
        }

        graph.ok_or_else(|| parse_error(1, "missing vertex count".into()))
    }

    /// Writes the graph in edge-list format.
    ///
    /// # Errors
    /// Propagates write failures as [`GraphError::Io`].
    pub fn write_edge_list<W: Write>(&self, mut writer: W) -> Result<(), GraphError> {
        writeln!(writer, "{}", self.vertices)?;
        for e in &self.edges {
            writeln!(writer, "{} {} {}", e.from, e.to, e.weight)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Loads an edge-list file.
    ///
    /// # Errors
    /// See [`read_edge_list`](Self::read_edge_list).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let file = File::open(path)?;
        Self::read_edge_list(BufReader::new(file))
    }

    /// Saves the graph as an edge-list file, replacing any existing file.
    ///
    /// # Errors
    /// Propagates create/write failures as [`GraphError::Io`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        let file = File::create(path)?;
        self.write_edge_list(BufWriter::new(file))
    }
}

fn parse_field<T: std::str::FromStr>(token: &str, line: usize, what: &str) -> Result<T, GraphError>
where
    T::Err: std::fmt::Display,
{
    token
        .parse()
        .map_err(|e| parse_error(line, format!("invalid {what} `{token}`: {e}")))
}

fn parse_error(line: usize, message: String) -> GraphError {
    GraphError::Parse { line, message }
}
