//! Vertex CSV exchanged with the clustering stage
//!
//! One vertex per line as `x, y, z`. Coordinates are rounded to 8 decimal
//! places and printed with `.` as the decimal separator; the last line has no
//! trailing newline.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use clustermesh_core::{Error, Point3f, Result};
use tracing::info;

const DELIMITER: &str = ", ";
const DECIMALS: i32 = 8;

/// Writer for the clustering-stage vertex file
pub struct VertexCsvWriter;

impl VertexCsvWriter {
    /// Write `vertices` to `path`. The parent directory must already exist.
    pub fn write_vertices<P: AsRef<Path>>(vertices: &[Point3f], path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(Error::Configuration(format!(
                    "Directory \"{}\" does not exist",
                    parent.display()
                )));
            }
        }

        info!("Saving {} vertices to {:?}", vertices.len(), path);
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(vertices, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write `vertices` in CSV form to any writer.
    pub fn write_to<W: Write>(vertices: &[Point3f], writer: &mut W) -> Result<()> {
        for (i, vertex) in vertices.iter().enumerate() {
            if i > 0 {
                writeln!(writer)?;
            }
            write!(writer, "{}", Self::format_vertex(vertex))?;
        }
        Ok(())
    }

    /// Format a single vertex line without a line terminator.
    pub fn format_vertex(vertex: &Point3f) -> String {
        [vertex.x, vertex.y, vertex.z]
            .iter()
            .map(|&c| format_coordinate(c))
            .collect::<Vec<_>>()
            .join(DELIMITER)
    }
}

fn format_coordinate(value: f32) -> String {
    let scale = 10f64.powi(DECIMALS);
    let rounded = (f64::from(value) * scale).round() / scale;
    // Adding zero folds -0.0 into 0.0
    format!("{}", rounded + 0.0)
}

/// Reader for vertex files in the format written by [`VertexCsvWriter`]
pub struct VertexCsvReader;

impl VertexCsvReader {
    pub fn read_vertices<P: AsRef<Path>>(path: P) -> Result<Vec<Point3f>> {
        let file = File::open(path.as_ref())?;
        Self::read_from(BufReader::new(file))
    }

    /// Parse vertices from any buffered reader; blank lines are skipped.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Vec<Point3f>> {
        let mut vertices = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let coords = line
                .split(',')
                .map(|part| {
                    part.trim().parse::<f32>().map_err(|e| {
                        Error::parse(i + 1, format!("invalid coordinate '{}': {}", part.trim(), e))
                    })
                })
                .collect::<Result<Vec<f32>>>()?;
            match coords.as_slice() {
                &[x, y, z] => vertices.push(Point3f::new(x, y, z)),
                _ => {
                    return Err(Error::parse(
                        i + 1,
                        format!("expected 3 coordinates, found {}", coords.len()),
                    ))
                }
            }
        }
        Ok(vertices)
    }
}
