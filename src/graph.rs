use glam::Vec3;
use log::debug;
use palette::{Lab, Srgb};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::SegmentError;
use crate::grid::Grid;

/// Color space in which edge weights are measured. Both metrics are the
/// Euclidean distance between per-cell feature vectors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Metric {
    Rgb,
    Lab,
}

impl Default for Metric {
    fn default() -> Metric {
        Metric::Rgb
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Metric, String> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(Metric::Rgb),
            "lab" => Ok(Metric::Lab),
            other => Err(format!("unknown metric `{}` (expected rgb or lab)", other)),
        }
    }
}

impl Metric {
    fn features(self, grid: &Grid) -> Vec<Vec3> {
        let colors = grid.cells().iter().map(|cell| cell.color);
        match self {
            Metric::Rgb => colors
                .map(|v| Vec3::new(v[0] as f32, v[1] as f32, v[2] as f32))
                .collect(),
            Metric::Lab => colors
                .map(|v| {
                    Srgb::new(
                        v[0] as f32 / 255.0,
                        v[1] as f32 / 255.0,
                        v[2] as f32 / 255.0,
                    )
                })
                .map(|p| Lab::from(p))
                .map(|p| Vec3::from(p.into_components()))
                .collect(),
        }
    }
}

/// Undirected adjacency between cells `a < b`, weighted by color distance.
///
/// Edges order by weight first, then by endpoints. Endpoint pairs are unique
/// within a graph, so this is a total order and sorting is reproducible.
#[derive(Debug, Copy, Clone)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub weight: f32,
}

impl Ord for Edge {
    fn cmp(&self, other: &Edge) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then(self.a.cmp(&other.a))
            .then(self.b.cmp(&other.b))
    }
}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Edge) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Edge) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Edge {}

/* east, south, south-east, south-west as (row, col) offsets */
const FORWARD_NEIGHBORS: [(i64, i64); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Builds the 8-connected graph of `grid`, each adjacent pair exactly once.
pub fn build_edges(grid: &Grid, metric: Metric) -> Result<Vec<Edge>, SegmentError> {
    if grid.len() < 2 {
        return Err(SegmentError::EmptyGraph { cells: grid.len() });
    }

    let features = metric.features(grid);
    let (width, height) = (grid.width() as i64, grid.height() as i64);
    let mut edges = Vec::with_capacity(4 * grid.len());

    for (a, cell) in grid.cells().iter().enumerate() {
        for (drow, dcol) in &FORWARD_NEIGHBORS {
            let (nrow, ncol) = (cell.row as i64 + drow, cell.col as i64 + dcol);
            if nrow >= height || ncol < 0 || ncol >= width {
                continue;
            }
            let b = (nrow * width + ncol) as usize;
            edges.push(Edge {
                a,
                b,
                weight: (features[a] - features[b]).length(),
            });
        }
    }

    debug!(
        "built {} edges over a {}x{} grid",
        edges.len(),
        grid.width(),
        grid.height()
    );
    Ok(edges)
}

pub fn sort_edges(mut edges: Vec<Edge>) -> Vec<Edge> {
    edges.sort_unstable();
    edges
}
