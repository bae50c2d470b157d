use image::{DynamicImage, Rgb, RgbImage};
use log::{debug, info};

use crate::color::{ColorSource, Coloring, SpreadPalette};
use crate::error::SegmentError;
use crate::forest::SegmentForest;
use crate::graph::{build_edges, sort_edges, Edge, Metric};
use crate::grid::Grid;

/// Run parameters. Larger granularities produce fewer, larger segments.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Options {
    pub granularity: f32,
    pub metric: Metric,
}

impl Options {
    pub fn new(granularity: f32) -> Options {
        Options {
            granularity,
            metric: Metric::default(),
        }
    }

    pub fn with_metric(self, metric: Metric) -> Options {
        Options { metric, ..self }
    }

    pub fn validate(&self) -> Result<(), SegmentError> {
        if self.granularity.is_finite() && self.granularity > 0.0 {
            Ok(())
        } else {
            Err(SegmentError::InvalidParameter {
                name: "granularity",
                value: self.granularity,
            })
        }
    }
}

/// Greedy region merging over a weight-sorted edge list.
#[derive(Debug, Copy, Clone)]
pub struct Segmenter {
    granularity: f32,
}

impl Segmenter {
    pub fn new(granularity: f32) -> Segmenter {
        Segmenter { granularity }
    }

    /// Whether an edge of weight `weight` between roots `a` and `b` is small
    /// enough, compared to both segments' internal bounds, to join them.
    pub fn should_merge(&self, forest: &SegmentForest, a: usize, b: usize, weight: f32) -> bool {
        weight < self.bound(forest, a).min(self.bound(forest, b))
    }

    fn bound(&self, forest: &SegmentForest, root: usize) -> f32 {
        forest.root_threshold(root) + self.granularity / forest.root_size(root) as f32
    }

    /// Applies a single edge. Returns whether two segments were merged.
    pub fn merge_edge(&self, forest: &mut SegmentForest, edge: &Edge) -> bool {
        let a = forest.find(edge.a);
        let b = forest.find(edge.b);
        if a == b || !self.should_merge(forest, a, b, edge.weight) {
            return false;
        }
        forest.union(a, b, edge.weight);
        true
    }

    /// Merge phase. `edges` must already be sorted.
    pub fn merge(&self, forest: &mut SegmentForest, edges: &[Edge]) -> usize {
        edges
            .iter()
            .filter(|edge| self.merge_edge(forest, edge))
            .count()
    }

    /// Builds, sorts and merges the graph of `grid`.
    pub fn run(&self, grid: &Grid, metric: Metric) -> Result<SegmentForest, SegmentError> {
        let mut forest = SegmentForest::new(grid.len());
        if grid.len() < 2 {
            return Ok(forest);
        }

        let edges = sort_edges(build_edges(grid, metric)?);
        debug!("sorted {} edges", edges.len());

        let merges = self.merge(&mut forest, &edges);
        info!(
            "{} merges left {} segments out of {} cells",
            merges,
            forest.segment_count(),
            grid.len()
        );
        Ok(forest)
    }
}

/// Segments `rows` and paints each segment with a distinct color.
pub fn segment(rows: &[Vec<Rgb<u8>>], granularity: f32) -> Result<Vec<Vec<Rgb<u8>>>, SegmentError> {
    segment_with(rows, &Options::new(granularity), &mut SpreadPalette::default())
}

pub fn segment_with<C: ColorSource + ?Sized>(
    rows: &[Vec<Rgb<u8>>],
    options: &Options,
    colors: &mut C,
) -> Result<Vec<Vec<Rgb<u8>>>, SegmentError> {
    options.validate()?;
    let grid = Grid::from_rows(rows)?;
    let mut forest = Segmenter::new(options.granularity).run(&grid, options.metric)?;
    Ok(grid.to_rows(&forest.finalize(colors)))
}

#[derive(Debug, Clone)]
pub struct Segmented {
    pub image: RgbImage,
    pub segments: usize,
}

pub fn segment_image(
    img: &DynamicImage,
    options: &Options,
    coloring: Coloring,
) -> Result<Segmented, SegmentError> {
    options.validate()?;
    let grid = Grid::from_image(img)?;
    let mut forest = Segmenter::new(options.granularity).run(&grid, options.metric)?;
    let colors = coloring.paint(&grid, &mut forest);
    Ok(Segmented {
        image: grid.to_image(&colors),
        segments: forest.segment_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn counter() -> impl FnMut() -> Rgb<u8> {
        let mut next = 0u32;
        move || {
            next += 1;
            Rgb([(next >> 16) as u8, (next >> 8) as u8, next as u8])
        }
    }

    fn grid(width: u32, pixels: &[[u8; 3]]) -> Grid {
        let height = pixels.len() as u32 / width;
        Grid::new(width, height, pixels.iter().map(|&p| Rgb(p)).collect()).unwrap()
    }

    /* a 5x5 image with a bright cross over a dark, slightly noisy background */
    fn cross() -> Grid {
        let mut pixels = Vec::new();
        for row in 0..5u8 {
            for col in 0..5u8 {
                if row == 2 || col == 2 {
                    pixels.push([230, 220 + row, 210 + col]);
                } else {
                    pixels.push([10 + row * 3, 12 + col * 5, 8 + row + col]);
                }
            }
        }
        grid(5, &pixels)
    }

    #[test]
    fn predicate_uses_threshold_plus_granularity_over_size() {
        let mut forest = SegmentForest::new(4);
        let segmenter = Segmenter::new(10.0);

        /* both singletons: bound is 0 + 10 / 1 */
        assert!(segmenter.should_merge(&forest, 0, 1, 9.9));
        assert!(!segmenter.should_merge(&forest, 0, 1, 10.0));

        /* size 2, threshold 1: bound is 1 + 10 / 2 = 6, the smaller side wins */
        let root = forest.union(0, 1, 1.0);
        assert!(segmenter.should_merge(&forest, root, 2, 5.9));
        assert!(!segmenter.should_merge(&forest, root, 2, 6.0));
        assert!(!segmenter.should_merge(&forest, 2, root, 6.0));
    }

    #[test]
    fn merge_edge_skips_cells_already_together() {
        let mut forest = SegmentForest::new(3);
        let segmenter = Segmenter::new(100.0);
        assert!(segmenter.merge_edge(&mut forest, &Edge { a: 0, b: 1, weight: 1.0 }));
        assert!(!segmenter.merge_edge(&mut forest, &Edge { a: 1, b: 0, weight: 0.0 }));
        assert_eq!(forest.segment_threshold(0), 1.0);
    }

    #[test]
    fn sizes_are_conserved_and_merges_are_permanent() {
        let grid = cross();
        let edges = sort_edges(build_edges(&grid, Metric::Rgb).unwrap());
        let mut forest = SegmentForest::new(grid.len());
        let segmenter = Segmenter::new(40.0);
        let mut together: Vec<(usize, usize)> = Vec::new();

        for edge in &edges {
            let merged = segmenter.merge_edge(&mut forest, edge);
            if merged {
                together.push((edge.a, edge.b));
                let root = forest.find(edge.a);
                assert_eq!(forest.segment_threshold(root), edge.weight);
            }

            let roots: HashSet<_> = (0..grid.len()).map(|cell| forest.find(cell)).collect();
            let total: usize = roots.iter().map(|&root| forest.segment_size(root)).sum();
            assert_eq!(total, grid.len());

            for &(a, b) in &together {
                assert_eq!(forest.find(a), forest.find(b));
            }
        }
        assert!(!together.is_empty());
    }

    #[test]
    fn cross_separates_from_background() {
        let grid = cross();
        let mut forest = Segmenter::new(40.0).run(&grid, Metric::Rgb).unwrap();
        let labels = forest.labels();

        let center = labels[2 * 5 + 2];
        let corner = labels[0];
        assert_ne!(center, corner);
        for (index, cell) in grid.cells().iter().enumerate() {
            let on_cross = cell.row == 2 || cell.col == 2;
            assert_eq!(labels[index] == center, on_cross, "cell {}", index);
        }
    }

    #[test]
    fn partition_is_reproducible() {
        /* gray steps of 1, 2, 3, ... so every edge weight is distinct */
        let mut level = 0u8;
        let pixels: Vec<[u8; 3]> = (0..12u8)
            .map(|i| {
                level += i;
                [level, level, level]
            })
            .collect();
        let g = grid(12, &pixels);

        let edges = sort_edges(build_edges(&g, Metric::Rgb).unwrap());
        assert!(edges.windows(2).all(|pair| pair[0].weight < pair[1].weight));

        let first = Segmenter::new(5.0).run(&g, Metric::Rgb).unwrap().labels();
        for _ in 0..3 {
            assert_eq!(Segmenter::new(5.0).run(&g, Metric::Rgb).unwrap().labels(), first);
        }

        /* steps of 1 and 2 join the first three cells, 3 is past every bound */
        assert_eq!(first[0], first[1]);
        assert_eq!(first[1], first[2]);
        let distinct: HashSet<_> = first.iter().collect();
        assert_eq!(distinct.len(), 10);
    }

    #[test]
    fn coloring_matches_segment_membership() {
        let grid = cross();
        let mut forest = Segmenter::new(40.0).run(&grid, Metric::Lab).unwrap();
        let colors = forest.finalize(&mut counter());
        for a in 0..grid.len() {
            for b in 0..grid.len() {
                assert_eq!(
                    colors[a] == colors[b],
                    forest.find(a) == forest.find(b),
                    "cells {} and {}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn two_identical_pixels_form_one_segment() {
        let rows = vec![vec![Rgb([40, 80, 120]), Rgb([40, 80, 120])]];
        for &g in &[0.001, 1.0, 1000.0] {
            let out = segment(&rows, g).unwrap();
            assert_eq!(out[0][0], out[0][1]);
        }
    }

    #[test]
    fn zero_granularity_never_joins_different_colors() {
        let g = grid(2, &[[0, 0, 0], [255, 255, 255]]);
        let mut forest = Segmenter::new(0.0).run(&g, Metric::Rgb).unwrap();
        assert_eq!(forest.segment_count(), 2);
        let colors = forest.finalize(&mut counter());
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn uniform_image_is_a_single_segment() {
        let rows = vec![vec![Rgb([9, 9, 9]); 4]; 4];
        for &g in &[0.01, 1.0, 500.0] {
            let out = segment(&rows, g).unwrap();
            let distinct: HashSet<_> = out.iter().flatten().map(|c| c.0).collect();
            assert_eq!(distinct.len(), 1);
        }
    }

    #[test]
    fn high_granularity_merges_a_checkerboard() {
        let (black, white) = (Rgb([0, 0, 0]), Rgb([255, 255, 255]));
        let rows = vec![vec![black, white], vec![white, black]];
        let out = segment(&rows, 1.0e6).unwrap();
        let distinct: HashSet<_> = out.iter().flatten().map(|c| c.0).collect();
        assert_eq!(distinct.len(), 1);
    }

    #[test]
    fn segment_colors_stay_distinct_for_many_segments() {
        /* 40x40 gradient, every pixel unique, so each one is its own segment */
        let rows: Vec<Vec<Rgb<u8>>> = (0..40u8)
            .map(|row| (0..40u8).map(|col| Rgb([row * 6, col * 6, 90])).collect())
            .collect();
        let grid = Grid::from_rows(&rows).unwrap();
        let segments = Segmenter::new(0.001)
            .run(&grid, Metric::Rgb)
            .unwrap()
            .segment_count();
        assert_eq!(segments, 1600);

        let out = segment(&rows, 0.001).unwrap();
        let distinct: HashSet<_> = out.iter().flatten().map(|c| c.0).collect();
        assert_eq!(distinct.len(), segments);
    }

    #[test]
    fn single_pixel_is_its_own_segment() {
        let rows = vec![vec![Rgb([1, 2, 3])]];
        let out = segment_with(&rows, &Options::new(5.0), &mut counter()).unwrap();
        assert_eq!(out, vec![vec![Rgb([0, 0, 1])]]);
    }

    #[test]
    fn rejects_bad_granularity_before_anything_else() {
        let ragged = vec![vec![Rgb([0, 0, 0])], vec![]];
        for &g in &[0.0, -1.0, std::f32::NAN, std::f32::INFINITY] {
            assert!(matches!(
                segment(&ragged, g),
                Err(SegmentError::InvalidParameter { name: "granularity", .. })
            ));
        }
        assert!(matches!(
            segment(&ragged, 1.0),
            Err(SegmentError::InvalidDimensions { .. })
        ));
    }
}
