use glam::Vec3;
use image::Rgb;
use palette::{Hsv, RgbHue, Srgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::str::FromStr;

use crate::forest::SegmentForest;
use crate::grid::Grid;

/// Hands out display colors for finished segments, one call per segment.
pub trait ColorSource {
    fn next_color(&mut self) -> Rgb<u8>;
}

impl<F> ColorSource for F
where
    F: FnMut() -> Rgb<u8>,
{
    fn next_color(&mut self) -> Rgb<u8> {
        self()
    }
}

/* fraction of a turn between consecutive hues */
const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;

/* odd, so multiplying by it permutes the 24-bit color codes */
const CODE_SCRAMBLE: u32 = 0x9E_3779;
const CODE_MASK: u32 = 0xFF_FFFF;

/// Walks the hue circle in golden-ratio steps, so neighboring draws land far
/// apart. Deterministic, and never repeats a color until all 2^24 are used.
///
/// Once the hue walk lands on a color it already gave out, the next unused
/// code of a scrambled 24-bit counter is returned instead.
#[derive(Debug, Clone, Default)]
pub struct SpreadPalette {
    turn: f32,
    step: u32,
    fallback: u32,
    issued: HashSet<[u8; 3]>,
}

impl SpreadPalette {
    fn hue_walk(&mut self) -> [u8; 3] {
        /* cycle through a few saturation/value bands once hues get dense */
        let band = (self.step % 3) as f32;
        let hsv: Hsv = Hsv::new(
            RgbHue::from_degrees(self.turn * 360.0),
            0.85 - 0.2 * band,
            0.95 - 0.15 * band,
        );
        self.turn = (self.turn + GOLDEN_RATIO_CONJUGATE).fract();
        self.step = self.step.wrapping_add(1);

        let (r, g, b) = Srgb::from(hsv).into_components();
        [
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        ]
    }

    fn scrambled_code(&mut self) -> [u8; 3] {
        let code = self.fallback.wrapping_mul(CODE_SCRAMBLE) & CODE_MASK;
        self.fallback = self.fallback.wrapping_add(1) & CODE_MASK;
        [(code >> 16) as u8, (code >> 8) as u8, code as u8]
    }
}

impl ColorSource for SpreadPalette {
    fn next_color(&mut self) -> Rgb<u8> {
        let color = self.hue_walk();
        if self.issued.len() > CODE_MASK as usize {
            /* every 24-bit color is taken, repeats are unavoidable */
            return Rgb(color);
        }
        if self.issued.insert(color) {
            return Rgb(color);
        }
        loop {
            let code = self.scrambled_code();
            if self.issued.insert(code) {
                return Rgb(code);
            }
        }
    }
}

/// Uniformly random colors from a seeded generator.
#[derive(Debug, Clone)]
pub struct RandomPalette {
    rng: StdRng,
}

impl RandomPalette {
    pub fn new(seed: u64) -> RandomPalette {
        RandomPalette {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ColorSource for RandomPalette {
    fn next_color(&mut self) -> Rgb<u8> {
        Rgb([self.rng.gen(), self.rng.gen(), self.rng.gen()])
    }
}

/// Paints every cell with the rounded mean input color of its segment.
/// `labels[i]` is the segment id of cell `i` and must be a cell id.
pub fn mean_colors(grid: &Grid, labels: &[usize]) -> Vec<Rgb<u8>> {
    assert_eq!(labels.len(), grid.len());

    let mut sums = vec![(Vec3::new(0.0, 0.0, 0.0), 0usize); grid.len()];
    for (cell, &label) in grid.cells().iter().zip(labels) {
        let rgb = cell.color;
        let (sum, count) = sums[label];
        sums[label] = (
            sum + Vec3::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32),
            count + 1,
        );
    }

    labels
        .iter()
        .map(|&label| {
            let (sum, count) = sums[label];
            let avg = sum / (count as f32);
            Rgb([
                avg.x().round() as u8,
                avg.y().round() as u8,
                avg.z().round() as u8,
            ])
        })
        .collect()
}

/// How finished segments are painted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Coloring {
    Spread,
    Random { seed: u64 },
    Mean,
}

impl Coloring {
    pub fn with_seed(self, seed: u64) -> Coloring {
        match self {
            Coloring::Random { .. } => Coloring::Random { seed },
            other => other,
        }
    }

    pub fn paint(self, grid: &Grid, forest: &mut SegmentForest) -> Vec<Rgb<u8>> {
        match self {
            Coloring::Spread => forest.finalize(&mut SpreadPalette::default()),
            Coloring::Random { seed } => forest.finalize(&mut RandomPalette::new(seed)),
            Coloring::Mean => mean_colors(grid, &forest.labels()),
        }
    }
}

impl FromStr for Coloring {
    type Err = String;

    fn from_str(s: &str) -> Result<Coloring, String> {
        match s.to_ascii_lowercase().as_str() {
            "spread" => Ok(Coloring::Spread),
            "random" => Ok(Coloring::Random { seed: 0 }),
            "mean" => Ok(Coloring::Mean),
            other => Err(format!(
                "unknown coloring `{}` (expected spread, random or mean)",
                other
            )),
        }
    }
}
